use serde::{Deserialize, Serialize};

/// Which stage of the pipeline failed. Capture-stage failures cannot be
/// retried (there is no audio to retry with); transcription-stage failures
/// usually can, because the captured file is kept on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Recording,
    Transcription,
}

// Field names follow the wire payload of the `recording-error` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordingError {
    #[serde(rename = "error_type")]
    pub kind: ErrorKind,

    // Diagnostic detail, for logs only.
    #[serde(rename = "error_message")]
    pub message: String,

    // The only string ever shown to the user.
    pub user_message: String,

    pub can_retry: bool,
    pub audio_file_path: Option<String>,
}

impl RecordingError {
    pub fn recording(message: impl Into<String>, user_message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Recording,
            message: message.into(),
            user_message: user_message.into(),
            can_retry: false,
            audio_file_path: None,
        }
    }

    pub fn transcription(
        message: impl Into<String>,
        user_message: impl Into<String>,
        can_retry: bool,
        audio_file_path: Option<String>,
    ) -> Self {
        Self {
            kind: ErrorKind::Transcription,
            message: message.into(),
            user_message: user_message.into(),
            can_retry,
            audio_file_path,
        }
    }
}
