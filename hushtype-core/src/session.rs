use crate::error::RecordingError;
use serde::{Deserialize, Serialize};

/// The popup's visible mode. Exactly one variant is active at any instant;
/// entering any variant clears the others.
///
/// `Recording { started_at_ms: None }` is the idle-armed view: visually the
/// recording screen, but with no countdown running. The popup enters it after
/// a stop, cancel or dismiss, ready for the next session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionState {
    Recording { started_at_ms: Option<u64> },
    Transcribing,
    Error(RecordingError),
}

impl Default for SessionState {
    fn default() -> Self {
        Self::idle_armed()
    }
}

impl SessionState {
    pub fn idle_armed() -> Self {
        Self::Recording {
            started_at_ms: None,
        }
    }

    pub fn is_recording(&self) -> bool {
        matches!(self, Self::Recording { .. })
    }

    /// Recording with a live countdown, as opposed to idle-armed.
    pub fn is_recording_active(&self) -> bool {
        matches!(
            self,
            Self::Recording {
                started_at_ms: Some(_)
            }
        )
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    // A stable string label for UI display.
    // This is intentionally not derived from `Debug`.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Recording {
                started_at_ms: Some(_),
            } => "recording",
            Self::Recording {
                started_at_ms: None,
            } => "idle",
            Self::Transcribing => "transcribing",
            Self::Error(_) => "error",
        }
    }
}
