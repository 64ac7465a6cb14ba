use hushtype_core::RecordingError;
use serde::{Deserialize, Serialize};

/// Lifecycle events pushed by the backend, fire-and-forget, no acknowledgment.
/// Arrival is causally sequenced per session but carries no sequence numbers,
/// so consumers must tolerate duplicates of terminal events.
///
/// The serialized tag matches the wire name the backend emits
/// (`recording-started`, `recording-error`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum BackendEvent {
    RecordingStarted,
    RecordingTranscribing,
    RecordingStopped,
    RecordingCancelled,
    RecordingError(RecordingError),

    // Onboarding trial-step variant; the popup controller ignores it.
    RecordingStateChanged { state: String },
}

impl BackendEvent {
    /// Terminal events fully determine the next session state; audio-level
    /// pushes and `RecordingStateChanged` never do.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::RecordingStateChanged { .. })
    }
}
