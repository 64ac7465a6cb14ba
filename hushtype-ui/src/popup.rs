use serde::Serialize;

use hushtype_core::SessionState;
use hushtype_session::PopupStatus;

/// The popup window has exactly two footprints: the compact recording pill
/// and the wide error card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PopupSize {
    Compact,
    Wide,
}

/// A fully resolved frame for the popup. Everything the renderer needs is
/// precomputed here so the draw path stays a dumb projection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PopupView {
    pub size: PopupSize,
    pub headline: String,
    /// mm:ss of remaining time, present only while actively recording.
    pub timer: Option<String>,
    pub meter_percent: u8,
    pub show_cancel: bool,
    pub show_stop: bool,
    pub show_retry: bool,
    pub show_dismiss: bool,
}

impl PopupView {
    pub fn from_status(status: &PopupStatus) -> Self {
        let (size, headline, timer) = match &status.state {
            SessionState::Error(e) => (PopupSize::Wide, e.user_message.clone(), None),
            SessionState::Transcribing => (PopupSize::Compact, "Transcribing…".to_string(), None),
            SessionState::Recording { started_at_ms } => {
                let timer = started_at_ms.map(|_| status.timer_label.clone());
                (PopupSize::Compact, String::new(), timer)
            }
        };

        Self {
            size,
            headline,
            timer,
            meter_percent: (status.level.clamp(0.0, 1.0) * 100.0).round() as u8,
            show_cancel: status.can_cancel,
            show_stop: status.can_stop,
            show_retry: status.can_retry,
            show_dismiss: status.can_dismiss,
        }
    }
}
