use async_trait::async_trait;
use hushtype_core::{
    AppConfig, AzureOpenAiConfig, OnboardingConfig, OpenAiConfig, UpdateStatus,
};
use thiserror::Error;
use tokio::sync::{broadcast, watch};

use crate::event::BackendEvent;

/// Wire names of the backend commands, shared by the de-duplication gate,
/// logging and the fake backend's invocation log.
pub mod commands {
    pub const REGISTER_AUDIO_LEVEL_CHANNEL: &str = "register-audio-level-channel";
    pub const CANCEL_RECORDING: &str = "cancel-recording";
    pub const STOP_RECORDING: &str = "stop-recording";
    pub const RETRY_TRANSCRIPTION: &str = "retry-transcription";
    pub const DISMISS_ERROR: &str = "dismiss-error";
    pub const RESIZE_POPUP_FOR_ERROR: &str = "resize-popup-for-error";
    pub const CHECK_ACCESSIBILITY_PERMISSION: &str = "check-accessibility-permission";
    pub const REQUEST_ACCESSIBILITY_PERMISSION: &str = "request-accessibility-permission";
    pub const LOAD_APP_CONFIG: &str = "load-app-config";
    pub const SAVE_APP_CONFIG: &str = "save-app-config";
    pub const LOAD_OPENAI_CONFIG: &str = "load-openai-config";
    pub const SAVE_OPENAI_CONFIG: &str = "save-openai-config";
    pub const TEST_OPENAI_CONFIG: &str = "test-openai-config";
    pub const DELETE_OPENAI_CONFIG: &str = "delete-openai-config";
    pub const LOAD_AZURE_OPENAI_CONFIG: &str = "load-azure-openai-config";
    pub const SAVE_AZURE_OPENAI_CONFIG: &str = "save-azure-openai-config";
    pub const TEST_AZURE_OPENAI_CONFIG: &str = "test-azure-openai-config";
    pub const DELETE_AZURE_OPENAI_CONFIG: &str = "delete-azure-openai-config";
    pub const LOAD_ONBOARDING_CONFIG: &str = "load-onboarding-config";
    pub const SAVE_ONBOARDING_CONFIG: &str = "save-onboarding-config";
    pub const FINISH_ONBOARDING: &str = "finish-onboarding";
    pub const SKIP_ONBOARDING: &str = "skip-onboarding";
    pub const RESTART_ONBOARDING: &str = "restart-onboarding";
    pub const CHECK_FOR_UPDATES: &str = "check-for-updates";
}

/// A backend command rejected the call. Callers treat this as
/// exception-equivalent: convert it (log, map, or bubble) before use, never
/// render it directly as session state. The backend re-asserts truth through
/// a subsequent event.
#[derive(Debug, Clone, Error)]
#[error("backend command {command} failed: {message}")]
pub struct CommandError {
    pub command: &'static str,
    pub message: String,
}

impl CommandError {
    pub fn new(command: &'static str, message: impl Into<String>) -> Self {
        Self {
            command,
            message: message.into(),
        }
    }
}

pub type CommandResult<T> = Result<T, CommandError>;

/// The native backend boundary: request/response commands plus two push
/// channels. Injected everywhere (never a singleton import) so every consumer
/// is testable against [`crate::FakeBackend`].
///
/// Audio capture, the keyboard hook, provider HTTP calls, keychain storage,
/// the updater and window management all live behind this trait.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Subscribe to lifecycle events. Dropping the receiver unsubscribes.
    fn subscribe_events(&self) -> broadcast::Receiver<BackendEvent>;

    /// Register for instantaneous audio levels in `[0.0, 1.0]`. The channel
    /// keeps only the latest value; pushes have no fixed cadence.
    fn register_audio_level_channel(&self) -> watch::Receiver<f32>;

    // Recording session commands.
    async fn cancel_recording(&self) -> CommandResult<()>;
    async fn stop_recording(&self) -> CommandResult<()>;
    async fn retry_transcription(&self) -> CommandResult<()>;
    async fn dismiss_error(&self) -> CommandResult<()>;
    async fn resize_popup_for_error(&self) -> CommandResult<()>;

    // Permissions.
    async fn check_accessibility_permission(&self) -> CommandResult<bool>;
    async fn request_accessibility_permission(&self) -> CommandResult<()>;

    // App configuration.
    async fn load_app_config(&self) -> CommandResult<AppConfig>;
    async fn save_app_config(&self, cfg: &AppConfig) -> CommandResult<()>;

    // Provider credentials (stored in the OS keychain by the backend).
    async fn load_openai_config(&self) -> CommandResult<Option<OpenAiConfig>>;
    async fn save_openai_config(&self, cfg: &OpenAiConfig) -> CommandResult<()>;
    async fn test_openai_config(&self, api_key: &str) -> CommandResult<bool>;
    async fn delete_openai_config(&self) -> CommandResult<()>;

    async fn load_azure_openai_config(&self) -> CommandResult<Option<AzureOpenAiConfig>>;
    async fn save_azure_openai_config(&self, cfg: &AzureOpenAiConfig) -> CommandResult<()>;
    async fn test_azure_openai_config(&self, api_key: &str, endpoint: &str)
        -> CommandResult<bool>;
    async fn delete_azure_openai_config(&self) -> CommandResult<()>;

    // Onboarding.
    async fn load_onboarding_config(&self) -> CommandResult<OnboardingConfig>;
    async fn save_onboarding_config(&self, cfg: &OnboardingConfig) -> CommandResult<()>;
    async fn finish_onboarding(&self) -> CommandResult<()>;
    async fn skip_onboarding(&self) -> CommandResult<()>;
    async fn restart_onboarding(&self) -> CommandResult<()>;

    // Updater.
    async fn check_for_updates(&self) -> CommandResult<UpdateStatus>;
}
