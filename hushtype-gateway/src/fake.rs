use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use hushtype_core::{
    AppConfig, AzureOpenAiConfig, OnboardingConfig, OpenAiConfig, UpdateStatus,
};
use tokio::sync::{broadcast, watch};
use tracing::debug;

use crate::backend::{commands, Backend, CommandError, CommandResult};
use crate::event::BackendEvent;

const EVENT_CAPACITY: usize = 64;

#[derive(Default)]
struct FakeState {
    app_config: AppConfig,
    openai: Option<OpenAiConfig>,
    azure: Option<AzureOpenAiConfig>,
    onboarding: OnboardingConfig,
    onboarding_finished: bool,
    onboarding_skipped: bool,
    accessibility_granted: bool,
    update_status: Option<UpdateStatus>,

    // Audio file a transcription error left behind; dismiss deletes it.
    last_audio_file: Option<PathBuf>,

    // Commands scripted to fail exactly once.
    fail_once: HashSet<&'static str>,
    calls: Vec<&'static str>,
}

/// In-process stand-in for the native backend, used by tests and the demo
/// binary. Commands are recorded in an invocation log and can be scripted to
/// fail; events and audio levels are pushed by the test itself, mirroring the
/// real backend's "commands never mutate UI state, events do" contract.
pub struct FakeBackend {
    events: broadcast::Sender<BackendEvent>,
    levels: watch::Sender<f32>,
    state: Mutex<FakeState>,
}

impl Default for FakeBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeBackend {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let (levels, _) = watch::channel(0.0);
        Self {
            events,
            levels,
            state: Mutex::new(FakeState::default()),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn record(&self, command: &'static str) -> CommandResult<()> {
        let mut state = self.lock();
        state.calls.push(command);
        if state.fail_once.remove(command) {
            return Err(CommandError::new(command, "scripted failure"));
        }
        Ok(())
    }

    // ---- scripting surface ----

    pub fn push_event(&self, event: BackendEvent) {
        // No subscribers is fine; events are fire-and-forget.
        if self.events.send(event).is_err() {
            debug!("event pushed with no subscribers");
        }
    }

    pub fn push_level(&self, level: f32) {
        self.levels.send_replace(level);
    }

    /// Script the next invocation of `command` to fail.
    pub fn fail_next(&self, command: &'static str) {
        self.lock().fail_once.insert(command);
    }

    pub fn set_accessibility_granted(&self, granted: bool) {
        self.lock().accessibility_granted = granted;
    }

    pub fn set_update_status(&self, status: UpdateStatus) {
        self.lock().update_status = Some(status);
    }

    /// Pretend a failed transcription left this file behind for retry.
    pub fn set_last_audio_file(&self, path: impl Into<PathBuf>) {
        self.lock().last_audio_file = Some(path.into());
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.lock().calls.clone()
    }

    pub fn call_count(&self, command: &'static str) -> usize {
        self.lock().calls.iter().filter(|c| **c == command).count()
    }

    pub fn onboarding_finished(&self) -> bool {
        self.lock().onboarding_finished
    }

    pub fn onboarding_skipped(&self) -> bool {
        self.lock().onboarding_skipped
    }
}

#[async_trait]
impl Backend for FakeBackend {
    fn subscribe_events(&self) -> broadcast::Receiver<BackendEvent> {
        self.events.subscribe()
    }

    fn register_audio_level_channel(&self) -> watch::Receiver<f32> {
        self.lock().calls.push(commands::REGISTER_AUDIO_LEVEL_CHANNEL);
        self.levels.subscribe()
    }

    async fn cancel_recording(&self) -> CommandResult<()> {
        self.record(commands::CANCEL_RECORDING)
    }

    async fn stop_recording(&self) -> CommandResult<()> {
        self.record(commands::STOP_RECORDING)
    }

    async fn retry_transcription(&self) -> CommandResult<()> {
        self.record(commands::RETRY_TRANSCRIPTION)
    }

    async fn dismiss_error(&self) -> CommandResult<()> {
        self.record(commands::DISMISS_ERROR)?;
        // Discard the temp audio file kept for retry, as the backend does.
        if let Some(path) = self.lock().last_audio_file.take() {
            let _ = std::fs::remove_file(path);
        }
        Ok(())
    }

    async fn resize_popup_for_error(&self) -> CommandResult<()> {
        self.record(commands::RESIZE_POPUP_FOR_ERROR)
    }

    async fn check_accessibility_permission(&self) -> CommandResult<bool> {
        self.record(commands::CHECK_ACCESSIBILITY_PERMISSION)?;
        Ok(self.lock().accessibility_granted)
    }

    async fn request_accessibility_permission(&self) -> CommandResult<()> {
        self.record(commands::REQUEST_ACCESSIBILITY_PERMISSION)?;
        // The system prompt grants it in this fake.
        self.lock().accessibility_granted = true;
        Ok(())
    }

    async fn load_app_config(&self) -> CommandResult<AppConfig> {
        self.record(commands::LOAD_APP_CONFIG)?;
        Ok(self.lock().app_config.clone())
    }

    async fn save_app_config(&self, cfg: &AppConfig) -> CommandResult<()> {
        self.record(commands::SAVE_APP_CONFIG)?;
        self.lock().app_config = cfg.clone();
        Ok(())
    }

    async fn load_openai_config(&self) -> CommandResult<Option<OpenAiConfig>> {
        self.record(commands::LOAD_OPENAI_CONFIG)?;
        Ok(self.lock().openai.clone())
    }

    async fn save_openai_config(&self, cfg: &OpenAiConfig) -> CommandResult<()> {
        self.record(commands::SAVE_OPENAI_CONFIG)?;
        self.lock().openai = Some(cfg.clone());
        Ok(())
    }

    async fn test_openai_config(&self, api_key: &str) -> CommandResult<bool> {
        self.record(commands::TEST_OPENAI_CONFIG)?;
        Ok(!api_key.trim().is_empty())
    }

    async fn delete_openai_config(&self) -> CommandResult<()> {
        self.record(commands::DELETE_OPENAI_CONFIG)?;
        self.lock().openai = None;
        Ok(())
    }

    async fn load_azure_openai_config(&self) -> CommandResult<Option<AzureOpenAiConfig>> {
        self.record(commands::LOAD_AZURE_OPENAI_CONFIG)?;
        Ok(self.lock().azure.clone())
    }

    async fn save_azure_openai_config(&self, cfg: &AzureOpenAiConfig) -> CommandResult<()> {
        self.record(commands::SAVE_AZURE_OPENAI_CONFIG)?;
        self.lock().azure = Some(cfg.clone());
        Ok(())
    }

    async fn test_azure_openai_config(
        &self,
        api_key: &str,
        endpoint: &str,
    ) -> CommandResult<bool> {
        self.record(commands::TEST_AZURE_OPENAI_CONFIG)?;
        Ok(!api_key.trim().is_empty() && endpoint.starts_with("https://"))
    }

    async fn delete_azure_openai_config(&self) -> CommandResult<()> {
        self.record(commands::DELETE_AZURE_OPENAI_CONFIG)?;
        self.lock().azure = None;
        Ok(())
    }

    async fn load_onboarding_config(&self) -> CommandResult<OnboardingConfig> {
        self.record(commands::LOAD_ONBOARDING_CONFIG)?;
        Ok(self.lock().onboarding.clone())
    }

    async fn save_onboarding_config(&self, cfg: &OnboardingConfig) -> CommandResult<()> {
        self.record(commands::SAVE_ONBOARDING_CONFIG)?;
        self.lock().onboarding = cfg.clone();
        Ok(())
    }

    async fn finish_onboarding(&self) -> CommandResult<()> {
        self.record(commands::FINISH_ONBOARDING)?;
        self.lock().onboarding_finished = true;
        Ok(())
    }

    async fn skip_onboarding(&self) -> CommandResult<()> {
        self.record(commands::SKIP_ONBOARDING)?;
        self.lock().onboarding_skipped = true;
        Ok(())
    }

    async fn restart_onboarding(&self) -> CommandResult<()> {
        self.record(commands::RESTART_ONBOARDING)?;
        let mut state = self.lock();
        state.onboarding = OnboardingConfig::default();
        state.onboarding_finished = false;
        state.onboarding_skipped = false;
        Ok(())
    }

    async fn check_for_updates(&self) -> CommandResult<UpdateStatus> {
        self.record(commands::CHECK_FOR_UPDATES)?;
        Ok(self
            .lock()
            .update_status
            .clone()
            .unwrap_or(UpdateStatus::UpToDate))
    }
}
