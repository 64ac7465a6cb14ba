use serde::{Deserialize, Serialize};

/// Speech-to-text providers the backend knows how to talk to.
/// This is a closed set; `None` in `AppConfig::active_provider` means the
/// user has not picked one yet (first launch, mid-onboarding).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    OpenAi,
    AzureOpenAi,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub active_provider: Option<Provider>,
}

// Provider credentials are stored by the backend (OS keychain); these shapes
// only exist so the preferences forms can round-trip them over the boundary.

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenAiConfig {
    pub api_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AzureOpenAiConfig {
    pub api_key: String,
    pub endpoint: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OnboardingConfig {
    #[serde(default)]
    pub current_step: u32,
}

/// Result of a manual update check. The backend defers installation while a
/// recording session is in flight, so `Deferred` is a real outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum UpdateStatus {
    UpToDate,
    Available { version: String },
    Deferred,
}
