use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use hushtype_core::OnboardingConfig;
use hushtype_gateway::{Backend, BackendEvent};

/// The wizard's ordered steps. `current_step` in [`OnboardingConfig`] is the
/// index into this order, so a half-finished wizard resumes where it left off
/// after a restart of the app.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnboardingStep {
    Welcome,
    Accessibility,
    Provider,
    Trial,
    Done,
}

impl OnboardingStep {
    const ORDER: [OnboardingStep; 5] = [
        Self::Welcome,
        Self::Accessibility,
        Self::Provider,
        Self::Trial,
        Self::Done,
    ];

    pub fn index(self) -> u32 {
        Self::ORDER.iter().position(|s| *s == self).unwrap_or(0) as u32
    }

    /// Out-of-range persisted indices clamp to the last step rather than
    /// trapping the user in a broken wizard.
    pub fn from_index(index: u32) -> Self {
        *Self::ORDER
            .get(index as usize)
            .unwrap_or(&Self::Done)
    }

    fn next(self) -> Self {
        Self::from_index(self.index() + 1)
    }

    fn back(self) -> Self {
        Self::from_index(self.index().saturating_sub(1))
    }
}

/// Onboarding wizard state. Every transition is persisted through the
/// backend so the wizard survives app restarts; persistence failures are
/// logged and do not block navigation.
pub struct OnboardingFlow {
    backend: Arc<dyn Backend>,
    step: OnboardingStep,

    // Live feedback for the trial step, fed by recording-state-changed.
    trial_state: Option<String>,
}

impl OnboardingFlow {
    pub async fn load(backend: Arc<dyn Backend>) -> Self {
        let step = match backend.load_onboarding_config().await {
            Ok(cfg) => OnboardingStep::from_index(cfg.current_step),
            Err(e) => {
                warn!(error = %e, "loading onboarding config failed; starting at Welcome");
                OnboardingStep::Welcome
            }
        };
        Self {
            backend,
            step,
            trial_state: None,
        }
    }

    pub fn step(&self) -> OnboardingStep {
        self.step
    }

    pub fn trial_state(&self) -> Option<&str> {
        self.trial_state.as_deref()
    }

    pub async fn next(&mut self) {
        self.step = self.step.next();
        self.persist().await;
    }

    pub async fn back(&mut self) {
        self.step = self.step.back();
        self.persist().await;
    }

    /// Accessibility step helper: check the permission, prompting the user
    /// through the system dialog if it is missing, then re-check.
    pub async fn ensure_accessibility(&self) -> bool {
        match self.backend.check_accessibility_permission().await {
            Ok(true) => true,
            Ok(false) => {
                if let Err(e) = self.backend.request_accessibility_permission().await {
                    warn!(error = %e, "accessibility prompt failed");
                    return false;
                }
                self.backend
                    .check_accessibility_permission()
                    .await
                    .unwrap_or(false)
            }
            Err(e) => {
                warn!(error = %e, "accessibility check failed");
                false
            }
        }
    }

    pub async fn finish(&mut self) -> anyhow::Result<()> {
        self.backend.finish_onboarding().await?;
        self.step = OnboardingStep::Done;
        self.persist().await;
        Ok(())
    }

    pub async fn skip(&mut self) -> anyhow::Result<()> {
        self.backend.skip_onboarding().await?;
        self.step = OnboardingStep::Done;
        self.persist().await;
        Ok(())
    }

    pub async fn restart(&mut self) -> anyhow::Result<()> {
        self.backend.restart_onboarding().await?;
        self.step = OnboardingStep::Welcome;
        self.trial_state = None;
        self.persist().await;
        Ok(())
    }

    /// The trial step listens for the backend's onboarding-specific state
    /// event; everything else is ignored here (the popup has its own
    /// controller).
    pub fn handle_event(&mut self, event: &BackendEvent) {
        if let BackendEvent::RecordingStateChanged { state } = event {
            if self.step == OnboardingStep::Trial {
                self.trial_state = Some(state.clone());
            } else {
                debug!(state = %state, "recording-state-changed outside trial step");
            }
        }
    }

    async fn persist(&self) {
        let cfg = OnboardingConfig {
            current_step: self.step.index(),
        };
        if let Err(e) = self.backend.save_onboarding_config(&cfg).await {
            warn!(error = %e, "persisting onboarding step failed");
        }
    }
}
