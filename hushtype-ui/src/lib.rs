pub mod onboarding;
pub mod popup;
pub mod preferences;

pub use onboarding::{OnboardingFlow, OnboardingStep};
pub use popup::{PopupSize, PopupView};
pub use preferences::Preferences;
