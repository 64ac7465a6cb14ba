pub mod clock;
pub mod controller;
pub mod countdown;

pub use clock::{Clock, ManualClock, SystemClock};
pub use controller::{PopupController, PopupStatus};
pub use countdown::Countdown;
