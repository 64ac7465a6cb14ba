pub mod config;
pub mod error;
pub mod level;
pub mod session;
pub mod timefmt;

// Keep the public surface small and intentional.
pub use config::*;
pub use error::*;
pub use level::*;
pub use session::*;
pub use timefmt::*;
