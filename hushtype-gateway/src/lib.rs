pub mod backend;
pub mod dedup;
pub mod event;
pub mod fake;

pub use backend::{Backend, CommandError, CommandResult};
pub use dedup::{CommandGate, GateGuard};
pub use event::BackendEvent;
pub use fake::FakeBackend;
