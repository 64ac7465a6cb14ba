use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// Command-level de-duplication: a second invocation of the same command while
/// the first is outstanding is rejected, independent of any view-level button
/// disabling. Guards release on drop, so every exit path (including errors)
/// re-enables the command.
#[derive(Debug, Clone, Default)]
pub struct CommandGate {
    inflight: Arc<Mutex<HashSet<&'static str>>>,
}

impl CommandGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `None` if `command` is already in flight.
    pub fn try_acquire(&self, command: &'static str) -> Option<GateGuard> {
        let mut inflight = self.inflight.lock().unwrap_or_else(|p| p.into_inner());
        if !inflight.insert(command) {
            return None;
        }
        Some(GateGuard {
            gate: self.clone(),
            command,
        })
    }

    /// Whether `command` currently has an outstanding invocation. The view
    /// layer uses this to disable the triggering control.
    pub fn is_inflight(&self, command: &'static str) -> bool {
        self.inflight
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .contains(command)
    }

    fn release(&self, command: &'static str) {
        self.inflight
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .remove(command);
    }
}

#[must_use = "dropping the guard immediately re-enables the command"]
pub struct GateGuard {
    gate: CommandGate,
    command: &'static str,
}

impl Drop for GateGuard {
    fn drop(&mut self) {
        self.gate.release(self.command);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_is_rejected_while_first_is_held() {
        let gate = CommandGate::new();

        let guard = gate.try_acquire("stop-recording");
        assert!(guard.is_some());
        assert!(gate.is_inflight("stop-recording"));
        assert!(gate.try_acquire("stop-recording").is_none());

        // Unrelated commands are independent.
        assert!(gate.try_acquire("cancel-recording").is_some());
    }

    #[test]
    fn drop_releases_the_command() {
        let gate = CommandGate::new();

        drop(gate.try_acquire("retry-transcription"));
        assert!(!gate.is_inflight("retry-transcription"));
        assert!(gate.try_acquire("retry-transcription").is_some());
    }
}
