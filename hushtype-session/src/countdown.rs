use hushtype_core::MAX_RECORDING_DURATION_MS;

/// Countdown bounding a recording session. At most one countdown is live per
/// controller: arming replaces any previous one, so duplicate timers cannot
/// exist by construction. Expiry reports true exactly once per armed session
/// even if the tick callback keeps firing past zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    max_duration_ms: u64,
    started_at_ms: Option<u64>,
    fired: bool,
}

impl Countdown {
    pub fn new(max_duration_ms: u64) -> Self {
        Self {
            max_duration_ms,
            started_at_ms: None,
            fired: false,
        }
    }

    pub fn arm(&mut self, now_ms: u64) {
        self.started_at_ms = Some(now_ms);
        self.fired = false;
    }

    pub fn disarm(&mut self) {
        self.started_at_ms = None;
        self.fired = false;
    }

    pub fn is_armed(&self) -> bool {
        self.started_at_ms.is_some()
    }

    pub fn remaining_ms(&self, now_ms: u64) -> u64 {
        match self.started_at_ms {
            Some(start) => self
                .max_duration_ms
                .saturating_sub(now_ms.saturating_sub(start)),
            None => 0,
        }
    }

    /// True exactly once, on the first tick at or past zero remaining.
    pub fn expire_once(&mut self, now_ms: u64) -> bool {
        if !self.is_armed() || self.fired || self.remaining_ms(now_ms) > 0 {
            return false;
        }
        self.fired = true;
        true
    }
}

impl Default for Countdown {
    fn default() -> Self {
        Self::new(MAX_RECORDING_DURATION_MS)
    }
}
