/// Per-frame approach rate while the raw level is above the smoothed one.
/// Fast, so the meter visibly reacts to speech onset.
pub const ATTACK_RATE: f32 = 0.35;

/// Per-frame approach rate while the raw level is below the smoothed one.
/// Slow, so the meter falls off gently instead of flickering.
pub const DECAY_RATE: f32 = 0.08;

/// Smooths the backend's noisy instantaneous loudness into something worth
/// animating. The raw level arrives at arbitrary intervals via `push_raw`;
/// `tick` is called once per animation frame and owns the smoothed value.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LevelMeter {
    raw: f32,
    smoothed: f32,
}

impl LevelMeter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the latest instantaneous level. Does not touch the smoothed
    /// value; only the frame tick moves it.
    pub fn push_raw(&mut self, raw: f32) {
        self.raw = raw.clamp(0.0, 1.0);
    }

    /// Advance the smoothed value one frame toward the raw level.
    pub fn tick(&mut self) -> f32 {
        let rate = if self.raw > self.smoothed {
            ATTACK_RATE
        } else {
            DECAY_RATE
        };
        self.smoothed += (self.raw - self.smoothed) * rate;
        self.smoothed
    }

    pub fn smoothed(&self) -> f32 {
        self.smoothed
    }

    pub fn reset(&mut self) {
        self.raw = 0.0;
        self.smoothed = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn rise_is_monotone_and_never_overshoots() {
        let mut meter = LevelMeter::new();
        meter.push_raw(1.0);

        let mut prev = 0.0;
        for _ in 0..200 {
            let v = meter.tick();
            assert!(v >= prev, "smoothed value must never fall while rising");
            assert!(v <= 1.0, "smoothed value must not overshoot the raw level");
            prev = v;
        }

        // Asymptotic approach: after many frames we are essentially at 1.0.
        assert_relative_eq!(prev, 1.0, epsilon = 1e-3);
    }

    #[test]
    fn decay_is_slower_than_attack() {
        let mut rising = LevelMeter::new();
        rising.push_raw(1.0);
        let rise_step = rising.tick();

        let mut falling = LevelMeter::new();
        falling.push_raw(1.0);
        for _ in 0..200 {
            falling.tick();
        }
        let top = falling.smoothed();
        falling.push_raw(0.0);
        let fall_step = top - falling.tick();

        assert!(
            fall_step < rise_step,
            "decay ({fall_step}) must be slower than attack ({rise_step})"
        );
    }

    #[test]
    fn raw_input_is_clamped() {
        let mut meter = LevelMeter::new();
        meter.push_raw(3.5);
        for _ in 0..200 {
            meter.tick();
        }
        assert!(meter.smoothed() <= 1.0);

        meter.push_raw(-1.0);
        for _ in 0..400 {
            meter.tick();
        }
        assert!(meter.smoothed() >= 0.0);
    }
}
