use crate::config::EFFECT_TIME_RATE;

/// Monotonic animation accumulators driven by frame timestamps (ms)
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AnimationClock {
    /// Drives the base pattern; advances by `delta * animation_speed`
    pub pattern_time: f64,
    /// Drives the overlays; advances by `delta * EFFECT_TIME_RATE`
    pub effect_time: f64,
    last_frame: Option<f64>,
}

impl AnimationClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget the last timestamp; the next tick anchors there with a zero
    /// delta. Called whenever the frame loop (re)starts.
    pub fn restart(&mut self) {
        self.last_frame = None;
    }

    /// Advance to timestamp `now`. Returns the frame delta, never negative.
    pub fn tick(&mut self, now: f64, animation_speed: f64) -> f64 {
        let delta = match self.last_frame {
            Some(last) => (now - last).max(0.0),
            None => 0.0,
        };
        self.last_frame = Some(self.last_frame.map_or(now, |last| last.max(now)));
        self.advance(delta, animation_speed);
        delta
    }

    /// Advance both accumulators by `delta` ms without a timestamp
    pub fn advance(&mut self, delta: f64, animation_speed: f64) {
        let delta = if delta.is_finite() { delta.max(0.0) } else { 0.0 };
        self.pattern_time += delta * animation_speed;
        self.effect_time += delta * EFFECT_TIME_RATE;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_tick_anchors() {
        let mut clock = AnimationClock::new();
        assert_eq!(clock.tick(1000.0, 0.5), 0.0);
        assert_eq!(clock.pattern_time, 0.0);

        assert_eq!(clock.tick(1016.0, 0.5), 16.0);
        assert_eq!(clock.pattern_time, 8.0);
        assert!((clock.effect_time - 0.016).abs() < 1e-12);
    }

    #[test]
    fn test_backwards_timestamp_does_not_rewind() {
        let mut clock = AnimationClock::new();
        clock.tick(500.0, 1.0);
        clock.tick(600.0, 1.0);
        let before = clock.clone();
        assert_eq!(clock.tick(550.0, 1.0), 0.0);
        assert_eq!(clock.pattern_time, before.pattern_time);
        // Next real frame measures from the latest timestamp seen
        assert_eq!(clock.tick(616.0, 1.0), 16.0);
    }

    #[test]
    fn test_restart_skips_paused_interval() {
        let mut clock = AnimationClock::new();
        clock.tick(0.0, 1.0);
        clock.tick(16.0, 1.0);
        clock.restart();
        assert_eq!(clock.tick(10_000.0, 1.0), 0.0);
        assert_eq!(clock.pattern_time, 16.0);
    }

    #[test]
    fn test_advance_ignores_bad_deltas() {
        let mut clock = AnimationClock::new();
        clock.advance(f64::NAN, 1.0);
        clock.advance(-5.0, 1.0);
        assert_eq!(clock, AnimationClock::new());
    }
}
