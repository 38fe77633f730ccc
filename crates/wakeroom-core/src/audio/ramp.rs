//! Linear fade-in ramp.
//!
//! The ramp is a pure step counter: it knows nothing about playback and is
//! advanced by elapsed wall-clock time.
//!
//! ```text
//! volume(step) = target / STEPS * step      for step < STEPS
//! volume(STEPS) = target                    (exact, no rounding drift)
//! ```

use std::time::Duration;

/// Number of discrete volume increments in a fade.
pub const FADE_STEPS: u32 = 100;

#[derive(Debug, Clone, PartialEq)]
pub struct FadeRamp {
    target: f32,
    increment: f32,
    step: u32,
    interval: Duration,
    /// Elapsed time not yet consumed by a whole step.
    carry: Duration,
}

impl FadeRamp {
    /// Ramp from 0 to `target` over `duration`.
    pub fn new(target: f32, duration: Duration) -> Self {
        Self {
            target,
            increment: target / FADE_STEPS as f32,
            step: 0,
            interval: duration / FADE_STEPS,
            carry: Duration::ZERO,
        }
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    pub fn step(&self) -> u32 {
        self.step
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_complete(&self) -> bool {
        self.step >= FADE_STEPS
    }

    /// Volume after `step` increments.
    pub fn volume_at(&self, step: u32) -> f32 {
        if step >= FADE_STEPS {
            self.target
        } else {
            (self.increment * step as f32).min(self.target)
        }
    }

    /// Consume `elapsed`, taking as many whole steps as fit.
    ///
    /// Returns the new volume if at least one step was taken.
    pub fn advance(&mut self, elapsed: Duration) -> Option<f32> {
        if self.is_complete() {
            return None;
        }
        self.carry += elapsed;
        let mut taken = false;
        while self.step < FADE_STEPS && self.carry >= self.interval {
            self.carry -= self.interval;
            self.step += 1;
            taken = true;
        }
        taken.then(|| self.volume_at(self.step))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn one_interval_takes_one_step() {
        let mut ramp = FadeRamp::new(0.8, Duration::from_secs(10));
        assert_eq!(ramp.interval(), Duration::from_millis(100));
        let v = ramp.advance(Duration::from_millis(100)).unwrap();
        assert!((v - 0.008).abs() < 1e-6);
        assert_eq!(ramp.step(), 1);
    }

    #[test]
    fn partial_interval_is_carried() {
        let mut ramp = FadeRamp::new(1.0, Duration::from_secs(10));
        assert_eq!(ramp.advance(Duration::from_millis(60)), None);
        assert!(ramp.advance(Duration::from_millis(60)).is_some());
        assert_eq!(ramp.step(), 1);
    }

    #[test]
    fn late_tick_catches_up_and_stops_at_target() {
        let mut ramp = FadeRamp::new(0.5, Duration::from_secs(1));
        assert_eq!(ramp.advance(Duration::from_secs(60)), Some(0.5));
        assert!(ramp.is_complete());
        assert_eq!(ramp.advance(Duration::from_secs(1)), None);
    }

    #[test]
    fn volume_is_monotonic() {
        let ramp = FadeRamp::new(0.7, Duration::from_secs(30));
        for step in 1..=FADE_STEPS {
            assert!(ramp.volume_at(step) >= ramp.volume_at(step - 1));
        }
    }

    proptest! {
        #[test]
        fn completed_fade_lands_exactly_on_target(
            target in 0.001f32..=1.0,
            millis in 1u64..=600_000,
        ) {
            let duration = Duration::from_millis(millis);
            let mut ramp = FadeRamp::new(target, duration);
            let mut last = 0.0;
            // Uneven tick sizes, as a real timer would deliver.
            let tick = Duration::from_millis((millis / 37).max(1));
            let mut elapsed = Duration::ZERO;
            while !ramp.is_complete() {
                if let Some(v) = ramp.advance(tick) {
                    prop_assert!(v <= target);
                    prop_assert!(v >= last);
                    last = v;
                }
                elapsed += tick;
                prop_assert!(elapsed <= duration + tick * 2);
            }
            prop_assert_eq!(last, target);
        }
    }
}
