//! Randomized timing and placement variance
//!
//! All randomness used by the decision loop and the injector flows through
//! [`Humanizer`] so tests can seed it and get reproducible behavior.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::platform::Key;

/// Source of bounded random perturbations.
pub struct Humanizer {
    rng: StdRng,
}

impl Default for Humanizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Humanizer {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    /// Deterministic instance for tests.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Uniform offset in `[-range, range]`, used to scatter fractional
    /// click positions.
    pub fn offset(&mut self, range: f64) -> f64 {
        if range <= 0.0 {
            return 0.0;
        }
        self.rng.random_range(-range..=range)
    }

    /// Uniform pixel offset in `[-max, max]` on both axes.
    pub fn pixel_jitter(&mut self, max: i32) -> (i32, i32) {
        if max <= 0 {
            return (0, 0);
        }
        (
            self.rng.random_range(-max..=max),
            self.rng.random_range(-max..=max),
        )
    }

    /// Multiplicative factor for interval rescheduling: `1 ± jitter`,
    /// floored at 0.3 so a routine never fires sooner than 30% of its base
    /// interval.
    pub fn interval_factor(&mut self, jitter: f64) -> f64 {
        let jitter = jitter.clamp(0.0, 1.0);
        let factor = 1.0 + self.rng.random_range(-1.0..=1.0) * jitter;
        factor.max(0.3)
    }

    pub fn chance(&mut self, probability: f64) -> bool {
        self.rng.random::<f64>() < probability
    }

    /// Uniform duration in `[lo, hi]` milliseconds.
    pub fn duration_ms(&mut self, lo: u64, hi: u64) -> Duration {
        if hi <= lo {
            return Duration::from_millis(lo);
        }
        Duration::from_millis(self.rng.random_range(lo..=hi))
    }

    /// Random movement key for idle walking.
    pub fn walk_key(&mut self) -> Key {
        match self.rng.random_range(0..4) {
            0 => Key::W,
            1 => Key::A,
            2 => Key::S,
            _ => Key::D,
        }
    }

    /// Sideways key for the occasional second step.
    pub fn strafe_key(&mut self) -> Key {
        if self.rng.random::<f64>() < 0.5 {
            Key::A
        } else {
            Key::D
        }
    }

    /// Uniform value in `[0, range)`.
    pub fn unit(&mut self, range: f64) -> f64 {
        self.rng.random::<f64>() * range
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_is_bounded() {
        let mut h = Humanizer::seeded(1);
        for _ in 0..500 {
            let v = h.offset(0.05);
            assert!((-0.05..=0.05).contains(&v));
        }
        assert_eq!(h.offset(0.0), 0.0);
    }

    #[test]
    fn pixel_jitter_is_bounded() {
        let mut h = Humanizer::seeded(2);
        for _ in 0..500 {
            let (dx, dy) = h.pixel_jitter(4);
            assert!((-4..=4).contains(&dx));
            assert!((-4..=4).contains(&dy));
        }
        assert_eq!(h.pixel_jitter(0), (0, 0));
    }

    #[test]
    fn interval_factor_stays_in_band() {
        let mut h = Humanizer::seeded(3);
        for _ in 0..1000 {
            let f = h.interval_factor(0.5);
            assert!((0.5..=1.5).contains(&f));
        }
    }

    #[test]
    fn jitter_above_one_is_clamped() {
        let mut h = Humanizer::seeded(4);
        for _ in 0..1000 {
            let f = h.interval_factor(5.0);
            assert!((0.3..=2.0).contains(&f));
        }
    }

    #[test]
    fn seeded_sequences_repeat() {
        let mut a = Humanizer::seeded(42);
        let mut b = Humanizer::seeded(42);
        for _ in 0..50 {
            assert_eq!(a.offset(1.0).to_bits(), b.offset(1.0).to_bits());
        }
    }

    #[test]
    fn duration_range() {
        let mut h = Humanizer::seeded(5);
        for _ in 0..200 {
            let d = h.duration_ms(80, 160);
            assert!(d >= Duration::from_millis(80));
            assert!(d <= Duration::from_millis(160));
        }
        assert_eq!(h.duration_ms(50, 50), Duration::from_millis(50));
    }
}
