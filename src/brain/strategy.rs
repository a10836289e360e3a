//! Adaptive pacing
//!
//! A bounded performance score drifts with how the run is going and maps to
//! a named strategy. The strategy tunes the click delay and scales the
//! intervals of explicitly customized routines.

use std::time::Duration;

/// Named pacing strategy derived each cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StrategyKind {
    #[default]
    Adaptive,
    Aggressive,
    Conservative,
    Recovery,
}

impl StrategyKind {
    pub fn label(self) -> &'static str {
        match self {
            StrategyKind::Adaptive => "Adaptive",
            StrategyKind::Aggressive => "Aggressive",
            StrategyKind::Conservative => "Conservative",
            StrategyKind::Recovery => "Recovery",
        }
    }

    /// Interval multiplier applied to routines with customized intervals.
    pub fn interval_multiplier(self) -> f64 {
        match self {
            StrategyKind::Aggressive => 0.7,
            StrategyKind::Conservative => 1.5,
            StrategyKind::Recovery => 2.0,
            StrategyKind::Adaptive => 1.0,
        }
    }
}

const SCORE_FLOOR: f64 = 30.0;
const CLICK_DELAY_FLOOR_MS: u64 = 100;
const CLICK_DELAY_CEIL_MS: u64 = 300;

/// Tracks the performance score and the current strategy label.
pub struct StrategyAdaptor {
    score: f64,
    kind: StrategyKind,
}

impl Default for StrategyAdaptor {
    fn default() -> Self {
        Self::new()
    }
}

impl StrategyAdaptor {
    pub fn new() -> Self {
        Self {
            score: 85.0,
            kind: StrategyKind::Adaptive,
        }
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn kind(&self) -> StrategyKind {
        self.kind
    }

    /// Re-derive the strategy for this cycle. Stalled progress drags the
    /// score down into recovery pacing; otherwise the score creeps up
    /// toward each branch's own ceiling.
    pub fn update(
        &mut self,
        since_progress: Duration,
        recovery_after: Duration,
        turbo: bool,
        safe_mode: bool,
    ) -> StrategyKind {
        if since_progress > recovery_after {
            self.kind = StrategyKind::Recovery;
            self.score = (self.score - 5.0).max(SCORE_FLOOR);
        } else if turbo {
            self.kind = StrategyKind::Aggressive;
            self.score = (self.score + 2.0).min(95.0);
        } else if safe_mode {
            self.kind = StrategyKind::Conservative;
            self.score = (self.score + 1.0).min(90.0);
        } else {
            self.kind = StrategyKind::Adaptive;
            self.score = (self.score + 0.5).min(100.0);
        }
        self.kind
    }

    /// Nudge the click delay toward the score: fast when performing well,
    /// slower when struggling, always inside [100, 300] ms once adjusted.
    pub fn adjust_click_delay(&self, current: Duration) -> Duration {
        let ms = current.as_millis() as u64;
        if self.score > 90.0 {
            Duration::from_millis(ms.saturating_sub(5).max(CLICK_DELAY_FLOOR_MS))
        } else if self.score < 60.0 {
            Duration::from_millis((ms + 10).min(CLICK_DELAY_CEIL_MS))
        } else {
            current
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEN_MIN: Duration = Duration::from_secs(600);

    fn fresh() -> StrategyAdaptor {
        StrategyAdaptor::new()
    }

    #[test]
    fn labels_and_multipliers() {
        assert_eq!(StrategyKind::Aggressive.interval_multiplier(), 0.7);
        assert_eq!(StrategyKind::Conservative.interval_multiplier(), 1.5);
        assert_eq!(StrategyKind::Recovery.interval_multiplier(), 2.0);
        assert_eq!(StrategyKind::Adaptive.interval_multiplier(), 1.0);
        assert_eq!(StrategyKind::Recovery.label(), "Recovery");
    }

    #[test]
    fn stalled_progress_flips_to_recovery() {
        let mut s = fresh();
        let kind = s.update(Duration::from_secs(700), TEN_MIN, true, true);
        assert_eq!(kind, StrategyKind::Recovery);
        assert_eq!(s.score(), 80.0);
    }

    #[test]
    fn branch_priorities_and_ceilings() {
        let mut s = fresh();
        for _ in 0..20 {
            assert_eq!(
                s.update(Duration::ZERO, TEN_MIN, true, true),
                StrategyKind::Aggressive
            );
        }
        assert_eq!(s.score(), 95.0);

        let mut s = fresh();
        for _ in 0..20 {
            assert_eq!(
                s.update(Duration::ZERO, TEN_MIN, false, true),
                StrategyKind::Conservative
            );
        }
        assert_eq!(s.score(), 90.0);

        let mut s = fresh();
        for _ in 0..40 {
            assert_eq!(
                s.update(Duration::ZERO, TEN_MIN, false, false),
                StrategyKind::Adaptive
            );
        }
        assert_eq!(s.score(), 100.0);
    }

    #[test]
    fn score_never_leaves_bounds() {
        let mut s = fresh();
        for _ in 0..100 {
            s.update(Duration::from_secs(9_999), TEN_MIN, false, false);
            assert!(s.score() >= 30.0);
        }
        assert_eq!(s.score(), 30.0);
        for _ in 0..200 {
            s.update(Duration::ZERO, TEN_MIN, false, false);
            assert!(s.score() <= 100.0);
        }
    }

    #[test]
    fn click_delay_follows_score() {
        let mut s = fresh();
        // Drive the score above 90.
        for _ in 0..10 {
            s.update(Duration::ZERO, TEN_MIN, true, false);
        }
        let faster = s.adjust_click_delay(Duration::from_millis(150));
        assert_eq!(faster, Duration::from_millis(145));
        assert_eq!(
            s.adjust_click_delay(Duration::from_millis(101)),
            Duration::from_millis(100)
        );

        // Drive the score below 60.
        let mut s = fresh();
        for _ in 0..8 {
            s.update(Duration::from_secs(9_999), TEN_MIN, false, false);
        }
        let slower = s.adjust_click_delay(Duration::from_millis(150));
        assert_eq!(slower, Duration::from_millis(160));
        assert_eq!(
            s.adjust_click_delay(Duration::from_millis(295)),
            Duration::from_millis(300)
        );

        // Middle band leaves the delay alone.
        let s = fresh();
        assert_eq!(
            s.adjust_click_delay(Duration::from_millis(150)),
            Duration::from_millis(150)
        );
    }
}
