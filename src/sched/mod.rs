//! Background routine scheduler
//!
//! Low-priority fallback actions (attack clicks, upgrades, next-wave,
//! reward collection) fire on independently jittered timers beneath the
//! decision loop. Rescheduling is randomized so input cadence is never
//! perfectly periodic; a routine can fire no sooner than 30% of its base
//! interval and no later than `(1 + jitter)` times it.

use std::time::{Duration, Instant};

use crate::stealth::Humanizer;

/// The built-in background routines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoutineKind {
    Attack,
    Upgrade,
    NextWave,
    Rewards,
}

impl RoutineKind {
    pub fn name(self) -> &'static str {
        match self {
            RoutineKind::Attack => "Attack",
            RoutineKind::Upgrade => "Upgrade",
            RoutineKind::NextWave => "NextWave",
            RoutineKind::Rewards => "Rewards",
        }
    }

    pub const ALL: [RoutineKind; 4] = [
        RoutineKind::Attack,
        RoutineKind::Upgrade,
        RoutineKind::NextWave,
        RoutineKind::Rewards,
    ];
}

/// One scheduled task: base interval, jitter fraction, optional override
/// interval and the next-due timestamp. Created once at startup and never
/// deleted during normal operation.
#[derive(Debug, Clone)]
pub struct Routine {
    kind: RoutineKind,
    base: Duration,
    jitter: f64,
    override_interval: Option<Duration>,
    next_due: Instant,
}

impl Routine {
    fn new(kind: RoutineKind, base: Duration, jitter: f64, now: Instant) -> Self {
        Self {
            kind,
            base,
            jitter: jitter.clamp(0.0, 1.0),
            override_interval: None,
            next_due: now,
        }
    }

    pub fn kind(&self) -> RoutineKind {
        self.kind
    }

    pub fn is_due(&self, now: Instant) -> bool {
        now >= self.next_due
    }

    pub fn next_due(&self) -> Instant {
        self.next_due
    }

    pub fn jitter(&self) -> f64 {
        self.jitter
    }

    /// Base interval after any override.
    pub fn effective_base(&self) -> Duration {
        self.override_interval.unwrap_or(self.base)
    }

    pub fn set_override(&mut self, interval: Duration) {
        self.override_interval = Some(interval);
    }

    pub fn clear_override(&mut self) {
        self.override_interval = None;
    }

    /// `next = now + base * max(0.3, 1 + jitter * U(-1, 1))`.
    pub fn schedule_next(&mut self, now: Instant, rng: &mut Humanizer) {
        let factor = rng.interval_factor(self.jitter);
        self.next_due = now + self.effective_base().mul_f64(factor);
    }
}

/// The full routine table.
pub struct RoutineSet {
    routines: Vec<Routine>,
}

impl RoutineSet {
    /// The standard table: fast attack clicks, periodic upgrades,
    /// next-wave nudges and reward collection.
    pub fn standard(now: Instant) -> Self {
        Self {
            routines: vec![
                Routine::new(RoutineKind::Attack, Duration::from_millis(350), 0.3, now),
                Routine::new(RoutineKind::Upgrade, Duration::from_secs(8), 0.3, now),
                Routine::new(RoutineKind::NextWave, Duration::from_secs(22), 0.35, now),
                Routine::new(RoutineKind::Rewards, Duration::from_secs(90), 0.5, now),
            ],
        }
    }

    pub fn due(&self, now: Instant) -> Vec<RoutineKind> {
        self.routines
            .iter()
            .filter(|r| r.is_due(now))
            .map(|r| r.kind)
            .collect()
    }

    pub fn reschedule(&mut self, kind: RoutineKind, now: Instant, rng: &mut Humanizer) {
        if let Some(r) = self.routines.iter_mut().find(|r| r.kind == kind) {
            r.schedule_next(now, rng);
        }
    }

    pub fn set_override(&mut self, kind: RoutineKind, interval: Duration) {
        if let Some(r) = self.routines.iter_mut().find(|r| r.kind == kind) {
            r.set_override(interval);
        }
    }

    pub fn get(&self, kind: RoutineKind) -> Option<&Routine> {
        self.routines.iter().find(|r| r.kind == kind)
    }
}
