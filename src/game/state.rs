//! Persistent controller state
//!
//! Cooldowns, purchase memory and the play-mode queue survive across
//! cycles; the coarse [`BotState`] is recomputed from each snapshot and only
//! kept for reporting.

use std::collections::{HashSet, VecDeque};
use std::time::{Duration, Instant};

/// Coarse state the controller derives from the current snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BotState {
    #[default]
    Searching,
    MainMenu,
    LevelUp,
    Playing,
    Shopping,
    Prestige,
    Rewards,
    Recovering,
}

impl BotState {
    /// Human-readable label for the host UI.
    pub fn label(self) -> &'static str {
        match self {
            BotState::Searching => "Searching for game",
            BotState::MainMenu => "Main menu",
            BotState::LevelUp => "Level up",
            BotState::Playing => "Playing",
            BotState::Shopping => "Shop",
            BotState::Prestige => "Prestige",
            BotState::Rewards => "Rewards",
            BotState::Recovering => "Recovering",
        }
    }
}

/// Monotonic action timestamps, updated only by successful actions and read
/// to gate repeats.
#[derive(Debug, Clone)]
pub struct Cooldowns {
    pub last_buy: Option<Instant>,
    pub last_prestige: Option<Instant>,
    pub last_next: Option<Instant>,
    pub last_speed: Option<Instant>,
    pub last_skills: Option<Instant>,
    pub last_perk_pick: Option<Instant>,
    /// Any successful farming action: buy, next, claim, speed, perk.
    pub last_progress: Instant,
    pub last_recovery: Option<Instant>,
    pub last_walk: Option<Instant>,
    pub last_afk_probe: Option<Instant>,
}

impl Cooldowns {
    pub fn new(now: Instant) -> Self {
        Self {
            last_buy: None,
            last_prestige: None,
            last_next: None,
            last_speed: None,
            last_skills: None,
            last_perk_pick: None,
            last_progress: now,
            last_recovery: None,
            last_walk: None,
            last_afk_probe: None,
        }
    }

    /// True once at least `min` has passed since `last` (or when the action
    /// has never fired).
    pub fn ready(last: Option<Instant>, now: Instant, min: Duration) -> bool {
        match last {
            None => true,
            Some(t) => now.saturating_duration_since(t) > min,
        }
    }

    pub fn since_progress(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_progress)
    }
}

/// Template keys of previously purchased items, used to bias future
/// purchases toward build continuity.
#[derive(Debug, Clone, Default)]
pub struct OwnedTemplates {
    keys: HashSet<String>,
    last: Option<String>,
}

impl OwnedTemplates {
    pub fn record(&mut self, key: &str) {
        if key.is_empty() {
            return;
        }
        self.keys.insert(key.to_ascii_lowercase());
        self.last = Some(key.to_ascii_lowercase());
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(&key.to_ascii_lowercase())
    }

    pub fn is_last(&self, key: &str) -> bool {
        self.last
            .as_deref()
            .is_some_and(|l| l.eq_ignore_ascii_case(key))
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Ordered, consumable list of play-mode labels. Advanced on main-menu
/// restart, prestige and recovery; an empty queue keeps the current mode.
#[derive(Debug, Clone, Default)]
pub struct ModeQueue {
    queue: VecDeque<String>,
    current: Option<String>,
}

impl ModeQueue {
    /// Replace the queue wholesale; consumes the first entry as the current
    /// mode when none is active yet.
    pub fn load(&mut self, modes: &[String]) {
        self.queue.clear();
        self.queue
            .extend(modes.iter().filter(|m| !m.trim().is_empty()).cloned());
        if self.current.is_none() {
            self.current = self.queue.pop_front();
        }
    }

    /// Rotate to the next mode. Returns the new current mode, or `None`
    /// when the queue is already drained (the current mode then stays).
    pub fn advance(&mut self) -> Option<String> {
        if let Some(next) = self.queue.pop_front() {
            self.current = Some(next.clone());
            Some(next)
        } else {
            None
        }
    }

    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}
