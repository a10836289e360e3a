//! Automation settings
//!
//! A flat set of named booleans and numeric knobs, applied wholesale on
//! every update. Persistence lives with the host; this struct is just
//! serde-ready.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::vision::Rarity;

/// All configurable options for the automation core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Master toggle for the farming actions (Next, chests, walking).
    pub auto_farm: bool,
    /// Perform prestige when its cooldown allows.
    pub auto_prestige: bool,
    /// Limits aggressive actions (no smart-shop purchases).
    pub safe_mode: bool,
    /// Base post-click delay in milliseconds, clamped to 10..=5000.
    pub click_delay_ms: u64,
    /// Start the run with turbo pacing on.
    pub turbo: bool,

    // Cooldowns and timeouts.
    /// Minimal delay between shop purchases.
    pub buy_cooldown_secs: u64,
    /// Minimal delay between prestiges.
    pub prestige_cooldown_secs: u64,
    /// With no progress for this long, force a Next attempt.
    pub next_timeout_secs: u64,
    /// With no buy/next/claim for this long the strategy flips to recovery.
    pub no_progress_recovery_secs: u64,
    /// Shop rows scanned per purchase decision (1..=6).
    pub buy_scan_slots: usize,

    // In-run helpers.
    pub auto_chests: bool,
    pub auto_skills: bool,
    pub skill_interval_secs: u64,
    pub skill_slots: [bool; 4],
    /// Normalized y of the skill bar.
    pub skill_bar_y: f64,
    /// Normalized x of the four skill slots.
    pub skill_xs: [f64; 4],
    pub use_speed_boost: bool,
    pub speed_boost_every_secs: u64,
    pub auto_pick_perks: bool,
    /// Simulate movement to collect XP orbs.
    pub walk_around: bool,

    // Shop preferences.
    pub prefer_elemental: bool,
    pub prefer_ballistic: bool,
    pub prefer_explosive: bool,
    pub prefer_energy: bool,
    /// Skip non-preferred weapon types entirely (unless that would leave
    /// nothing to buy).
    pub buy_only_preferred: bool,
    pub min_rarity_to_buy: Rarity,

    // High-level switches.
    pub auto_collect: bool,
    pub auto_buy_best: bool,
    /// Restart from the main menu and attempt recovery clicks.
    pub auto_restart: bool,
    pub auto_focus: bool,
    pub safety_pause: bool,
    pub anti_afk: bool,

    // Background routine toggles.
    pub enable_attack: bool,
    pub enable_upgrade: bool,
    pub enable_next_wave: bool,
    pub enable_rewards: bool,

    // Explicit routine interval overrides. `None` keeps the built-in
    // cadence; only customized routines are scaled by the strategy
    // multiplier.
    pub attack_interval_ms: Option<u64>,
    pub upgrade_interval_secs: Option<u64>,
    pub next_wave_interval_secs: Option<u64>,
    pub rewards_interval_secs: Option<u64>,

    /// Ordered play-mode labels rotated through on restart/prestige.
    pub play_modes: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            auto_farm: true,
            auto_prestige: false,
            safe_mode: false,
            click_delay_ms: 150,
            turbo: false,
            buy_cooldown_secs: 8,
            prestige_cooldown_secs: 300,
            next_timeout_secs: 20,
            no_progress_recovery_secs: 600,
            buy_scan_slots: 3,
            auto_chests: true,
            auto_skills: false,
            skill_interval_secs: 30,
            skill_slots: [true; 4],
            skill_bar_y: 0.92,
            skill_xs: [0.15, 0.28, 0.41, 0.54],
            use_speed_boost: true,
            speed_boost_every_secs: 40,
            auto_pick_perks: true,
            walk_around: true,
            prefer_elemental: true,
            prefer_ballistic: true,
            prefer_explosive: true,
            prefer_energy: true,
            buy_only_preferred: false,
            min_rarity_to_buy: Rarity::Gray,
            auto_collect: true,
            auto_buy_best: true,
            auto_restart: true,
            auto_focus: true,
            safety_pause: true,
            anti_afk: true,
            enable_attack: true,
            enable_upgrade: true,
            enable_next_wave: true,
            enable_rewards: true,
            attack_interval_ms: None,
            upgrade_interval_secs: None,
            next_wave_interval_secs: None,
            rewards_interval_secs: None,
            play_modes: Vec::new(),
        }
    }
}

impl Settings {
    /// Cautious preset: no prestige, no skill spam, relaxed cooldowns.
    pub fn basic() -> Self {
        Self {
            safe_mode: true,
            auto_prestige: false,
            auto_skills: false,
            turbo: false,
            buy_cooldown_secs: 10,
            prestige_cooldown_secs: 480,
            next_timeout_secs: 25,
            no_progress_recovery_secs: 900,
            buy_scan_slots: 2,
            ..Self::default()
        }
    }

    /// Everything on, moderate cadence.
    pub fn advanced() -> Self {
        Self {
            safe_mode: false,
            auto_prestige: true,
            auto_skills: true,
            turbo: false,
            buy_cooldown_secs: 8,
            prestige_cooldown_secs: 300,
            next_timeout_secs: 20,
            no_progress_recovery_secs: 720,
            buy_scan_slots: 3,
            ..Self::default()
        }
    }

    /// Everything on, aggressive cadence, turbo pacing from the start.
    pub fn turbo() -> Self {
        Self {
            safe_mode: false,
            auto_prestige: true,
            auto_skills: true,
            turbo: true,
            buy_cooldown_secs: 5,
            prestige_cooldown_secs: 180,
            next_timeout_secs: 15,
            no_progress_recovery_secs: 480,
            buy_scan_slots: 3,
            ..Self::default()
        }
    }

    pub fn click_delay(&self) -> Duration {
        Duration::from_millis(self.click_delay_ms.clamp(10, 5000))
    }

    pub fn buy_cooldown(&self) -> Duration {
        Duration::from_secs(self.buy_cooldown_secs)
    }

    pub fn prestige_cooldown(&self) -> Duration {
        Duration::from_secs(self.prestige_cooldown_secs)
    }

    pub fn next_timeout(&self) -> Duration {
        Duration::from_secs(self.next_timeout_secs)
    }

    /// Speed boost spacing, floored at 5 s.
    pub fn speed_boost_interval(&self) -> Duration {
        Duration::from_secs(self.speed_boost_every_secs.max(5))
    }

    /// Skill cast spacing, floored at 5 s.
    pub fn skill_interval(&self) -> Duration {
        Duration::from_secs(self.skill_interval_secs.max(5))
    }

    /// True when this weapon type is marked preferred.
    pub fn prefers(&self, kind: crate::vision::WeaponKind) -> bool {
        use crate::vision::WeaponKind;
        match kind {
            WeaponKind::Elemental => self.prefer_elemental,
            WeaponKind::Ballistic => self.prefer_ballistic,
            WeaponKind::Explosive => self.prefer_explosive,
            WeaponKind::Energy => self.prefer_energy,
            WeaponKind::Unknown => false,
        }
    }
}
