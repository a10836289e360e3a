//! Decision controller
//!
//! A finite-state step over each snapshot: perk dialogs trump everything,
//! blocking shop errors force recovery, and otherwise the single highest-
//! priority affordance picks the state. Persistent cooldowns gate repeat
//! actions; all transitions are pure functions of the snapshot plus that
//! state, so an identical snapshot yields the identical decision (modulo
//! click-placement jitter).

pub mod perks;
pub mod shop;
pub mod skills;
pub mod strategy;

use std::time::{Duration, Instant};

use crate::config::Settings;
use crate::events::EventBus;
use crate::game::{BotState, Cooldowns, GameSnapshot, ModeQueue, OwnedTemplates};
use crate::input::Injector;
use crate::platform::{Platform, Rect};
use crate::sched::RoutineKind;
use crate::stealth::Humanizer;
use crate::vision::{Rarity, Sensor, ShopError, Target};

pub use skills::SkillLoadout;
pub use strategy::{StrategyAdaptor, StrategyKind};

/// Minimum spacing between perk picks, so the dialog animation cannot
/// double-fire a selection.
const PERK_RESCAN: Duration = Duration::from_secs(5);
/// Minimum spacing between inventory sells (shares the buy timestamp).
const SELL_SPACING: Duration = Duration::from_secs(5);
/// Minimum spacing between Next clicks when idling.
const AUTONOMOUS_NEXT_SPACING: Duration = Duration::from_secs(5);
/// Idle movement cadence.
const WALK_INTERVAL: Duration = Duration::from_millis(2500);
/// Rate limit for recovery attempts after cycle failures.
const RECOVERY_SPACING: Duration = Duration::from_secs(10);

/// Which background routines may fire right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoutineToggles {
    pub attack: bool,
    pub upgrade: bool,
    pub next_wave: bool,
    pub rewards: bool,
}

impl RoutineToggles {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            attack: settings.enable_attack,
            upgrade: settings.enable_upgrade,
            next_wave: settings.enable_next_wave,
            // Reward collection follows the high-level collect switch.
            rewards: settings.enable_rewards && settings.auto_collect,
        }
    }

    pub fn allows(self, kind: RoutineKind) -> bool {
        match kind {
            RoutineKind::Attack => self.attack,
            RoutineKind::Upgrade => self.upgrade,
            RoutineKind::NextWave => self.next_wave,
            RoutineKind::Rewards => self.rewards,
        }
    }
}

/// Borrowed collaborators for one decision cycle, threaded through
/// explicitly instead of living in shared mutable fields.
pub struct Cycle<'a, P: Platform> {
    pub platform: &'a P,
    pub sensor: &'a Sensor,
    pub injector: &'a mut Injector,
    pub settings: &'a Settings,
    pub events: &'a EventBus,
    pub rng: &'a mut Humanizer,
    pub now: Instant,
}

/// Persistent decision state carried between cycles.
pub struct Controller {
    pub state: BotState,
    pub cooldowns: Cooldowns,
    pub owned: OwnedTemplates,
    pub modes: ModeQueue,
    pub loadout: SkillLoadout,
    pub toggles: RoutineToggles,
    pub turbo: bool,
    pub error_count: u32,
    pub click_delay: Duration,
}

impl Controller {
    pub fn new(settings: &Settings, now: Instant) -> Self {
        let mut controller = Self {
            state: BotState::Searching,
            cooldowns: Cooldowns::new(now),
            owned: OwnedTemplates::default(),
            modes: ModeQueue::default(),
            loadout: SkillLoadout::from_settings(settings),
            toggles: RoutineToggles::from_settings(settings),
            turbo: settings.turbo,
            error_count: 0,
            click_delay: settings.click_delay(),
        };
        controller.modes.load(&settings.play_modes);
        controller
    }

    /// Re-apply a wholesale settings update.
    pub fn apply_settings(&mut self, settings: &Settings) {
        self.loadout = SkillLoadout::from_settings(settings);
        self.toggles = RoutineToggles::from_settings(settings);
        self.turbo = settings.turbo;
        self.click_delay = settings.click_delay();
        self.modes.load(&settings.play_modes);
    }

    /// Forget transient per-run state on enable, so evaluation resumes from
    /// attachment reality instead of a stale pre-disable state.
    pub fn reset_for_enable(&mut self, now: Instant) {
        self.state = BotState::Searching;
        self.cooldowns.last_progress = now;
    }

    /// One FSM step over a fresh snapshot.
    pub fn step<P: Platform>(&mut self, snap: &GameSnapshot, cx: &mut Cycle<'_, P>) {
        // The perk dialog blocks the whole screen; nothing else applies.
        if !snap.perk_choices.is_empty() {
            self.state = BotState::LevelUp;
            cx.events.set_state(self.state.label());
            self.pick_best_perk(snap, cx);
            return;
        }

        if snap.shop_error != ShopError::None {
            self.state = BotState::Recovering;
            cx.events.set_state(self.state.label());
            self.handle_shop_error(snap, cx);
            return;
        }

        self.state = if snap.start.is_some() {
            BotState::MainMenu
        } else if snap.prestige.is_some() {
            BotState::Prestige
        } else if snap.buy.is_some() {
            BotState::Shopping
        } else {
            BotState::Playing
        };
        cx.events.set_state(self.state.label());

        match self.state {
            BotState::MainMenu => {
                if cx.settings.auto_restart {
                    if let Some(rect) = snap.start {
                        if self.click_rect_labeled(cx, rect, "Start") {
                            self.cooldowns.last_progress = cx.now;
                            self.advance_mode(cx.events);
                        }
                    }
                }
            }
            BotState::Prestige => {
                let ready = Cooldowns::ready(
                    self.cooldowns.last_prestige,
                    cx.now,
                    cx.settings.prestige_cooldown(),
                );
                if cx.settings.auto_prestige && ready {
                    if let Some(rect) = snap.prestige {
                        if self.click_rect_labeled(cx, rect, "Prestige") {
                            self.cooldowns.last_prestige = Some(cx.now);
                            self.cooldowns.last_progress = cx.now;
                            self.advance_mode(cx.events);
                        }
                    }
                } else {
                    // Not time yet: keep playing without consuming the
                    // prestige affordance.
                    self.fallback_play(snap, cx);
                }
            }
            BotState::Shopping => {
                self.inventory_maintenance(snap, cx);
                self.smart_shop(snap, cx);
                if snap.shop_error == ShopError::InsufficientMaterials {
                    self.try_click_next(snap, cx);
                }
            }
            BotState::Playing => {
                if let Some(rect) = snap.claim {
                    if self.click_rect_labeled(cx, rect, "Claim") {
                        self.cooldowns.last_progress = cx.now;
                    }
                    return;
                }
                if cx.settings.auto_farm {
                    if let Some(rect) = snap.next {
                        if self.click_rect_labeled(cx, rect, "Next") {
                            self.cooldowns.last_next = Some(cx.now);
                            self.cooldowns.last_progress = cx.now;
                        }
                        return;
                    }
                    if cx.settings.auto_chests && snap.chest_count > 0 {
                        self.open_chests(snap, cx);
                        return;
                    }
                }
                self.speed_and_skills(snap, cx);
                self.walk_and_collect(snap, cx);
                self.autonomous_next(snap, cx);
            }
            _ => {}
        }
    }

    fn pick_best_perk<P: Platform>(&mut self, snap: &GameSnapshot, cx: &mut Cycle<'_, P>) {
        if !Cooldowns::ready(self.cooldowns.last_perk_pick, cx.now, PERK_RESCAN) {
            return;
        }
        let Some(choice) = perks::choose(&snap.perk_choices) else {
            return;
        };
        cx.events.set_action(format!("Perk: {:?}", choice.rarity));
        if cx.injector.click_rect(cx.platform, choice.rect, self.click_delay) {
            self.cooldowns.last_perk_pick = Some(cx.now);
            self.cooldowns.last_progress = cx.now;
            cx.events
                .log(format!("Picked {:?} perk at slot {}", choice.rarity, choice.index));
            cx.events.bump_progress(8);
        }
    }

    fn handle_shop_error<P: Platform>(&mut self, snap: &GameSnapshot, cx: &mut Cycle<'_, P>) {
        match snap.shop_error {
            ShopError::InsufficientMaterials => {
                // Can't afford anything: push to the next stage to farm.
                let mut acted = self.try_click_next(snap, cx);
                if !acted {
                    acted = cx.injector.click_fraction(
                        cx.platform,
                        snap.win_rect,
                        0.80,
                        0.15,
                        0.02,
                        0.02,
                        Duration::from_millis(120),
                    );
                }
                if acted {
                    self.cooldowns.last_progress = cx.now;
                }
            }
            ShopError::TooManyMercenaries => {
                let acted = if let Some(rect) = snap.start {
                    self.click_rect_labeled(cx, rect, "Start")
                } else {
                    // Close the popup near the bottom center.
                    cx.injector.click_fraction(
                        cx.platform,
                        snap.win_rect,
                        0.50,
                        0.70,
                        0.02,
                        0.02,
                        Duration::from_millis(120),
                    )
                };
                if acted {
                    self.cooldowns.last_progress = cx.now;
                }
            }
            ShopError::None => {}
        }
    }

    /// Click Next via detection, or the usual corner as a fallback.
    /// Returns whether a farming click was attempted at all.
    fn try_click_next<P: Platform>(&mut self, snap: &GameSnapshot, cx: &mut Cycle<'_, P>) -> bool {
        if !cx.settings.auto_farm {
            return false;
        }
        if let Some(rect) = snap.next {
            if self.click_rect_labeled(cx, rect, "Next") {
                self.cooldowns.last_next = Some(cx.now);
                self.cooldowns.last_progress = cx.now;
            }
            return true;
        }
        if cx.injector.click_fraction(
            cx.platform,
            snap.win_rect,
            0.80,
            0.15,
            0.02,
            0.02,
            self.click_delay,
        ) {
            self.cooldowns.last_next = Some(cx.now);
            self.cooldowns.last_progress = cx.now;
        }
        true
    }

    /// Sell the weakest non-top-rarity inventory item, spaced out so the
    /// shop isn't churned every cycle.
    fn inventory_maintenance<P: Platform>(&mut self, snap: &GameSnapshot, cx: &mut Cycle<'_, P>) {
        if !self.toggles.upgrade {
            return;
        }
        let Some((slot_rect, rarity)) =
            cx.sensor
                .find_weakest_inventory_slot(cx.platform, snap.win_rect, 5)
        else {
            return;
        };
        if rarity == Rarity::Red
            || !Cooldowns::ready(self.cooldowns.last_buy, cx.now, SELL_SPACING)
        {
            return;
        }
        if !cx
            .injector
            .click_rect(cx.platform, slot_rect, Duration::from_millis(80))
        {
            return;
        }
        if let Some(sell) = cx.sensor.detect_button(cx.platform, snap.win_rect, Target::Sell) {
            cx.injector
                .click_rect(cx.platform, sell, Duration::from_millis(120));
        } else {
            cx.injector.click_fraction(
                cx.platform,
                snap.win_rect,
                0.84,
                0.82,
                0.02,
                0.02,
                Duration::from_millis(120),
            );
        }
        cx.events.log(format!("Inventory: sold weakest ({rarity:?})"));
        self.cooldowns.last_progress = cx.now;
        cx.events.bump_progress(4);
    }

    /// Score the scanned shop rows and buy the best one.
    fn smart_shop<P: Platform>(&mut self, snap: &GameSnapshot, cx: &mut Cycle<'_, P>) {
        let settings = cx.settings;
        if !settings.auto_farm
            || settings.safe_mode
            || !settings.auto_buy_best
            || !self.toggles.upgrade
        {
            return;
        }
        if !Cooldowns::ready(self.cooldowns.last_buy, cx.now, settings.buy_cooldown()) {
            return;
        }

        let slots = cx
            .sensor
            .scan_shop(cx.platform, snap.win_rect, settings.buy_scan_slots);
        if slots.is_empty() {
            // Nothing readable: probe the usual rows blind.
            for i in 0..settings.buy_scan_slots.clamp(1, 6) {
                let ny = 0.25 + i as f64 * 0.18;
                cx.injector.click_fraction(
                    cx.platform,
                    snap.win_rect,
                    0.92,
                    ny,
                    0.02,
                    0.02,
                    Duration::from_millis(80),
                );
                std::thread::sleep(Duration::from_millis(50));
            }
            cx.events.log("Shop: blind purchase probes");
            cx.events.bump_progress(3);
            return;
        }

        let Some(target) = shop::pick_best(&slots, &self.owned, settings) else {
            return;
        };
        let delivered = if let Some(buy) = snap.buy {
            cx.injector
                .click_rect(cx.platform, buy, Duration::from_millis(100))
        } else {
            let ny = 0.25 + target.row as f64 * 0.18;
            cx.injector.click_fraction(
                cx.platform,
                snap.win_rect,
                0.92,
                ny,
                0.02,
                0.02,
                Duration::from_millis(90),
            )
        };
        if !delivered {
            return;
        }
        self.cooldowns.last_buy = Some(cx.now);
        self.cooldowns.last_progress = cx.now;
        self.owned.record(&target.template_key);
        cx.events.log(format!(
            "Shop: bought {} ({:?}, {:?})",
            target.template_key, target.kind, target.rarity
        ));
        cx.events.bump_progress(8);
        self.loadout = skills::loadout_for(target.kind);
        cx.events
            .log(format!("Skill loadout adapted to {:?}", target.kind));
    }

    /// Periodic speed boost and skill casts.
    fn speed_and_skills<P: Platform>(&mut self, snap: &GameSnapshot, cx: &mut Cycle<'_, P>) {
        let settings = cx.settings;
        if settings.use_speed_boost
            && Cooldowns::ready(
                self.cooldowns.last_speed,
                cx.now,
                settings.speed_boost_interval(),
            )
        {
            let delivered = if let Some(rect) =
                cx.sensor.detect_button(cx.platform, snap.win_rect, Target::Speed)
            {
                cx.injector
                    .click_rect(cx.platform, rect, Duration::from_millis(50))
            } else {
                cx.injector.click_fraction(
                    cx.platform,
                    snap.win_rect,
                    0.92,
                    0.06,
                    0.01,
                    0.01,
                    Duration::from_millis(50),
                )
            };
            if delivered {
                self.cooldowns.last_speed = Some(cx.now);
                self.cooldowns.last_progress = cx.now;
                cx.events.log("Speed boost");
            }
        }

        if self.loadout.auto_cast
            && Cooldowns::ready(self.cooldowns.last_skills, cx.now, settings.skill_interval())
        {
            let mut any = false;
            for (i, &enabled) in self.loadout.slots.iter().enumerate() {
                if enabled {
                    any |= cx.injector.click_fraction(
                        cx.platform,
                        snap.win_rect,
                        settings.skill_xs[i],
                        settings.skill_bar_y,
                        0.01,
                        0.0,
                        Duration::from_millis(40),
                    );
                }
            }
            if any {
                self.cooldowns.last_skills = Some(cx.now);
                self.cooldowns.last_progress = cx.now;
                cx.events.log("Skills cast");
            }
        }
    }

    /// Wander a little and sweep up XP orbs between stage events.
    fn walk_and_collect<P: Platform>(&mut self, snap: &GameSnapshot, cx: &mut Cycle<'_, P>) {
        let settings = cx.settings;
        if !settings.auto_farm || !settings.walk_around {
            return;
        }
        if !Cooldowns::ready(self.cooldowns.last_walk, cx.now, WALK_INTERVAL) {
            return;
        }
        let key = cx.rng.walk_key();
        let hold = cx.rng.duration_ms(80, 160);
        cx.injector.key_tap(cx.platform, Some(snap.window), key, hold);
        if cx.rng.chance(0.25) {
            let strafe = cx.rng.strafe_key();
            let hold = cx.rng.duration_ms(60, 120);
            cx.injector
                .key_tap(cx.platform, Some(snap.window), strafe, hold);
        }
        if cx.rng.chance(0.70) {
            cx.injector.click_fraction(
                cx.platform,
                snap.win_rect,
                0.50,
                0.55,
                0.06,
                0.08,
                Duration::from_millis(40),
            );
        }
        self.cooldowns.last_walk = Some(cx.now);
        cx.events.log("Walk + XP sweep");
        cx.events.bump_progress(1);
    }

    fn open_chests<P: Platform>(&mut self, snap: &GameSnapshot, cx: &mut Cycle<'_, P>) {
        let count = snap.chest_count.clamp(1, 4);
        let mut any = false;
        for _ in 0..count {
            any |= cx.injector.click_fraction(
                cx.platform,
                snap.win_rect,
                0.50,
                0.80,
                0.15,
                0.08,
                self.click_delay,
            );
            std::thread::sleep(Duration::from_millis(100));
        }
        if any {
            cx.events.log(format!("Opening chests: {}", snap.chest_count));
            self.cooldowns.last_progress = cx.now;
            cx.events.bump_progress(5);
        }
    }

    /// Force a Next attempt after too long without any progress.
    fn autonomous_next<P: Platform>(&mut self, snap: &GameSnapshot, cx: &mut Cycle<'_, P>) {
        let since_progress = self.cooldowns.since_progress(cx.now);
        if since_progress <= cx.settings.next_timeout() {
            return;
        }
        if !Cooldowns::ready(self.cooldowns.last_next, cx.now, AUTONOMOUS_NEXT_SPACING) {
            return;
        }
        if cx.injector.click_fraction(
            cx.platform,
            snap.win_rect,
            0.80,
            0.15,
            0.02,
            0.02,
            self.click_delay,
        ) {
            cx.events.log(format!(
                "Autonomous Next after {}s without progress",
                since_progress.as_secs()
            ));
            self.cooldowns.last_next = Some(cx.now);
        }
    }

    /// Minimal play when the state is ambiguous.
    fn fallback_play<P: Platform>(&mut self, snap: &GameSnapshot, cx: &mut Cycle<'_, P>) {
        self.speed_and_skills(snap, cx);
        self.walk_and_collect(snap, cx);
    }

    /// Rate-limited recovery after an unexpected cycle failure: look for a
    /// Start button, else a heuristic click near the bottom center.
    pub fn try_recovery<P: Platform>(&mut self, win: Rect, cx: &mut Cycle<'_, P>) {
        if !cx.settings.auto_restart {
            return;
        }
        if !Cooldowns::ready(self.cooldowns.last_recovery, cx.now, RECOVERY_SPACING) {
            return;
        }
        self.cooldowns.last_recovery = Some(cx.now);
        if let Some(rect) = cx.sensor.detect_button(cx.platform, win, Target::Start) {
            if cx
                .injector
                .click_rect(cx.platform, rect, Duration::from_millis(150))
            {
                cx.events.log("Recovery: clicked Start from main menu");
                self.cooldowns.last_progress = cx.now;
                self.advance_mode(cx.events);
            }
            return;
        }
        if cx.injector.click_fraction(
            cx.platform,
            win,
            0.50,
            0.70,
            0.02,
            0.03,
            Duration::from_millis(150),
        ) {
            cx.events.log("Recovery: heuristic start click");
            self.cooldowns.last_progress = cx.now;
            self.advance_mode(cx.events);
        }
    }

    fn advance_mode(&mut self, events: &EventBus) {
        match self.modes.advance() {
            Some(mode) => events.log(format!("Play mode -> {mode}")),
            None => events.log("Play modes: queue drained, staying on current"),
        }
    }

    fn click_rect_labeled<P: Platform>(
        &mut self,
        cx: &mut Cycle<'_, P>,
        rect: Rect,
        label: &str,
    ) -> bool {
        cx.events.set_action(format!("Click: {label}"));
        let ok = cx.injector.click_rect(cx.platform, rect, self.click_delay);
        if ok {
            cx.events.log(format!("Clicked {label}"));
        }
        ok
    }
}
