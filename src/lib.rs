//! wavebuddy - vision-driven automation for the Idle Zombie Wave idle game
//!
//! The core is a perception-decision-action loop over a third-party game
//! window: a pixel-level sensor battery builds an immutable snapshot each
//! cycle, a finite-state controller decides the cycle's action, and the
//! injector posts synthetic input to the window without ever touching the
//! operator's real cursor. Background routines tick alongside on jittered
//! timers, and an adaptive strategy nudges pacing based on how the run is
//! going.
//!
//! All OS access sits behind the [`platform`] traits, so the whole decision
//! stack runs unchanged against the in-memory fake used by the tests and
//! the CLI demo.

pub mod brain;
pub mod config;
pub mod events;
pub mod game;
pub mod input;
pub mod platform;
pub mod sched;
pub mod stealth;
pub mod vision;

mod engine;

use std::time::{Duration, Instant};

use brain::{Controller, Cycle, RoutineToggles, StrategyAdaptor, StrategyKind};
use game::{BotState, Cooldowns, GameSnapshot};
use input::Injector;
use platform::{Key, Platform, Rect, WindowHandle, WindowProvider};
use sched::{RoutineKind, RoutineSet};
use stealth::Humanizer;
use vision::Sensor;

pub use config::Settings;
pub use engine::{Command, Engine, EngineConfig};
pub use events::{default_log_path, BotEvent, EventBus};

/// Anti-AFK probe spacing.
const AFK_PROBE_INTERVAL: Duration = Duration::from_secs(3);

/// Errors that abort one cycle (never the process).
#[derive(Debug, thiserror::Error)]
pub enum BrainError {
    #[error("game window vanished mid-cycle")]
    WindowLost,
    #[error(transparent)]
    Platform(#[from] platform::PlatformError),
}

/// The assembled automation core: owns the platform backends, the sensor,
/// the decision state and the schedulers, and is driven by [`Engine`] (or
/// directly, in tests).
pub struct Brain<P: Platform, W: WindowProvider> {
    platform: P,
    windows: W,
    sensor: Sensor,
    controller: Controller,
    scheduler: RoutineSet,
    strategy: StrategyAdaptor,
    injector: Injector,
    rng: Humanizer,
    settings: Settings,
    events: EventBus,
    enabled: bool,
}

impl<P: Platform, W: WindowProvider> Brain<P, W> {
    pub fn new(platform: P, windows: W, sensor: Sensor, settings: Settings, events: EventBus) -> Self {
        let now = Instant::now();
        let mut brain = Self {
            controller: Controller::new(&settings, now),
            scheduler: RoutineSet::standard(now),
            strategy: StrategyAdaptor::new(),
            injector: Injector::new(),
            rng: Humanizer::new(),
            platform,
            windows,
            sensor,
            settings,
            events,
            enabled: false,
        };
        brain.apply_routine_overrides(1.0);
        brain
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    pub fn routines(&self) -> &RoutineSet {
        &self.scheduler
    }

    pub fn strategy(&self) -> &StrategyAdaptor {
        &self.strategy
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn attached(&self) -> Option<WindowHandle> {
        self.windows.attached()
    }

    /// Flip the master switch. Enabling resets transient state so the next
    /// cycle re-derives everything from current attachment reality instead
    /// of resuming a stale pre-disable state.
    pub fn set_enabled(&mut self, enabled: bool, now: Instant) {
        if enabled && !self.enabled {
            self.controller.reset_for_enable(now);
            self.events.log("Bot enabled");
            self.events.set_state(BotState::Searching.label());
        } else if !enabled && self.enabled {
            self.events.log("Bot disabled");
            let label = if self.windows.attached().is_some() {
                "Attached"
            } else {
                BotState::Searching.label()
            };
            self.events.set_state(label);
        }
        self.enabled = enabled;
    }

    /// Replace the settings wholesale.
    pub fn apply_settings(&mut self, settings: Settings) {
        self.settings = settings;
        self.controller.apply_settings(&self.settings);
        self.apply_routine_overrides(1.0);
        self.events.log("Settings applied");
    }

    /// Attempt to bind to the target window, decaying the detection
    /// progress while the search keeps failing.
    pub fn try_attach(&mut self, _now: Instant) -> bool {
        if self.windows.attached().is_some() {
            return true;
        }
        match self.windows.try_attach() {
            Some(_) => {
                self.events.log("Attached to game window");
                self.events.set_progress(100);
                self.events
                    .set_state(if self.enabled { "Working" } else { "Attached" });
                true
            }
            None => {
                self.events.set_progress(self.events.progress() as i32 - 2);
                false
            }
        }
    }

    /// One Sense -> Decide -> Act pass. Unexpected failures bump the error
    /// counter and trigger a rate-limited recovery attempt; nothing here is
    /// fatal to the process.
    pub fn cycle(&mut self, now: Instant) {
        if !self.enabled {
            return;
        }
        self.update_strategy(now);

        let Some(window) = self.windows.attached() else {
            self.controller.state = BotState::Searching;
            self.events.set_state(BotState::Searching.label());
            self.events.bump_progress(2);
            self.try_attach(now);
            return;
        };

        match self.run_attached_cycle(now, window) {
            Ok(()) => {
                // Occasional spontaneous turbo spike.
                if !self.controller.turbo && self.rng.chance(0.05) {
                    self.controller.turbo = true;
                    self.events.log("Turbo: on (auto)");
                }
            }
            Err(err) => {
                self.controller.error_count += 1;
                self.events.log(format!("Cycle error: {err}"));
                self.recover(now);
            }
        }
    }

    fn run_attached_cycle(&mut self, now: Instant, window: WindowHandle) -> Result<(), BrainError> {
        let win_rect = self
            .windows
            .window_rect(window)
            .ok_or(BrainError::WindowLost)?;
        if win_rect.is_empty() {
            return Err(BrainError::WindowLost);
        }
        if self.settings.auto_focus {
            self.windows.bring_to_foreground(window);
        }
        if self.settings.safety_pause && self.user_interacting(now, win_rect) {
            self.events.log("Paused: operator activity");
            return Ok(());
        }

        let snap = GameSnapshot::sense(
            &self.sensor,
            &self.platform,
            window,
            win_rect,
            self.settings.auto_pick_perks,
        );
        let mut cx = Cycle {
            platform: &self.platform,
            sensor: &self.sensor,
            injector: &mut self.injector,
            settings: &self.settings,
            events: &self.events,
            rng: &mut self.rng,
            now,
        };
        self.controller.step(&snap, &mut cx);
        Ok(())
    }

    fn recover(&mut self, now: Instant) {
        let Some(window) = self.windows.attached() else {
            return;
        };
        let Some(win_rect) = self.windows.window_rect(window) else {
            return;
        };
        let mut cx = Cycle {
            platform: &self.platform,
            sensor: &self.sensor,
            injector: &mut self.injector,
            settings: &self.settings,
            events: &self.events,
            rng: &mut self.rng,
            now,
        };
        self.controller.try_recovery(win_rect, &mut cx);
    }

    /// Re-derive the strategy, tune the click delay, adjust routine
    /// toggles, and scale customized routine intervals.
    fn update_strategy(&mut self, now: Instant) {
        let since = self.controller.cooldowns.since_progress(now);
        let recovery_after = Duration::from_secs(self.settings.no_progress_recovery_secs);
        let kind = self.strategy.update(
            since,
            recovery_after,
            self.controller.turbo,
            self.settings.safe_mode,
        );
        self.controller.click_delay = self.strategy.adjust_click_delay(self.controller.click_delay);
        match kind {
            StrategyKind::Aggressive => {
                self.controller.toggles = RoutineToggles {
                    attack: true,
                    upgrade: true,
                    next_wave: true,
                    rewards: true,
                };
            }
            StrategyKind::Conservative => {
                self.controller.toggles.attack = true;
                self.controller.toggles.upgrade = false;
                self.controller.toggles.next_wave = false;
                self.controller.toggles.rewards = true;
            }
            _ => {}
        }
        self.apply_routine_overrides(kind.interval_multiplier());
    }

    /// Push customized intervals (scaled by the strategy multiplier) onto
    /// the scheduler. Routines without an explicit custom interval keep
    /// their built-in cadence.
    fn apply_routine_overrides(&mut self, multiplier: f64) {
        for (kind, base) in self.custom_intervals() {
            self.scheduler.set_override(kind, base.mul_f64(multiplier));
        }
    }

    fn custom_intervals(&self) -> Vec<(RoutineKind, Duration)> {
        let s = &self.settings;
        let mut out = Vec::new();
        if let Some(ms) = s.attack_interval_ms {
            out.push((RoutineKind::Attack, Duration::from_millis(ms)));
        }
        if let Some(secs) = s.upgrade_interval_secs {
            out.push((RoutineKind::Upgrade, Duration::from_secs(secs)));
        }
        if let Some(secs) = s.next_wave_interval_secs {
            out.push((RoutineKind::NextWave, Duration::from_secs(secs)));
        }
        if let Some(secs) = s.rewards_interval_secs {
            out.push((RoutineKind::Rewards, Duration::from_secs(secs)));
        }
        out
    }

    /// Anti-AFK probe. The activity check itself is a stub: it nudges the
    /// window corner every few seconds but always reports the operator as
    /// idle, so the safety pause never actually engages.
    /// TODO: sample real keyboard/mouse activity instead of assuming idle.
    fn user_interacting(&mut self, now: Instant, win_rect: Rect) -> bool {
        if self.settings.anti_afk
            && Cooldowns::ready(self.controller.cooldowns.last_afk_probe, now, AFK_PROBE_INTERVAL)
        {
            self.controller.cooldowns.last_afk_probe = Some(now);
            let nx = 0.01 + self.rng.unit(0.02);
            let ny = 0.01 + self.rng.unit(0.02);
            self.injector
                .click_fraction(&self.platform, win_rect, nx, ny, 0.0, 0.0, Duration::ZERO);
        }
        false
    }

    /// Run any due background routines, isolating failures per routine.
    pub fn tick_routines(&mut self, now: Instant) {
        if !self.enabled {
            return;
        }
        for kind in self.scheduler.due(now) {
            if let Err(err) = self.run_routine(kind) {
                self.events
                    .log(format!("Routine {} error: {err}", kind.name()));
            }
            self.scheduler.reschedule(kind, now, &mut self.rng);
        }
    }

    fn run_routine(&mut self, kind: RoutineKind) -> Result<(), BrainError> {
        if !self.controller.toggles.allows(kind) {
            return Ok(());
        }
        let Some(window) = self.windows.attached() else {
            return Ok(());
        };
        let win = self
            .windows
            .window_rect(window)
            .ok_or(BrainError::WindowLost)?;
        match kind {
            RoutineKind::Attack => {
                self.injector
                    .click_fraction(&self.platform, win, 0.50, 0.50, 0.03, 0.03, Duration::ZERO);
                if self.rng.chance(0.15) {
                    self.injector
                        .key_tap(&self.platform, None, Key::Space, Duration::ZERO);
                }
            }
            RoutineKind::Upgrade => {
                self.injector.click_fraction(
                    &self.platform,
                    win,
                    0.90,
                    0.85,
                    0.02,
                    0.02,
                    Duration::from_millis(200),
                );
                self.events.log("Upgrade nudge");
            }
            RoutineKind::NextWave => {
                self.injector.click_fraction(
                    &self.platform,
                    win,
                    0.80,
                    0.15,
                    0.03,
                    0.03,
                    Duration::from_millis(200),
                );
                self.events.log("Next wave nudge");
            }
            RoutineKind::Rewards => {
                self.injector.click_fraction(
                    &self.platform,
                    win,
                    0.50,
                    0.60,
                    0.05,
                    0.05,
                    Duration::from_millis(300),
                );
                self.events.log("Reward sweep");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::fake::FakePlatform;
    use crate::vision::TemplateStore;
    use std::sync::Arc;

    fn quiet_settings() -> Settings {
        let mut settings = Settings::default();
        settings.click_delay_ms = 10;
        settings.walk_around = false;
        settings.use_speed_boost = false;
        settings.anti_afk = false;
        settings
    }

    fn make_brain(
        fake: &Arc<FakePlatform>,
        settings: Settings,
    ) -> Brain<Arc<FakePlatform>, Arc<FakePlatform>> {
        Brain::new(
            Arc::clone(fake),
            Arc::clone(fake),
            Sensor::new(TemplateStore::empty()),
            settings,
            EventBus::detached(),
        )
    }

    #[test]
    fn unattached_cycle_reports_searching() {
        let fake = Arc::new(FakePlatform::new(1000, 600));
        let mut brain = make_brain(&fake, quiet_settings());
        let now = Instant::now();
        brain.set_enabled(true, now);
        brain.cycle(now);

        assert_eq!(brain.controller().state, BotState::Searching);
        assert!(fake.clicks().is_empty());
    }

    #[test]
    fn menu_cycle_clicks_start() {
        let fake = Arc::new(FakePlatform::with_window(1000, 600));
        fake.paint(
            Rect::from_xywh(470, 370, 60, 40),
            image::Rgba([40, 210, 60, 255]),
        );
        let mut brain = make_brain(&fake, quiet_settings());
        let now = Instant::now();
        brain.set_enabled(true, now);
        brain.cycle(now);

        assert_eq!(brain.controller().state, BotState::MainMenu);
        assert_eq!(fake.clicks().len(), 1);
        let click = fake.clicks()[0];
        assert!((430..=570).contains(&click.x));
        assert!((350..=430).contains(&click.y));
    }

    #[test]
    fn reenable_resumes_from_fresh_state() {
        let fake = Arc::new(FakePlatform::with_window(1000, 600));
        fake.paint(
            Rect::from_xywh(470, 370, 60, 40),
            image::Rgba([40, 210, 60, 255]),
        );
        let mut brain = make_brain(&fake, quiet_settings());
        let now = Instant::now();
        brain.set_enabled(true, now);
        brain.cycle(now);
        assert_eq!(brain.controller().state, BotState::MainMenu);

        brain.set_enabled(false, now);
        brain.cycle(now + Duration::from_secs(2));
        // Disabled: no evaluation happened, state untouched.
        assert_eq!(brain.controller().state, BotState::MainMenu);

        brain.set_enabled(true, now + Duration::from_secs(4));
        // Re-enable resets to Searching until a fresh snapshot decides.
        assert_eq!(brain.controller().state, BotState::Searching);

        fake.clear_inputs();
        brain.cycle(now + Duration::from_secs(6));
        assert_eq!(brain.controller().state, BotState::MainMenu);
        assert_eq!(fake.clicks().len(), 1);
    }

    #[test]
    fn disabled_brain_does_nothing() {
        let fake = Arc::new(FakePlatform::with_window(1000, 600));
        let mut brain = make_brain(&fake, quiet_settings());
        brain.cycle(Instant::now());
        brain.tick_routines(Instant::now());
        assert!(fake.clicks().is_empty());
    }

    #[test]
    fn attack_routine_fires_and_reschedules() {
        let fake = Arc::new(FakePlatform::with_window(1000, 600));
        let mut settings = quiet_settings();
        settings.enable_upgrade = false;
        settings.enable_next_wave = false;
        settings.auto_collect = false;
        let mut brain = make_brain(&fake, settings);
        let now = Instant::now();
        brain.set_enabled(true, now);

        brain.tick_routines(now);
        assert_eq!(fake.clicks().len(), 1);
        let click = fake.clicks()[0];
        // Center scatter: 0.50 ± 0.03 of the window.
        assert!((470..=530).contains(&click.x));
        assert!((282..=318).contains(&click.y));

        // Just rescheduled: an immediate second tick is a no-op.
        brain.tick_routines(now);
        assert_eq!(fake.clicks().len(), 1);
    }

    #[test]
    fn routine_toggles_silence_routines() {
        let fake = Arc::new(FakePlatform::with_window(1000, 600));
        let mut settings = quiet_settings();
        settings.enable_attack = false;
        settings.enable_upgrade = false;
        settings.enable_next_wave = false;
        settings.auto_collect = false;
        let mut brain = make_brain(&fake, settings);
        let now = Instant::now();
        brain.set_enabled(true, now);
        brain.tick_routines(now);
        assert!(fake.clicks().is_empty());
    }

    #[test]
    fn strategy_scales_only_customized_intervals() {
        let fake = Arc::new(FakePlatform::new(1000, 600));
        let mut settings = quiet_settings();
        settings.safe_mode = true;
        settings.attack_interval_ms = Some(1000);
        let mut brain = make_brain(&fake, settings);
        let now = Instant::now();
        brain.set_enabled(true, now);
        brain.cycle(now);

        assert_eq!(brain.strategy().kind(), StrategyKind::Conservative);
        // Customized attack interval scaled by the 1.5x multiplier.
        assert_eq!(
            brain
                .routines()
                .get(RoutineKind::Attack)
                .unwrap()
                .effective_base(),
            Duration::from_millis(1500)
        );
        // Built-in cadence untouched.
        assert_eq!(
            brain
                .routines()
                .get(RoutineKind::Upgrade)
                .unwrap()
                .effective_base(),
            Duration::from_secs(8)
        );
        // Conservative pacing also silences the riskier routines.
        assert!(!brain.controller().toggles.upgrade);
        assert!(!brain.controller().toggles.next_wave);
        assert!(brain.controller().toggles.attack);
    }

    #[test]
    fn anti_afk_probe_clicks_the_corner_and_never_pauses() {
        let fake = Arc::new(FakePlatform::with_window(1000, 600));
        let mut settings = quiet_settings();
        settings.anti_afk = true;
        let mut brain = make_brain(&fake, settings);
        let now = Instant::now();
        brain.set_enabled(true, now);
        brain.cycle(now);

        // The probe fired (corner click) but the cycle still ran to a
        // decision rather than pausing.
        assert_eq!(brain.controller().state, BotState::Playing);
        let clicks = fake.clicks();
        assert!(!clicks.is_empty());
        let probe = clicks[0];
        assert!(probe.x <= 30 && probe.y <= 18, "corner probe, got {probe:?}");
    }
}
