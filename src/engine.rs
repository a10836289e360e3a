//! Worker-thread driver
//!
//! Owns the [`Brain`] on a single background thread: commands arrive over a
//! channel, the primary Sense/Decide/Act cycle runs on a fixed period,
//! reattach attempts pace themselves separately while unattached, and the
//! routine scheduler ticks between cycles. Serializing everything through
//! one thread is what makes the shared cooldown/purchase state safe;
//! there is deliberately no finer-grained locking.

use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError, Sender};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crate::config::Settings;
use crate::events::{BotEvent, EventBus};
use crate::platform::{Platform, WindowProvider};
use crate::vision::Sensor;
use crate::Brain;

/// Operator commands accepted by the worker.
#[derive(Debug)]
pub enum Command {
    Enable,
    Disable,
    ApplySettings(Box<Settings>),
    Shutdown,
}

/// Timer cadence for the worker loop.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Primary Sense/Decide/Act period.
    pub cycle_period: Duration,
    /// Reattach attempt period while unattached.
    pub attach_period: Duration,
    /// Command poll / routine tick granularity.
    pub tick: Duration,
    /// Durable log file; `None` keeps logs on the `log` facade only.
    pub log_file: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cycle_period: Duration::from_secs(2),
            attach_period: Duration::from_secs(3),
            tick: Duration::from_millis(100),
            log_file: Some(crate::events::default_log_path()),
        }
    }
}

/// Handle to the background worker. Dropping it shuts the worker down.
pub struct Engine {
    tx: Sender<Command>,
    handle: Option<JoinHandle<()>>,
}

impl Engine {
    /// Spawn the worker thread and return the handle plus the event stream
    /// the host drains (marshalling to its UI thread is the host's job).
    pub fn spawn<P, W>(
        platform: P,
        windows: W,
        sensor: Sensor,
        settings: Settings,
        config: EngineConfig,
    ) -> (Self, Receiver<BotEvent>)
    where
        P: Platform + Send + 'static,
        W: WindowProvider + Send + 'static,
    {
        let (events, events_rx) = EventBus::channel();
        let events = match &config.log_file {
            Some(path) => events.with_log_file(path.clone()),
            None => events,
        };
        let brain = Brain::new(platform, windows, sensor, settings, events);

        let (tx, rx) = channel();
        let handle = std::thread::Builder::new()
            .name("wavebuddy-core".into())
            .spawn(move || worker(brain, rx, config))
            .expect("failed to spawn core worker thread");

        (
            Self {
                tx,
                handle: Some(handle),
            },
            events_rx,
        )
    }

    pub fn enable(&self) {
        let _ = self.tx.send(Command::Enable);
    }

    pub fn disable(&self) {
        let _ = self.tx.send(Command::Disable);
    }

    pub fn apply_settings(&self, settings: Settings) {
        let _ = self.tx.send(Command::ApplySettings(Box::new(settings)));
    }

    /// Stop the worker and wait for it to finish.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        let _ = self.tx.send(Command::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.stop();
    }
}

fn worker<P: Platform, W: WindowProvider>(
    mut brain: Brain<P, W>,
    rx: Receiver<Command>,
    config: EngineConfig,
) {
    let mut next_cycle = Instant::now();
    let mut next_attach = Instant::now();
    loop {
        match rx.recv_timeout(config.tick) {
            Ok(Command::Enable) => brain.set_enabled(true, Instant::now()),
            Ok(Command::Disable) => brain.set_enabled(false, Instant::now()),
            Ok(Command::ApplySettings(settings)) => brain.apply_settings(*settings),
            Ok(Command::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {}
        }

        let now = Instant::now();
        if now >= next_attach {
            if brain.attached().is_none() {
                brain.try_attach(now);
            }
            next_attach = now + config.attach_period;
        }
        // Disable halts only the Sense/Decide/Act branch and the routine
        // ticks; cancellation is checked here, at cycle boundaries.
        if brain.is_enabled() {
            if now >= next_cycle {
                brain.cycle(now);
                next_cycle = now + config.cycle_period;
            }
            brain.tick_routines(now);
        }
    }
}
