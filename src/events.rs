//! Outbound events and durable logging
//!
//! The core never touches the host UI thread; progress, state and action
//! labels plus log lines are pushed onto a channel the host drains, and log
//! lines are additionally appended to a per-install log file.

use std::cell::{Cell, RefCell};
use std::fs::{self, OpenOptions};
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::time::{SystemTime, UNIX_EPOCH};

/// One observer-facing event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotEvent {
    /// Detection confidence, 0..=100.
    DetectionProgress(u8),
    /// Human-readable state label.
    State(String),
    /// Human-readable current-action label.
    Action(String),
    /// Append-only log line.
    Log(String),
}

/// Event sink shared by the whole cycle.
pub struct EventBus {
    tx: Option<Sender<BotEvent>>,
    progress: Cell<u8>,
    state: RefCell<String>,
    log_file: Option<PathBuf>,
}

impl EventBus {
    /// Bus plus the receiver the host drains.
    pub fn channel() -> (Self, Receiver<BotEvent>) {
        let (tx, rx) = channel();
        (
            Self {
                tx: Some(tx),
                progress: Cell::new(0),
                state: RefCell::new(String::new()),
                log_file: None,
            },
            rx,
        )
    }

    /// Bus with no observer; events are dropped, log lines still go to the
    /// `log` facade (and the log file when configured).
    pub fn detached() -> Self {
        Self {
            tx: None,
            progress: Cell::new(0),
            state: RefCell::new(String::new()),
            log_file: None,
        }
    }

    pub fn with_log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_file = Some(path.into());
        self
    }

    pub fn progress(&self) -> u8 {
        self.progress.get()
    }

    pub fn set_progress(&self, value: i32) {
        let v = value.clamp(0, 100) as u8;
        self.progress.set(v);
        self.emit(BotEvent::DetectionProgress(v));
    }

    pub fn bump_progress(&self, delta: i32) {
        self.set_progress(self.progress.get() as i32 + delta);
    }

    /// Emit a state label, deduplicating repeats.
    pub fn set_state(&self, label: &str) {
        {
            let mut current = self.state.borrow_mut();
            if *current == label {
                return;
            }
            current.clear();
            current.push_str(label);
        }
        self.emit(BotEvent::State(label.to_string()));
    }

    pub fn set_action(&self, text: impl Into<String>) {
        self.emit(BotEvent::Action(text.into()));
    }

    pub fn log(&self, msg: impl AsRef<str>) {
        let msg = msg.as_ref();
        log::info!("{msg}");
        if let Some(path) = &self.log_file {
            append_line(path, msg);
        }
        self.emit(BotEvent::Log(msg.to_string()));
    }

    fn emit(&self, event: BotEvent) {
        if let Some(tx) = &self.tx {
            // A dropped receiver just means nobody is watching.
            let _ = tx.send(event);
        }
    }
}

/// Per-install log location: `%APPDATA%` on Windows, `~/.local/share`
/// elsewhere, falling back to the temp dir.
pub fn default_log_path() -> PathBuf {
    let base = std::env::var_os("APPDATA")
        .map(PathBuf::from)
        .or_else(|| {
            std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".local/share"))
        })
        .unwrap_or_else(std::env::temp_dir);
    base.join("wavebuddy").join("run.log")
}

fn append_line(path: &Path, msg: &str) {
    // Logging must never take the bot down; IO errors are swallowed.
    if let Some(dir) = path.parent() {
        let _ = fs::create_dir_all(dir);
    }
    let ts = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(path) {
        let _ = writeln!(file, "[{ts}] {msg}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_is_clamped_and_emitted() {
        let (bus, rx) = EventBus::channel();
        bus.set_progress(150);
        assert_eq!(bus.progress(), 100);
        bus.bump_progress(-250);
        assert_eq!(bus.progress(), 0);
        bus.bump_progress(8);
        assert_eq!(bus.progress(), 8);

        let events: Vec<_> = rx.try_iter().collect();
        assert_eq!(
            events,
            vec![
                BotEvent::DetectionProgress(100),
                BotEvent::DetectionProgress(0),
                BotEvent::DetectionProgress(8),
            ]
        );
    }

    #[test]
    fn state_changes_are_deduplicated() {
        let (bus, rx) = EventBus::channel();
        bus.set_state("Searching for game");
        bus.set_state("Searching for game");
        bus.set_state("Playing");

        let events: Vec<_> = rx.try_iter().collect();
        assert_eq!(
            events,
            vec![
                BotEvent::State("Searching for game".into()),
                BotEvent::State("Playing".into()),
            ]
        );
    }

    #[test]
    fn log_lines_reach_channel_and_file() {
        let path = std::env::temp_dir().join(format!(
            "wavebuddy-events-test-{}.log",
            std::process::id()
        ));
        let _ = fs::remove_file(&path);

        let (bus, rx) = EventBus::channel();
        let bus = bus.with_log_file(&path);
        bus.log("clicked Next");

        assert_eq!(
            rx.try_iter().collect::<Vec<_>>(),
            vec![BotEvent::Log("clicked Next".into())]
        );
        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.contains("clicked Next"));
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn detached_bus_does_not_panic() {
        let bus = EventBus::detached();
        bus.set_progress(50);
        bus.set_state("Playing");
        bus.set_action("Click: Next");
        bus.log("no observer");
        assert_eq!(bus.progress(), 50);
    }
}
