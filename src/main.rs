//! wavebuddy CLI - desktop smoke entry
//!
//! Runs the full decision loop against the in-memory fake backend so the
//! core can be exercised without a game window. The real desktop host links
//! the library and supplies its own platform backends.

use std::sync::Arc;
use std::time::{Duration, Instant};

use wavebuddy::platform::fake::FakePlatform;
use wavebuddy::platform::Rect;
use wavebuddy::vision::{Sensor, TemplateStore};
use wavebuddy::{BotEvent, Brain, EventBus, Settings};

fn main() {
    println!("wavebuddy - Idle Zombie Wave automation core");
    println!("============================================");
    println!();

    let settings = Settings::default();
    println!("Configuration:");
    println!("  auto-farm:      {}", settings.auto_farm);
    println!("  auto-prestige:  {}", settings.auto_prestige);
    println!("  click delay:    {} ms", settings.click_delay_ms);
    println!("  buy scan slots: {}", settings.buy_scan_slots);
    println!();

    // A virtual screen with a green Start button where the main menu
    // would have one.
    let fake = Arc::new(FakePlatform::with_window(1280, 720));
    fake.paint(
        Rect::from_xywh(600, 440, 80, 50),
        image::Rgba([40, 210, 60, 255]),
    );

    let (events, events_rx) = EventBus::channel();
    let mut brain = Brain::new(
        Arc::clone(&fake),
        Arc::clone(&fake),
        Sensor::new(TemplateStore::empty()),
        settings,
        events,
    );

    let now = Instant::now();
    brain.set_enabled(true, now);
    brain.cycle(now);
    brain.cycle(now + Duration::from_secs(2));
    brain.tick_routines(now + Duration::from_secs(2));

    println!("Demo run against the fake backend:");
    for event in events_rx.try_iter() {
        match event {
            BotEvent::DetectionProgress(p) => println!("  progress: {p}%"),
            BotEvent::State(s) => println!("  state:    {s}"),
            BotEvent::Action(a) => println!("  action:   {a}"),
            BotEvent::Log(l) => println!("  log:      {l}"),
        }
    }
    println!();
    println!(
        "Synthetic clicks delivered: {}",
        fake.clicks().len()
    );
}
