//! Per-cycle world snapshot
//!
//! Built fresh at the top of every cycle and treated as immutable after
//! that. An absent field means "not detected this cycle", never
//! "confirmed absent"; detection is best-effort by design.

use crate::platform::{Platform, Rect, WindowHandle};
use crate::vision::{PerkChoice, Sensor, ShopError};

/// Everything the sensor battery saw in one cycle.
#[derive(Debug, Clone)]
pub struct GameSnapshot {
    pub window: WindowHandle,
    pub win_rect: Rect,
    pub start: Option<Rect>,
    pub next: Option<Rect>,
    pub claim: Option<Rect>,
    pub prestige: Option<Rect>,
    pub buy: Option<Rect>,
    pub shop_error: ShopError,
    pub chest_count: u32,
    pub perk_choices: Vec<PerkChoice>,
}

impl GameSnapshot {
    /// A snapshot with nothing detected, for a known window.
    pub fn blank(window: WindowHandle, win_rect: Rect) -> Self {
        Self {
            window,
            win_rect,
            start: None,
            next: None,
            claim: None,
            prestige: None,
            buy: None,
            shop_error: ShopError::None,
            chest_count: 0,
            perk_choices: Vec::new(),
        }
    }

    /// Run the full sensor battery once. Perk scanning is skipped when perk
    /// auto-pick is off, since the dialog scan is the most expensive query.
    pub fn sense<P: Platform>(
        sensor: &Sensor,
        platform: &P,
        window: WindowHandle,
        win_rect: Rect,
        scan_perks: bool,
    ) -> Self {
        use crate::vision::Target;

        let mut snap = Self::blank(window, win_rect);
        snap.start = sensor.detect_button(platform, win_rect, Target::Start);
        snap.next = sensor.detect_button(platform, win_rect, Target::Next);
        snap.claim = sensor.detect_button(platform, win_rect, Target::Claim);
        snap.prestige = sensor.detect_button(platform, win_rect, Target::Prestige);
        snap.buy = sensor.detect_button(platform, win_rect, Target::Buy);
        snap.shop_error = sensor.detect_shop_error(platform, win_rect);
        snap.chest_count = sensor.count_chests(platform, win_rect);
        if scan_perks {
            snap.perk_choices = sensor.detect_perk_choices(platform, win_rect);
        }
        snap
    }
}
