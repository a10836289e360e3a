//! Pixel-level sensing of game UI affordances
//!
//! The sensor answers "is this button on screen right now, and where" from a
//! capture of a region of interest. Detection is two-stage: a reference-image
//! match when a template exists, then a color-signature fallback. Every
//! internal failure (capture error, missing asset, out-of-bounds region)
//! collapses to "not found"; a miss is an expected, silent outcome here.

pub mod heuristics;
pub mod template;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::platform::{Platform, Rect};
use heuristics::ColorSig;
pub use template::{TemplateError, TemplateStore};

/// Summed per-channel tolerance for button template matches.
const BUTTON_TOLERANCE: u32 = 12;
/// Popup art is noisier; allow slightly more drift.
const POPUP_TOLERANCE: u32 = 14;
const WEAPON_TOLERANCE: u32 = 12;

/// Button classes the sensor can look for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    Start,
    Next,
    Claim,
    Prestige,
    Buy,
    Speed,
    Sell,
}

impl Target {
    /// Fractional center of the region of interest for this button.
    pub(crate) fn roi_center(self) -> (f64, f64) {
        match self {
            Target::Next => (0.80, 0.15),
            Target::Claim => (0.50, 0.60),
            Target::Prestige => (0.50, 0.30),
            Target::Buy => (0.90, 0.45),
            Target::Speed => (0.92, 0.06),
            Target::Start => (0.50, 0.65),
            Target::Sell => (0.84, 0.82),
        }
    }

    /// File stem of the reference image for this button.
    pub(crate) fn template_stem(self) -> &'static str {
        match self {
            Target::Start => "start",
            Target::Next => "next",
            Target::Claim => "claim",
            Target::Prestige => "prestige",
            Target::Buy => "buy",
            Target::Speed => "speed",
            Target::Sell => "sell",
        }
    }

    /// Start renders as a green button just like Next; everything else uses
    /// the amber reward styling.
    fn signature(self) -> ColorSig {
        match self {
            Target::Start | Target::Next => ColorSig::Green,
            _ => ColorSig::Amber,
        }
    }
}

/// Item quality tier, ordered weakest to strongest.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub enum Rarity {
    #[default]
    Unknown,
    Gray,
    Blue,
    Pink,
    Red,
}

impl Rarity {
    /// Sell priority: lower sells first. Unknown ranks last so unreadable
    /// slots are never preferred over a recognized weak item.
    pub fn sell_rank(self) -> u8 {
        match self {
            Rarity::Gray => 0,
            Rarity::Blue => 1,
            Rarity::Pink => 2,
            Rarity::Red => 3,
            Rarity::Unknown => 4,
        }
    }
}

/// Weapon category inferred from template filename or pixel statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum WeaponKind {
    #[default]
    Unknown,
    Elemental,
    Ballistic,
    Explosive,
    Energy,
}

/// Blocking shop popup classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShopError {
    #[default]
    None,
    InsufficientMaterials,
    TooManyMercenaries,
}

/// One card in the level-up perk dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PerkChoice {
    pub rect: Rect,
    pub rarity: Rarity,
    /// Position 0..2, left to right.
    pub index: usize,
}

/// One scanned shop row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShopSlot {
    pub rect: Rect,
    /// Matched weapon template key, or `row_<i>` when nothing matched.
    pub template_key: String,
    pub kind: WeaponKind,
    pub rarity: Rarity,
    pub row: usize,
}

/// The vision sensor: template store plus the detection battery.
pub struct Sensor {
    templates: TemplateStore,
}

impl Sensor {
    pub fn new(templates: TemplateStore) -> Self {
        Self { templates }
    }

    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(TemplateStore::load(dir))
    }

    pub fn templates(&self) -> &TemplateStore {
        &self.templates
    }

    /// Look for a button inside its expected region of interest.
    pub fn detect_button<P: Platform>(
        &self,
        platform: &P,
        win: Rect,
        target: Target,
    ) -> Option<Rect> {
        if win.is_empty() {
            return None;
        }
        let roi = roi_for(win, target);
        let shot = platform.capture_region(roi)?;

        if let Some(tpl) = self.templates.button(target) {
            if let Some((x, y)) = template::search(&shot, &tpl.image, BUTTON_TOLERANCE) {
                let (tw, th) = tpl.image.dimensions();
                return Some(Rect::from_xywh(
                    roi.left + x as i32,
                    roi.top + y as i32,
                    tw as i32,
                    th as i32,
                ));
            }
        }

        let blob = heuristics::find_blob(&shot, target.signature())?;
        Some(Rect::from_xywh(
            roi.left + blob.left(),
            roi.top + blob.top(),
            blob.width() as i32,
            blob.height() as i32,
        ))
    }

    /// Detect a blocking shop popup in the center of the window.
    /// Template-only: these dialogs have no reliable color signature.
    pub fn detect_shop_error<P: Platform>(&self, platform: &P, win: Rect) -> ShopError {
        let w = win.width();
        let h = win.height();
        if w <= 0 || h <= 0 {
            return ShopError::None;
        }
        let roi = Rect::from_xywh(
            win.left + (w as f64 * 0.2) as i32,
            win.top + (h as f64 * 0.2) as i32,
            (w as f64 * 0.6) as i32,
            (h as f64 * 0.5) as i32,
        );
        let Some(shot) = platform.capture_region(roi) else {
            return ShopError::None;
        };
        if let Some(tpl) = self.templates.named("shop_insufficient") {
            if template::search(&shot, &tpl.image, POPUP_TOLERANCE).is_some() {
                return ShopError::InsufficientMaterials;
            }
        }
        if let Some(tpl) = self.templates.named("shop_too_many") {
            if template::search(&shot, &tpl.image, POPUP_TOLERANCE).is_some() {
                return ShopError::TooManyMercenaries;
            }
        }
        ShopError::None
    }

    /// Count likely chest/gold drops across the whole viewport by scoring a
    /// coarse grid of cells for the gold signature.
    pub fn count_chests<P: Platform>(&self, platform: &P, win: Rect) -> u32 {
        if win.is_empty() {
            return 0;
        }
        let Some(shot) = platform.capture_region(win) else {
            return 0;
        };
        let (w, h) = shot.dimensions();
        let cols = 4.max(w / 200);
        let rows = 3.max(h / 160);
        let mut hits = 0;
        for ry in 0..rows {
            for rx in 0..cols {
                let sx = rx * w / cols;
                let sy = ry * h / rows;
                let sw = (w / cols).max(24).min(w - sx);
                let sh = (h / rows).max(16).min(h - sy);
                let mut score = 0u32;
                let mut y = sy;
                while y < sy + sh {
                    let mut x = sx;
                    while x < sx + sw {
                        if ColorSig::Gold.matches(shot.get_pixel(x, y)) {
                            score += 1;
                        }
                        x += 3;
                    }
                    y += 3;
                }
                if score > (sw * sh) / 9 / 6 {
                    hits += 1;
                }
            }
        }
        hits
    }

    /// Detect the level-up dialog: three card columns across the centered
    /// dialog area, each classified by rarity. A card with no recognizable
    /// rarity is treated as absent, which also guards against false
    /// positives when no dialog is open.
    pub fn detect_perk_choices<P: Platform>(&self, platform: &P, win: Rect) -> Vec<PerkChoice> {
        let w = win.width();
        let h = win.height();
        if w <= 0 || h <= 0 {
            return Vec::new();
        }
        let dlg_w = (w as f64 * 0.80) as i32;
        let dlg_h = (h as f64 * 0.55) as i32;
        let dlg_x = win.left + (w - dlg_w) / 2;
        let dlg_y = win.top + (h as f64 * 0.20) as i32;

        let gap = (dlg_w / 50).max(12);
        let card_w = (dlg_w - 2 * gap) / 3;
        let card_h = dlg_h - 2 * gap;
        let card_y = dlg_y + gap;

        let mut choices = Vec::new();
        for i in 0..3usize {
            let card_x = dlg_x + gap + i as i32 * (card_w + gap);
            let roi = Rect::from_xywh(card_x, card_y, card_w, card_h);
            let Some(shot) = platform.capture_region(roi) else {
                continue;
            };
            let rarity = heuristics::classify_rarity(&shot);
            if rarity != Rarity::Unknown {
                choices.push(PerkChoice {
                    rect: roi,
                    rarity,
                    index: i,
                });
            }
        }
        choices
    }

    /// Scan the left inventory panel for the weakest slot worth selling.
    /// Top-rarity (Red) slots are never offered.
    pub fn find_weakest_inventory_slot<P: Platform>(
        &self,
        platform: &P,
        win: Rect,
        slots: usize,
    ) -> Option<(Rect, Rarity)> {
        let w = win.width();
        let h = win.height();
        if w <= 0 || h <= 0 {
            return None;
        }
        let slots = slots.clamp(1, 6);

        let mut best: Option<(Rect, Rarity)> = None;
        for i in 0..slots {
            let ny = 0.30 + i as f64 * 0.15;
            let cx = win.left + (w as f64 * 0.14) as i32;
            let cy = win.top + (h as f64 * ny) as i32;
            let roi = Rect::from_xywh(
                cx - (w / 6).max(140),
                cy - (h / 25).max(40),
                (w / 4).max(260),
                (h / 12).max(80),
            );
            let Some(shot) = platform.capture_region(roi) else {
                continue;
            };
            let rarity = heuristics::classify_rarity(&shot);
            if rarity == Rarity::Red {
                continue;
            }
            let replace = match &best {
                None => true,
                Some((_, b)) => *b == Rarity::Unknown || rarity.sell_rank() < b.sell_rank(),
            };
            if replace {
                best = Some((roi, rarity));
            }
        }
        best
    }

    /// Scan shop rows on the right side of the window, classifying each by
    /// rarity and weapon type (template match first, pixels otherwise).
    pub fn scan_shop<P: Platform>(&self, platform: &P, win: Rect, slots: usize) -> Vec<ShopSlot> {
        let w = win.width();
        let h = win.height();
        if w <= 0 || h <= 0 {
            return Vec::new();
        }
        let slots = slots.clamp(1, 6);

        let mut items = Vec::new();
        for i in 0..slots {
            let ny = 0.25 + i as f64 * 0.18;
            let cx = win.left + (w as f64 * 0.90) as i32;
            let cy = win.top + (h as f64 * ny) as i32;
            let roi = Rect::from_xywh(
                cx - (w / 10).max(120),
                cy - (h / 25).max(40),
                (w / 6).max(220),
                (h / 12).max(80),
            );
            let Some(shot) = platform.capture_region(roi) else {
                continue;
            };
            let rarity = heuristics::classify_rarity(&shot);
            let mut key = format!("row_{i}");
            let mut kind = WeaponKind::Unknown;
            for tpl in self.templates.weapons() {
                if template::search(&shot, &tpl.image, WEAPON_TOLERANCE).is_some() {
                    key = tpl.key.clone();
                    kind = tpl.kind;
                    break;
                }
            }
            if kind == WeaponKind::Unknown {
                kind = heuristics::classify_weapon(&shot);
            }
            items.push(ShopSlot {
                rect: roi,
                template_key: key,
                kind,
                rarity,
                row: i,
            });
        }
        items
    }
}

/// Region of interest around the expected button position, sized relative
/// to the window.
fn roi_for(win: Rect, target: Target) -> Rect {
    let (cx, cy) = target.roi_center();
    let roi_w = (win.width() / 5).max(60);
    let roi_h = ((win.height() as f64 * 0.15) as i32).max(40);
    let center = win.fraction_point(cx, cy);
    Rect::centered_at(center.x, center.y, roi_w, roi_h)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::fake::FakePlatform;
    use image::{ImageBuffer, Rgba, RgbaImage};

    const GREEN: Rgba<u8> = Rgba([40, 210, 60, 255]);
    const GOLD: Rgba<u8> = Rgba([230, 180, 60, 255]);
    const BLUE: Rgba<u8> = Rgba([50, 50, 200, 255]);
    const PINK: Rgba<u8> = Rgba([220, 100, 180, 255]);
    const GRAY: Rgba<u8> = Rgba([200, 200, 200, 255]);

    fn solid(w: u32, h: u32, color: [u8; 4]) -> RgbaImage {
        ImageBuffer::from_pixel(w, h, Rgba(color))
    }

    fn empty_sensor() -> Sensor {
        Sensor::new(TemplateStore::empty())
    }

    #[test]
    fn detects_start_via_color_fallback() {
        let fake = FakePlatform::with_window(1000, 600);
        let win = Rect::new(0, 0, 1000, 600);
        // Start ROI is centered at (500, 390), 200x90.
        fake.paint(Rect::from_xywh(470, 370, 60, 40), GREEN);

        let sensor = empty_sensor();
        let rect = sensor
            .detect_button(&fake, win, Target::Start)
            .expect("start detected");
        assert!(rect.left < 530 && rect.right > 470);
        assert!(rect.top < 410 && rect.bottom > 370);

        // Nothing painted at the Claim ROI.
        assert!(sensor.detect_button(&fake, win, Target::Claim).is_none());
    }

    #[test]
    fn template_match_wins_over_heuristic() {
        let fake = FakePlatform::with_window(1000, 600);
        let win = Rect::new(0, 0, 1000, 600);
        // Next ROI spans x 700..900, y 45..135.
        let color = Rgba([123, 45, 67, 255]);
        fake.paint(Rect::from_xywh(780, 81, 12, 12), color);

        let mut store = TemplateStore::empty();
        store.insert_button(Target::Next, solid(12, 12, [123, 45, 67, 255]));
        let sensor = Sensor::new(store);

        let rect = sensor
            .detect_button(&fake, win, Target::Next)
            .expect("next detected");
        assert_eq!(rect, Rect::from_xywh(780, 81, 12, 12));
    }

    #[test]
    fn empty_window_never_detects() {
        let fake = FakePlatform::with_window(1000, 600);
        let sensor = empty_sensor();
        assert!(sensor
            .detect_button(&fake, Rect::default(), Target::Next)
            .is_none());
    }

    #[test]
    fn shop_error_from_template() {
        let fake = FakePlatform::with_window(1000, 600);
        let win = Rect::new(0, 0, 1000, 600);
        let color = Rgba([90, 12, 150, 255]);
        // Center ROI spans x 200..800, y 120..420.
        fake.paint(Rect::from_xywh(400, 200, 16, 16), color);

        let mut store = TemplateStore::empty();
        store.insert_named("shop_insufficient", solid(16, 16, [90, 12, 150, 255]));
        let sensor = Sensor::new(store);

        assert_eq!(
            sensor.detect_shop_error(&fake, win),
            ShopError::InsufficientMaterials
        );

        // No popup templates on file: always None.
        assert_eq!(
            empty_sensor().detect_shop_error(&fake, win),
            ShopError::None
        );
    }

    #[test]
    fn counts_gold_cells_as_chests() {
        let fake = FakePlatform::with_window(800, 480);
        let win = Rect::new(0, 0, 800, 480);
        // 4x3 grid of 200x160 cells; a hit needs dense gold in one cell.
        fake.paint(Rect::from_xywh(40, 30, 100, 80), GOLD);
        fake.paint(Rect::from_xywh(240, 190, 100, 80), GOLD);

        let sensor = empty_sensor();
        assert_eq!(sensor.count_chests(&fake, win), 2);

        let blank = FakePlatform::with_window(800, 480);
        assert_eq!(sensor.count_chests(&blank, win), 0);
    }

    #[test]
    fn perk_choices_classified_per_card() {
        let fake = FakePlatform::with_window(900, 600);
        let win = Rect::new(0, 0, 900, 600);
        // Dialog: 720x330 at (90, 120); gap 14, cards 230x302 at y 134.
        // Paint card index 1 blue and card index 2 pink.
        fake.paint(Rect::from_xywh(348, 134, 230, 302), BLUE);
        fake.paint(Rect::from_xywh(592, 134, 230, 302), PINK);

        let sensor = empty_sensor();
        let choices = sensor.detect_perk_choices(&fake, win);
        assert_eq!(choices.len(), 2);
        assert_eq!(choices[0].index, 1);
        assert_eq!(choices[0].rarity, Rarity::Blue);
        assert_eq!(choices[1].index, 2);
        assert_eq!(choices[1].rarity, Rarity::Pink);

        let blank = FakePlatform::with_window(900, 600);
        assert!(sensor.detect_perk_choices(&blank, win).is_empty());
    }

    #[test]
    fn weakest_inventory_slot_skips_red() {
        let fake = FakePlatform::with_window(1400, 800);
        let win = Rect::new(200, 50, 1200, 650);
        // Slot ROIs: x 174, width 260, height 80, y = 190 + 90*i.
        fake.paint(Rect::from_xywh(174, 190, 260, 80), BLUE);
        fake.paint(Rect::from_xywh(174, 280, 260, 80), GRAY);
        fake.paint(Rect::from_xywh(174, 370, 260, 80), Rgba([200, 50, 50, 255]));

        let sensor = empty_sensor();
        let (rect, rarity) = sensor
            .find_weakest_inventory_slot(&fake, win, 5)
            .expect("weakest slot");
        assert_eq!(rarity, Rarity::Gray);
        assert_eq!(rect, Rect::from_xywh(174, 280, 260, 80));
    }

    #[test]
    fn all_red_inventory_offers_nothing() {
        let fake = FakePlatform::with_window(1400, 800);
        let win = Rect::new(200, 50, 1200, 650);
        let red = Rgba([200, 50, 50, 255]);
        for i in 0..5 {
            fake.paint(Rect::from_xywh(174, 190 + 90 * i, 260, 80), red);
        }
        let sensor = empty_sensor();
        let got = sensor.find_weakest_inventory_slot(&fake, win, 5);
        assert!(got.is_none());
    }

    #[test]
    fn shop_scan_classifies_rows() {
        let fake = FakePlatform::with_window(1000, 600);
        let win = Rect::new(0, 0, 1000, 600);
        // Row ROIs: x 780, width 220, height 80; row 0 at y 110.
        fake.paint(Rect::from_xywh(780, 110, 220, 80), PINK);

        let sensor = empty_sensor();
        let slots = sensor.scan_shop(&fake, win, 2);
        assert_eq!(slots.len(), 2);
        assert_eq!(slots[0].row, 0);
        assert_eq!(slots[0].rarity, Rarity::Pink);
        assert_eq!(slots[0].template_key, "row_0");
        assert_eq!(slots[0].kind, WeaponKind::Elemental);
        assert_eq!(slots[1].rarity, Rarity::Unknown);
    }

    #[test]
    fn shop_scan_prefers_weapon_template_key() {
        let fake = FakePlatform::with_window(1000, 600);
        let win = Rect::new(0, 0, 1000, 600);
        let color = Rgba([17, 99, 203, 255]);
        fake.paint(Rect::from_xywh(800, 120, 14, 14), color);

        let mut store = TemplateStore::empty();
        store.insert_weapon(
            "weapon_energy_12ab34cd",
            WeaponKind::Energy,
            solid(14, 14, [17, 99, 203, 255]),
        );
        let sensor = Sensor::new(store);

        let slots = sensor.scan_shop(&fake, win, 1);
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].template_key, "weapon_energy_12ab34cd");
        assert_eq!(slots[0].kind, WeaponKind::Energy);
    }

    #[test]
    fn rarity_order_matches_tiers() {
        assert!(Rarity::Gray < Rarity::Blue);
        assert!(Rarity::Blue < Rarity::Pink);
        assert!(Rarity::Pink < Rarity::Red);
        assert!(Rarity::Unknown < Rarity::Gray);
        assert_eq!(Rarity::Gray.sell_rank(), 0);
        assert_eq!(Rarity::Unknown.sell_rank(), 4);
    }
}
