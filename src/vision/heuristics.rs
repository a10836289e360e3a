//! Color-signature detection and classification
//!
//! Fallback path when no template matches: score the region of interest for
//! a target-specific color signature, grow the densest block into a blob,
//! and classify rarity/weapon type from sampled pixel statistics.

use image::{Rgba, RgbaImage};
use imageproc::rect::Rect as PixelRect;

use super::{Rarity, WeaponKind};

/// Block geometry for the coarse scan.
const BLOCK_W: u32 = 16;
const BLOCK_H: u32 = 10;
/// Minimum sampled matches for a seed block to count as a signal.
const MIN_SEED_SCORE: u32 = 20;
/// Matching-pixel ratio a grown region must keep.
const GROW_RATIO: f64 = 0.22;
const GROW_ITERATIONS: u32 = 8;

/// Color signature a detection target is looking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSig {
    /// Green-dominant affirmative buttons (Start/Next).
    Green,
    /// Amber/orange reward and action buttons.
    Amber,
    /// Gold drop icons (chests).
    Gold,
}

impl ColorSig {
    pub fn matches(self, p: &Rgba<u8>) -> bool {
        let (r, g, b) = (p[0], p[1], p[2]);
        match self {
            ColorSig::Green => g > 160 && r < 140 && b < 140,
            ColorSig::Amber => r > 170 && g > 120 && b < 120,
            ColorSig::Gold => r > 200 && g > 140 && b < 140,
        }
    }
}

/// Locate the densest signature-colored blob in the image.
///
/// Scans 16x10 blocks at a 4px stride, keeps the best-scoring block, grows
/// it while the matching-pixel ratio holds, and accepts the result only if
/// it clears a minimum size relative to the image.
pub fn find_blob(img: &RgbaImage, sig: ColorSig) -> Option<PixelRect> {
    let (w, h) = img.dimensions();
    if w == 0 || h == 0 {
        return None;
    }
    let min_w = 30.max(w / 8);
    let min_h = 18.max(h / 8);

    let mut best_score = 0;
    let mut best: Option<PixelRect> = None;
    let mut y = 0;
    while y < h {
        let mut x = 0;
        while x < w {
            let bw = BLOCK_W.min(w - x);
            let bh = BLOCK_H.min(h - y);
            let score = sample_score(img, x, y, bw, bh, sig);
            if score > best_score {
                best_score = score;
                best = Some(PixelRect::at(x as i32, y as i32).of_size(bw, bh));
            }
            x += 4;
        }
        y += 4;
    }

    if best_score < MIN_SEED_SCORE {
        return None;
    }
    let grown = grow_blob(img, best?, sig);
    if grown.width() >= min_w && grown.height() >= min_h {
        Some(grown)
    } else {
        None
    }
}

fn sample_score(img: &RgbaImage, sx: u32, sy: u32, w: u32, h: u32, sig: ColorSig) -> u32 {
    let mut score = 0;
    let mut y = sy;
    while y < sy + h {
        let mut x = sx;
        while x < sx + w {
            if sig.matches(img.get_pixel(x, y)) {
                score += 1;
            }
            x += 2;
        }
        y += 2;
    }
    score
}

fn grow_blob(img: &RgbaImage, seed: PixelRect, sig: ColorSig) -> PixelRect {
    let mut rect = seed;
    for _ in 0..GROW_ITERATIONS {
        let Some(inflated) = inflate_clamped(rect, 6, img.width(), img.height()) else {
            break;
        };
        if inflated == rect || color_ratio(img, inflated, sig) <= GROW_RATIO {
            break;
        }
        rect = inflated;
    }
    rect
}

/// Inflate by `by` pixels on every side, clamped to the image bounds.
fn inflate_clamped(r: PixelRect, by: i32, img_w: u32, img_h: u32) -> Option<PixelRect> {
    let left = (r.left() - by).max(0);
    let top = (r.top() - by).max(0);
    let right = (r.left() + r.width() as i32 + by).min(img_w as i32);
    let bottom = (r.top() + r.height() as i32 + by).min(img_h as i32);
    if right <= left || bottom <= top {
        return None;
    }
    Some(PixelRect::at(left, top).of_size((right - left) as u32, (bottom - top) as u32))
}

fn color_ratio(img: &RgbaImage, area: PixelRect, sig: ColorSig) -> f64 {
    let mut good = 0u32;
    let mut total = 0u32;
    let mut y = area.top().max(0) as u32;
    let y_end = (area.top() + area.height() as i32).min(img.height() as i32) as u32;
    let x_start = area.left().max(0) as u32;
    let x_end = (area.left() + area.width() as i32).min(img.width() as i32) as u32;
    while y < y_end {
        let mut x = x_start;
        while x < x_end {
            total += 1;
            if sig.matches(img.get_pixel(x, y)) {
                good += 1;
            }
            x += 3;
        }
        y += 3;
    }
    if total == 0 {
        0.0
    } else {
        good as f64 / total as f64
    }
}

/// Bucket an item region into a rarity tier by the border-strip color.
///
/// Samples a narrow vertical strip near the left edge and takes the
/// majority color family; ties resolve to the lower rank.
pub fn classify_rarity(img: &RgbaImage) -> Rarity {
    let (w, h) = img.dimensions();
    if w == 0 || h == 0 {
        return Rarity::Unknown;
    }
    let x0 = w / 10;
    let strip = (w / 20).clamp(6, 12);

    let (mut gray, mut blue, mut pink, mut red) = (0u32, 0u32, 0u32, 0u32);
    let mut y = 0;
    while y < h {
        let mut x = x0;
        while x < (x0 + strip).min(w) {
            let p = img.get_pixel(x, y);
            let (r, g, b) = (p[0], p[1], p[2]);
            let max = r.max(g).max(b);
            let min = r.min(g).min(b);
            let sat = max - min;
            if r > 170 && g < 110 && b < 110 && sat > 40 {
                red += 1;
            } else if b > 160 && r < 130 && sat > 30 {
                blue += 1;
            } else if r > 180 && b > 150 && g < 160 && r.abs_diff(b) < 60 {
                pink += 1;
            } else if max > 150 && sat < 25 {
                gray += 1;
            }
            x += 2;
        }
        y += 2;
    }

    let m = gray.max(blue).max(pink).max(red);
    if m == 0 {
        Rarity::Unknown
    } else if m == gray {
        Rarity::Gray
    } else if m == blue {
        Rarity::Blue
    } else if m == pink {
        Rarity::Pink
    } else {
        Rarity::Red
    }
}

/// Assign a weapon type from channel-dominance counts over a sparse grid of
/// the central region. Priority when counts tie: Explosive, Energy,
/// Elemental, Ballistic.
pub fn classify_weapon(img: &RgbaImage) -> WeaponKind {
    let (w, h) = img.dimensions();
    let (mut blueish, mut magenta, mut cyan_green, mut orange_red, mut gray_brown) =
        (0u32, 0u32, 0u32, 0u32, 0u32);

    let mut y = h / 5;
    while y < h * 4 / 5 {
        let mut x = w / 5;
        while x < w * 4 / 5 {
            let p = img.get_pixel(x, y);
            let (r, g, b) = (p[0], p[1], p[2]);
            let max = r.max(g).max(b);
            let min = r.min(g).min(b);
            let sat = max - min;
            if b > 160 && r < 130 {
                blueish += 1;
            }
            if r > 170 && b > 150 && g < 160 && r.abs_diff(b) < 60 {
                magenta += 1;
            }
            if g > 160 && b > 140 && r < 170 {
                cyan_green += 1;
            }
            if r > 170 && (90..=150).contains(&g) && b < 110 {
                orange_red += 1;
            }
            if sat < 25 && max > 80 {
                gray_brown += 1;
            }
            x += 3;
        }
        y += 3;
    }

    if orange_red > blueish
        && orange_red > cyan_green
        && orange_red > gray_brown
        && orange_red > magenta
    {
        WeaponKind::Explosive
    } else if cyan_green > orange_red && cyan_green > gray_brown && cyan_green > magenta {
        WeaponKind::Energy
    } else if blueish + magenta > cyan_green
        && blueish + magenta > orange_red
        && blueish + magenta > gray_brown
    {
        WeaponKind::Elemental
    } else if gray_brown > 0 {
        WeaponKind::Ballistic
    } else {
        WeaponKind::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::ImageBuffer;
    use imageproc::drawing::draw_filled_rect_mut;

    fn solid(w: u32, h: u32, color: [u8; 4]) -> RgbaImage {
        ImageBuffer::from_pixel(w, h, Rgba(color))
    }

    fn dark(w: u32, h: u32) -> RgbaImage {
        solid(w, h, [10, 10, 10, 255])
    }

    #[test]
    fn signatures_match_expected_colors() {
        assert!(ColorSig::Green.matches(&Rgba([60, 200, 80, 255])));
        assert!(!ColorSig::Green.matches(&Rgba([200, 200, 80, 255])));
        assert!(ColorSig::Amber.matches(&Rgba([220, 150, 60, 255])));
        assert!(!ColorSig::Amber.matches(&Rgba([120, 150, 60, 255])));
        assert!(ColorSig::Gold.matches(&Rgba([230, 180, 60, 255])));
        assert!(!ColorSig::Gold.matches(&Rgba([230, 180, 200, 255])));
    }

    #[test]
    fn finds_green_blob() {
        let mut img = dark(200, 100);
        draw_filled_rect_mut(
            &mut img,
            PixelRect::at(50, 30).of_size(60, 40),
            Rgba([40, 210, 60, 255]),
        );

        let blob = find_blob(&img, ColorSig::Green).expect("blob");
        assert!(blob.width() >= 30);
        assert!(blob.height() >= 18);
        // The grown blob must overlap the painted region.
        assert!(blob.left() < 110 && blob.left() + blob.width() as i32 > 50);
        assert!(blob.top() < 70 && blob.top() + blob.height() as i32 > 30);
    }

    #[test]
    fn tiny_blob_is_rejected() {
        let mut img = dark(200, 100);
        draw_filled_rect_mut(
            &mut img,
            PixelRect::at(50, 30).of_size(8, 6),
            Rgba([40, 210, 60, 255]),
        );
        assert!(find_blob(&img, ColorSig::Green).is_none());
    }

    #[test]
    fn empty_image_has_no_blob() {
        let img = dark(200, 100);
        assert!(find_blob(&img, ColorSig::Amber).is_none());
    }

    #[test]
    fn rarity_families() {
        assert_eq!(classify_rarity(&solid(40, 40, [200, 50, 50, 255])), Rarity::Red);
        assert_eq!(classify_rarity(&solid(40, 40, [50, 50, 200, 255])), Rarity::Blue);
        assert_eq!(
            classify_rarity(&solid(40, 40, [220, 100, 180, 255])),
            Rarity::Pink
        );
        assert_eq!(
            classify_rarity(&solid(40, 40, [200, 200, 200, 255])),
            Rarity::Gray
        );
        assert_eq!(classify_rarity(&dark(40, 40)), Rarity::Unknown);
    }

    #[test]
    fn rarity_tie_defaults_to_lower_rank() {
        // Top half gray, bottom half red: equal sampled counts.
        let mut img = solid(40, 40, [200, 200, 200, 255]);
        draw_filled_rect_mut(
            &mut img,
            PixelRect::at(0, 20).of_size(40, 20),
            Rgba([200, 50, 50, 255]),
        );
        assert_eq!(classify_rarity(&img), Rarity::Gray);
    }

    #[test]
    fn weapon_families() {
        assert_eq!(
            classify_weapon(&solid(60, 60, [200, 120, 80, 255])),
            WeaponKind::Explosive
        );
        assert_eq!(
            classify_weapon(&solid(60, 60, [100, 200, 180, 255])),
            WeaponKind::Energy
        );
        assert_eq!(
            classify_weapon(&solid(60, 60, [80, 80, 200, 255])),
            WeaponKind::Elemental
        );
        assert_eq!(
            classify_weapon(&solid(60, 60, [120, 120, 120, 255])),
            WeaponKind::Ballistic
        );
        assert_eq!(classify_weapon(&dark(60, 60)), WeaponKind::Unknown);
    }
}
