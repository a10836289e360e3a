//! Reference-image loading and naive template search
//!
//! Templates are plain image files dropped into a directory and resolved by
//! filename convention: `next.png`, `claim.png`, ... for buttons, and
//! `weapon_<type>_<hash>.png` for catalog-sourced weapon art. A missing file
//! is a soft miss; detection falls through to the color heuristics.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use image::{Rgba, RgbaImage};

use super::{Target, WeaponKind};

/// Offsets are scanned every other pixel; a candidate patch samples every
/// third pixel. Coarse on purpose: button art is large and flat.
const SCAN_STEP: u32 = 2;
const SAMPLE_STEP: u32 = 3;

#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("failed to load template image: {0}")]
    Image(#[from] image::ImageError),
}

/// A named button reference image.
pub struct Template {
    pub key: String,
    pub image: RgbaImage,
}

/// A weapon reference image carrying its classified type.
pub struct WeaponTemplate {
    pub key: String,
    pub kind: WeaponKind,
    pub image: RgbaImage,
}

/// In-memory set of reference images, loaded once from the template
/// directory (pngs win over jpgs when both exist for a stem).
#[derive(Default)]
pub struct TemplateStore {
    buttons: HashMap<String, Template>,
    weapons: Vec<WeaponTemplate>,
}

impl TemplateStore {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Scan a directory for templates. A missing or unreadable directory
    /// yields an empty store; individual bad files are skipped with a
    /// warning.
    pub fn load(dir: impl AsRef<Path>) -> Self {
        let mut store = Self::empty();
        let Ok(entries) = fs::read_dir(dir.as_ref()) else {
            return store;
        };
        let mut files: Vec<PathBuf> = entries.flatten().map(|e| e.path()).collect();
        files.sort();
        for wanted in ["png", "jpg", "jpeg"] {
            for path in &files {
                let ext = path
                    .extension()
                    .and_then(|e| e.to_str())
                    .map(|e| e.to_ascii_lowercase());
                if ext.as_deref() == Some(wanted) {
                    store.add_file(path);
                }
            }
        }
        store
    }

    fn add_file(&mut self, path: &Path) {
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            return;
        };
        let stem = stem.to_ascii_lowercase();
        let image = match load_image(path) {
            Ok(img) => img,
            Err(err) => {
                log::warn!("skipping template {}: {err}", path.display());
                return;
            }
        };
        if stem.starts_with("weapon_") {
            if self.weapons.iter().any(|w| w.key == stem) {
                return;
            }
            let kind = weapon_kind_from_name(&stem);
            self.weapons.push(WeaponTemplate {
                key: stem,
                kind,
                image,
            });
        } else {
            self.buttons.entry(stem.clone()).or_insert(Template {
                key: stem,
                image,
            });
        }
    }

    /// Register a button template programmatically.
    pub fn insert_button(&mut self, target: Target, image: RgbaImage) {
        let key = target.template_stem().to_string();
        self.buttons.insert(
            key.clone(),
            Template { key, image },
        );
    }

    /// Register an arbitrary named template (e.g. shop-error popups).
    pub fn insert_named(&mut self, key: &str, image: RgbaImage) {
        self.buttons.insert(
            key.to_string(),
            Template {
                key: key.to_string(),
                image,
            },
        );
    }

    /// Register a weapon template programmatically.
    pub fn insert_weapon(&mut self, key: &str, kind: WeaponKind, image: RgbaImage) {
        self.weapons.push(WeaponTemplate {
            key: key.to_string(),
            kind,
            image,
        });
    }

    pub fn button(&self, target: Target) -> Option<&Template> {
        self.buttons.get(target.template_stem())
    }

    pub fn named(&self, key: &str) -> Option<&Template> {
        self.buttons.get(key)
    }

    pub fn weapons(&self) -> &[WeaponTemplate] {
        &self.weapons
    }

    pub fn is_empty(&self) -> bool {
        self.buttons.is_empty() && self.weapons.is_empty()
    }
}

pub fn load_image(path: &Path) -> Result<RgbaImage, TemplateError> {
    Ok(image::open(path)?.to_rgba8())
}

fn weapon_kind_from_name(name: &str) -> WeaponKind {
    if name.contains("element") {
        WeaponKind::Elemental
    } else if name.contains("ballist") {
        WeaponKind::Ballistic
    } else if name.contains("explos") {
        WeaponKind::Explosive
    } else if name.contains("energy") {
        WeaponKind::Energy
    } else {
        WeaponKind::Unknown
    }
}

/// Find the first offset where `needle` matches `haystack` within the
/// summed per-channel tolerance. Scan order is top-to-bottom then
/// left-to-right, so the first match has the lowest y, then the lowest x.
pub fn search(haystack: &RgbaImage, needle: &RgbaImage, tolerance: u32) -> Option<(u32, u32)> {
    let (hw, hh) = haystack.dimensions();
    let (nw, nh) = needle.dimensions();
    if nw == 0 || nh == 0 || nw > hw || nh > hh {
        return None;
    }
    let mut y = 0;
    while y <= hh - nh {
        let mut x = 0;
        while x <= hw - nw {
            if patch_matches(haystack, needle, x, y, tolerance) {
                return Some((x, y));
            }
            x += SCAN_STEP;
        }
        y += SCAN_STEP;
    }
    None
}

fn patch_matches(hay: &RgbaImage, needle: &RgbaImage, ox: u32, oy: u32, tolerance: u32) -> bool {
    let (nw, nh) = needle.dimensions();
    let mut j = 0;
    while j < nh {
        let mut i = 0;
        while i < nw {
            let a = hay.get_pixel(ox + i, oy + j);
            let b = needle.get_pixel(i, j);
            if channel_diff(a, b) > tolerance {
                return false;
            }
            i += SAMPLE_STEP;
        }
        j += SAMPLE_STEP;
    }
    true
}

fn channel_diff(a: &Rgba<u8>, b: &Rgba<u8>) -> u32 {
    let dr = (a[0] as i32 - b[0] as i32).unsigned_abs();
    let dg = (a[1] as i32 - b[1] as i32).unsigned_abs();
    let db = (a[2] as i32 - b[2] as i32).unsigned_abs();
    dr + dg + db
}
