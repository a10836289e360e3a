//! Synthetic input injection
//!
//! Resolves target rectangles and fractional window positions to absolute
//! screen points, scatters them slightly, and hands them to the platform
//! backend. The backend is contracted to post press/release to the
//! top-level window under the point without moving the operator's cursor.

use std::thread;
use std::time::Duration;

use crate::platform::{Key, Platform, Point, Rect, WindowHandle};
use crate::stealth::Humanizer;

/// Pixel scatter applied to rect-centered clicks.
const RECT_JITTER_PX: i32 = 4;

/// Click/key delivery front-end. Failures are logged and reported to the
/// caller; there is no retry within a cycle.
pub struct Injector {
    rng: Humanizer,
}

impl Default for Injector {
    fn default() -> Self {
        Self::new()
    }
}

impl Injector {
    pub fn new() -> Self {
        Self {
            rng: Humanizer::new(),
        }
    }

    /// Deterministic instance for tests.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Humanizer::seeded(seed),
        }
    }

    /// Click the center of a detected rectangle, scattered by a few pixels.
    /// Returns whether delivery succeeded; the optional post-delay paces
    /// action cadence after a successful click.
    pub fn click_rect<P: Platform>(&mut self, platform: &P, rect: Rect, delay: Duration) -> bool {
        let center = rect.center();
        let (dx, dy) = self.rng.pixel_jitter(RECT_JITTER_PX);
        self.deliver_click(
            platform,
            Point {
                x: center.x + dx,
                y: center.y + dy,
            },
            delay,
        )
    }

    /// Click a fractional position inside the window, each axis scattered
    /// by its own jitter range.
    #[allow(clippy::too_many_arguments)]
    pub fn click_fraction<P: Platform>(
        &mut self,
        platform: &P,
        win: Rect,
        nx: f64,
        ny: f64,
        jitter_x: f64,
        jitter_y: f64,
        delay: Duration,
    ) -> bool {
        if win.is_empty() {
            return false;
        }
        let fx = (nx + self.rng.offset(jitter_x)).clamp(0.0, 1.0);
        let fy = (ny + self.rng.offset(jitter_y)).clamp(0.0, 1.0);
        let point = win.fraction_point(fx, fy);
        self.deliver_click(platform, point, delay)
    }

    fn deliver_click<P: Platform>(&mut self, platform: &P, point: Point, delay: Duration) -> bool {
        match platform.click_at(point) {
            Ok(()) => {
                if !delay.is_zero() {
                    thread::sleep(delay);
                }
                true
            }
            Err(err) => {
                log::warn!("click at ({}, {}) failed: {err}", point.x, point.y);
                false
            }
        }
    }

    /// Press and release a key, holding it for `hold`. `window == None`
    /// targets the current foreground window.
    pub fn key_tap<P: Platform>(
        &mut self,
        platform: &P,
        window: Option<WindowHandle>,
        key: Key,
        hold: Duration,
    ) -> bool {
        if let Err(err) = platform.key_event(window, key, true) {
            log::warn!("key down {key:?} failed: {err}");
            return false;
        }
        if !hold.is_zero() {
            thread::sleep(hold);
        }
        match platform.key_event(window, key, false) {
            Ok(()) => true,
            Err(err) => {
                log::warn!("key up {key:?} failed: {err}");
                false
            }
        }
    }

}
