//! Platform abstraction for screen capture and synthetic input
//!
//! The decision and vision logic never touches the OS directly; everything
//! goes through the [`Platform`] and [`WindowProvider`] traits so the core
//! stays testable against a fake backend.

pub mod fake;

use image::RgbaImage;

/// Opaque handle to a host window, as issued by the window provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowHandle(pub u64);

/// A point in absolute screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

/// A rectangle in absolute screen coordinates (left/top inclusive,
/// right/bottom exclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Build a rectangle from an origin and a size.
    pub fn from_xywh(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            left: x,
            top: y,
            right: x + width.max(0),
            bottom: y + height.max(0),
        }
    }

    /// Build a rectangle centered on a point.
    pub fn centered_at(cx: i32, cy: i32, width: i32, height: i32) -> Self {
        Self::from_xywh(cx - width / 2, cy - height / 2, width, height)
    }

    pub fn width(&self) -> i32 {
        (self.right - self.left).max(0)
    }

    pub fn height(&self) -> i32 {
        (self.bottom - self.top).max(0)
    }

    pub fn center(&self) -> Point {
        Point {
            x: self.left + self.width() / 2,
            y: self.top + self.height() / 2,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// Resolve a fractional (0..1) position inside this rectangle to an
    /// absolute screen point.
    pub fn fraction_point(&self, nx: f64, ny: f64) -> Point {
        Point {
            x: self.left + (self.width() as f64 * nx) as i32,
            y: self.top + (self.height() as f64 * ny) as i32,
        }
    }

}

/// Keys the injector can post to a game window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    W,
    A,
    S,
    D,
    Space,
    Up,
    Down,
    Left,
    Right,
}

/// Errors from synthetic input delivery.
///
/// Capture misses are not errors; they surface as `None` from
/// [`Platform::capture_region`].
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    #[error("target window is gone")]
    WindowGone,
    #[error("input delivery failed: {0}")]
    Delivery(String),
}

/// Backend contract for pixel capture and synthetic input.
///
/// Implementations must deliver clicks as a press/release pair posted to the
/// top-level window under the given screen point, without repositioning the
/// real cursor. `key_event` targets the given window, or the current
/// foreground window when `window` is `None`.
pub trait Platform {
    /// Capture the pixels inside `rect`. Any failure (out of bounds, capture
    /// error) yields `None`.
    fn capture_region(&self, rect: Rect) -> Option<RgbaImage>;

    fn click_at(&self, point: Point) -> Result<(), PlatformError>;

    fn key_event(
        &self,
        window: Option<WindowHandle>,
        key: Key,
        down: bool,
    ) -> Result<(), PlatformError>;
}

/// Window attach/liveness collaborator.
///
/// Enumeration and scoring of candidate windows lives outside the core; the
/// core only asks whether a window is attached and where it is.
pub trait WindowProvider {
    /// Currently attached window, if any and still alive.
    fn attached(&self) -> Option<WindowHandle>;

    /// Screen rectangle of the given window, `None` once it is gone.
    fn window_rect(&self, window: WindowHandle) -> Option<Rect>;

    /// Attempt to (re)bind to a target window.
    fn try_attach(&mut self) -> Option<WindowHandle>;

    fn bring_to_foreground(&self, window: WindowHandle);
}
