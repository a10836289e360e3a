//! In-memory backend for exercising the core without a real desktop
//!
//! The fake holds a virtual screen image that tests (and the CLI demo) paint
//! buttons onto, and records every synthetic input it is asked to deliver.

use std::sync::{Arc, Mutex};

use image::{Rgba, RgbaImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect as PixelRect;

use super::{Key, Platform, PlatformError, Point, Rect, WindowHandle, WindowProvider};

/// One recorded input event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputRecord {
    Click(Point),
    Key { key: Key, down: bool },
}

/// Fake platform + window provider backed by a virtual screen image.
///
/// The "desktop" window set via [`FakePlatform::set_window`] becomes
/// visible to [`WindowProvider::attached`] only after a `try_attach`
/// discovers it, mirroring the real attach flow; `with_window` starts
/// pre-attached for convenience.
pub struct FakePlatform {
    screen: Mutex<RgbaImage>,
    window: Mutex<Option<(WindowHandle, Rect)>>,
    bound: Mutex<Option<WindowHandle>>,
    inputs: Arc<Mutex<Vec<InputRecord>>>,
    foreground_calls: Arc<Mutex<u32>>,
    /// When true, input delivery fails as if the target window vanished.
    pub fail_input: bool,
}

impl FakePlatform {
    /// A virtual screen of the given size, filled with near-black.
    pub fn new(width: u32, height: u32) -> Self {
        let screen = RgbaImage::from_pixel(width, height, Rgba([10, 10, 10, 255]));
        Self {
            screen: Mutex::new(screen),
            window: Mutex::new(None),
            bound: Mutex::new(None),
            inputs: Arc::new(Mutex::new(Vec::new())),
            foreground_calls: Arc::new(Mutex::new(0)),
            fail_input: false,
        }
    }

    /// A fake with an already-attached window covering the whole virtual
    /// screen.
    pub fn with_window(width: u32, height: u32) -> Self {
        let fake = Self::new(width, height);
        fake.set_window(Some((
            WindowHandle(1),
            Rect::new(0, 0, width as i32, height as i32),
        )));
        fake.auto_bind();
        fake
    }

    /// Place (or remove) the window on the virtual desktop. Removing it
    /// also drops any existing attachment; a newly placed window has to be
    /// discovered via `try_attach`.
    pub fn set_window(&self, window: Option<(WindowHandle, Rect)>) {
        *self.window.lock().unwrap() = window;
        if window.is_none() {
            *self.bound.lock().unwrap() = None;
        }
    }

    fn auto_bind(&self) -> Option<WindowHandle> {
        let handle = self.window.lock().unwrap().map(|(h, _)| h);
        *self.bound.lock().unwrap() = handle;
        handle
    }

    /// Paint a solid block onto the virtual screen (screen coordinates).
    pub fn paint(&self, rect: Rect, color: Rgba<u8>) {
        if rect.is_empty() {
            return;
        }
        let mut screen = self.screen.lock().unwrap();
        draw_filled_rect_mut(
            &mut *screen,
            PixelRect::at(rect.left, rect.top).of_size(rect.width() as u32, rect.height() as u32),
            color,
        );
    }

    /// Handle for inspecting recorded inputs from another thread.
    pub fn input_log(&self) -> Arc<Mutex<Vec<InputRecord>>> {
        Arc::clone(&self.inputs)
    }

    pub fn clicks(&self) -> Vec<Point> {
        self.inputs
            .lock()
            .unwrap()
            .iter()
            .filter_map(|r| match r {
                InputRecord::Click(p) => Some(*p),
                InputRecord::Key { .. } => None,
            })
            .collect()
    }

    pub fn key_events(&self) -> Vec<(Key, bool)> {
        self.inputs
            .lock()
            .unwrap()
            .iter()
            .filter_map(|r| match r {
                InputRecord::Key { key, down } => Some((*key, *down)),
                InputRecord::Click(_) => None,
            })
            .collect()
    }

    pub fn clear_inputs(&self) {
        self.inputs.lock().unwrap().clear();
    }

    pub fn foreground_calls(&self) -> u32 {
        *self.foreground_calls.lock().unwrap()
    }
}

impl Platform for FakePlatform {
    fn capture_region(&self, rect: Rect) -> Option<RgbaImage> {
        if rect.is_empty() {
            return None;
        }
        let screen = self.screen.lock().unwrap();
        let (sw, sh) = screen.dimensions();
        if rect.left < 0
            || rect.top < 0
            || rect.right > sw as i32
            || rect.bottom > sh as i32
        {
            return None;
        }
        let crop = image::imageops::crop_imm(
            &*screen,
            rect.left as u32,
            rect.top as u32,
            rect.width() as u32,
            rect.height() as u32,
        );
        Some(crop.to_image())
    }

    fn click_at(&self, point: Point) -> Result<(), PlatformError> {
        if self.fail_input {
            return Err(PlatformError::WindowGone);
        }
        self.inputs.lock().unwrap().push(InputRecord::Click(point));
        Ok(())
    }

    fn key_event(
        &self,
        _window: Option<WindowHandle>,
        key: Key,
        down: bool,
    ) -> Result<(), PlatformError> {
        if self.fail_input {
            return Err(PlatformError::WindowGone);
        }
        self.inputs
            .lock()
            .unwrap()
            .push(InputRecord::Key { key, down });
        Ok(())
    }
}

impl WindowProvider for FakePlatform {
    fn attached(&self) -> Option<WindowHandle> {
        let bound = (*self.bound.lock().unwrap())?;
        self.window
            .lock()
            .unwrap()
            .filter(|(h, _)| *h == bound)
            .map(|(h, _)| h)
    }

    fn window_rect(&self, window: WindowHandle) -> Option<Rect> {
        self.window
            .lock()
            .unwrap()
            .filter(|(h, _)| *h == window)
            .map(|(_, r)| r)
    }

    fn try_attach(&mut self) -> Option<WindowHandle> {
        self.auto_bind()
    }

    fn bring_to_foreground(&self, _window: WindowHandle) {
        *self.foreground_calls.lock().unwrap() += 1;
    }
}

// Shared-handle forwarding, so one fake can serve as both the platform
// backend and the window provider while the caller keeps a handle for
// painting and inspection.
impl Platform for Arc<FakePlatform> {
    fn capture_region(&self, rect: Rect) -> Option<RgbaImage> {
        self.as_ref().capture_region(rect)
    }

    fn click_at(&self, point: Point) -> Result<(), PlatformError> {
        self.as_ref().click_at(point)
    }

    fn key_event(
        &self,
        window: Option<WindowHandle>,
        key: Key,
        down: bool,
    ) -> Result<(), PlatformError> {
        self.as_ref().key_event(window, key, down)
    }
}

impl WindowProvider for Arc<FakePlatform> {
    fn attached(&self) -> Option<WindowHandle> {
        self.as_ref().attached()
    }

    fn window_rect(&self, window: WindowHandle) -> Option<Rect> {
        self.as_ref().window_rect(window)
    }

    fn try_attach(&mut self) -> Option<WindowHandle> {
        self.as_ref().auto_bind()
    }

    fn bring_to_foreground(&self, window: WindowHandle) {
        self.as_ref().bring_to_foreground(window);
    }
}
