//! Data types for screenshot capture functionality.

use chrono::{DateTime, Local};
use image::RgbaImage;
use thiserror::Error;

use crate::selection::SelectionRect;

/// The kind of screenshot the user asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureIntent {
    /// Capture the entire screen.
    FullScreen,
    /// Capture a user-selected rectangular region.
    Region,
}

/// Screen dimensions in the logical pixel coordinate space shared by the
/// selection overlay and the capture routine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenGeometry {
    pub width: u32,
    pub height: u32,
}

impl ScreenGeometry {
    /// Returns true if the rectangle lies entirely within the screen.
    pub fn contains(&self, rect: &SelectionRect) -> bool {
        rect.x >= 0
            && rect.y >= 0
            && rect.x as i64 + rect.width as i64 <= self.width as i64
            && rect.y as i64 + rect.height as i64 <= self.height as i64
    }
}

/// A captured screenshot: decoded pixels plus the moment of capture.
///
/// The pixel buffer is immutable after construction; the timestamp overlay
/// produces a stamped copy rather than mutating in place.
#[derive(Debug, Clone)]
pub struct CapturedImage {
    pixels: RgbaImage,
    taken_at: DateTime<Local>,
}

impl CapturedImage {
    pub fn new(pixels: RgbaImage) -> Self {
        Self {
            pixels,
            taken_at: Local::now(),
        }
    }

    /// Rebuilds an image around new pixels, keeping the original capture time.
    pub(crate) fn with_pixels(&self, pixels: RgbaImage) -> Self {
        Self {
            pixels,
            taken_at: self.taken_at,
        }
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn into_pixels(self) -> RgbaImage {
        self.pixels
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn taken_at(&self) -> DateTime<Local> {
        self.taken_at
    }
}

/// Errors that can occur while grabbing pixels from the screen.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// The OS capture primitive failed (no display, permission denied, ...).
    /// Fatal to this capture attempt, never to the process.
    #[error("screen capture unavailable: {0}")]
    Unavailable(String),

    /// The requested region extends beyond the known screen geometry.
    /// Out-of-bounds regions are rejected, not clamped.
    #[error(
        "region {width}x{height} at ({x},{y}) extends beyond the {screen_width}x{screen_height} screen"
    )]
    OutOfBounds {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        screen_width: u32,
        screen_height: u32,
    },
}

impl CaptureError {
    pub(crate) fn out_of_bounds(rect: &SelectionRect, screen: ScreenGeometry) -> Self {
        Self::OutOfBounds {
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
            screen_width: screen.width,
            screen_height: screen.height,
        }
    }
}
