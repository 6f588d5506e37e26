//! Screen grabbing.

use std::sync::Arc;

use image::RgbaImage;
use image::imageops;
use xcap::Monitor;

use super::types::{CaptureError, CapturedImage, ScreenGeometry};
use crate::selection::SelectionRect;

/// Abstraction over the OS screen-grab primitive. The selection overlay reads
/// its geometry from the same source, so overlay coordinates and captured
/// pixels share one coordinate space. Mockable in tests.
pub trait ScreenSource: Send + Sync {
    fn geometry(&self) -> Result<ScreenGeometry, CaptureError>;
    fn grab(&self) -> Result<RgbaImage, CaptureError>;
}

/// Grabs the primary monitor via `xcap`.
pub struct PrimaryMonitorSource;

impl PrimaryMonitorSource {
    fn monitor() -> Result<Monitor, CaptureError> {
        let monitors =
            Monitor::all().map_err(|e| CaptureError::Unavailable(e.to_string()))?;
        let primary = monitors.iter().position(|m| m.is_primary()).unwrap_or(0);
        monitors
            .into_iter()
            .nth(primary)
            .ok_or_else(|| CaptureError::Unavailable("no active display".to_string()))
    }
}

impl ScreenSource for PrimaryMonitorSource {
    fn geometry(&self) -> Result<ScreenGeometry, CaptureError> {
        let monitor = Self::monitor()?;
        Ok(ScreenGeometry {
            width: monitor.width(),
            height: monitor.height(),
        })
    }

    fn grab(&self) -> Result<RgbaImage, CaptureError> {
        let monitor = Self::monitor()?;
        monitor
            .capture_image()
            .map_err(|e| CaptureError::Unavailable(e.to_string()))
    }
}

/// Produces in-memory images for full-screen and region capture intents.
///
/// Calls are synchronous and bounded; a failing OS primitive surfaces as
/// [`CaptureError::Unavailable`] for that attempt only.
pub struct CaptureEngine {
    source: Arc<dyn ScreenSource>,
}

impl CaptureEngine {
    pub fn new() -> Self {
        Self::with_source(Arc::new(PrimaryMonitorSource))
    }

    /// Builds an engine around a custom source (used by tests).
    pub fn with_source(source: Arc<dyn ScreenSource>) -> Self {
        Self { source }
    }

    /// Screen geometry as the capture routine sees it. The overlay must be
    /// armed with exactly this value.
    pub fn screen_geometry(&self) -> Result<ScreenGeometry, CaptureError> {
        self.source.geometry()
    }

    pub fn capture_full_screen(&self) -> Result<CapturedImage, CaptureError> {
        let pixels = self.source.grab()?;
        log::info!(
            "captured full screen: {}x{}",
            pixels.width(),
            pixels.height()
        );
        Ok(CapturedImage::new(pixels))
    }

    /// Captures a region by cropping a full-screen grab, guaranteeing that a
    /// region capture is pixel-identical to the same crop of a full-screen
    /// capture. Rejects rectangles extending beyond the screen with
    /// [`CaptureError::OutOfBounds`]; no clamping is performed.
    pub fn capture_region(&self, rect: SelectionRect) -> Result<CapturedImage, CaptureError> {
        let screen = self.source.geometry()?;
        if !screen.contains(&rect) {
            return Err(CaptureError::out_of_bounds(&rect, screen));
        }

        let full = self.source.grab()?;
        let cropped = imageops::crop_imm(
            &full,
            rect.x as u32,
            rect.y as u32,
            rect.width,
            rect.height,
        )
        .to_image();
        log::info!(
            "captured region {}x{} at ({},{})",
            rect.width,
            rect.height,
            rect.x,
            rect.y
        );
        Ok(CapturedImage::new(cropped))
    }
}

impl Default for CaptureEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use image::Rgba;

    /// Deterministic gradient screen for tests.
    pub(crate) struct FakeScreen {
        pub width: u32,
        pub height: u32,
    }

    impl ScreenSource for FakeScreen {
        fn geometry(&self) -> Result<ScreenGeometry, CaptureError> {
            Ok(ScreenGeometry {
                width: self.width,
                height: self.height,
            })
        }

        fn grab(&self) -> Result<RgbaImage, CaptureError> {
            Ok(RgbaImage::from_fn(self.width, self.height, |x, y| {
                Rgba([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8, 255])
            }))
        }
    }

    pub(crate) struct DeadScreen;

    impl ScreenSource for DeadScreen {
        fn geometry(&self) -> Result<ScreenGeometry, CaptureError> {
            Err(CaptureError::Unavailable("no active display".into()))
        }

        fn grab(&self) -> Result<RgbaImage, CaptureError> {
            Err(CaptureError::Unavailable("no active display".into()))
        }
    }

    fn engine() -> CaptureEngine {
        CaptureEngine::with_source(Arc::new(FakeScreen {
            width: 640,
            height: 480,
        }))
    }

    #[test]
    fn full_screen_matches_geometry() {
        let image = engine().capture_full_screen().unwrap();
        assert_eq!((image.width(), image.height()), (640, 480));
    }

    #[test]
    fn region_capture_equals_cropped_full_screen() {
        let engine = engine();
        let rect = SelectionRect {
            x: 100,
            y: 100,
            width: 200,
            height: 150,
        };
        let region = engine.capture_region(rect).unwrap();
        assert_eq!((region.width(), region.height()), (200, 150));

        let full = engine.capture_full_screen().unwrap();
        let cropped =
            imageops::crop_imm(full.pixels(), 100, 100, 200, 150).to_image();
        assert_eq!(region.pixels().as_raw(), cropped.as_raw());
    }

    #[test]
    fn out_of_bounds_region_is_rejected() {
        let engine = engine();
        let rect = SelectionRect {
            x: 600,
            y: 400,
            width: 100,
            height: 100,
        };
        assert!(matches!(
            engine.capture_region(rect),
            Err(CaptureError::OutOfBounds { .. })
        ));

        let negative = SelectionRect {
            x: -10,
            y: 0,
            width: 50,
            height: 50,
        };
        assert!(matches!(
            engine.capture_region(negative),
            Err(CaptureError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn edge_touching_region_is_accepted() {
        let rect = SelectionRect {
            x: 540,
            y: 380,
            width: 100,
            height: 100,
        };
        assert!(engine().capture_region(rect).is_ok());
    }

    #[test]
    fn dead_screen_surfaces_unavailable() {
        let engine = CaptureEngine::with_source(Arc::new(DeadScreen));
        assert!(matches!(
            engine.capture_full_screen(),
            Err(CaptureError::Unavailable(_))
        ));
    }
}
