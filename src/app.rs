//! Control layer tying the capture pipeline together.
//!
//! A single task drives captures through the [`App`]; the UI layer feeds
//! pointer events into the selection overlay from its own event loop, so the
//! overlay sits behind a mutex that is only held for the duration of one
//! state transition, never across an await. A capture or save already in
//! flight rejects a second request instead of interleaving filesystem writes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use image::RgbaImage;
use thiserror::Error;
use tokio::sync::oneshot;

use crate::capture::{
    CaptureEngine, CaptureError, CaptureIntent, CapturedImage, apply_timestamp,
};
use crate::config::{ConfigError, Settings};
use crate::hotkey::HotkeyRouter;
use crate::save::{SaveError, SavedFile, save_capture};
use crate::selection::{SelectionError, SelectionOutcome, SelectionOverlay, SelectionRect};

/// A completed capture: the saved file plus an in-memory preview the UI can
/// retain independently of the file on disk.
#[derive(Debug, Clone)]
pub struct CaptureSuccess {
    pub file: SavedFile,
    pub preview: Arc<RgbaImage>,
}

/// Typed failures reported back to the UI. None of these are fatal to the
/// process; each is scoped to a single user-triggered operation.
#[derive(Debug, Error)]
pub enum TriggerError {
    #[error("a capture is already in progress")]
    AlreadyInProgress,

    #[error(transparent)]
    Selection(#[from] SelectionError),

    #[error(transparent)]
    Capture(#[from] CaptureError),

    /// The capture is carried alongside the save error so it is not lost;
    /// the UI may keep rendering it and retry with different settings.
    #[error("{source}")]
    Save {
        #[source]
        source: SaveError,
        preview: Arc<RgbaImage>,
    },
}

/// Clears the in-flight flag when a capture attempt ends, however it ends.
struct InFlightGuard(Arc<AtomicBool>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub struct App {
    settings: Settings,
    engine: CaptureEngine,
    overlay: Mutex<SelectionOverlay>,
    in_flight: Arc<AtomicBool>,
}

impl App {
    pub fn new(settings: Settings) -> Self {
        Self::with_engine(settings, CaptureEngine::new())
    }

    pub fn with_engine(settings: Settings, engine: CaptureEngine) -> Self {
        Self {
            settings,
            engine,
            overlay: Mutex::new(SelectionOverlay::new()),
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Applies and persists new settings. Persistence errors are surfaced but
    /// the in-memory settings are already updated; the next capture uses them.
    pub fn apply_settings(&mut self, settings: Settings) -> Result<(), ConfigError> {
        self.settings = settings;
        self.settings.save()
    }

    /// Runs a resolved capture intent to completion: grab, optional timestamp
    /// stamp, save. Synchronous and bounded; a concurrent request is rejected
    /// with [`TriggerError::AlreadyInProgress`].
    pub fn capture_full(&self) -> Result<CaptureSuccess, TriggerError> {
        let _guard = self.acquire_in_flight()?;
        let image = self.engine.capture_full_screen()?;
        self.finish(image)
    }

    /// See [`App::capture_full`]. Rejects out-of-bounds rectangles.
    pub fn capture_region(&self, rect: SelectionRect) -> Result<CaptureSuccess, TriggerError> {
        let _guard = self.acquire_in_flight()?;
        let image = self.engine.capture_region(rect)?;
        self.finish(image)
    }

    /// Arms the selection overlay over the same screen geometry the capture
    /// routine uses and returns the future the drag resolves.
    pub fn begin_region_selection(
        &self,
    ) -> Result<oneshot::Receiver<SelectionOutcome>, TriggerError> {
        let geometry = self.engine.screen_geometry()?;
        Ok(self.overlay().begin_selection(geometry)?)
    }

    // Pointer feed, forwarded by the UI layer from its event loop.

    pub fn pointer_pressed(&self, x: i32, y: i32) {
        self.overlay().pointer_pressed(x, y);
    }

    /// Returns the live feedback rectangle to render, if any.
    pub fn pointer_moved(&self, x: i32, y: i32) -> Option<SelectionRect> {
        self.overlay().pointer_moved(x, y)
    }

    pub fn pointer_released(&self, x: i32, y: i32) {
        self.overlay().pointer_released(x, y);
    }

    /// Escape pressed or input focus lost.
    pub fn cancel_selection(&self) {
        self.overlay().cancel();
    }

    /// Full capture flow for one intent. Region intents first resolve the
    /// selection overlay; a cancelled selection completes with `Ok(None)` and
    /// no capture occurs. Once the engine has been invoked the operation runs
    /// to completion or failure.
    pub async fn trigger_capture(
        &self,
        intent: CaptureIntent,
    ) -> Result<Option<CaptureSuccess>, TriggerError> {
        match intent {
            CaptureIntent::FullScreen => self.capture_full().map(Some),
            CaptureIntent::Region => {
                let resolved = self.begin_region_selection()?;
                match resolved.await {
                    Ok(SelectionOutcome::Selected(rect)) => self.capture_region(rect).map(Some),
                    // Cancelled, or the overlay was torn down.
                    Ok(SelectionOutcome::Cancelled) | Err(_) => Ok(None),
                }
            }
        }
    }

    fn overlay(&self) -> MutexGuard<'_, SelectionOverlay> {
        // A poisoned overlay lock only means a panic mid-transition; the
        // state machine itself is still consistent.
        self.overlay.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn acquire_in_flight(&self) -> Result<InFlightGuard, TriggerError> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(TriggerError::AlreadyInProgress);
        }
        Ok(InFlightGuard(Arc::clone(&self.in_flight)))
    }

    fn finish(&self, image: CapturedImage) -> Result<CaptureSuccess, TriggerError> {
        let image = if self.settings.timestamp_overlay {
            apply_timestamp(&image, &self.settings.stamp_format)
        } else {
            image
        };
        match save_capture(&image, &self.settings) {
            Ok(file) => Ok(CaptureSuccess {
                file,
                preview: Arc::new(image.into_pixels()),
            }),
            Err(source) => Err(TriggerError::Save {
                source,
                preview: Arc::new(image.into_pixels()),
            }),
        }
    }
}

/// Hotkey daemon loop for the binary: binds the configured combos and serves
/// intents until the channel closes. Region intents need a UI frontend to
/// feed pointer events into the overlay, so in this headless loop they are
/// logged and skipped; `quickshot --region X,Y,WxH` covers one-shot region
/// captures.
pub fn run_listen(settings: Settings) -> anyhow::Result<()> {
    use anyhow::Context;

    let (mut router, mut intent_rx) = HotkeyRouter::new();
    router
        .register(&settings.hotkey_fullscreen, CaptureIntent::FullScreen)
        .context("binding full-screen hotkey")?;
    router
        .register(&settings.hotkey_region, CaptureIntent::Region)
        .context("binding region hotkey")?;
    router.start().context("starting hotkey listener")?;

    log::info!(
        "listening: {} = full screen, {} = region",
        settings.hotkey_fullscreen,
        settings.hotkey_region
    );

    let app = App::new(settings);
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("building runtime")?;

    runtime.block_on(async move {
        while let Some(intent) = intent_rx.recv().await {
            match intent {
                CaptureIntent::FullScreen => match app.capture_full() {
                    Ok(success) => {
                        println!("{}", success.file.path.display());
                    }
                    Err(e) => log::error!("capture failed: {e}"),
                },
                CaptureIntent::Region => {
                    log::warn!(
                        "region hotkey fired, but no overlay frontend is attached; \
                         use --region X,Y,WxH for one-shot region captures"
                    );
                }
            }
        }
    });

    router.stop();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::engine::tests::{DeadScreen, FakeScreen};
    use tempfile::TempDir;

    fn test_app(dir: &TempDir) -> App {
        let settings = Settings {
            save_directory: dir.path().to_path_buf(),
            filename_prefix: "shot".to_string(),
            ..Settings::default()
        };
        let engine = CaptureEngine::with_source(Arc::new(FakeScreen {
            width: 800,
            height: 600,
        }));
        App::with_engine(settings, engine)
    }

    #[tokio::test]
    async fn full_screen_intent_saves_and_returns_preview() {
        let dir = TempDir::new().unwrap();
        let app = test_app(&dir);

        let success = app
            .trigger_capture(CaptureIntent::FullScreen)
            .await
            .unwrap()
            .unwrap();
        assert!(success.file.path.exists());
        assert_eq!((success.preview.width(), success.preview.height()), (800, 600));
    }

    #[tokio::test]
    async fn region_intent_runs_selection_then_capture() {
        let dir = TempDir::new().unwrap();
        let app = test_app(&dir);

        let pending = app.trigger_capture(CaptureIntent::Region);
        tokio::pin!(pending);
        // The future is pending until the drag resolves.
        tokio::select! {
            biased;
            _ = &mut pending => panic!("resolved before any pointer input"),
            _ = tokio::task::yield_now() => {}
        }

        app.pointer_pressed(100, 100);
        assert!(app.pointer_moved(200, 200).is_some());
        app.pointer_released(300, 250);

        let success = pending.await.unwrap().unwrap();
        assert_eq!(
            (success.preview.width(), success.preview.height()),
            (200, 150)
        );
        assert!(success.file.path.exists());
    }

    #[tokio::test]
    async fn cancelled_selection_captures_nothing() {
        let dir = TempDir::new().unwrap();
        let app = test_app(&dir);

        let pending = app.trigger_capture(CaptureIntent::Region);
        tokio::pin!(pending);
        tokio::select! {
            biased;
            _ = &mut pending => panic!("resolved before cancel"),
            _ = tokio::task::yield_now() => {}
        }
        app.cancel_selection();

        assert!(pending.await.unwrap().is_none());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn zero_area_drag_captures_nothing() {
        let dir = TempDir::new().unwrap();
        let app = test_app(&dir);

        let pending = app.trigger_capture(CaptureIntent::Region);
        tokio::pin!(pending);
        tokio::select! {
            biased;
            _ = &mut pending => panic!("resolved before pointer input"),
            _ = tokio::task::yield_now() => {}
        }
        app.pointer_pressed(50, 50);
        app.pointer_released(50, 50);

        assert!(pending.await.unwrap().is_none());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn concurrent_capture_is_rejected() {
        let dir = TempDir::new().unwrap();
        let app = test_app(&dir);

        let guard = app.acquire_in_flight().unwrap();
        assert!(matches!(
            app.capture_full(),
            Err(TriggerError::AlreadyInProgress)
        ));
        drop(guard);
        assert!(app.capture_full().is_ok());
    }

    #[test]
    fn second_selection_session_is_rejected() {
        let dir = TempDir::new().unwrap();
        let app = test_app(&dir);

        let _rx = app.begin_region_selection().unwrap();
        assert!(matches!(
            app.begin_region_selection(),
            Err(TriggerError::Selection(SelectionError::AlreadyInProgress))
        ));
    }

    #[test]
    fn timestamp_overlay_is_applied_per_settings() {
        let dir = TempDir::new().unwrap();
        let mut app = test_app(&dir);

        let plain = app.capture_full().unwrap();
        app.settings.timestamp_overlay = true;
        let stamped = app.capture_full().unwrap();

        assert_eq!(
            (plain.preview.width(), plain.preview.height()),
            (stamped.preview.width(), stamped.preview.height())
        );
        assert_ne!(plain.preview.as_raw(), stamped.preview.as_raw());
    }

    #[test]
    fn failed_save_keeps_the_capture_in_memory() {
        let dir = TempDir::new().unwrap();
        // A file where the save directory should be, so the save must fail.
        let blocked = dir.path().join("blocked");
        std::fs::write(&blocked, b"file, not dir").unwrap();

        let settings = Settings {
            save_directory: blocked,
            filename_prefix: "shot".to_string(),
            ..Settings::default()
        };
        let app = App::with_engine(
            settings,
            CaptureEngine::with_source(Arc::new(FakeScreen {
                width: 800,
                height: 600,
            })),
        );

        match app.capture_full() {
            Err(TriggerError::Save { source, preview }) => {
                assert!(matches!(source, SaveError::Io(_)));
                // The captured pixels survive the failure for retry/display.
                assert_eq!((preview.width(), preview.height()), (800, 600));
            }
            other => panic!("expected a save failure carrying the capture, got {other:?}"),
        }
    }

    #[test]
    fn dead_screen_error_is_scoped_to_the_attempt() {
        let dir = TempDir::new().unwrap();
        let settings = Settings {
            save_directory: dir.path().to_path_buf(),
            ..Settings::default()
        };
        let app = App::with_engine(
            settings,
            CaptureEngine::with_source(Arc::new(DeadScreen)),
        );

        assert!(matches!(
            app.capture_full(),
            Err(TriggerError::Capture(CaptureError::Unavailable(_)))
        ));
        // The in-flight flag was released; a retry is possible.
        assert!(matches!(
            app.capture_full(),
            Err(TriggerError::Capture(CaptureError::Unavailable(_)))
        ));
    }
}
