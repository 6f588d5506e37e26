//! Interactive region selection.
//!
//! The overlay surface itself (a transparent full-screen window) is owned by
//! the UI layer; this module holds the part that needs to be correct: an
//! explicit pointer state machine that turns a drag into a normalized
//! screen-pixel rectangle, with cancellation and re-entrancy guards that are
//! testable without a live display.

use std::str::FromStr;

use thiserror::Error;
use tokio::sync::oneshot;

use crate::capture::ScreenGeometry;

/// A normalized selection rectangle in screen-pixel coordinates.
///
/// Invariant: `width >= 1` and `height >= 1`. Zero-area drags never produce
/// a `SelectionRect`; they resolve to [`SelectionOutcome::Cancelled`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl SelectionRect {
    /// Builds the normalized bounding box of two drag endpoints:
    /// `x = min(x0,x1)`, `y = min(y0,y1)`, `width = |x1-x0|`,
    /// `height = |y1-y0|`. Returns `None` when either span is zero.
    pub fn from_drag(x0: i32, y0: i32, x1: i32, y1: i32) -> Option<Self> {
        let width = x0.abs_diff(x1);
        let height = y0.abs_diff(y1);
        if width == 0 || height == 0 {
            return None;
        }
        Some(Self {
            x: x0.min(x1),
            y: y0.min(y1),
            width,
            height,
        })
    }
}

impl std::fmt::Display for SelectionRect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{},{}x{}", self.x, self.y, self.width, self.height)
    }
}

impl FromStr for SelectionRect {
    type Err = String;

    /// Parses `"X,Y,WxH"`, e.g. `"100,100,200x150"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || format!("expected X,Y,WxH (e.g. 100,100,200x150), got '{s}'");
        let mut parts = s.split(',');
        let x = parts.next().ok_or_else(err)?.trim();
        let y = parts.next().ok_or_else(err)?.trim();
        let size = parts.next().ok_or_else(err)?.trim();
        if parts.next().is_some() {
            return Err(err());
        }
        let (w, h) = size.split_once('x').ok_or_else(err)?;

        let x: i32 = x.parse().map_err(|_| err())?;
        let y: i32 = y.parse().map_err(|_| err())?;
        let width: u32 = w.trim().parse().map_err(|_| err())?;
        let height: u32 = h.trim().parse().map_err(|_| err())?;
        if width == 0 || height == 0 {
            return Err(format!("region must have non-zero area, got '{s}'"));
        }
        Ok(Self {
            x,
            y,
            width,
            height,
        })
    }
}

/// How a selection session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionOutcome {
    Selected(SelectionRect),
    /// Zero-area release, Escape, or focus loss. No capture occurs.
    Cancelled,
}

#[derive(Debug, Error)]
pub enum SelectionError {
    #[error("a region selection is already in progress")]
    AlreadyInProgress,
}

/// Pointer state of the active session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OverlayState {
    /// No overlay visible.
    Idle,
    /// Overlay shown, pointer-down not yet observed.
    Armed,
    /// Pointer is down; tracking the drag from `origin`.
    Dragging { origin: (i32, i32) },
}

/// Drag-to-select state machine: `Idle -> Armed -> Dragging -> Resolved | Cancelled`.
///
/// Exactly one session may be active at a time. The UI layer feeds pointer
/// events on the thread that owns the event loop; the `begin_selection`
/// future resolves asynchronously from the caller's perspective.
pub struct SelectionOverlay {
    state: OverlayState,
    bounds: ScreenGeometry,
    pending: Option<oneshot::Sender<SelectionOutcome>>,
}

impl SelectionOverlay {
    pub fn new() -> Self {
        Self {
            state: OverlayState::Idle,
            bounds: ScreenGeometry {
                width: 0,
                height: 0,
            },
            pending: None,
        }
    }

    /// Arms the overlay and returns a future resolving to the selection
    /// outcome. `bounds` must come from the same source the capture routine
    /// uses, so overlay coordinates map 1:1 onto captured pixels.
    pub fn begin_selection(
        &mut self,
        bounds: ScreenGeometry,
    ) -> Result<oneshot::Receiver<SelectionOutcome>, SelectionError> {
        if self.pending.is_some() {
            return Err(SelectionError::AlreadyInProgress);
        }
        let (tx, rx) = oneshot::channel();
        self.pending = Some(tx);
        self.state = OverlayState::Armed;
        self.bounds = bounds;
        log::debug!(
            "selection armed over {}x{} screen",
            bounds.width,
            bounds.height
        );
        Ok(rx)
    }

    pub fn is_active(&self) -> bool {
        self.pending.is_some()
    }

    /// Pointer-down: records the drag origin. Ignored unless armed.
    pub fn pointer_pressed(&mut self, x: i32, y: i32) {
        if self.state == OverlayState::Armed {
            let origin = self.clamp(x, y);
            self.state = OverlayState::Dragging { origin };
        }
    }

    /// Pointer-move: returns the live feedback rectangle (bounding box of the
    /// origin and the current point), or `None` when not dragging or the box
    /// still has zero area.
    pub fn pointer_moved(&mut self, x: i32, y: i32) -> Option<SelectionRect> {
        match self.state {
            OverlayState::Dragging { origin } => {
                let (cx, cy) = self.clamp(x, y);
                SelectionRect::from_drag(origin.0, origin.1, cx, cy)
            }
            _ => None,
        }
    }

    /// Pointer-up: resolves the session. A zero-area release cancels instead
    /// of selecting.
    pub fn pointer_released(&mut self, x: i32, y: i32) {
        if let OverlayState::Dragging { origin } = self.state {
            let (rx, ry) = self.clamp(x, y);
            match SelectionRect::from_drag(origin.0, origin.1, rx, ry) {
                Some(rect) => self.resolve(SelectionOutcome::Selected(rect)),
                None => {
                    log::debug!("zero-area release, treating as cancellation");
                    self.resolve(SelectionOutcome::Cancelled);
                }
            }
        }
    }

    /// Explicit cancellation: Escape key or loss of input focus. Safe to call
    /// in any state.
    pub fn cancel(&mut self) {
        if self.pending.is_some() {
            self.resolve(SelectionOutcome::Cancelled);
        }
    }

    fn resolve(&mut self, outcome: SelectionOutcome) {
        self.state = OverlayState::Idle;
        if let Some(tx) = self.pending.take() {
            // The receiver may already be gone; nothing left to notify then.
            let _ = tx.send(outcome);
        }
    }

    fn clamp(&self, x: i32, y: i32) -> (i32, i32) {
        let max_x = self.bounds.width.saturating_sub(1) as i32;
        let max_y = self.bounds.height.saturating_sub(1) as i32;
        (x.clamp(0, max_x.max(0)), y.clamp(0, max_y.max(0)))
    }
}

impl Default for SelectionOverlay {
    fn default() -> Self {
        Self::new()
    }
}
