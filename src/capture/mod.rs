//! Screenshot capture: intents, the screen-grab engine, and the optional
//! timestamp overlay transform.

pub mod engine;
pub mod timestamp;
pub mod types;

pub use engine::{CaptureEngine, PrimaryMonitorSource, ScreenSource};
pub use timestamp::apply_timestamp;
pub use types::{CaptureError, CaptureIntent, CapturedImage, ScreenGeometry};
