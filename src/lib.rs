//! Library exports for reusing quickshot subsystems.
//!
//! Exposes the capture pipeline and configuration data structures so that
//! external tools (e.g. GUI frontends) can share the selection, capture, and
//! save logic with the main binary.

pub mod app;
pub mod capture;
pub mod config;
pub mod hotkey;
pub mod save;
pub mod selection;

pub use app::{App, CaptureSuccess, TriggerError};
pub use config::Settings;
