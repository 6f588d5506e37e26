//! Settings data types.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Output image format for saved screenshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    #[default]
    Png,
    Jpg,
}

impl ImageFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpg => "jpg",
        }
    }
}

/// User preferences, persisted as TOML at a fixed per-user path.
///
/// Every field has a default, so a partial (or empty) config file is valid;
/// unknown keys are ignored on load.
///
/// # Example TOML
/// ```toml
/// save_directory = "/home/user/Pictures"
/// filename_prefix = "screenshot"
/// format = "png"
/// hotkey_fullscreen = "print_screen"
/// hotkey_region = "ctrl+print_screen"
/// show_preview = true
/// auto_open_folder = false
/// timestamp_overlay = false
/// timestamp_format = "%Y%m%d_%H%M%S"
/// stamp_format = "%Y-%m-%d %H:%M:%S"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Directory screenshots are written to. Created on first save if absent.
    #[serde(default = "default_save_directory")]
    pub save_directory: PathBuf,

    /// Filename prefix; final names are `{prefix}_{timestamp}.{ext}`.
    #[serde(default = "default_filename_prefix")]
    pub filename_prefix: String,

    /// Output image format.
    #[serde(default)]
    pub format: ImageFormat,

    /// Global hotkey combo for full-screen capture.
    #[serde(default = "default_hotkey_fullscreen")]
    pub hotkey_fullscreen: String,

    /// Global hotkey combo for region capture.
    #[serde(default = "default_hotkey_region")]
    pub hotkey_region: String,

    /// Show the preview pane after a capture.
    #[serde(default = "default_true")]
    pub show_preview: bool,

    /// Open the save folder after a capture.
    #[serde(default)]
    pub auto_open_folder: bool,

    /// Stamp the capture time onto the image.
    #[serde(default)]
    pub timestamp_overlay: bool,

    /// chrono format used for the filename timestamp.
    #[serde(default = "default_timestamp_format")]
    pub timestamp_format: String,

    /// chrono format used for the rendered stamp overlay.
    #[serde(default = "default_stamp_format")]
    pub stamp_format: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            save_directory: default_save_directory(),
            filename_prefix: default_filename_prefix(),
            format: ImageFormat::default(),
            hotkey_fullscreen: default_hotkey_fullscreen(),
            hotkey_region: default_hotkey_region(),
            show_preview: true,
            auto_open_folder: false,
            timestamp_overlay: false,
            timestamp_format: default_timestamp_format(),
            stamp_format: default_stamp_format(),
        }
    }
}

fn default_save_directory() -> PathBuf {
    dirs::picture_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

fn default_filename_prefix() -> String {
    "screenshot".to_string()
}

fn default_hotkey_fullscreen() -> String {
    "print_screen".to_string()
}

fn default_hotkey_region() -> String {
    "ctrl+print_screen".to_string()
}

fn default_timestamp_format() -> String {
    "%Y%m%d_%H%M%S".to_string()
}

fn default_stamp_format() -> String {
    "%Y-%m-%d %H:%M:%S".to_string()
}

fn default_true() -> bool {
    true
}
