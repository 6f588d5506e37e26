//! Configuration file support.
//!
//! User settings live at `~/.config/quickshot/config.toml`. Loading never
//! fails: a missing file yields defaults, and an unreadable or corrupt file
//! yields defaults and is silently rewritten so the next run starts clean.
//! Saving surfaces errors to the caller and is never retried automatically;
//! all writes happen on the thread that owns the settings.

pub mod types;

pub use types::{ImageFormat, Settings};

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine the user config directory")]
    NoConfigDir,

    #[error("failed to write config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

impl Settings {
    /// Returns the fixed per-user path of the configuration file.
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("quickshot").join("config.toml"))
    }

    /// Loads settings from the per-user config file. Any failure falls back
    /// to defaults; a corrupt file is additionally rewritten with defaults.
    pub fn load() -> Self {
        match Self::config_path() {
            Ok(path) => Self::load_from(&path),
            Err(e) => {
                warn!("{e}, using default settings");
                Self::default()
            }
        }
    }

    /// Loads settings from an explicit path. Same fallback behavior as
    /// [`Settings::load`].
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            info!("config file not found, using defaults");
            debug!("expected config at: {}", path.display());
            return Self::default();
        }

        let recover = |reason: String| {
            warn!("{reason}; recreating config with defaults");
            let defaults = Self::default();
            if let Err(e) = defaults.save_to(path) {
                warn!("failed to rewrite config at {}: {e}", path.display());
            }
            defaults
        };

        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) => {
                return recover(format!("failed to read config from {}: {e}", path.display()));
            }
        };

        let mut settings: Settings = match toml::from_str(&raw) {
            Ok(settings) => settings,
            Err(e) => {
                return recover(format!(
                    "failed to parse config from {}: {e}",
                    path.display()
                ));
            }
        };

        settings.validate_and_fix();
        info!("loaded config from {}", path.display());
        debug!("settings: {settings:?}");
        settings
    }

    /// Saves to the per-user config file, creating the directory if needed.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::config_path()?;
        self.save_to(&path)
    }

    /// Saves to an explicit path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let raw = toml::to_string_pretty(self)?;
        fs::write(path, raw)?;
        info!("saved config to {}", path.display());
        Ok(())
    }

    /// Writes the documented example config, refusing to clobber an existing
    /// file. Used by `quickshot --init-config`.
    pub fn create_default_file() -> Result<PathBuf, ConfigError> {
        let path = Self::config_path()?;
        if path.exists() {
            return Err(ConfigError::Io(std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                format!("config file already exists at {}", path.display()),
            )));
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, include_str!("../../config.example.toml"))?;
        info!("created default config at {}", path.display());
        Ok(path)
    }

    /// Replaces out-of-range values with defaults, logging each fix.
    fn validate_and_fix(&mut self) {
        if self.filename_prefix.trim().is_empty() {
            warn!("empty filename_prefix, falling back to 'screenshot'");
            self.filename_prefix = "screenshot".to_string();
        }
        if self.timestamp_format.trim().is_empty() {
            warn!("empty timestamp_format, falling back to %Y%m%d_%H%M%S");
            self.timestamp_format = "%Y%m%d_%H%M%S".to_string();
        }
        if self.stamp_format.trim().is_empty() {
            warn!("empty stamp_format, falling back to %Y-%m-%d %H:%M:%S");
            self.stamp_format = "%Y-%m-%d %H:%M:%S".to_string();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let settings = Settings::load_from(&dir.path().join("nope.toml"));
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn corrupt_file_yields_defaults_and_is_rewritten() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "this is { not toml").unwrap();

        let settings = Settings::load_from(&path);
        assert_eq!(settings, Settings::default());

        // The backing file was recreated with parseable defaults.
        let reloaded = Settings::load_from(&path);
        assert_eq!(reloaded, Settings::default());
        assert!(toml::from_str::<Settings>(&fs::read_to_string(&path).unwrap()).is_ok());
    }

    #[test]
    fn save_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        let mut settings = Settings::default();
        settings.filename_prefix = "shot".to_string();
        settings.format = ImageFormat::Jpg;
        settings.timestamp_overlay = true;
        settings.save_directory = dir.path().join("captures");

        settings.save_to(&path).unwrap();
        assert_eq!(Settings::load_from(&path), settings);
    }

    #[test]
    fn partial_file_fills_in_defaults_and_ignores_unknown_keys() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "filename_prefix = \"grab\"\nformat = \"jpg\"\nfuture_option = 42\n",
        )
        .unwrap();

        let settings = Settings::load_from(&path);
        assert_eq!(settings.filename_prefix, "grab");
        assert_eq!(settings.format, ImageFormat::Jpg);
        assert_eq!(settings.hotkey_region, "ctrl+print_screen");
        assert!(settings.show_preview);
    }

    #[test]
    fn empty_prefix_is_fixed_on_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "filename_prefix = \"  \"\n").unwrap();

        let settings = Settings::load_from(&path);
        assert_eq!(settings.filename_prefix, "screenshot");
    }
}
