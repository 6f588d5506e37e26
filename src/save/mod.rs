//! Saving captured images to disk.
//!
//! Filenames are `{prefix}_{timestamp}.{ext}` with second resolution; when a
//! name is taken, a numeric suffix (`_1`, `_2`, ...) is appended until a free
//! one is found. Names are claimed with `create_new`, so two saves in the
//! same second can never overwrite each other. The encoded bytes are written
//! through the claimed handle and the file is removed on any write failure,
//! leaving no partial file behind.

use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, RgbaImage};
use thiserror::Error;

use crate::capture::CapturedImage;
use crate::config::{ImageFormat, Settings};

/// Collision-avoidance retry bound. Exceeding it means something is
/// generating files faster than any human presses a hotkey.
const MAX_NAME_ATTEMPTS: u32 = 1000;

/// JPEG quality, matching common screenshot-tool output.
const JPEG_QUALITY: u8 = 95;

/// Result of a successful save. Never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedFile {
    pub path: PathBuf,
    pub format: ImageFormat,
    pub size_bytes: u64,
}

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("failed to write screenshot: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode screenshot: {0}")]
    Encode(#[from] image::ImageError),

    #[error("could not find a free filename after {attempts} attempts")]
    Exhausted { attempts: u32 },
}

/// Writes a captured image to the configured directory and reports the
/// resulting file. The directory is created if absent.
pub fn save_capture(image: &CapturedImage, settings: &Settings) -> Result<SavedFile, SaveError> {
    fs::create_dir_all(&settings.save_directory)?;

    let bytes = encode(image.pixels(), settings.format)?;
    let stem = format!(
        "{}_{}",
        settings.filename_prefix,
        image.taken_at().format(&settings.timestamp_format)
    );
    let path = write_claimed(
        &settings.save_directory,
        &stem,
        settings.format.extension(),
        &bytes,
        MAX_NAME_ATTEMPTS,
    )?;

    log::info!("saved screenshot: {} ({} bytes)", path.display(), bytes.len());
    Ok(SavedFile {
        path,
        format: settings.format,
        size_bytes: bytes.len() as u64,
    })
}

/// Encodes pixels into the target format in memory, so a disk write can only
/// fail as a whole, never mid-encode.
fn encode(pixels: &RgbaImage, format: ImageFormat) -> Result<Vec<u8>, image::ImageError> {
    let mut bytes = Vec::new();
    match format {
        ImageFormat::Png => {
            PngEncoder::new(Cursor::new(&mut bytes)).write_image(
                pixels.as_raw(),
                pixels.width(),
                pixels.height(),
                ExtendedColorType::Rgba8,
            )?;
        }
        ImageFormat::Jpg => {
            // JPEG has no alpha channel.
            let rgb = DynamicImage::ImageRgba8(pixels.clone()).to_rgb8();
            JpegEncoder::new_with_quality(Cursor::new(&mut bytes), JPEG_QUALITY).encode(
                rgb.as_raw(),
                rgb.width(),
                rgb.height(),
                ExtendedColorType::Rgb8,
            )?;
        }
    }
    Ok(bytes)
}

/// Claims the first free `{stem}.{ext}` / `{stem}_{n}.{ext}` name with
/// `create_new` and writes `bytes` through the claimed handle. On a write
/// failure the claimed file is removed before the error is surfaced.
fn write_claimed(
    dir: &Path,
    stem: &str,
    ext: &str,
    bytes: &[u8],
    max_attempts: u32,
) -> Result<PathBuf, SaveError> {
    for attempt in 0..max_attempts {
        let filename = if attempt == 0 {
            format!("{stem}.{ext}")
        } else {
            format!("{stem}_{attempt}.{ext}")
        };
        let path = dir.join(filename);

        let mut file = match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
        {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(SaveError::Io(e)),
        };

        if let Err(e) = file.write_all(bytes).and_then(|_| file.sync_all()) {
            drop(file);
            if let Err(cleanup) = fs::remove_file(&path) {
                log::warn!(
                    "failed to remove partial file {}: {cleanup}",
                    path.display()
                );
            }
            return Err(SaveError::Io(e));
        }

        return Ok(path);
    }
    Err(SaveError::Exhausted {
        attempts: max_attempts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use tempfile::TempDir;

    fn capture() -> CapturedImage {
        CapturedImage::new(RgbaImage::from_pixel(8, 8, Rgba([10, 20, 30, 255])))
    }

    fn settings(dir: &Path) -> Settings {
        Settings {
            save_directory: dir.to_path_buf(),
            filename_prefix: "shot".to_string(),
            ..Settings::default()
        }
    }

    #[test]
    fn saves_png_with_prefixed_timestamp_name() {
        let dir = TempDir::new().unwrap();
        let saved = save_capture(&capture(), &settings(dir.path())).unwrap();

        let name = saved.path.file_name().unwrap().to_string_lossy();
        assert!(name.starts_with("shot_"));
        assert!(name.ends_with(".png"));
        assert_eq!(saved.format, ImageFormat::Png);
        assert_eq!(fs::metadata(&saved.path).unwrap().len(), saved.size_bytes);

        // The written file decodes back to the captured pixels.
        let decoded = image::open(&saved.path).unwrap().to_rgba8();
        assert_eq!(decoded.as_raw(), capture().pixels().as_raw());
    }

    #[test]
    fn saves_jpg_when_configured() {
        let dir = TempDir::new().unwrap();
        let mut settings = settings(dir.path());
        settings.format = ImageFormat::Jpg;

        let saved = save_capture(&capture(), &settings).unwrap();
        assert!(saved.path.to_string_lossy().ends_with(".jpg"));
        assert!(image::open(&saved.path).is_ok());
    }

    #[test]
    fn same_second_saves_never_overwrite() {
        let dir = TempDir::new().unwrap();
        let settings = settings(dir.path());
        let image = capture(); // one capture, one timestamp

        let first = save_capture(&image, &settings).unwrap();
        let second = save_capture(&image, &settings).unwrap();
        let third = save_capture(&image, &settings).unwrap();

        assert_ne!(first.path, second.path);
        assert_ne!(second.path, third.path);
        assert!(second.path.to_string_lossy().ends_with("_1.png"));
        assert!(third.path.to_string_lossy().ends_with("_2.png"));
        assert!(first.path.exists() && second.path.exists() && third.path.exists());
    }

    #[test]
    fn exhausted_names_surface_an_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("x.png"), b"taken").unwrap();
        fs::write(dir.path().join("x_1.png"), b"taken").unwrap();

        let err = write_claimed(dir.path(), "x", "png", b"data", 2).unwrap_err();
        assert!(matches!(err, SaveError::Exhausted { attempts: 2 }));
    }

    #[test]
    fn creates_missing_save_directory() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a").join("b");
        let saved = save_capture(&capture(), &settings(&nested)).unwrap();
        assert!(saved.path.starts_with(&nested));
    }

    #[test]
    fn unwritable_directory_surfaces_io_error() {
        let dir = TempDir::new().unwrap();
        // A file where the directory should be.
        let blocked = dir.path().join("blocked");
        fs::write(&blocked, b"file, not dir").unwrap();

        let err = save_capture(&capture(), &settings(&blocked)).unwrap_err();
        assert!(matches!(err, SaveError::Io(_)));
    }
}
