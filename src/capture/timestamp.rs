//! Timestamp overlay rendering.
//!
//! Stamps the capture time into the bottom-right corner of an image using the
//! 8x8 bitmap font, over a semi-opaque backing box so the text stays legible
//! on arbitrary content. Pure transform: the input image is left untouched.

use font8x8::{BASIC_FONTS, UnicodeFonts};
use image::{Rgba, RgbaImage};

use super::types::CapturedImage;

const GLYPH_SIZE: i32 = 8;
const SCALE: i32 = 2;
const MARGIN: i32 = 10;
const PADDING: i32 = 6;
const BACKING: Rgba<u8> = Rgba([0, 0, 0, 160]);
const TEXT: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Returns a stamped copy of `image`. The stamp renders the image's own
/// capture time formatted with the chrono `format` string.
pub fn apply_timestamp(image: &CapturedImage, format: &str) -> CapturedImage {
    let text = image.taken_at().format(format).to_string();
    let mut pixels = image.pixels().clone();
    stamp_text(&mut pixels, &text);
    image.with_pixels(pixels)
}

fn stamp_text(pixels: &mut RgbaImage, text: &str) {
    let (img_w, img_h) = (pixels.width() as i32, pixels.height() as i32);
    let text_w = text.chars().count() as i32 * GLYPH_SIZE * SCALE;
    let text_h = GLYPH_SIZE * SCALE;

    // Bottom-right with a margin, clamped so tiny captures still get a stamp.
    let x = (img_w - text_w - MARGIN - PADDING).max(PADDING);
    let y = (img_h - text_h - MARGIN - PADDING).max(PADDING);

    fill_rect(
        pixels,
        x - PADDING,
        y - PADDING,
        x + text_w + PADDING,
        y + text_h + PADDING,
        BACKING,
    );

    let mut cursor_x = x;
    for ch in text.chars() {
        let Some(glyph) = BASIC_FONTS.get(ch).or_else(|| BASIC_FONTS.get('?')) else {
            cursor_x += GLYPH_SIZE * SCALE;
            continue;
        };
        for (row_idx, row) in glyph.iter().enumerate() {
            let bits = *row;
            for col_idx in 0..GLYPH_SIZE {
                if (bits >> col_idx) & 1 == 0 {
                    continue;
                }
                fill_rect(
                    pixels,
                    cursor_x + col_idx * SCALE,
                    y + row_idx as i32 * SCALE,
                    cursor_x + (col_idx + 1) * SCALE,
                    y + (row_idx as i32 + 1) * SCALE,
                    TEXT,
                );
            }
        }
        cursor_x += GLYPH_SIZE * SCALE;
    }
}

/// Alpha-blends `color` over the half-open rectangle [x0,x1) x [y0,y1),
/// clipped to the image.
fn fill_rect(pixels: &mut RgbaImage, x0: i32, y0: i32, x1: i32, y1: i32, color: Rgba<u8>) {
    let (img_w, img_h) = (pixels.width() as i32, pixels.height() as i32);
    for y in y0.max(0)..y1.min(img_h) {
        for x in x0.max(0)..x1.min(img_w) {
            let dst = *pixels.get_pixel(x as u32, y as u32);
            pixels.put_pixel(x as u32, y as u32, blend(dst, color));
        }
    }
}

fn blend(dst: Rgba<u8>, src: Rgba<u8>) -> Rgba<u8> {
    let alpha = src[3] as u32;
    let inv = 255 - alpha;
    let mix = |s: u8, d: u8| ((s as u32 * alpha + d as u32 * inv) / 255) as u8;
    Rgba([
        mix(src[0], dst[0]),
        mix(src[1], dst[1]),
        mix(src[2], dst[2]),
        dst[3].max(src[3]),
    ])
}
