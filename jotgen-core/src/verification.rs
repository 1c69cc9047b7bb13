//! The seed verification image: a colour grid keyed on the share identifier
//! with the verification token drawn across it as glyphs. Two players with
//! the same record see the same picture.

use ::image::imageops::{self, FilterType};
use ::image::{ImageFormat, ImageOutputFormat, Rgb, RgbImage};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sha2::{Digest, Sha256};
use std::io::Cursor;

use crate::{GeneratorError, Result};

pub const IMAGE_SIZE: u32 = 200;
const CELL_SIZE: u32 = 50;
const GLYPH_SIZE: u32 = 8;
const GLYPH_SCALE: u32 = 24;
const GLYPH_ORIGIN: (u32, u32) = (4, 88);
pub const MAX_GLYPHS: usize = 8;

/// 96x8 strip of twelve 8x8 glyphs.
const GLYPH_STRIP_GIF: &str = concat!(
    "R0lGODlhYAAIAPEDABggKIiQkPj4+AAAACH5BAUAAAMALAAAAABgAAgAQALTBIYpNwbSVkIvnCPkpMv6LFiJwxjNdQUhA4Iioo3qY8xx",
    "9AxLF0LcHOkFhriJSiUEIDMWGqcSOh6WIuUtMishSzwVVlKCIpuG0GBpZqo7R4lQ2gJxK2Wur6HjVkfdk3zilEeSUwHUMHbR8gLGyMBX",
    "w2QV8xAJ0eP4yBZXhXjGVhGk8baigGl1QWEok2FSBvKzU9Zm4+jQc2k1tEIDSano+idT1agV6Wtxh9XUxvpUqtQEIcm5QDcqYvNCgWPm",
    "jCe9EY6nhCl+ireBQlHrMEIy4j5QAAA7",
);

/// Maps a token byte to its glyph column. Bytes outside the strip have no
/// glyph.
pub fn glyph_index(byte: u8) -> Option<u32> {
    let idx = byte.checked_sub(0x20)?;
    let idx = if idx > 9 { idx - 4 } else { idx };
    let columns = 96 / GLYPH_SIZE;
    (u32::from(idx) < columns).then_some(u32::from(idx))
}

fn grid_rng(id: &str) -> StdRng {
    let digest = Sha256::digest(id.as_bytes());
    let mut seed = [0u8; 32];
    seed.copy_from_slice(&digest);
    StdRng::from_seed(seed)
}

fn glyph_strip() -> Result<RgbImage> {
    let gif = BASE64
        .decode(GLYPH_STRIP_GIF)
        .map_err(|e| GeneratorError::Engine(format!("glyph strip is not valid base64: {e}")))?;
    Ok(::image::load_from_memory_with_format(&gif, ImageFormat::Gif)?.to_rgb8())
}

/// Renders the verification image for a record.
pub fn render(id: &str, token: &[u8]) -> Result<RgbImage> {
    let mut rng = grid_rng(id);
    let mut img = RgbImage::new(IMAGE_SIZE, IMAGE_SIZE);

    // Column-major, one colour per cell.
    for cx in (0..IMAGE_SIZE).step_by(CELL_SIZE as usize) {
        for cy in (0..IMAGE_SIZE).step_by(CELL_SIZE as usize) {
            let colour = Rgb([
                rng.gen_range(0..=31u8) * 8,
                rng.gen_range(0..=31u8) * 8,
                rng.gen_range(0..=31u8) * 8,
            ]);
            for x in cx..cx + CELL_SIZE {
                for y in cy..cy + CELL_SIZE {
                    img.put_pixel(x, y, colour);
                }
            }
        }
    }

    for x in 2..=198 {
        for y in 85..=115 {
            img.put_pixel(x, y, Rgb([0, 0, 0]));
        }
    }

    let strip = glyph_strip()?;
    for (n, &byte) in token.iter().take(MAX_GLYPHS).enumerate() {
        let Some(idx) = glyph_index(byte) else {
            continue;
        };
        let glyph = imageops::crop_imm(&strip, idx * GLYPH_SIZE, 0, GLYPH_SIZE, GLYPH_SIZE).to_image();
        let glyph = imageops::resize(&glyph, GLYPH_SCALE, GLYPH_SCALE, FilterType::Nearest);
        let x = GLYPH_ORIGIN.0 + n as u32 * GLYPH_SCALE;
        imageops::replace(&mut img, &glyph, i64::from(x), i64::from(GLYPH_ORIGIN.1));
    }

    Ok(img)
}

/// PNG-encoded [`render`].
pub fn render_png(id: &str, token: &[u8]) -> Result<Vec<u8>> {
    let img = render(id, token)?;
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageOutputFormat::Png)?;
    Ok(out.into_inner())
}
