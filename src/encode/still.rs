//! Single-frame encoders: PNG, lossless WebP, ICO, and JPEG.

use anyhow::Context as _;
use image::ImageEncoder;
use image::codecs::ico::IcoEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;

use crate::foundation::core::Bitmap;
use crate::foundation::error::{ViviconError, ViviconResult};

pub fn encode_png_bytes(bitmap: &Bitmap) -> ViviconResult<Vec<u8>> {
    let mut out = Vec::new();
    PngEncoder::new(&mut out)
        .write_image(
            &bitmap.to_straight_rgba(),
            bitmap.width,
            bitmap.height,
            image::ExtendedColorType::Rgba8,
        )
        .context("encode png")?;
    Ok(out)
}

pub fn encode_webp_bytes(bitmap: &Bitmap) -> ViviconResult<Vec<u8>> {
    let mut out = Vec::new();
    WebPEncoder::new_lossless(&mut out)
        .write_image(
            &bitmap.to_straight_rgba(),
            bitmap.width,
            bitmap.height,
            image::ExtendedColorType::Rgba8,
        )
        .context("encode webp")?;
    Ok(out)
}

/// ICO entries cap at 256 pixels per side.
pub fn encode_ico_bytes(bitmap: &Bitmap) -> ViviconResult<Vec<u8>> {
    if bitmap.width > 256 || bitmap.height > 256 {
        return Err(ViviconError::encode(format!(
            "ico supports at most 256x256, got {}x{}",
            bitmap.width, bitmap.height
        )));
    }
    let mut out = Vec::new();
    IcoEncoder::new(&mut out)
        .write_image(
            &bitmap.to_straight_rgba(),
            bitmap.width,
            bitmap.height,
            image::ExtendedColorType::Rgba8,
        )
        .context("encode ico")?;
    Ok(out)
}

/// JPEG carries no alpha; the bitmap is flattened over an opaque white
/// page first.
pub fn encode_jpeg_bytes(bitmap: &Bitmap, quality: u8) -> ViviconResult<Vec<u8>> {
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, quality)
        .write_image(
            &flatten_over_white(bitmap),
            bitmap.width,
            bitmap.height,
            image::ExtendedColorType::Rgb8,
        )
        .context("encode jpeg")?;
    Ok(out)
}

fn flatten_over_white(bitmap: &Bitmap) -> Vec<u8> {
    let mut out = Vec::with_capacity(bitmap.data.len() / 4 * 3);
    for px in bitmap.data.chunks_exact(4) {
        // Premultiplied source over white: white contributes 255 * (1 - a).
        let inv = 255 - px[3];
        out.push(px[0].saturating_add(inv));
        out.push(px[1].saturating_add(inv));
        out.push(px[2].saturating_add(inv));
    }
    out
}
