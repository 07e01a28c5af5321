pub use kurbo::{Affine, Point, Rect, Vec2};

use crate::foundation::error::{ViviconError, ViviconResult};

/// Guard against degenerate or absurd raster dimensions.
pub const MAX_DIM: u32 = 16_384;

/// Straight-alpha RGBA color, 8 bits per channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub const WHITE: Rgba8 = Rgba8::opaque(255, 255, 255);

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Premultiplied `[r, g, b, a]` bytes for compositing.
    pub fn to_premul(self) -> [u8; 4] {
        [
            mul_div255(self.r, self.a),
            mul_div255(self.g, self.a),
            mul_div255(self.b, self.a),
            self.a,
        ]
    }
}

/// `(x * y) / 255` with correct rounding, for premultiplied-alpha math.
pub(crate) fn mul_div255(x: u8, y: u8) -> u8 {
    ((u16::from(x) * u16::from(y) + 127) / 255) as u8
}

/// A rasterized image buffer: tightly packed premultiplied RGBA8 rows.
///
/// Every pixel buffer in the crate is premultiplied; conversion back to
/// straight alpha happens only at encoder boundaries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bitmap {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl Bitmap {
    /// Fully transparent bitmap of the given size.
    pub fn new(width: u32, height: u32) -> ViviconResult<Self> {
        validate_dims(width, height)?;
        Ok(Self {
            width,
            height,
            data: vec![0u8; (width as usize) * (height as usize) * 4],
        })
    }

    /// Wrap an existing premultiplied RGBA8 buffer.
    pub fn from_premul_parts(width: u32, height: u32, data: Vec<u8>) -> ViviconResult<Self> {
        validate_dims(width, height)?;
        let expected = (width as usize) * (height as usize) * 4;
        if data.len() != expected {
            return Err(ViviconError::validation(format!(
                "bitmap buffer length {} does not match {}x{} rgba",
                data.len(),
                width,
                height
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Premultiply a straight-alpha RGBA8 buffer in place and wrap it.
    pub fn from_straight_rgba(width: u32, height: u32, mut data: Vec<u8>) -> ViviconResult<Self> {
        for px in data.chunks_exact_mut(4) {
            let a = px[3];
            px[0] = mul_div255(px[0], a);
            px[1] = mul_div255(px[1], a);
            px[2] = mul_div255(px[2], a);
        }
        Self::from_premul_parts(width, height, data)
    }

    /// Straight-alpha copy of the pixel data, for encoders that quantize
    /// or store unassociated alpha.
    pub fn to_straight_rgba(&self) -> Vec<u8> {
        let mut out = self.data.clone();
        for px in out.chunks_exact_mut(4) {
            let a = px[3];
            if a == 0 {
                px[0] = 0;
                px[1] = 0;
                px[2] = 0;
            } else if a != 255 {
                let a16 = u16::from(a);
                px[0] = ((u16::from(px[0]) * 255 + a16 / 2) / a16).min(255) as u8;
                px[1] = ((u16::from(px[1]) * 255 + a16 / 2) / a16).min(255) as u8;
                px[2] = ((u16::from(px[2]) * 255 + a16 / 2) / a16).min(255) as u8;
            }
        }
        out
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        [
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ]
    }

    pub fn put_pixel(&mut self, x: u32, y: u32, px: [u8; 4]) {
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        self.data[i..i + 4].copy_from_slice(&px);
    }
}

pub(crate) fn validate_dims(width: u32, height: u32) -> ViviconResult<()> {
    if width == 0 || height == 0 {
        return Err(ViviconError::validation("bitmap dimensions must be > 0"));
    }
    if width > MAX_DIM || height > MAX_DIM {
        return Err(ViviconError::validation(format!(
            "bitmap dimensions {width}x{height} exceed maximum {MAX_DIM}"
        )));
    }
    Ok(())
}
