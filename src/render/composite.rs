//! Premultiplied-alpha compositing primitives.

use crate::foundation::core::{Bitmap, mul_div255};
use crate::foundation::error::{ViviconError, ViviconResult};

pub type PremulRgba8 = [u8; 4];

/// Source-over in premultiplied space.
pub fn over(dst: PremulRgba8, src: PremulRgba8) -> PremulRgba8 {
    if src[3] == 0 {
        return dst;
    }
    if src[3] == 255 {
        return src;
    }
    let inv = 255 - src[3];
    let mut out = [0u8; 4];
    for i in 0..4 {
        out[i] = src[i].saturating_add(mul_div255(dst[i], inv));
    }
    out
}

pub fn over_in_place(dst: &mut [u8], src: &[u8]) -> ViviconResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(ViviconError::render(
            "over_in_place expects equal-length rgba8 buffers",
        ));
    }
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let out = over([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]]);
        d.copy_from_slice(&out);
    }
    Ok(())
}

/// Blit `src` over `dst` with its top-left at `(left, top)`. The sprite may
/// extend past any canvas edge; out-of-bounds pixels are clipped.
pub fn blit_over(dst: &mut Bitmap, src: &Bitmap, left: i64, top: i64) {
    for sy in 0..i64::from(src.height) {
        let dy = top + sy;
        if dy < 0 || dy >= i64::from(dst.height) {
            continue;
        }
        for sx in 0..i64::from(src.width) {
            let dx = left + sx;
            if dx < 0 || dx >= i64::from(dst.width) {
                continue;
            }
            let s = src.pixel(sx as u32, sy as u32);
            if s[3] == 0 {
                continue;
            }
            let d = dst.pixel(dx as u32, dy as u32);
            dst.put_pixel(dx as u32, dy as u32, over(d, s));
        }
    }
}

/// Blit with the sprite centered on the canvas. Sprites larger than the
/// canvas get negative offsets and are clipped symmetrically.
pub fn blit_centered(dst: &mut Bitmap, src: &Bitmap) {
    let left = (i64::from(dst.width) - i64::from(src.width)).div_euclid(2);
    let top = (i64::from(dst.height) - i64::from(src.height)).div_euclid(2);
    blit_over(dst, src, left, top);
}
