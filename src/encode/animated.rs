//! Animated GIF container encoding.

use std::io::Write;
use std::path::Path;

use anyhow::Context as _;
use image::Frame;
use image::codecs::gif::{GifEncoder, Repeat};

use crate::foundation::core::Bitmap;
use crate::foundation::error::{ViviconError, ViviconResult};

/// A finished animation: uniform frames plus playback timing.
#[derive(Clone, Debug)]
pub struct AnimatedAsset {
    pub frames: Vec<Bitmap>,
    /// Per-frame delay in milliseconds, already floored to >= 1 upstream.
    pub frame_delay_ms: u32,
    /// Number of times the animation plays; 0 loops forever.
    pub loop_count: u16,
}

impl AnimatedAsset {
    fn validate(&self) -> ViviconResult<(u32, u32)> {
        let first = self
            .frames
            .first()
            .ok_or_else(|| ViviconError::encode("animated asset has no frames"))?;
        let dims = (first.width, first.height);
        for frame in &self.frames {
            if (frame.width, frame.height) != dims {
                return Err(ViviconError::encode(
                    "animated frames must share dimensions",
                ));
            }
        }
        Ok(dims)
    }
}

/// Encode the asset as an animated GIF. Alpha is unassociated before
/// quantization; the delay is clamped up to the container's 10ms tick by
/// the encoder.
pub fn encode_gif<W: Write>(asset: &AnimatedAsset, writer: W) -> ViviconResult<()> {
    let (width, height) = asset.validate()?;

    let mut encoder = GifEncoder::new(writer);
    let repeat = match asset.loop_count {
        0 => Repeat::Infinite,
        n => Repeat::Finite(n),
    };
    encoder.set_repeat(repeat).context("set gif repeat")?;

    for frame in &asset.frames {
        let rgba = image::RgbaImage::from_raw(width, height, frame.to_straight_rgba())
            .ok_or_else(|| ViviconError::encode("frame buffer does not form an rgba image"))?;
        let delay = image::Delay::from_numer_denom_ms(asset.frame_delay_ms.max(1), 1);
        encoder
            .encode_frame(Frame::from_parts(rgba, 0, 0, delay))
            .context("encode gif frame")?;
    }
    Ok(())
}

pub fn encode_gif_bytes(asset: &AnimatedAsset) -> ViviconResult<Vec<u8>> {
    let mut out = Vec::new();
    encode_gif(asset, &mut out)?;
    Ok(out)
}

pub fn write_gif(asset: &AnimatedAsset, path: &Path) -> ViviconResult<()> {
    let bytes = encode_gif_bytes(asset)?;
    std::fs::write(path, bytes).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid_frame(size: u32, px: [u8; 4]) -> Bitmap {
        let mut bmp = Bitmap::new(size, size).unwrap();
        for y in 0..size {
            for x in 0..size {
                bmp.put_pixel(x, y, px);
            }
        }
        bmp
    }

    fn two_frame_asset() -> AnimatedAsset {
        AnimatedAsset {
            frames: vec![
                solid_frame(4, [255, 0, 0, 255]),
                solid_frame(4, [0, 255, 0, 255]),
            ],
            frame_delay_ms: 50,
            loop_count: 0,
        }
    }

    #[test]
    fn emits_a_gif_with_infinite_looping() {
        let bytes = encode_gif_bytes(&two_frame_asset()).unwrap();
        assert_eq!(&bytes[..6], b"GIF89a");
        assert!(
            bytes
                .windows(b"NETSCAPE2.0".len())
                .any(|w| w == b"NETSCAPE2.0"),
            "loop extension missing"
        );
    }

    #[test]
    fn frames_and_delay_survive_a_decode() {
        use image::AnimationDecoder;

        let bytes = encode_gif_bytes(&two_frame_asset()).unwrap();
        let decoder = image::codecs::gif::GifDecoder::new(std::io::Cursor::new(bytes)).unwrap();
        let frames = decoder.into_frames().collect_frames().unwrap();
        assert_eq!(frames.len(), 2);
        let (numer, denom) = frames[0].delay().numer_denom_ms();
        assert_eq!(numer / denom, 50);
    }

    #[test]
    fn no_frames_is_an_encode_error() {
        let asset = AnimatedAsset {
            frames: Vec::new(),
            frame_delay_ms: 50,
            loop_count: 0,
        };
        let err = encode_gif_bytes(&asset).unwrap_err();
        assert!(err.to_string().contains("no frames"));
    }

    #[test]
    fn mismatched_frame_sizes_are_rejected() {
        let asset = AnimatedAsset {
            frames: vec![solid_frame(4, [0; 4]), solid_frame(5, [0; 4])],
            frame_delay_ms: 50,
            loop_count: 0,
        };
        assert!(encode_gif_bytes(&asset).is_err());
    }

    #[test]
    fn writes_a_readable_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("icon.gif");
        write_gif(&two_frame_asset(), &path).unwrap();
        assert!(image::open(&path).is_ok());
    }
}
