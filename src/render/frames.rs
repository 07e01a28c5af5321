//! Per-frame sprite rendering for animated raster output.
//!
//! The base sprite is rasterized from markup exactly once; each sampled
//! frame then applies the preset's transform to that bitmap. A rotation
//! here and a SMIL rotation in embedded markup turn the same direction for
//! the same track value.

use anyhow::Context as _;
use kurbo::{Affine, Point, Vec2};
use rayon::prelude::*;

use crate::animation::preset::AnimationSpec;
use crate::animation::sampler::FramePlan;
use crate::animation::track::{self, TransformTrack};
use crate::foundation::core::{Bitmap, validate_dims};
use crate::foundation::error::{ViviconError, ViviconResult};

/// Renders icon markup into premultiplied pixels.
///
/// The default implementation is [`ResvgRasterizer`]; tests and embedders
/// with their own SVG stack can substitute one at the pipeline seam.
pub trait VectorRasterizer: Send + Sync {
    fn rasterize(&self, svg: &str, width: u32, height: u32) -> ViviconResult<Bitmap>;
}

/// Rasterizer backed by `usvg`/`resvg`, stretching the document viewport
/// to the requested pixel size.
#[derive(Clone, Copy, Debug, Default)]
pub struct ResvgRasterizer;

impl VectorRasterizer for ResvgRasterizer {
    fn rasterize(&self, svg: &str, width: u32, height: u32) -> ViviconResult<Bitmap> {
        validate_dims(width, height)?;
        let opts = usvg::Options::default();
        let tree = usvg::Tree::from_data(svg.as_bytes(), &opts).context("parse svg tree")?;

        let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
            .ok_or_else(|| ViviconError::render("failed to allocate svg pixmap"))?;
        let sx = (width as f32) / tree.size().width();
        let sy = (height as f32) / tree.size().height();
        resvg::render(
            &tree,
            resvg::tiny_skia::Transform::from_scale(sx, sy),
            &mut pixmap.as_mut(),
        );
        Bitmap::from_premul_parts(width, height, pixmap.data().to_vec())
    }
}

/// Rasterize the base sprite once and produce one transformed bitmap per
/// sampled frame time. Frames render in parallel on a dedicated pool.
pub fn render_animation_frames(
    rasterizer: &dyn VectorRasterizer,
    svg: &str,
    spec: &AnimationSpec,
    plan: &FramePlan,
    sprite_size: u32,
    threads: Option<usize>,
) -> ViviconResult<Vec<Bitmap>> {
    let base = rasterizer.rasterize(svg, sprite_size, sprite_size)?;
    let transform = track::synthesize(spec.preset());
    let times: Vec<f64> = plan.sample_times().collect();
    tracing::debug!(
        frames = times.len(),
        sprite_size,
        preset = ?spec.preset(),
        "rendering animation frames"
    );

    let pool = build_thread_pool(threads)?;
    let rendered = pool.install(|| {
        times
            .par_iter()
            .map(|&t| transform_frame(&base, &transform, t))
            .collect::<Vec<_>>()
    });

    let mut frames = Vec::with_capacity(rendered.len());
    for frame in rendered {
        frames.push(frame?);
    }
    Ok(frames)
}

/// Apply a transform track at normalized time `t` to the base sprite.
pub fn transform_frame(base: &Bitmap, transform: &TransformTrack, t: f64) -> ViviconResult<Bitmap> {
    match transform {
        TransformTrack::Rotate(rotation) => rotate_frame(base, rotation.sample(t)),
        TransformTrack::Scale(scale) => scale_frame(base, scale.sample(t)),
    }
}

/// Rotate clockwise by `degrees` about the sprite center, expanding the
/// output to the rotated bounding box. Sampling is bilinear; pixels that
/// map outside the source read as transparent.
pub fn rotate_frame(src: &Bitmap, degrees: f64) -> ViviconResult<Bitmap> {
    let radians = degrees.to_radians();
    if radians == 0.0 {
        return Ok(src.clone());
    }

    let (w, h) = (f64::from(src.width), f64::from(src.height));
    let forward = Affine::rotate(radians);
    let mut min = Point::new(f64::INFINITY, f64::INFINITY);
    let mut max = Point::new(f64::NEG_INFINITY, f64::NEG_INFINITY);
    for corner in [
        Point::new(0.0, 0.0),
        Point::new(w, 0.0),
        Point::new(w, h),
        Point::new(0.0, h),
    ] {
        let q = forward * corner;
        min.x = min.x.min(q.x);
        min.y = min.y.min(q.y);
        max.x = max.x.max(q.x);
        max.y = max.y.max(q.y);
    }
    let out_w = snap_ceil(max.x - min.x).max(1.0) as u32;
    let out_h = snap_ceil(max.y - min.y).max(1.0) as u32;
    validate_dims(out_w, out_h)?;

    let src_center = Vec2::new(w * 0.5, h * 0.5);
    let out_center = Vec2::new(f64::from(out_w) * 0.5, f64::from(out_h) * 0.5);
    let inverse =
        Affine::translate(src_center) * Affine::rotate(-radians) * Affine::translate(-out_center);

    let mut out = Bitmap::new(out_w, out_h)?;
    for y in 0..out_h {
        for x in 0..out_w {
            let q = inverse * Point::new(f64::from(x) + 0.5, f64::from(y) + 0.5);
            let px = bilinear_premul(src, q.x, q.y);
            if px != [0, 0, 0, 0] {
                out.put_pixel(x, y, px);
            }
        }
    }
    Ok(out)
}

/// Resize by `|factors|` (Lanczos), mirroring an axis when its factor is
/// negative. An exact identity returns the sprite untouched.
pub fn scale_frame(src: &Bitmap, factors: Vec2) -> ViviconResult<Bitmap> {
    if factors.x == 1.0 && factors.y == 1.0 {
        return Ok(src.clone());
    }
    if !factors.x.is_finite() || !factors.y.is_finite() {
        return Err(ViviconError::render("non-finite scale factor"));
    }

    let target_w = ((f64::from(src.width) * factors.x.abs()).round() as u32).max(1);
    let target_h = ((f64::from(src.height) * factors.y.abs()).round() as u32).max(1);
    validate_dims(target_w, target_h)?;

    let base = image::RgbaImage::from_raw(src.width, src.height, src.data.clone())
        .ok_or_else(|| ViviconError::render("bitmap does not form an rgba image"))?;
    let mut img = if (target_w, target_h) == (src.width, src.height) {
        base
    } else {
        image::imageops::resize(
            &base,
            target_w,
            target_h,
            image::imageops::FilterType::Lanczos3,
        )
    };
    if factors.x < 0.0 {
        img = image::imageops::flip_horizontal(&img);
    }
    if factors.y < 0.0 {
        img = image::imageops::flip_vertical(&img);
    }
    Bitmap::from_premul_parts(target_w, target_h, img.into_raw())
}

fn build_thread_pool(threads: Option<usize>) -> ViviconResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(ViviconError::validation(
            "render 'threads' must be >= 1 when set",
        ));
    }

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| ViviconError::render(format!("failed to build rayon thread pool: {e}")))
}

/// Ceil that forgives sub-epsilon float noise above an integer, so exact
/// quarter turns keep their dimensions.
fn snap_ceil(v: f64) -> f64 {
    let r = v.round();
    if (v - r).abs() < 1e-6 { r } else { v.ceil() }
}

fn bilinear_premul(src: &Bitmap, x: f64, y: f64) -> [u8; 4] {
    let gx = x - 0.5;
    let gy = y - 0.5;
    let x0 = gx.floor();
    let y0 = gy.floor();
    let fx = gx - x0;
    let fy = gy - y0;

    let mut acc = [0.0f64; 4];
    for (dx, dy, weight) in [
        (0i64, 0i64, (1.0 - fx) * (1.0 - fy)),
        (1, 0, fx * (1.0 - fy)),
        (0, 1, (1.0 - fx) * fy),
        (1, 1, fx * fy),
    ] {
        if weight == 0.0 {
            continue;
        }
        let sx = x0 as i64 + dx;
        let sy = y0 as i64 + dy;
        if sx < 0 || sy < 0 || sx >= i64::from(src.width) || sy >= i64::from(src.height) {
            continue;
        }
        let px = src.pixel(sx as u32, sy as u32);
        for c in 0..4 {
            acc[c] += weight * f64::from(px[c]);
        }
    }
    acc.map(|v| v.round().clamp(0.0, 255.0) as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::preset::AnimationPreset;
    use crate::animation::track::{FlipAxis, flip_track, pulse_track};

    const MARK: [u8; 4] = [255, 255, 255, 255];

    fn sprite_with_mark(size: u32, x: u32, y: u32) -> Bitmap {
        let mut bmp = Bitmap::new(size, size).unwrap();
        bmp.put_pixel(x, y, MARK);
        bmp
    }

    struct FakeRasterizer(Bitmap);

    impl VectorRasterizer for FakeRasterizer {
        fn rasterize(&self, _svg: &str, _width: u32, _height: u32) -> ViviconResult<Bitmap> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn rotate_zero_is_an_exact_clone() {
        let sprite = sprite_with_mark(4, 1, 2);
        assert_eq!(rotate_frame(&sprite, 0.0).unwrap(), sprite);
    }

    #[test]
    fn quarter_turn_is_clockwise() {
        // Mark just right of top-center; a clockwise quarter turn moves it
        // to the right edge at vertical center.
        let sprite = sprite_with_mark(4, 2, 0);
        let turned = rotate_frame(&sprite, 90.0).unwrap();
        assert_eq!((turned.width, turned.height), (4, 4));
        assert_eq!(turned.pixel(3, 2), MARK);
        assert_eq!(turned.pixel(2, 0), [0, 0, 0, 0]);
    }

    #[test]
    fn quarter_turn_keeps_dimensions_exact() {
        let sprite = sprite_with_mark(7, 0, 0);
        for degrees in [90.0, 180.0, 270.0, 360.0] {
            let turned = rotate_frame(&sprite, degrees).unwrap();
            assert_eq!((turned.width, turned.height), (7, 7), "at {degrees}");
        }
    }

    #[test]
    fn diagonal_rotation_expands_the_bounding_box() {
        let sprite = sprite_with_mark(4, 0, 0);
        let turned = rotate_frame(&sprite, 45.0).unwrap();
        // 4 * sqrt(2) = 5.66, ceiled.
        assert_eq!((turned.width, turned.height), (6, 6));
    }

    #[test]
    fn scale_identity_is_an_exact_clone() {
        let sprite = sprite_with_mark(4, 3, 1);
        assert_eq!(scale_frame(&sprite, Vec2::new(1.0, 1.0)).unwrap(), sprite);
    }

    #[test]
    fn scale_half_halves_dimensions() {
        let sprite = sprite_with_mark(8, 0, 0);
        let scaled = scale_frame(&sprite, Vec2::new(0.5, 0.5)).unwrap();
        assert_eq!((scaled.width, scaled.height), (4, 4));
    }

    #[test]
    fn tiny_factors_never_collapse_to_zero() {
        let sprite = sprite_with_mark(4, 0, 0);
        let scaled = scale_frame(&sprite, Vec2::new(0.01, 0.01)).unwrap();
        assert_eq!((scaled.width, scaled.height), (1, 1));
    }

    #[test]
    fn negative_factor_mirrors_without_resampling() {
        let sprite = sprite_with_mark(4, 0, 0);
        let mirrored = scale_frame(&sprite, Vec2::new(-1.0, 1.0)).unwrap();
        assert_eq!(mirrored.pixel(3, 0), MARK);
        assert_eq!(mirrored.pixel(0, 0), [0, 0, 0, 0]);

        let flipped = scale_frame(&sprite, Vec2::new(1.0, -1.0)).unwrap();
        assert_eq!(flipped.pixel(0, 3), MARK);
    }

    #[test]
    fn flip_track_start_renders_the_untouched_sprite() {
        let sprite = sprite_with_mark(4, 1, 1);
        let transform = TransformTrack::Scale(flip_track(FlipAxis::Horizontal));
        let frame = transform_frame(&sprite, &transform, 0.0).unwrap();
        assert_eq!(frame, sprite);
    }

    #[test]
    fn pulse_midpoint_shrinks_to_a_tenth() {
        let sprite = sprite_with_mark(10, 0, 0);
        let transform = TransformTrack::Scale(pulse_track());
        let frame = transform_frame(&sprite, &transform, 0.5).unwrap();
        assert_eq!((frame.width, frame.height), (1, 1));
    }

    #[test]
    fn frame_loop_renders_one_bitmap_per_sample() {
        let spec = AnimationSpec::new(AnimationPreset::Spin, Some("1s"));
        let plan = FramePlan::for_spec(&spec, 4).unwrap();
        let raster = FakeRasterizer(sprite_with_mark(4, 2, 0));
        let frames =
            render_animation_frames(&raster, "<svg/>", &spec, &plan, 4, Some(2)).unwrap();
        assert_eq!(frames.len(), 4);
        // t = 0 must be the untransformed sprite.
        assert_eq!(frames[0], raster.0);
        // quarter turn at t = 0.25.
        assert_eq!(frames[1].pixel(3, 2), MARK);
    }

    #[test]
    fn zero_threads_is_rejected() {
        assert!(build_thread_pool(Some(0)).is_err());
    }
}
