//! Square backdrop plate: fill, rounded-corner mask, optional outline.
//!
//! The plate is resolved to pixels exactly once per request and shared by
//! every animation frame, so the (comparatively pricey) per-pixel distance
//! evaluation never runs per frame.

use kurbo::{Point, Rect, Vec2};

use crate::foundation::core::{Bitmap, Rgba8, validate_dims};
use crate::foundation::error::ViviconResult;
use crate::render::composite;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GradientDirection {
    #[default]
    Horizontal,
    Vertical,
    Diagonal,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackdropFill {
    Solid(Rgba8),
    Gradient {
        start: Rgba8,
        end: Rgba8,
        direction: GradientDirection,
    },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Outline {
    pub color: Rgba8,
    pub width: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BackdropSpec {
    pub size: u32,
    pub fill: BackdropFill,
    /// Corner radius in pixels; 0 keeps the plate square.
    pub corner_radius: f64,
    pub outline: Option<Outline>,
}

/// Render the backdrop plate for a request.
pub fn render_backdrop(spec: &BackdropSpec) -> ViviconResult<Bitmap> {
    validate_dims(spec.size, spec.size)?;
    let size = spec.size;
    let mut out = Bitmap::new(size, size)?;

    let plate = Rect::new(0.0, 0.0, f64::from(size), f64::from(size));
    let ring = spec.outline.filter(|o| o.width > 0.0).map(|o| {
        let half = o.width * 0.5;
        (
            o.color.to_premul(),
            half,
            plate.inset(-half),
            (spec.corner_radius - half).max(0.0),
        )
    });

    for y in 0..size {
        for x in 0..size {
            let p = Point::new(f64::from(x) + 0.5, f64::from(y) + 0.5);
            let cov = coverage(sd_rounded_rect(p, plate, spec.corner_radius));
            if cov <= 0.0 {
                continue;
            }
            let mut px = scale_premul(fill_at(spec, x, y).to_premul(), cov);
            if let Some((stroke, half, inset, radius)) = ring {
                let band = coverage(sd_rounded_rect(p, inset, radius).abs() - half).min(cov);
                if band > 0.0 {
                    px = composite::over(px, scale_premul(stroke, band));
                }
            }
            out.put_pixel(x, y, px);
        }
    }
    Ok(out)
}

fn fill_at(spec: &BackdropSpec, x: u32, y: u32) -> Rgba8 {
    match spec.fill {
        BackdropFill::Solid(color) => color,
        BackdropFill::Gradient {
            start,
            end,
            direction,
        } => {
            let span = f64::from(spec.size.max(2) - 1);
            let ratio = match direction {
                GradientDirection::Horizontal => f64::from(x) / span,
                GradientDirection::Vertical => f64::from(y) / span,
                GradientDirection::Diagonal => (f64::from(x) + f64::from(y)) / (2.0 * span),
            };
            lerp_color(start, end, ratio)
        }
    }
}

fn lerp_color(a: Rgba8, b: Rgba8, t: f64) -> Rgba8 {
    let ch = |a: u8, b: u8| -> u8 {
        (f64::from(a) + (f64::from(b) - f64::from(a)) * t)
            .round()
            .clamp(0.0, 255.0) as u8
    };
    Rgba8::new(ch(a.r, b.r), ch(a.g, b.g), ch(a.b, b.b), ch(a.a, b.a))
}

/// Signed distance from `p` to a rounded rectangle: negative inside.
fn sd_rounded_rect(p: Point, rect: Rect, radius: f64) -> f64 {
    let r = radius.clamp(0.0, 0.5 * rect.width().min(rect.height()));
    let inner = rect.inset(-r);
    let dx = (inner.x0 - p.x).max(p.x - inner.x1);
    let dy = (inner.y0 - p.y).max(p.y - inner.y1);
    let outside = Vec2::new(dx.max(0.0), dy.max(0.0)).hypot();
    let inside = dx.max(dy).min(0.0);
    outside + inside - r
}

/// One-pixel antialiasing feather around the zero crossing.
fn coverage(sd: f64) -> f64 {
    (0.5 - sd).clamp(0.0, 1.0)
}

fn scale_premul(px: [u8; 4], factor: f64) -> [u8; 4] {
    if factor >= 1.0 {
        return px;
    }
    px.map(|c| (f64::from(c) * factor).round().clamp(0.0, 255.0) as u8)
}
