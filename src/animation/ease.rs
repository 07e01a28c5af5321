/// Easing curve applied over a single keyframe segment.
///
/// `CubicBezier` follows the CSS/SMIL convention: control points `(x1, y1)`
/// and `(x2, y2)` between fixed endpoints (0,0) and (1,1), evaluated by
/// solving the parametric x-curve for the input time.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Ease {
    Linear,
    CubicBezier { x1: f64, y1: f64, x2: f64, y2: f64 },
}

impl Ease {
    /// The ease-in-out spline shared by the pulse and flip presets
    /// (`keySplines="0.42 0 0.58 1"`).
    pub const SMOOTH: Ease = Ease::CubicBezier {
        x1: 0.42,
        y1: 0.0,
        x2: 0.58,
        y2: 1.0,
    };

    /// Map normalized time `t` in [0,1] through the curve. Input outside
    /// the unit interval is clamped.
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Ease::Linear => t,
            Ease::CubicBezier { x1, y1, x2, y2 } => {
                let u = solve_bezier_x(x1, x2, t);
                sample_curve(y1, y2, u)
            }
        }
    }

    /// SMIL `keySplines` entry for this ease, if it is a spline.
    pub fn key_spline(self) -> Option<String> {
        match self {
            Ease::Linear => None,
            Ease::CubicBezier { x1, y1, x2, y2 } => Some(format!("{x1} {y1} {x2} {y2}")),
        }
    }
}

/// Evaluate one cubic axis with endpoints 0 and 1 and control values
/// `p1`, `p2` at parameter `u`.
fn sample_curve(p1: f64, p2: f64, u: f64) -> f64 {
    let c = 3.0 * p1;
    let b = 3.0 * (p2 - p1) - c;
    let a = 1.0 - c - b;
    ((a * u + b) * u + c) * u
}

fn sample_curve_derivative(p1: f64, p2: f64, u: f64) -> f64 {
    let c = 3.0 * p1;
    let b = 3.0 * (p2 - p1) - c;
    let a = 1.0 - c - b;
    (3.0 * a * u + 2.0 * b) * u + c
}

/// Find `u` such that x(u) = x, Newton first, bisection when the slope is
/// too flat for Newton to be trusted.
fn solve_bezier_x(x1: f64, x2: f64, x: f64) -> f64 {
    const EPSILON: f64 = 1e-7;

    let mut u = x;
    for _ in 0..8 {
        let err = sample_curve(x1, x2, u) - x;
        if err.abs() < EPSILON {
            return u;
        }
        let d = sample_curve_derivative(x1, x2, u);
        if d.abs() < 1e-6 {
            break;
        }
        u -= err / d;
    }

    let mut lo = 0.0;
    let mut hi = 1.0;
    u = x;
    while hi - lo > EPSILON {
        let val = sample_curve(x1, x2, u);
        if (val - x).abs() < EPSILON {
            return u;
        }
        if val < x {
            lo = u;
        } else {
            hi = u;
        }
        u = (lo + hi) / 2.0;
    }
    u
}
