//! Keyframe tracks: the single timing model behind both the SVG-native
//! animation output and the raster frame sampler.
//!
//! Tracks live in normalized cycle time: first key at t=0, last at t=1, and
//! the loop closes (value at 1 equals value at 0) so sampled playback can
//! wrap without a visible seam.

use kurbo::Vec2;

use crate::{
    animation::ease::Ease,
    animation::preset::AnimationPreset,
    foundation::error::{ViviconError, ViviconResult},
};

pub trait Lerp: Clone {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self;
}

impl Lerp for f64 {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        a + (b - a) * t
    }
}

impl Lerp for Vec2 {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        Vec2::new(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t)
    }
}

/// One keyframe: value at normalized time `t`, plus the ease applied over
/// the segment this key starts.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Keyframe<T> {
    pub t: f64,
    pub value: T,
    pub ease: Ease,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Track<T> {
    keys: Vec<Keyframe<T>>,
}

impl<T: Lerp> Track<T> {
    /// Build a track, enforcing the normalized-time shape: non-empty,
    /// first key at 0, last key at 1, strictly increasing times.
    pub fn new(keys: Vec<Keyframe<T>>) -> ViviconResult<Self> {
        if keys.is_empty() {
            return Err(ViviconError::validation("track must have keyframes"));
        }
        let first = keys[0].t;
        let last = keys[keys.len() - 1].t;
        if first != 0.0 || last != 1.0 {
            return Err(ViviconError::validation(
                "track must start at t=0 and end at t=1",
            ));
        }
        for pair in keys.windows(2) {
            if pair[1].t <= pair[0].t {
                return Err(ViviconError::validation(
                    "track keyframe times must be strictly increasing",
                ));
            }
        }
        Ok(Self { keys })
    }

    fn from_keys(keys: Vec<Keyframe<T>>) -> Self {
        Self { keys }
    }

    pub fn keys(&self) -> &[Keyframe<T>] {
        &self.keys
    }

    /// Evaluate at normalized time `t` (clamped to [0,1]): find the
    /// bracketing pair, ease the local fraction, interpolate.
    pub fn sample(&self, t: f64) -> T {
        let t = t.clamp(0.0, 1.0);
        let idx = self.keys.partition_point(|k| k.t <= t);
        if idx == 0 {
            return self.keys[0].value.clone();
        }
        if idx == self.keys.len() {
            return self.keys[idx - 1].value.clone();
        }
        let a = &self.keys[idx - 1];
        let b = &self.keys[idx];
        let local = (t - a.t) / (b.t - a.t);
        T::lerp(&a.value, &b.value, a.ease.apply(local))
    }
}

impl<T: Lerp + PartialEq> Track<T> {
    /// True when the loop boundary is seamless (value at t=1 equals t=0).
    pub fn closes_loop(&self) -> bool {
        self.keys[0].value == self.keys[self.keys.len() - 1].value
    }
}

/// Which axis a flip preset inverts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlipAxis {
    Horizontal,
    Vertical,
}

/// Rotation in degrees: 0 at the loop start, one full clockwise turn per
/// cycle, linear.
pub fn spin_track() -> Track<f64> {
    Track::from_keys(vec![
        Keyframe {
            t: 0.0,
            value: 0.0,
            ease: Ease::Linear,
        },
        Keyframe {
            t: 1.0,
            value: 360.0,
            ease: Ease::Linear,
        },
    ])
}

/// Two-axis scale: full size, down to 10% at the half cycle, back to full.
/// Both halves are eased so the contraction reads as organic rather than
/// mechanical.
pub fn pulse_track() -> Track<Vec2> {
    Track::from_keys(vec![
        Keyframe {
            t: 0.0,
            value: Vec2::new(1.0, 1.0),
            ease: Ease::SMOOTH,
        },
        Keyframe {
            t: 0.5,
            value: Vec2::new(0.1, 0.1),
            ease: Ease::SMOOTH,
        },
        Keyframe {
            t: 1.0,
            value: Vec2::new(1.0, 1.0),
            ease: Ease::SMOOTH,
        },
    ])
}

/// Flip scale track: hold upright for 4 flip-durations, invert and recover
/// within one, hold again, invert again. The 4:1 hold/flip ratio makes the
/// icon read as a subtle double-take rather than a busy continuous flip, so
/// the whole cycle spans 10 flip-durations.
pub fn flip_track(axis: FlipAxis) -> Track<Vec2> {
    // Key times as fractions of the 10x cycle: two long holds, two quick
    // flips with their zero-crossing midpoints.
    const TIMES: [f64; 7] = [0.0, 0.4, 0.45, 0.5, 0.9, 0.95, 1.0];

    let flipped = match axis {
        FlipAxis::Horizontal => Vec2::new(-1.0, 1.0),
        FlipAxis::Vertical => Vec2::new(1.0, -1.0),
    };
    let upright = Vec2::new(1.0, 1.0);
    let values = [
        upright, upright, flipped, upright, upright, flipped, upright,
    ];

    Track::from_keys(
        TIMES
            .iter()
            .zip(values)
            .map(|(&t, value)| Keyframe {
                t,
                value,
                ease: Ease::SMOOTH,
            })
            .collect(),
    )
}

/// The per-preset animated property, tagged by shape.
#[derive(Clone, Debug, PartialEq)]
pub enum TransformTrack {
    /// Rotation angle in degrees around the pivot.
    Rotate(Track<f64>),
    /// Two-axis scale factor about the pivot.
    Scale(Track<Vec2>),
}

/// Build the source-of-truth track for a preset.
pub fn synthesize(preset: AnimationPreset) -> TransformTrack {
    match preset {
        AnimationPreset::Spin => TransformTrack::Rotate(spin_track()),
        AnimationPreset::Pulse => TransformTrack::Scale(pulse_track()),
        AnimationPreset::FlipHorizontal => TransformTrack::Scale(flip_track(FlipAxis::Horizontal)),
        AnimationPreset::FlipVertical => TransformTrack::Scale(flip_track(FlipAxis::Vertical)),
    }
}
