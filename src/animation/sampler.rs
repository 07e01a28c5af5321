//! Fixed-frame-rate resampling of one animation loop cycle.

use crate::{
    animation::preset::AnimationSpec,
    foundation::error::{ViviconError, ViviconResult},
};

/// Upper bound on frames per export; anything past this is a sign of a
/// runaway duration/fps combination rather than a real request.
pub const MAX_FRAME_COUNT: usize = 10_000;

/// Discrete sampling plan covering exactly one loop cycle.
///
/// Sample times are `i / frame_count`: the t=1 boundary is deliberately not
/// sampled, because it renders identically to t=0 and a duplicated frame
/// stutters on loop restart.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FramePlan {
    frame_count: usize,
    frame_delay_ms: u32,
}

impl FramePlan {
    /// Plan a cycle for `spec` at `fps` (flip cycles already include their
    /// 10x hold/flip expansion via [`AnimationSpec::total_cycle_secs`]).
    pub fn for_spec(spec: &AnimationSpec, fps: u32) -> ViviconResult<Self> {
        Self::from_total_secs(spec.total_cycle_secs(), fps)
    }

    pub fn from_total_secs(total_secs: f64, fps: u32) -> ViviconResult<Self> {
        if fps == 0 {
            return Err(ViviconError::validation("frame rate must be > 0"));
        }
        if !total_secs.is_finite() || total_secs <= 0.0 {
            return Err(ViviconError::validation(
                "animation cycle length must be a positive number of seconds",
            ));
        }

        let exact = f64::from(fps) * total_secs;
        if exact.round() > MAX_FRAME_COUNT as f64 {
            return Err(ViviconError::validation(format!(
                "fps {fps} over {total_secs}s needs {} frames (limit {MAX_FRAME_COUNT})",
                exact.round()
            )));
        }
        let frame_count = (exact.round() as usize).max(1);
        let frame_delay_ms = ((total_secs * 1000.0 / frame_count as f64).round() as u32).max(1);
        Ok(Self {
            frame_count,
            frame_delay_ms,
        })
    }

    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    /// Delay of every frame in milliseconds (floor 1 ms).
    pub fn frame_delay_ms(&self) -> u32 {
        self.frame_delay_ms
    }

    /// Total play time after rounding, in milliseconds.
    pub fn total_play_ms(&self) -> u64 {
        self.frame_count as u64 * u64::from(self.frame_delay_ms)
    }

    /// Normalized sample times, evenly spaced over [0, 1).
    pub fn sample_times(&self) -> impl Iterator<Item = f64> + '_ {
        let n = self.frame_count;
        (0..n).map(move |i| i as f64 / n as f64)
    }
}
