//! Animation model: presets, duration grammar, keyframe tracks, frame
//! sampling, and SVG-native embedding.
//!
//! A single timing model drives both output paths. [`track::synthesize`]
//! produces the normalized keyframe track for a preset; [`embed`] projects
//! that track into SMIL markup for vector output, and the rasterizer
//! samples the same track per frame for animated raster output.

pub mod duration;
pub mod ease;
pub mod embed;
pub mod preset;
pub mod sampler;
pub mod track;
