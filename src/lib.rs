//! Vivicon generates customized icon assets from SVG sources.
//!
//! One [`IconRequest`] describes the whole job: recoloring (solid or
//! gradient), a background plate with rounded corners and an outline, an
//! animation preset, and the output container. The API is
//! pipeline-oriented:
//!
//! - Describe an icon with an [`IconRequest`] (or a [`BatchSpec`] of them)
//! - Pick a rasterizer, usually [`ResvgRasterizer`]
//! - Call [`generate_icon`] or [`generate_batch`]
//!
//! Vector output stays vector: animation presets embed as SMIL markup and
//! backgrounds wrap the icon in a generated document. Raster output samples
//! the same preset timing into fixed-fps frames and composites them over
//! the rendered plate.
#![forbid(unsafe_code)]

pub mod animation;
pub mod assets;
pub mod encode;
pub mod foundation;
pub mod model;
pub mod pipeline;
pub mod render;

pub use crate::foundation::core::{Bitmap, Point, Rect, Rgba8, Vec2};
pub use crate::foundation::error::{ViviconError, ViviconResult};

pub use crate::animation::preset::{AnimationPreset, AnimationRequest, AnimationSpec};
pub use crate::animation::sampler::FramePlan;
pub use crate::encode::animated::AnimatedAsset;
pub use crate::model::{
    BackgroundStyle, BatchEntry, BatchSpec, GradientDirection, IconRequest, OutputFormat,
};
pub use crate::pipeline::{
    BatchOutcome, BatchReport, RenderOptions, generate_batch, generate_icon, read_batch_spec,
};
pub use crate::render::frames::{ResvgRasterizer, VectorRasterizer};
