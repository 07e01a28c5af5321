//! End-to-end icon generation.
//!
//! One request flows through a fixed sequence of markup edits (canvas
//! normalization, recolor), then forks by output container: vector output
//! embeds the animation and persists markup, still rasters rasterize the
//! wrapped document once, and the animated raster path samples the preset
//! track into frames over a shared backdrop plate.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::animation::embed;
use crate::animation::preset::AnimationSpec;
use crate::animation::sampler::FramePlan;
use crate::assets::{source, svg_edit};
use crate::encode::animated::{self, AnimatedAsset};
use crate::encode::still;
use crate::foundation::core::Bitmap;
use crate::foundation::error::{ViviconError, ViviconResult};
use crate::model::{BatchSpec, IconRequest, OutputFormat};
use crate::render::backdrop::render_backdrop;
use crate::render::composite;
use crate::render::frames::{self, VectorRasterizer};

/// Options shared by every export in a run.
#[derive(Clone, Debug)]
pub struct RenderOptions {
    /// Fraction of the canvas the animated sprite occupies; the margin
    /// keeps rotated corners inside the frame.
    pub icon_scale: f64,
    /// Worker threads for frame transforms; `None` sizes the pool to the
    /// machine.
    pub threads: Option<usize>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            icon_scale: 0.85,
            threads: None,
        }
    }
}

impl RenderOptions {
    fn validate(&self) -> ViviconResult<()> {
        if !self.icon_scale.is_finite() || self.icon_scale <= 0.0 || self.icon_scale > 1.0 {
            return Err(ViviconError::validation(format!(
                "icon_scale must be within (0, 1], got {}",
                self.icon_scale
            )));
        }
        Ok(())
    }
}

/// Generate one icon and write it to `out_path` in `format`.
#[tracing::instrument(skip(request, rasterizer, options), fields(source = %request.source))]
pub fn generate_icon(
    request: &IconRequest,
    format: OutputFormat,
    out_path: &Path,
    rasterizer: &dyn VectorRasterizer,
    options: &RenderOptions,
) -> ViviconResult<()> {
    request.validate()?;
    options.validate()?;

    let spec = resolve_animation(request);
    let base = prepare_markup(request)?;

    match (format, &spec) {
        (OutputFormat::Svg, spec) => {
            let mut markup = match spec {
                Some(spec) => embed::embed_animation(&base, spec),
                None => base,
            };
            if wants_backdrop(request) {
                markup =
                    svg_edit::wrap_with_background(&markup, request.size, &request.background);
            }
            write_output(out_path, markup.as_bytes())
        }
        (OutputFormat::Gif, Some(spec)) => {
            let asset = render_animated_asset(request, spec, &base, rasterizer, options)?;
            write_output(out_path, &animated::encode_gif_bytes(&asset)?)
        }
        (OutputFormat::Gif, None) => {
            let frame = rasterize_still(request, &base, rasterizer)?;
            let asset = AnimatedAsset {
                frames: vec![frame],
                frame_delay_ms: 100,
                loop_count: request.loop_count,
            };
            write_output(out_path, &animated::encode_gif_bytes(&asset)?)
        }
        (format, spec) => {
            if spec.is_some() {
                tracing::warn!(?format, "container is static, dropping animation");
            }
            let frame = rasterize_still(request, &base, rasterizer)?;
            let bytes = encode_still_bytes(format, &frame, request.quality)?;
            write_output(out_path, &bytes)
        }
    }
}

/// Resolve the request's animation; an unknown preset downgrades to "no
/// animation" instead of failing the request.
fn resolve_animation(request: &IconRequest) -> Option<AnimationSpec> {
    let animation = request.animation.as_ref()?;
    let spec = animation.resolve();
    if spec.is_none() {
        tracing::warn!(?animation, "unknown animation, generating static output");
    }
    spec
}

/// Load and normalize the static icon markup: source resolution, canvas
/// size plus namespace, and any requested recolor. Animation embedding and
/// the backdrop wrap are applied per output path.
fn prepare_markup(request: &IconRequest) -> ViviconResult<String> {
    let mut markup = source::load_markup(&request.source)?;
    markup = svg_edit::normalize_canvas(&markup, request.size);
    if let Some(color) = &request.color {
        markup = svg_edit::recolor(&markup, color, request.direction);
    }
    Ok(markup)
}

/// Any plate styling triggers the wrap; a bare corner radius draws an
/// invisible plate but still reserves the icon inset.
fn wants_backdrop(request: &IconRequest) -> bool {
    let style = &request.background;
    style.fill_color().is_some() || style.corner_radius > 0.0 || style.outline().is_some()
}

fn rasterize_still(
    request: &IconRequest,
    base: &str,
    rasterizer: &dyn VectorRasterizer,
) -> ViviconResult<Bitmap> {
    let markup = if wants_backdrop(request) {
        svg_edit::wrap_with_background(base, request.size, &request.background)
    } else {
        base.to_string()
    };
    rasterizer.rasterize(&markup, request.size, request.size)
}

/// Sample the animation into composited frames: backdrop plate once, one
/// transformed sprite per frame, centered.
fn render_animated_asset(
    request: &IconRequest,
    spec: &AnimationSpec,
    base: &str,
    rasterizer: &dyn VectorRasterizer,
    options: &RenderOptions,
) -> ViviconResult<AnimatedAsset> {
    let plan = FramePlan::for_spec(spec, request.fps)?;
    let backdrop = match request.background.resolve(request.size)? {
        Some(plate) => Some(render_backdrop(&plate)?),
        None => None,
    };

    // Pre-animated sources must not double-animate under the sampled
    // transform.
    let sprite_markup = svg_edit::strip_animation(base);
    let sprite_size = sprite_size(request.size, options.icon_scale);
    let sprites = frames::render_animation_frames(
        rasterizer,
        &sprite_markup,
        spec,
        &plan,
        sprite_size,
        options.threads,
    )?;

    let mut composed = Vec::with_capacity(sprites.len());
    for sprite in &sprites {
        let mut canvas = match &backdrop {
            Some(plate) => plate.clone(),
            None => Bitmap::new(request.size, request.size)?,
        };
        composite::blit_centered(&mut canvas, sprite);
        composed.push(canvas);
    }

    Ok(AnimatedAsset {
        frames: composed,
        frame_delay_ms: plan.frame_delay_ms(),
        loop_count: request.loop_count,
    })
}

fn sprite_size(canvas: u32, icon_scale: f64) -> u32 {
    ((f64::from(canvas) * icon_scale).round() as u32).max(1)
}

fn encode_still_bytes(
    format: OutputFormat,
    frame: &Bitmap,
    quality: u8,
) -> ViviconResult<Vec<u8>> {
    match format {
        OutputFormat::Png => still::encode_png_bytes(frame),
        OutputFormat::Webp => still::encode_webp_bytes(frame),
        OutputFormat::Ico => still::encode_ico_bytes(frame),
        OutputFormat::Jpeg => still::encode_jpeg_bytes(frame, quality),
        OutputFormat::Svg | OutputFormat::Gif => Err(ViviconError::encode(
            "svg and gif are not still containers",
        )),
    }
}

fn write_output(path: &Path, bytes: &[u8]) -> ViviconResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("create output directory {}", parent.display()))?;
    }
    fs::write(path, bytes).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

/// Read a batch spec from a JSON document.
pub fn read_batch_spec(path: &Path) -> ViviconResult<BatchSpec> {
    let text =
        fs::read_to_string(path).with_context(|| format!("read batch spec {}", path.display()))?;
    let batch: BatchSpec = serde_json::from_str(&text)
        .with_context(|| format!("parse batch spec {}", path.display()))?;
    Ok(batch)
}

/// Outcome of one batch entry.
#[derive(Clone, Debug)]
pub struct BatchOutcome {
    pub name: String,
    pub path: PathBuf,
    /// `None` when the icon was written.
    pub error: Option<String>,
}

impl BatchOutcome {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Clone, Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<BatchOutcome>,
}

impl BatchReport {
    pub fn written(&self) -> usize {
        self.outcomes.iter().filter(|o| o.succeeded()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.written()
    }
}

/// Generate every icon in a batch into `out_dir`. One icon's failure is
/// recorded in its outcome and never aborts the rest.
#[tracing::instrument(skip(batch, rasterizer, options), fields(icons = batch.icons.len()))]
pub fn generate_batch(
    batch: &BatchSpec,
    out_dir: &Path,
    rasterizer: &dyn VectorRasterizer,
    options: &RenderOptions,
) -> ViviconResult<BatchReport> {
    batch.validate()?;

    let mut report = BatchReport::default();
    for (index, entry) in batch.icons.iter().enumerate() {
        let request = entry.to_request(batch);
        let format = entry
            .format()
            .or(batch.format)
            .unwrap_or(OutputFormat::Svg);
        let name = entry.output_stem(index);
        let path = out_dir.join(format!("{name}.{}", format.extension()));

        let error = generate_icon(&request, format, &path, rasterizer, options).err();
        match &error {
            Some(e) => tracing::warn!(icon = %name, error = %e, "icon failed"),
            None => tracing::debug!(icon = %name, path = %path.display(), "icon written"),
        }
        report.outcomes.push(BatchOutcome {
            name,
            path,
            error: error.map(|e| e.to_string()),
        });
    }
    Ok(report)
}
