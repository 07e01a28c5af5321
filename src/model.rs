use std::path::Path;

use crate::animation::preset::AnimationRequest;
use crate::assets::color::{self, ColorSpec};
use crate::foundation::core::Rgba8;
use crate::foundation::error::{ViviconError, ViviconResult};
use crate::render::backdrop::{BackdropFill, BackdropSpec, Outline};

pub use crate::render::backdrop::GradientDirection;

/// Output container for a generated icon.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Svg,
    Png,
    Webp,
    Gif,
    Ico,
    Jpeg,
}

impl OutputFormat {
    pub fn from_extension(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "svg" => Some(Self::Svg),
            "png" => Some(Self::Png),
            "webp" => Some(Self::Webp),
            "gif" => Some(Self::Gif),
            "ico" => Some(Self::Ico),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Svg => "svg",
            Self::Png => "png",
            Self::Webp => "webp",
            Self::Gif => "gif",
            Self::Ico => "ico",
            Self::Jpeg => "jpg",
        }
    }

    /// SVG animates natively (SMIL); GIF is the animated raster container.
    pub fn supports_animation(self) -> bool {
        matches!(self, Self::Svg | Self::Gif)
    }
}

/// Backdrop plate description as it arrives from a user: raw color
/// strings, resolved to pixels via [`BackgroundStyle::resolve`].
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BackgroundStyle {
    /// Solid color or `(start,end)` gradient pair; empty and "none" mean
    /// no backdrop fill.
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub direction: GradientDirection,
    #[serde(default)]
    pub corner_radius: f64,
    #[serde(default)]
    pub outline_width: f64,
    #[serde(default)]
    pub outline_color: Option<String>,
}

impl BackgroundStyle {
    pub fn validate(&self) -> ViviconResult<()> {
        if !self.corner_radius.is_finite() || self.corner_radius < 0.0 {
            return Err(ViviconError::validation(
                "background corner_radius must be finite and >= 0",
            ));
        }
        if !self.outline_width.is_finite() || self.outline_width < 0.0 {
            return Err(ViviconError::validation(
                "background outline_width must be finite and >= 0",
            ));
        }
        Ok(())
    }

    pub fn fill_color(&self) -> Option<&str> {
        self.color
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty() && !c.eq_ignore_ascii_case("none"))
    }

    pub fn outline(&self) -> Option<(&str, f64)> {
        let color = self.outline_color.as_deref().map(str::trim)?;
        if color.is_empty() || self.outline_width <= 0.0 {
            return None;
        }
        Some((color, self.outline_width))
    }

    /// Resolve to a pixel-space backdrop, or `None` when there is nothing
    /// to draw. An outline without a fill gets a transparent plate.
    pub fn resolve(&self, size: u32) -> ViviconResult<Option<BackdropSpec>> {
        let fill_color = self.fill_color();
        let outline = self
            .outline()
            .map(|(c, width)| Outline {
                color: color::parse(c),
                width,
            });
        if fill_color.is_none() && outline.is_none() {
            return Ok(None);
        }

        let fill = match fill_color {
            None => BackdropFill::Solid(Rgba8::new(0, 0, 0, 0)),
            Some(raw) => match color::parse_spec(raw)? {
                ColorSpec::Solid(c) => BackdropFill::Solid(c),
                ColorSpec::Gradient(start, end) => BackdropFill::Gradient {
                    start,
                    end,
                    direction: self.direction,
                },
            },
        };
        Ok(Some(BackdropSpec {
            size,
            fill,
            corner_radius: self.corner_radius,
            outline,
        }))
    }
}

/// One icon to generate.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct IconRequest {
    /// Path to an SVG file, or inline markup (recognized by a leading '<').
    pub source: String,
    #[serde(default = "default_size")]
    pub size: u32,
    /// Icon recolor: solid color or `(start,end)` gradient pair.
    #[serde(default)]
    pub color: Option<String>,
    /// Direction for an icon gradient recolor.
    #[serde(default)]
    pub direction: GradientDirection,
    #[serde(default)]
    pub background: BackgroundStyle,
    /// Animation, shorthand (`"spin:2s"`) or structured
    /// (`{"preset": "spin", "duration": "2s"}`).
    #[serde(default)]
    pub animation: Option<AnimationRequest>,
    #[serde(default = "default_fps")]
    pub fps: u32,
    /// Animation repeats; 0 loops forever.
    #[serde(default)]
    pub loop_count: u16,
    /// JPEG quality, 1-100.
    #[serde(default = "default_quality")]
    pub quality: u8,
}

fn default_size() -> u32 {
    256
}

fn default_fps() -> u32 {
    20
}

fn default_quality() -> u8 {
    95
}

impl IconRequest {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            size: default_size(),
            color: None,
            direction: GradientDirection::default(),
            background: BackgroundStyle::default(),
            animation: None,
            fps: default_fps(),
            loop_count: 0,
            quality: default_quality(),
        }
    }

    pub fn validate(&self) -> ViviconResult<()> {
        if self.source.trim().is_empty() {
            return Err(ViviconError::validation("icon source must not be empty"));
        }
        if !(16..=4096).contains(&self.size) {
            return Err(ViviconError::validation(format!(
                "size must be within 16..=4096, got {}",
                self.size
            )));
        }
        if !(1..=120).contains(&self.fps) {
            return Err(ViviconError::validation(format!(
                "fps must be within 1..=120, got {}",
                self.fps
            )));
        }
        if !(1..=100).contains(&self.quality) {
            return Err(ViviconError::validation(format!(
                "quality must be within 1..=100, got {}",
                self.quality
            )));
        }
        if let Some(color) = &self.color {
            // Pair syntax must be well formed even though single colors
            // degrade to white.
            color::parse_spec(color)?;
        }
        self.background.validate()?;
        Ok(())
    }
}

/// A batch file: shared settings plus one entry per icon.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BatchSpec {
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub direction: GradientDirection,
    #[serde(default = "default_size")]
    pub size: u32,
    #[serde(default)]
    pub background: BackgroundStyle,
    #[serde(default)]
    pub animation: Option<AnimationRequest>,
    #[serde(default = "default_fps")]
    pub fps: u32,
    #[serde(default)]
    pub loop_count: u16,
    #[serde(default = "default_quality")]
    pub quality: u8,
    /// Container for every entry; per-entry format wins over this.
    #[serde(default)]
    pub format: Option<OutputFormat>,
    pub icons: Vec<BatchEntry>,
}

/// Either a bare source string or a detailed entry with overrides.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum BatchEntry {
    Source(String),
    Detailed {
        source: String,
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        color: Option<String>,
        #[serde(default)]
        size: Option<u32>,
        #[serde(default)]
        animation: Option<AnimationRequest>,
        #[serde(default)]
        format: Option<OutputFormat>,
    },
}

impl BatchEntry {
    pub fn source(&self) -> &str {
        match self {
            Self::Source(source) => source,
            Self::Detailed { source, .. } => source,
        }
    }

    /// Output stem: explicit name, else the source file stem, else a
    /// positional fallback for inline markup.
    pub fn output_stem(&self, index: usize) -> String {
        if let Self::Detailed {
            name: Some(name), ..
        } = self
        {
            return name.clone();
        }
        let source = self.source().trim();
        if !source.starts_with('<')
            && let Some(stem) = Path::new(source).file_stem().and_then(|s| s.to_str())
        {
            return stem.to_string();
        }
        format!("icon-{index}")
    }

    pub fn format(&self) -> Option<OutputFormat> {
        match self {
            Self::Source(_) => None,
            Self::Detailed { format, .. } => *format,
        }
    }

    /// Merge this entry over the batch-wide defaults.
    pub fn to_request(&self, batch: &BatchSpec) -> IconRequest {
        let mut request = IconRequest {
            source: self.source().to_string(),
            size: batch.size,
            color: batch.color.clone(),
            direction: batch.direction,
            background: batch.background.clone(),
            animation: batch.animation.clone(),
            fps: batch.fps,
            loop_count: batch.loop_count,
            quality: batch.quality,
        };
        if let Self::Detailed {
            color,
            size,
            animation,
            ..
        } = self
        {
            if let Some(color) = color {
                request.color = Some(color.clone());
            }
            if let Some(size) = size {
                request.size = *size;
            }
            if let Some(animation) = animation {
                request.animation = Some(animation.clone());
            }
        }
        request
    }
}

impl BatchSpec {
    pub fn validate(&self) -> ViviconResult<()> {
        if self.icons.is_empty() {
            return Err(ViviconError::validation("batch has no icons"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_round_trips_through_extension() {
        let path = Path::new("out/icon.webp");
        assert_eq!(OutputFormat::from_extension(path), Some(OutputFormat::Webp));
        assert_eq!(
            OutputFormat::from_extension(Path::new("a.JPEG")),
            Some(OutputFormat::Jpeg)
        );
        assert_eq!(OutputFormat::from_extension(Path::new("a.tiff")), None);
        assert_eq!(OutputFormat::from_extension(Path::new("noext")), None);
    }

    #[test]
    fn only_svg_and_gif_animate() {
        assert!(OutputFormat::Svg.supports_animation());
        assert!(OutputFormat::Gif.supports_animation());
        assert!(!OutputFormat::Png.supports_animation());
        assert!(!OutputFormat::Webp.supports_animation());
    }

    #[test]
    fn request_defaults_fill_in() {
        let request: IconRequest = serde_json::from_str(r#"{"source": "icon.svg"}"#).unwrap();
        assert_eq!(request.size, 256);
        assert_eq!(request.fps, 20);
        assert_eq!(request.quality, 95);
        assert_eq!(request.loop_count, 0);
        request.validate().unwrap();
    }

    #[test]
    fn animation_accepts_shorthand_and_structured_forms() {
        let request: IconRequest =
            serde_json::from_str(r#"{"source": "a.svg", "animation": "spin:2s"}"#).unwrap();
        let spec = request.animation.unwrap().resolve().unwrap();
        assert_eq!(spec.duration_token(), "2s");

        let request: IconRequest = serde_json::from_str(
            r#"{"source": "a.svg", "animation": {"type": "pulse", "duration": "1s"}}"#,
        )
        .unwrap();
        let spec = request.animation.unwrap().resolve().unwrap();
        assert_eq!(spec.duration_token(), "1s");
    }

    #[test]
    fn out_of_range_settings_fail_validation() {
        let mut request = IconRequest::new("icon.svg");
        request.size = 8;
        assert!(request.validate().is_err());

        let mut request = IconRequest::new("icon.svg");
        request.fps = 0;
        assert!(request.validate().is_err());

        let mut request = IconRequest::new("icon.svg");
        request.color = Some("(red, blue, green)".to_string());
        assert!(request.validate().is_err());
    }

    #[test]
    fn background_none_resolves_to_nothing() {
        let style = BackgroundStyle {
            color: Some("none".to_string()),
            ..BackgroundStyle::default()
        };
        assert!(style.resolve(64).unwrap().is_none());
    }

    #[test]
    fn background_outline_without_fill_gets_a_clear_plate() {
        let style = BackgroundStyle {
            outline_width: 2.0,
            outline_color: Some("black".to_string()),
            ..BackgroundStyle::default()
        };
        let spec = style.resolve(64).unwrap().unwrap();
        assert_eq!(spec.fill, BackdropFill::Solid(Rgba8::new(0, 0, 0, 0)));
        assert!(spec.outline.is_some());
    }

    #[test]
    fn batch_entries_deserialize_bare_or_detailed() {
        let json = r#"{
            "size": 64,
            "color": "red",
            "icons": [
                "icons/home.svg",
                {"source": "icons/save.svg", "name": "disk", "size": 32}
            ]
        }"#;
        let batch: BatchSpec = serde_json::from_str(json).unwrap();
        batch.validate().unwrap();
        assert_eq!(batch.icons.len(), 2);

        let first = batch.icons[0].to_request(&batch);
        assert_eq!(first.size, 64);
        assert_eq!(first.color.as_deref(), Some("red"));
        assert_eq!(batch.icons[0].output_stem(0), "home");

        let second = batch.icons[1].to_request(&batch);
        assert_eq!(second.size, 32);
        assert_eq!(batch.icons[1].output_stem(1), "disk");
    }

    #[test]
    fn inline_markup_entries_get_positional_stems() {
        let entry = BatchEntry::Source("<svg viewBox=\"0 0 24 24\"/>".to_string());
        assert_eq!(entry.output_stem(3), "icon-3");
    }
}
