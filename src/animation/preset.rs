use crate::animation::duration;

/// The built-in animation patterns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnimationPreset {
    Spin,
    Pulse,
    #[serde(alias = "flip-h")]
    FlipHorizontal,
    #[serde(alias = "flip-v")]
    FlipVertical,
}

impl AnimationPreset {
    /// Parse a preset token; both the long and the short flip spellings are
    /// accepted. `None` means "no recognized animation".
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "spin" => Some(Self::Spin),
            "pulse" => Some(Self::Pulse),
            "flip-h" | "flip-horizontal" => Some(Self::FlipHorizontal),
            "flip-v" | "flip-vertical" => Some(Self::FlipVertical),
            _ => None,
        }
    }

    /// Duration applied when a request does not carry one.
    pub fn default_duration_token(self) -> &'static str {
        match self {
            Self::Spin => "4s",
            Self::Pulse => "1.5s",
            Self::FlipHorizontal | Self::FlipVertical => "1s",
        }
    }

    pub fn is_flip(self) -> bool {
        matches!(self, Self::FlipHorizontal | Self::FlipVertical)
    }
}

/// A fully resolved animation: preset plus canonical duration token.
///
/// Parsed once at the boundary; every later stage (embedder, sampler,
/// rasterizer) reads this one representation.
#[derive(Clone, Debug, PartialEq)]
pub struct AnimationSpec {
    preset: AnimationPreset,
    duration_token: String,
}

impl AnimationSpec {
    /// Resolve a preset and an optional raw duration token. Missing,
    /// malformed, or non-positive durations fall back to the preset
    /// default, keeping the duration strictly positive.
    pub fn new(preset: AnimationPreset, duration: Option<&str>) -> Self {
        let token = duration
            .and_then(duration::normalize)
            .filter(|t| duration::to_seconds(t) > 0.0)
            .unwrap_or_else(|| preset.default_duration_token().to_string());
        Self {
            preset,
            duration_token: token,
        }
    }

    /// Parse a shorthand token: `"spin"`, `"spin:2s"`, `"flip-h:250ms"`.
    /// Unknown presets yield `None` (callers pass content through
    /// unchanged).
    pub fn parse(token: &str) -> Option<Self> {
        let (name, dur) = match token.split_once(':') {
            Some((name, dur)) => (name, Some(dur)),
            None => (token, None),
        };
        let preset = AnimationPreset::from_token(name)?;
        Some(Self::new(preset, dur))
    }

    pub fn preset(&self) -> AnimationPreset {
        self.preset
    }

    /// Canonical suffixed duration token, e.g. `"2s"` or `"250ms"`.
    pub fn duration_token(&self) -> &str {
        &self.duration_token
    }

    /// Base duration in seconds (for flips, the duration of one quick
    /// flip, not the whole cycle).
    pub fn duration_secs(&self) -> f64 {
        duration::to_seconds(&self.duration_token)
    }

    /// Length of one full loop in seconds. Flip cycles span ten base
    /// durations (hold 4, flip 1, hold 4, flip 1).
    pub fn total_cycle_secs(&self) -> f64 {
        let base = self.duration_secs();
        if self.preset.is_flip() { base * 10.0 } else { base }
    }
}

/// Animation field as it appears in requests: either the shorthand string
/// or a structured object. Kept raw so an unknown preset downgrades to "no
/// animation" instead of failing deserialization.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum AnimationRequest {
    Shorthand(String),
    Structured {
        #[serde(alias = "type")]
        preset: String,
        #[serde(default, alias = "dur")]
        duration: Option<String>,
    },
}

impl AnimationRequest {
    /// Resolve to a concrete spec, or `None` for unknown presets.
    pub fn resolve(&self) -> Option<AnimationSpec> {
        match self {
            Self::Shorthand(token) => AnimationSpec::parse(token),
            Self::Structured { preset, duration } => {
                let preset = AnimationPreset::from_token(preset)?;
                Some(AnimationSpec::new(preset, duration.as_deref()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shorthand_with_duration() {
        let spec = AnimationSpec::parse("spin:2s").unwrap();
        assert_eq!(spec.preset(), AnimationPreset::Spin);
        assert_eq!(spec.duration_token(), "2s");
        assert!((spec.duration_secs() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn shorthand_without_duration_uses_preset_default() {
        assert_eq!(AnimationSpec::parse("spin").unwrap().duration_token(), "4s");
        assert_eq!(
            AnimationSpec::parse("pulse").unwrap().duration_token(),
            "1.5s"
        );
        assert_eq!(
            AnimationSpec::parse("flip-h").unwrap().duration_token(),
            "1s"
        );
    }

    #[test]
    fn bare_number_durations_are_treated_as_seconds() {
        let spec = AnimationSpec::parse("pulse:2").unwrap();
        assert_eq!(spec.duration_token(), "2s");
    }

    #[test]
    fn unknown_preset_is_rejected() {
        assert_eq!(AnimationSpec::parse("wobble"), None);
        assert_eq!(AnimationSpec::parse(""), None);
        assert_eq!(AnimationSpec::parse("wobble:2s"), None);
    }

    #[test]
    fn long_and_short_flip_spellings_agree() {
        assert_eq!(
            AnimationSpec::parse("flip-h:1s"),
            AnimationSpec::parse("flip-horizontal:1s")
        );
        assert_eq!(
            AnimationSpec::parse("flip-v"),
            AnimationSpec::parse("flip-vertical")
        );
    }

    #[test]
    fn non_positive_duration_falls_back_to_default() {
        assert_eq!(
            AnimationSpec::parse("spin:-2s").unwrap().duration_token(),
            "4s"
        );
        assert_eq!(
            AnimationSpec::parse("spin:0s").unwrap().duration_token(),
            "4s"
        );
    }

    #[test]
    fn flip_cycle_is_ten_base_durations() {
        let spec = AnimationSpec::parse("flip-v:1s").unwrap();
        assert!((spec.total_cycle_secs() - 10.0).abs() < 1e-9);
        let spin = AnimationSpec::parse("spin:1s").unwrap();
        assert!((spin.total_cycle_secs() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn structured_request_resolves_with_aliases() {
        let req: AnimationRequest =
            serde_json::from_value(serde_json::json!({"type": "spin", "dur": "0.5s"})).unwrap();
        let spec = req.resolve().unwrap();
        assert_eq!(spec.preset(), AnimationPreset::Spin);
        assert_eq!(spec.duration_token(), "0.5s");

        let req: AnimationRequest =
            serde_json::from_value(serde_json::json!({"preset": "pulse"})).unwrap();
        assert_eq!(req.resolve().unwrap().duration_token(), "1.5s");
    }

    #[test]
    fn structured_request_with_unknown_preset_resolves_to_none() {
        let req: AnimationRequest =
            serde_json::from_value(serde_json::json!({"type": "unknown"})).unwrap();
        assert!(req.resolve().is_none());
    }

    #[test]
    fn shorthand_request_round_trips_through_json() {
        let req: AnimationRequest = serde_json::from_value(serde_json::json!("flip-h:1s")).unwrap();
        let spec = req.resolve().unwrap();
        assert_eq!(spec.preset(), AnimationPreset::FlipHorizontal);
    }
}
