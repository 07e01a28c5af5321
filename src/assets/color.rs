//! Color grammar: hex, `rgb()`/`rgba()` functions, CSS named colors, and
//! `(start,end)` gradient pairs.
//!
//! Single colors degrade to opaque white rather than failing; a malformed
//! gradient pair is a hard error because silently dropping one stop would
//! change the output shape.

use crate::foundation::core::Rgba8;
use crate::foundation::error::{ViviconError, ViviconResult};

/// A resolved fill request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorSpec {
    Solid(Rgba8),
    Gradient(Rgba8, Rgba8),
}

/// Parse either a single color or a `(start,end)` gradient pair.
pub fn parse_spec(input: &str) -> ViviconResult<ColorSpec> {
    let trimmed = input.trim();
    if trimmed.starts_with('(') {
        let (start, end) = gradient_components(trimmed).ok_or_else(|| {
            ViviconError::validation(format!(
                "gradient must be '(color1,color2)', got {trimmed:?}"
            ))
        })?;
        return Ok(ColorSpec::Gradient(parse(start), parse(end)));
    }
    Ok(ColorSpec::Solid(parse(trimmed)))
}

/// The two components of a `(start,end)` pair, trimmed. `None` unless the
/// input is parenthesized with exactly two comma-separated entries.
pub fn gradient_components(input: &str) -> Option<(&str, &str)> {
    let inner = input.trim().strip_prefix('(')?.strip_suffix(')')?;
    let parts: Vec<&str> = inner.split(',').map(str::trim).collect();
    match parts[..] {
        [start, end] if !start.is_empty() && !end.is_empty() => Some((start, end)),
        _ => None,
    }
}

/// Parse a single color, falling back to opaque white.
pub fn parse(input: &str) -> Rgba8 {
    match try_parse(input) {
        Some(color) => color,
        None => {
            tracing::warn!(color = input, "unrecognized color, using white");
            Rgba8::WHITE
        }
    }
}

fn try_parse(input: &str) -> Option<Rgba8> {
    let s = input.trim();
    if let Some(hex) = s.strip_prefix('#') {
        return parse_hex(hex);
    }
    let lower = s.to_ascii_lowercase();
    if let Some(args) = lower
        .strip_prefix("rgba")
        .or_else(|| lower.strip_prefix("rgb"))
    {
        return parse_rgb_func(args);
    }
    named(&lower)
}

fn parse_hex(hex: &str) -> Option<Rgba8> {
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let nibble = |i: usize| u8::from_str_radix(&hex[i..=i], 16).ok();
    let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    match hex.len() {
        3 => Some(Rgba8::opaque(
            nibble(0)? * 17,
            nibble(1)? * 17,
            nibble(2)? * 17,
        )),
        4 => Some(Rgba8::new(
            nibble(0)? * 17,
            nibble(1)? * 17,
            nibble(2)? * 17,
            nibble(3)? * 17,
        )),
        6 => Some(Rgba8::opaque(byte(0)?, byte(2)?, byte(4)?)),
        8 => Some(Rgba8::new(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
        _ => None,
    }
}

fn parse_rgb_func(args: &str) -> Option<Rgba8> {
    let inner = args.trim().strip_prefix('(')?.strip_suffix(')')?;
    let parts: Vec<&str> = inner.split(',').map(str::trim).collect();
    if parts.len() != 3 && parts.len() != 4 {
        return None;
    }
    let channel = |s: &str| -> Option<u8> {
        let v: i64 = s.parse().ok()?;
        Some(v.clamp(0, 255) as u8)
    };
    let r = channel(parts[0])?;
    let g = channel(parts[1])?;
    let b = channel(parts[2])?;
    let a = match parts.get(3) {
        // CSS alpha is a 0..1 fraction.
        Some(frac) => {
            let v: f64 = frac.parse().ok()?;
            if !(0.0..=1.0).contains(&v) {
                return None;
            }
            (v * 255.0).round() as u8
        }
        None => 255,
    };
    Some(Rgba8::new(r, g, b, a))
}

fn named(name: &str) -> Option<Rgba8> {
    let (r, g, b) = match name {
        "black" => (0, 0, 0),
        "silver" => (192, 192, 192),
        "gray" | "grey" => (128, 128, 128),
        "white" => (255, 255, 255),
        "maroon" => (128, 0, 0),
        "red" => (255, 0, 0),
        "purple" => (128, 0, 128),
        "fuchsia" | "magenta" => (255, 0, 255),
        "green" => (0, 128, 0),
        "lime" => (0, 255, 0),
        "olive" => (128, 128, 0),
        "yellow" => (255, 255, 0),
        "navy" => (0, 0, 128),
        "blue" => (0, 0, 255),
        "teal" => (0, 128, 128),
        "aqua" | "cyan" => (0, 255, 255),
        "orange" => (255, 165, 0),
        "pink" => (255, 192, 203),
        "brown" => (165, 42, 42),
        "gold" => (255, 215, 0),
        "indigo" => (75, 0, 130),
        "violet" => (238, 130, 238),
        "transparent" => return Some(Rgba8::new(0, 0, 0, 0)),
        _ => return None,
    };
    Some(Rgba8::opaque(r, g, b))
}
