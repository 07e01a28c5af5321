//! Duration token handling for animation specs.
//!
//! Tokens come from user input ("2", "2s", "250ms") and are kept lenient on
//! purpose: a malformed token degrades to a default instead of failing the
//! whole generation.

/// Normalize a duration token to a unit-suffixed form.
///
/// Bare numbers are assumed to be seconds ("2" -> "2s"); already-suffixed
/// tokens are kept verbatim. Returns `None` for empty or unrecognizable
/// input.
pub fn normalize(token: &str) -> Option<String> {
    let p = token.trim();
    if p.is_empty() {
        return None;
    }
    if p.ends_with("ms") || p.ends_with('s') {
        return Some(p.to_string());
    }
    if p.parse::<f64>().is_ok() {
        return Some(format!("{p}s"));
    }
    None
}

/// Convert a duration token to seconds.
///
/// Malformed input yields 1.0 rather than an error.
pub fn to_seconds(token: &str) -> f64 {
    let s = token.trim();
    let parsed = if let Some(num) = s.strip_suffix("ms") {
        num.parse::<f64>().map(|v| v / 1000.0)
    } else if let Some(num) = s.strip_suffix('s') {
        num.parse::<f64>()
    } else {
        s.parse::<f64>()
    };
    parsed.unwrap_or(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_bare_numbers_to_seconds() {
        assert_eq!(normalize("2").as_deref(), Some("2s"));
        assert_eq!(normalize(" 1.5 ").as_deref(), Some("1.5s"));
    }

    #[test]
    fn keeps_suffixed_tokens_verbatim() {
        assert_eq!(normalize("250ms").as_deref(), Some("250ms"));
        assert_eq!(normalize("1.5s").as_deref(), Some("1.5s"));
    }

    #[test]
    fn rejects_empty_and_garbage() {
        assert_eq!(normalize(""), None);
        assert_eq!(normalize("   "), None);
        assert_eq!(normalize("fast"), None);
    }

    #[test]
    fn converts_within_tolerance() {
        assert!((to_seconds("250ms") - 0.25).abs() < 1e-6);
        assert!((to_seconds("1.5s") - 1.5).abs() < 1e-6);
        assert!((to_seconds("2") - 2.0).abs() < 1e-6);
    }

    #[test]
    fn malformed_falls_back_to_one_second() {
        assert!((to_seconds("xyzms") - 1.0).abs() < 1e-9);
        assert!((to_seconds("") - 1.0).abs() < 1e-9);
        assert!((to_seconds("s") - 1.0).abs() < 1e-9);
    }
}
