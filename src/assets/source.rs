//! Icon source resolution: a request's `source` is either a path to a
//! markup file or the markup itself, recognized by a leading `<`.

use anyhow::Context as _;

use crate::foundation::error::{ViviconError, ViviconResult};

/// True when the source string is inline markup rather than a path.
pub fn is_inline(source: &str) -> bool {
    source.trim_start().starts_with('<')
}

/// Resolve a source to markup text. Paths are read from disk; inline
/// markup passes through as-is.
pub fn load_markup(source: &str) -> ViviconResult<String> {
    if is_inline(source) {
        return Ok(source.to_string());
    }

    let path = source.trim();
    let markup =
        std::fs::read_to_string(path).with_context(|| format!("read icon source {path}"))?;
    if markup.trim_start().is_empty() {
        return Err(ViviconError::validation(format!(
            "icon source {path} is empty"
        )));
    }
    Ok(markup)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[test]
    fn inline_markup_is_recognized_by_a_leading_angle_bracket() {
        assert!(is_inline("<svg/>"));
        assert!(is_inline("  <svg/>"));
        assert!(!is_inline("icons/home.svg"));
    }

    #[test]
    fn inline_markup_loads_verbatim() {
        let markup = r#"<svg viewBox="0 0 24 24"/>"#;
        assert_eq!(load_markup(markup).unwrap(), markup);
    }

    #[test]
    fn files_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("icon.svg");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(file, r#"<svg viewBox="0 0 24 24"/>"#).unwrap();

        let markup = load_markup(path.to_str().unwrap()).unwrap();
        assert!(markup.starts_with("<svg"));
    }

    #[test]
    fn missing_files_error_with_the_path() {
        let err = load_markup("definitely/not/here.svg").unwrap_err();
        assert!(err.to_string().contains("definitely/not/here.svg"));
    }

    #[test]
    fn empty_files_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.svg");
        std::fs::File::create(&path).unwrap();
        assert!(load_markup(path.to_str().unwrap()).is_err());
    }
}
