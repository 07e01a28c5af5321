pub type ViviconResult<T> = Result<T, ViviconError>;

#[derive(thiserror::Error, Debug)]
pub enum ViviconError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("capability error: {0}")]
    Capability(String),

    #[error("render error: {0}")]
    Render(String),

    #[error("encode error: {0}")]
    Encode(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ViviconError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn capability(msg: impl Into<String>) -> Self {
        Self::Capability(msg.into())
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            ViviconError::validation("x")
                .to_string()
                .contains("validation error:")
        );
        assert!(
            ViviconError::capability("x")
                .to_string()
                .contains("capability error:")
        );
        assert!(
            ViviconError::render("x")
                .to_string()
                .contains("render error:")
        );
        assert!(
            ViviconError::encode("x")
                .to_string()
                .contains("encode error:")
        );
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = ViviconError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
    }
}
