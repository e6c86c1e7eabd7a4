use thiserror::Error;

/// Crate-wide result type alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for setup-time failures of the engine.
///
/// Runtime physics trouble (diverging particles, escapes, collision-loop overflow) is
/// recovered inside the step loop and never shows up here. Each variant carries enough
/// context to be actionable.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid user or API parameter.
    #[error("invalid parameter: {0}")]
    InvalidParam(String),

    /// Programmer error while configuring a simulation (unknown tool, malformed interaction, bad config).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Numerical or geometric issue (e.g., degenerate segment, near-zero normal).
    #[error("numerical error: {0}")]
    MathError(String),

    /// Malformed JSON configuration.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Propagated I/O errors (reading configuration files).
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_is_informative() {
        let e = Error::InvalidParam("radius must be > 0".to_string());
        let msg = format!("{e}");
        assert!(msg.contains("invalid parameter"));
        assert!(msg.contains("radius"));
    }

    #[test]
    fn configuration_error_mentions_cause() {
        let e = Error::Configuration("unknown tool 'lasso'".into());
        assert!(e.to_string().contains("lasso"));
    }

    #[test]
    fn json_errors_convert() {
        let err: Error = serde_json::from_str::<serde_json::Value>("{").unwrap_err().into();
        assert!(matches!(err, Error::Json(_)));
    }
}
