//! Error types for the Citadel sanitizer crate.

/// Errors surfaced by sanitize operations.
///
/// Classification helpers (URI checks, CSS scrubbing) never fail; they return
/// a rejecting value instead. Only caller mistakes end up here.
#[derive(thiserror::Error, Debug)]
pub enum SanitizeError {
    /// A per-call option had the wrong shape (e.g. `tags` given as a string)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The supplied scrubber is not registered or is not a scrubber at all
    #[error("Scrubber not found: {0}")]
    ScrubberNotFound(String),

    /// An XPath expression could not be compiled
    #[error("XPath syntax error at offset {position} in `{expression}`: {message}")]
    XPathSyntax {
        expression: String,
        position: usize,
        message: String,
    },

    /// The base sanitizer was asked to sanitize without a concrete mode
    #[error("sanitize is not implemented for this sanitizer; use a safe-list, full or link sanitizer")]
    NotImplemented,

    /// Defaults could not be loaded from JSON
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(#[from] serde_json::Error),
}

/// Result type for sanitizer operations
pub type SanitizeResult<T> = Result<T, SanitizeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SanitizeError::InvalidArgument("tags must be a list of strings".to_string());
        assert_eq!(err.to_string(), "Invalid argument: tags must be a list of strings");

        let err = SanitizeError::ScrubberNotFound("shouty".to_string());
        assert_eq!(err.to_string(), "Scrubber not found: shouty");

        let err = SanitizeError::XPathSyntax {
            expression: "..faulty".to_string(),
            position: 2,
            message: "unexpected name".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "XPath syntax error at offset 2 in `..faulty`: unexpected name"
        );
    }

    #[test]
    fn test_error_source() {
        use std::error::Error;

        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = SanitizeError::from(json_err);
        assert!(err.source().is_some());

        assert!(SanitizeError::NotImplemented.source().is_none());
    }
}
