//! Error types for argus ingestion sources.

use argus_core::CoreError;
use thiserror::Error;

/// Result type alias for source operations.
pub type Result<T> = std::result::Result<T, SourceError>;

/// Errors that can occur while configuring, fetching, or parsing a source.
#[derive(Error, Debug)]
pub enum SourceError {
    /// The configured data format is not one of csv/tagger/json.
    #[error("unknown data format '{0}'")]
    UnknownFormat(String),

    /// The configured lookup type is not recognized.
    #[error("unknown lookup type '{0}'")]
    UnknownType(String),

    /// A json source has no key path configured.
    #[error("no key_column configured for json source")]
    MissingKeyPath,

    /// Source configuration is invalid or incomplete.
    #[error("config error: {0}")]
    Config(String),

    /// Exclusion-list syntax error. Unlike other config errors this aborts
    /// startup: a half-applied exclusion list would serve data the operator
    /// explicitly asked to suppress.
    #[error("exclusion list error: {0}")]
    ExcludeSyntax(String),

    /// The whole input could not be parsed; the previous snapshot is kept.
    #[error("parse error: {0}")]
    Parse(String),

    /// Downloading the source body failed.
    #[error("fetch error: {0}")]
    Fetch(String),

    /// Codec or registry failure.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Delimited-column input was malformed.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON input was malformed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl SourceError {
    /// True for errors that must abort startup instead of merely disabling
    /// the offending source.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Core(CoreError::FieldCapacity) | Self::ExcludeSyntax(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_capacity_is_fatal() {
        assert!(SourceError::Core(CoreError::FieldCapacity).is_fatal());
    }

    #[test]
    fn test_config_errors_are_not_fatal() {
        assert!(!SourceError::UnknownFormat("xml".into()).is_fatal());
        assert!(!SourceError::MissingKeyPath.is_fatal());
    }

    #[test]
    fn test_exclude_syntax_is_fatal() {
        assert!(SourceError::ExcludeSyntax("bad cidr".into()).is_fatal());
    }
}
