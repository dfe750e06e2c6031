//! Format adapters: one parser per supported ingest format.
//!
//! Each adapter turns a fully-buffered source body into encoded rows,
//! handing `(key, EncodedResult)` to a sink callback as it goes. A returned
//! error means the whole pass failed and the caller must keep its previous
//! snapshot; per-row problems are logged and skipped inside the adapter.

use argus_core::{codec, EncodedResult};
use std::str::FromStr;
use tracing::warn;

use crate::error::SourceError;

pub mod delimited;
pub mod json_path;
pub mod tagged;

/// Supported source data formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Comma-separated columns; key taken from a configured column index.
    Csv,
    /// `key;name=value;…` lines with inline `#field:` declarations.
    Tagger,
    /// JSON array of objects with dotted key paths.
    Json,
}

impl FromStr for Format {
    type Err = SourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "csv" => Ok(Self::Csv),
            "tagger" => Ok(Self::Tagger),
            "json" => Ok(Self::Json),
            other => Err(SourceError::UnknownFormat(other.to_string())),
        }
    }
}

impl Format {
    /// Config-file spelling of this format.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Tagger => "tagger",
            Self::Json => "json",
        }
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Encode one row's pairs, sharing the canonical empty result for rows with
/// no pairs. A row whose pair count would overflow the one-byte count is
/// rejected (logged), not wrapped; `None` means the row must be dropped.
pub(crate) fn encode_row(section: &str, key: &str, pairs: &[(u8, &str)]) -> Option<EncodedResult> {
    if pairs.is_empty() {
        return Some(EncodedResult::EMPTY);
    }
    match codec::encode(pairs) {
        Ok(result) => Some(result),
        Err(e) => {
            warn!(section = %section, key = %key, error = %e, "row rejected");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_str() {
        assert_eq!("csv".parse::<Format>().unwrap(), Format::Csv);
        assert_eq!("tagger".parse::<Format>().unwrap(), Format::Tagger);
        assert_eq!("json".parse::<Format>().unwrap(), Format::Json);
    }

    #[test]
    fn test_unknown_format_rejected() {
        assert!(matches!(
            "xml".parse::<Format>(),
            Err(SourceError::UnknownFormat(_))
        ));
    }

    #[test]
    fn test_encode_row_empty_is_canonical() {
        let result = encode_row("test", "k", &[]).unwrap();
        assert_eq!(result, EncodedResult::EMPTY);
    }

    #[test]
    fn test_encode_row_overflow_dropped() {
        let pairs: Vec<(u8, &str)> = (0..300).map(|_| (0u8, "x")).collect();
        assert!(encode_row("test", "k", &pairs).is_none());
    }
}
