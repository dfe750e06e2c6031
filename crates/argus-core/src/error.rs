//! Error types for the argus record codec and field registry.

use thiserror::Error;

/// Result type alias for core codec operations.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors that can occur while registering fields, encoding, or combining.
#[derive(Error, Debug)]
pub enum CoreError {
    /// All 256 field identifiers are in use. Field ids must fit one byte,
    /// so this is a hard, process-fatal configuration limit.
    #[error("field capacity exhausted: 256 field identifiers already registered")]
    FieldCapacity,

    /// Reverse lookup of an identifier that was never registered.
    #[error("unknown field id {0}")]
    UnknownField(u8),

    /// A single result cannot hold more than 255 field entries.
    #[error("too many entries for one result: {count} (max 255)")]
    TooManyEntries {
        /// Number of entries that were requested.
        count: usize,
    },

    /// Combining results would overflow the one-byte entry count.
    #[error("combined entry count {total} exceeds 255")]
    CombinedOverflow {
        /// Sum of entry counts across the combined results.
        total: u32,
    },

    /// An encoded payload did not match its declared entry count.
    #[error("malformed payload: {0}")]
    Malformed(String),
}
