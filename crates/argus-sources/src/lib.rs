//! argus-sources: ingestion sources for the argus enrichment service.
//!
//! Each configured source pulls a raw body (remote feed or local file),
//! parses it with one of three format adapters, and encodes every matched
//! row into the compact record format defined by `argus-core`:
//!
//! - **csv** — delimited columns, key taken from a configured column index
//! - **tagger** — `key;name=value;…` lines with inline field declarations
//! - **json** — a JSON array of objects walked by dotted key paths
//!
//! Sources share one [`FieldRegistry`](argus_core::FieldRegistry) so field
//! ids stay consistent across the process. A refresh is fetch-then-parse:
//! the body is fully buffered before parsing starts, refreshes of one
//! source never overlap, and a failed parse keeps the previous snapshot
//! serving lookups.

#![doc(html_root_url = "https://docs.rs/argus-sources/0.1.0")]

pub mod adapters;
pub mod config;
mod error;
pub mod exclude;
pub mod fetch;
pub mod source;

pub use adapters::Format;
pub use config::{SourceConfig, SourcesConfig};
pub use error::{Result, SourceError};
pub use fetch::{FetchOutcome, Fetcher};
pub use source::{build_sources, lookup_all, LookupKind, RefreshOutcome, Source};
