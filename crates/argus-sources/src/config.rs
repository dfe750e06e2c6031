//! Source configuration and field declaration parsing.
//!
//! A config file is a TOML table of sections, one per source:
//!
//! ```toml
//! [sources.badguys]
//! format = "csv"
//! type = "ip"
//! column = 0
//! url = "https://example.com/badguys.csv"
//! file = "/var/cache/argus/badguys.csv"
//! fields = """
//! field:tags;shortcut:1
//! field:severity;shortcut:2
//! """
//! tags = "blocklist"
//! ```
//!
//! Field declarations (`field:<name>[;attr:value…]`, `view:<template>`) are
//! parsed by [`parse_field_decl`], a pure function shared by config loading
//! and the tagged-lines adapter's inline `#` declarations.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::error::{Result, SourceError};

/// Configuration for a single ingestion source.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceConfig {
    /// Data format: `csv` (default), `tagger`, or `json`.
    #[serde(default)]
    pub format: Option<String>,

    /// Lookup key type: `ip`, `domain`, `md5`, `sha256`, `email`, `url`,
    /// `tuple`, or `ja3`.
    #[serde(default, rename = "type")]
    pub kind: Option<String>,

    /// Newline-separated field declarations.
    #[serde(default)]
    pub fields: Option<String>,

    /// View template registered with the presentation layer.
    #[serde(default)]
    pub view: Option<String>,

    /// Comma-separated tags attached to every hit from this source.
    #[serde(default)]
    pub tags: Option<String>,

    /// Key column index for csv sources.
    #[serde(default)]
    pub column: usize,

    /// Dotted key path for json sources.
    #[serde(default)]
    pub key_column: Option<String>,

    /// Remote location of the source data.
    #[serde(default)]
    pub url: Option<String>,

    /// Local path: the data file itself, or the download cache when `url`
    /// is set.
    #[serde(default)]
    pub file: Option<PathBuf>,

    /// Semicolon-delimited wildcard patterns for domains to exclude.
    #[serde(default)]
    pub exclude_domains: Option<String>,

    /// Semicolon-delimited wildcard patterns for emails to exclude.
    #[serde(default)]
    pub exclude_emails: Option<String>,

    /// Semicolon-delimited wildcard patterns for URLs to exclude.
    #[serde(default)]
    pub exclude_urls: Option<String>,

    /// Semicolon-delimited CIDRs to exclude.
    #[serde(default)]
    pub exclude_ips: Option<String>,

    /// Semicolon-delimited CIDRs this source is restricted to.
    #[serde(default)]
    pub only_ips: Option<String>,
}

/// Top-level config: all sources by section name.
///
/// `BTreeMap` keeps load order deterministic.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourcesConfig {
    /// Source sections keyed by name.
    #[serde(default)]
    pub sources: BTreeMap<String, SourceConfig>,
}

impl SourcesConfig {
    /// Load config from a TOML file, falling back to an empty config when
    /// the file does not exist.
    pub fn load(path: &std::path::Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            toml::from_str(&content).map_err(|e| SourceError::Config(e.to_string()))
        } else {
            Ok(Self::default())
        }
    }
}

/// One parsed field or view declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldDecl {
    /// `field:<name>[;shortcut:<alias>][;attr:value…]`
    Field {
        /// Field name to register globally.
        name: String,
        /// Optional per-source alias token.
        shortcut: Option<String>,
    },
    /// `view:<template fragment>`
    View(String),
}

/// Parse a single declaration line.
///
/// A leading `#` is stripped (tagged-lines files carry declarations as
/// comments). Lines that are neither `field:` nor `view:` return `None`.
/// Attributes other than `shortcut` are ignored here; they belong to the
/// presentation layer.
#[must_use]
pub fn parse_field_decl(line: &str) -> Option<FieldDecl> {
    let line = line.strip_prefix('#').unwrap_or(line);

    if let Some(rest) = line.strip_prefix("field:") {
        let mut segments = rest.split(';');
        let name = segments.next()?.trim();
        if name.is_empty() {
            return None;
        }
        let shortcut = segments
            .filter_map(|s| s.strip_prefix("shortcut:"))
            .map(str::trim)
            .find(|s| !s.is_empty())
            .map(ToString::to_string);
        Some(FieldDecl::Field {
            name: name.to_string(),
            shortcut,
        })
    } else if let Some(rest) = line.strip_prefix("view:") {
        Some(FieldDecl::View(rest.to_string()))
    } else {
        None
    }
}
