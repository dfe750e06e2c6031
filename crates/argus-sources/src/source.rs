//! Ingestion sources: configuration binding, parsing, and snapshot storage.
//!
//! A [`Source`] ties one config section to a format adapter, a shortcut
//! table, and the current key -> [`EncodedResult`] snapshot. Refreshes are
//! serialized per source and replace the snapshot atomically: a failed pass
//! leaves the previous snapshot serving lookups.

use argus_core::{codec, combine, CombinedResult, EncodedResult, FieldRegistry};
use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::{Arc, Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::adapters::{delimited, json_path, tagged, Format};
use crate::config::{parse_field_decl, FieldDecl, SourceConfig, SourcesConfig};
use crate::error::{Result, SourceError};
use crate::exclude::ExcludeRules;
use crate::fetch::{FetchOutcome, Fetcher};

/// What kind of value this source is keyed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupKind {
    /// IPv4/IPv6 address.
    Ip,
    /// Domain name.
    Domain,
    /// MD5 hash.
    Md5,
    /// SHA-256 hash.
    Sha256,
    /// Email address.
    Email,
    /// URL.
    Url,
    /// Connection tuple.
    Tuple,
    /// JA3 TLS fingerprint.
    Ja3,
}

impl FromStr for LookupKind {
    type Err = SourceError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ip" => Ok(Self::Ip),
            "domain" => Ok(Self::Domain),
            "md5" => Ok(Self::Md5),
            "sha256" => Ok(Self::Sha256),
            "email" => Ok(Self::Email),
            "url" => Ok(Self::Url),
            "tuple" => Ok(Self::Tuple),
            "ja3" => Ok(Self::Ja3),
            other => Err(SourceError::UnknownType(other.to_string())),
        }
    }
}

impl LookupKind {
    /// Config-file spelling of this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ip => "ip",
            Self::Domain => "domain",
            Self::Md5 => "md5",
            Self::Sha256 => "sha256",
            Self::Email => "email",
            Self::Url => "url",
            Self::Tuple => "tuple",
            Self::Ja3 => "ja3",
        }
    }
}

/// Where a source's raw body comes from.
#[derive(Debug, Clone)]
enum Location {
    /// Remote feed with a local download cache.
    Url { url: String, cache: PathBuf },
    /// Local file.
    File(PathBuf),
}

/// Per-source alias state; the tagged-lines adapter mutates it inline.
#[derive(Debug, Default)]
struct AliasState {
    shortcuts: HashMap<String, u8>,
    view: String,
}

/// Outcome of one refresh pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// A new snapshot was parsed and installed.
    Loaded {
        /// Number of keys in the new snapshot.
        rows: usize,
    },
    /// The upstream copy was unchanged; the snapshot was left alone.
    Unchanged,
}

type Snapshot = HashMap<String, EncodedResult>;

/// One configured ingestion source.
pub struct Source {
    section: String,
    kind: LookupKind,
    format: Format,
    key_column: usize,
    key_path: Vec<String>,
    location: Option<Location>,
    registry: Arc<FieldRegistry>,
    aliases: Mutex<AliasState>,
    tags: EncodedResult,
    exclude: ExcludeRules,
    table: RwLock<Arc<Snapshot>>,
    refresh_gate: tokio::sync::Mutex<()>,
}

impl Source {
    /// Build a source from its config section.
    ///
    /// Registers declared fields with the shared registry, binds shortcuts,
    /// precomputes the tags result, and validates format/type/key-path up
    /// front so a misconfigured source is caught (and disabled) at startup
    /// rather than on its first refresh.
    pub fn new(section: &str, cfg: &SourceConfig, registry: Arc<FieldRegistry>) -> Result<Self> {
        let format: Format = cfg.format.as_deref().unwrap_or("csv").parse()?;

        let kind: LookupKind = cfg
            .kind
            .as_deref()
            .ok_or_else(|| SourceError::Config(format!("source '{section}' has no type")))?
            .parse()?;

        let key_path: Vec<String> = match (format, cfg.key_column.as_deref()) {
            (Format::Json, None) => return Err(SourceError::MissingKeyPath),
            (Format::Json, Some("")) => return Err(SourceError::MissingKeyPath),
            (Format::Json, Some(path)) => path.split('.').map(ToString::to_string).collect(),
            _ => Vec::new(),
        };

        let mut aliases = AliasState::default();
        if let Some(fields) = &cfg.fields {
            for line in fields.lines() {
                if line.trim().is_empty() {
                    continue;
                }
                match parse_field_decl(line) {
                    Some(FieldDecl::Field { name, shortcut }) => {
                        let id = registry.register(&name)?;
                        if let Some(token) = shortcut {
                            aliases.shortcuts.insert(token, id);
                        }
                    }
                    Some(FieldDecl::View(template)) => {
                        aliases.view.push_str(&template);
                        aliases.view.push('\n');
                    }
                    None => {
                        debug!(section = %section, line = %line, "unrecognized field declaration");
                    }
                }
            }
        }
        if let Some(view) = &cfg.view {
            aliases.view.push_str(view);
        }

        let tags = match &cfg.tags {
            None => EncodedResult::EMPTY,
            Some(raw) => {
                let tags_field = registry.register("tags")?;
                let pairs: Vec<(u8, &str)> = raw
                    .split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(|t| (tags_field, t))
                    .collect();
                codec::encode(&pairs)?
            }
        };

        let location = match (&cfg.url, &cfg.file) {
            (Some(url), Some(cache)) => Some(Location::Url {
                url: url.clone(),
                cache: cache.clone(),
            }),
            (Some(_), None) => {
                return Err(SourceError::Config(format!(
                    "source '{section}' has a url but no cache file path"
                )))
            }
            (None, Some(path)) => Some(Location::File(path.clone())),
            (None, None) => None,
        };

        Ok(Self {
            section: section.to_string(),
            kind,
            format,
            key_column: cfg.column,
            key_path,
            location,
            registry,
            aliases: Mutex::new(aliases),
            tags,
            exclude: ExcludeRules::from_config(cfg)?,
            table: RwLock::new(Arc::new(Snapshot::new())),
            refresh_gate: tokio::sync::Mutex::new(()),
        })
    }

    /// Section name identifying this source in config and logs.
    #[must_use]
    pub fn section(&self) -> &str {
        &self.section
    }

    /// Lookup key kind served by this source.
    #[must_use]
    pub const fn kind(&self) -> LookupKind {
        self.kind
    }

    /// Active data format.
    #[must_use]
    pub const fn format(&self) -> Format {
        self.format
    }

    /// Current view template (config plus any inline declarations).
    #[must_use]
    pub fn view(&self) -> String {
        self.aliases
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .view
            .clone()
    }

    /// Precomputed result carrying this source's configured tags.
    #[must_use]
    pub const fn tags_result(&self) -> &EncodedResult {
        &self.tags
    }

    /// Exclusion rules configured for this source.
    #[must_use]
    pub const fn exclude(&self) -> &ExcludeRules {
        &self.exclude
    }

    /// Parse a fully-buffered body and, on success, atomically install the
    /// new snapshot. On failure the previous snapshot keeps serving.
    pub fn ingest(&self, body: &[u8]) -> Result<usize> {
        let mut table = Snapshot::new();
        {
            let mut sink = |key: String, result: EncodedResult| {
                table.insert(key, result);
            };

            let mut aliases = self
                .aliases
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);

            match self.format {
                Format::Csv => delimited::parse(
                    body,
                    self.key_column,
                    &aliases.shortcuts,
                    &self.section,
                    &mut sink,
                )?,
                Format::Tagger => {
                    let AliasState { shortcuts, view } = &mut *aliases;
                    tagged::parse(body, shortcuts, view, &self.registry, &self.section, &mut sink)?;
                }
                Format::Json => json_path::parse(
                    body,
                    &self.key_path,
                    &aliases.shortcuts,
                    &self.section,
                    &mut sink,
                )?,
            }
        }

        let rows = table.len();
        *self
            .table
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Arc::new(table);
        Ok(rows)
    }

    /// Fetch this source's body and ingest it.
    ///
    /// Refreshes of one source never overlap: the gate is held across the
    /// fetch and the parse. Parsing starts only once the body is fully
    /// buffered.
    pub async fn refresh(&self, fetcher: &Fetcher) -> Result<RefreshOutcome> {
        let _gate = self.refresh_gate.lock().await;

        let Some(location) = &self.location else {
            return Err(SourceError::Config(format!(
                "source '{}' has no url or file to refresh from",
                self.section
            )));
        };

        let body = match location {
            Location::Url { url, cache } => match fetcher.fetch_url(url, cache).await? {
                FetchOutcome::NotModified => {
                    debug!(section = %self.section, "refresh skipped, source unchanged");
                    return Ok(RefreshOutcome::Unchanged);
                }
                FetchOutcome::Fresh(body) => body,
            },
            Location::File(path) => fetcher.fetch_file(path).await?,
        };

        let rows = self.ingest(&body)?;
        info!(section = %self.section, rows, "snapshot refreshed");
        Ok(RefreshOutcome::Loaded { rows })
    }

    /// Look up a key in the current snapshot.
    ///
    /// A source that never loaded (or whose last pass failed before its
    /// first success) simply has no entries, so callers see it as absent.
    #[must_use]
    pub fn lookup(&self, key: &str) -> Option<EncodedResult> {
        self.table
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Number of keys in the current snapshot.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.table
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }
}

impl std::fmt::Debug for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Source")
            .field("section", &self.section)
            .field("kind", &self.kind)
            .field("format", &self.format)
            .field("entries", &self.entry_count())
            .finish_non_exhaustive()
    }
}

/// Build every configured source against a shared registry.
///
/// A source with a bad section (unknown format or type, missing key path)
/// is logged and skipped so the rest keep working; fatal errors (field
/// capacity, exclusion syntax) abort the whole load.
pub fn build_sources(
    config: &SourcesConfig,
    registry: &Arc<FieldRegistry>,
) -> Result<Vec<Arc<Source>>> {
    let mut sources = Vec::with_capacity(config.sources.len());
    for (section, cfg) in &config.sources {
        match Source::new(section, cfg, Arc::clone(registry)) {
            Ok(source) => sources.push(Arc::new(source)),
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => warn!(section = %section, error = %e, "source disabled"),
        }
    }
    Ok(sources)
}

/// Combine every source's result for `key` into one wire buffer.
///
/// Sources without a match (or that never loaded) are treated as absent.
pub fn lookup_all(sources: &[Arc<Source>], key: &str) -> argus_core::Result<CombinedResult> {
    let results: Vec<Option<EncodedResult>> = sources.iter().map(|s| s.lookup(key)).collect();
    combine::combine(results.iter().map(Option::as_ref))
}
