//! Conditional source fetching.
//!
//! Downloading is the one asynchronous boundary in a source's life: the body
//! is fully buffered here, then parsing runs synchronously to completion.
//! Remote sources keep a local cache file; a file younger than the minimum
//! refetch interval short-circuits the request entirely, and an older one
//! turns into an `If-Modified-Since` conditional GET so unchanged feeds cost
//! a 304 instead of a download.

use chrono::{DateTime, Utc};
use reqwest::header::IF_MODIFIED_SINCE;
use reqwest::StatusCode;
use std::path::Path;
use std::time::{Duration, SystemTime};
use tracing::{debug, info};

use crate::error::{Result, SourceError};

/// Minimum age a cache file must reach before it is refetched.
pub const DEFAULT_MIN_AGE: Duration = Duration::from_secs(60);

/// Outcome of a conditional fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// New body downloaded (and written through to the cache file).
    Fresh(Vec<u8>),
    /// The cached copy is still current; nothing to parse.
    NotModified,
}

/// HTTP fetcher with cache-file-based conditional requests.
#[derive(Debug, Clone)]
pub struct Fetcher {
    http: reqwest::Client,
    min_age: Duration,
}

impl Default for Fetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Fetcher {
    /// Create a fetcher with the default minimum refetch interval.
    #[must_use]
    pub fn new() -> Self {
        Self::with_min_age(DEFAULT_MIN_AGE)
    }

    /// Create a fetcher with a custom minimum refetch interval.
    #[must_use]
    pub fn with_min_age(min_age: Duration) -> Self {
        Self {
            http: reqwest::Client::new(),
            min_age,
        }
    }

    /// Conditionally fetch `url`, using `cache` as the local copy.
    ///
    /// A cache file younger than the minimum age reports
    /// [`FetchOutcome::NotModified`] without touching the network. Otherwise
    /// the request carries `If-Modified-Since` set to the cache file's
    /// mtime; a 200 rewrites the cache and returns the body, a 304 reports
    /// `NotModified`, anything else is a fetch error.
    pub async fn fetch_url(&self, url: &str, cache: &Path) -> Result<FetchOutcome> {
        let mut if_modified_since = None;
        if let Ok(meta) = tokio::fs::metadata(cache).await {
            if let Ok(mtime) = meta.modified() {
                if mtime.elapsed().unwrap_or_default() < self.min_age {
                    debug!(url = %url, "cache file younger than minimum age, skipping fetch");
                    return Ok(FetchOutcome::NotModified);
                }
                if_modified_since = Some(http_date(mtime));
            }
        }

        debug!(url = %url, conditional = if_modified_since.is_some(), "fetching source");
        let mut request = self.http.get(url);
        if let Some(date) = if_modified_since {
            request = request.header(IF_MODIFIED_SINCE, date);
        }

        let response = request
            .send()
            .await
            .map_err(|e| SourceError::Fetch(format!("{url}: {e}")))?;

        match response.status() {
            StatusCode::OK => {
                let body = response
                    .bytes()
                    .await
                    .map_err(|e| SourceError::Fetch(format!("{url}: {e}")))?;
                tokio::fs::write(cache, &body).await?;
                info!(url = %url, bytes = body.len(), "source downloaded");
                Ok(FetchOutcome::Fresh(body.to_vec()))
            }
            StatusCode::NOT_MODIFIED => {
                debug!(url = %url, "source not modified");
                Ok(FetchOutcome::NotModified)
            }
            status => Err(SourceError::Fetch(format!(
                "{url}: unexpected status {status}"
            ))),
        }
    }

    /// Read a local source file in full.
    pub async fn fetch_file(&self, path: &Path) -> Result<Vec<u8>> {
        Ok(tokio::fs::read(path).await?)
    }
}

/// Format a timestamp as an RFC 7231 HTTP date (always GMT).
fn http_date(time: SystemTime) -> String {
    DateTime::<Utc>::from(time)
        .format("%a, %d %b %Y %H:%M:%S GMT")
        .to_string()
}
