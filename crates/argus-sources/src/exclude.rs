//! Exclusion rule parsing.
//!
//! Sources can carry semicolon-delimited exclusion lists: wildcard patterns
//! for domains/emails/URLs and CIDR blocks for IPs. This module only parses
//! them into structured rules; applying the rules to lookups belongs to the
//! query layer.
//!
//! Wildcard syntax errors cannot occur (any non-empty token is a pattern),
//! but an unparseable CIDR aborts startup: silently skipping it would serve
//! data the operator explicitly excluded.

use std::net::IpAddr;

use crate::config::SourceConfig;
use crate::error::{Result, SourceError};

/// A wildcard pattern for domain/email/URL exclusion.
///
/// The pattern text is kept verbatim; compilation and matching are the
/// query layer's concern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WildcardPattern {
    /// Raw pattern, e.g. `*.example.com`.
    pub pattern: String,
}

/// One CIDR exclusion rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CidrRule {
    /// Network address.
    pub addr: IpAddr,
    /// Prefix length; defaults to the full address width when omitted.
    pub prefix_len: u8,
}

/// Parse a semicolon-delimited wildcard list. Empty tokens are skipped.
#[must_use]
pub fn parse_wildcard_list(raw: &str) -> Vec<WildcardPattern> {
    raw.split(';')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| WildcardPattern {
            pattern: item.to_string(),
        })
        .collect()
}

/// Parse a semicolon-delimited CIDR list.
///
/// Each entry is `addr[/prefix]`; the prefix defaults to 32 for IPv4 and
/// 128 for IPv6. Any malformed entry fails the whole list.
pub fn parse_cidr_list(raw: &str) -> Result<Vec<CidrRule>> {
    raw.split(';')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(parse_cidr)
        .collect()
}

fn parse_cidr(item: &str) -> Result<CidrRule> {
    let (addr_part, prefix_part) = match item.split_once('/') {
        Some((a, p)) => (a, Some(p)),
        None => (item, None),
    };

    let addr: IpAddr = addr_part
        .parse()
        .map_err(|e| SourceError::ExcludeSyntax(format!("'{item}': {e}")))?;

    let max_prefix = if addr.is_ipv6() { 128 } else { 32 };
    let prefix_len = match prefix_part {
        None => max_prefix,
        Some(p) => {
            let len: u8 = p
                .parse()
                .map_err(|_| SourceError::ExcludeSyntax(format!("'{item}': bad prefix '{p}'")))?;
            if len > max_prefix {
                return Err(SourceError::ExcludeSyntax(format!(
                    "'{item}': prefix {len} exceeds {max_prefix}"
                )));
            }
            len
        }
    };

    Ok(CidrRule { addr, prefix_len })
}

/// All exclusion rules configured for one source.
#[derive(Debug, Clone, Default)]
pub struct ExcludeRules {
    /// Domain wildcard exclusions.
    pub domains: Vec<WildcardPattern>,
    /// Email wildcard exclusions.
    pub emails: Vec<WildcardPattern>,
    /// URL wildcard exclusions.
    pub urls: Vec<WildcardPattern>,
    /// IP CIDR exclusions.
    pub ips: Vec<CidrRule>,
    /// When set, the source only applies to these CIDRs.
    pub only_ips: Option<Vec<CidrRule>>,
}

impl ExcludeRules {
    /// Build the rule set from a source's config section.
    pub fn from_config(cfg: &SourceConfig) -> Result<Self> {
        Ok(Self {
            domains: cfg
                .exclude_domains
                .as_deref()
                .map(parse_wildcard_list)
                .unwrap_or_default(),
            emails: cfg
                .exclude_emails
                .as_deref()
                .map(parse_wildcard_list)
                .unwrap_or_default(),
            urls: cfg
                .exclude_urls
                .as_deref()
                .map(parse_wildcard_list)
                .unwrap_or_default(),
            ips: cfg
                .exclude_ips
                .as_deref()
                .map(parse_cidr_list)
                .transpose()?
                .unwrap_or_default(),
            only_ips: cfg.only_ips.as_deref().map(parse_cidr_list).transpose()?,
        })
    }
}
