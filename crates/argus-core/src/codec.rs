//! TLV record codec for encoded lookup results.
//!
//! Each field entry is encoded as a fixed two-byte header followed by the
//! value bytes and a trailing zero:
//!
//! ```text
//! +----------+------------+-----------------+------+
//! | field id | stored len | value bytes ... | 0x00 |
//! |  1 byte  |   1 byte   | stored len - 1  |      |
//! +----------+------------+-----------------+------+
//! ```
//!
//! `stored len` counts the value bytes plus the terminator, so a decoder
//! recovers the true value length as `stored len - 1`. The terminator is
//! redundant given the explicit length but is kept for C-string-style
//! consumers of the wire format.
//!
//! Values longer than 250 bytes are truncated to their first 240 bytes.
//! A single result never holds more than 255 entries; the entry count is
//! tracked beside the payload (see [`EncodedResult`]) and only becomes a
//! payload byte when results are combined (see [`crate::combine`]).

use crate::error::{CoreError, Result};
use crate::field::FieldRegistry;

/// Value byte length above which truncation kicks in.
pub const VALUE_TRUNCATE_OVER: usize = 250;

/// Length a truncated value is cut down to.
pub const VALUE_TRUNCATE_TO: usize = 240;

/// Maximum entries in one result; the count must fit a single byte.
pub const MAX_ENTRIES: usize = 255;

/// One source's binary-encoded field set for a single lookup key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedResult {
    /// Number of field entries in `payload`.
    pub count: u8,
    /// Concatenated TLV entries.
    pub payload: Vec<u8>,
}

impl EncodedResult {
    /// Canonical empty result, reused for rows that produce no pairs.
    /// `Vec::new` does not allocate, so sharing a singleton and cloning
    /// this constant cost the same.
    pub const EMPTY: Self = Self {
        count: 0,
        payload: Vec::new(),
    };

    /// True if this result holds no entries.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// Encode ordered `(field id, value)` pairs into a result.
///
/// Pairs are emitted in input order. Values longer than
/// [`VALUE_TRUNCATE_OVER`] bytes are cut to their first
/// [`VALUE_TRUNCATE_TO`] bytes; this is lossy and not configurable.
///
/// Fails with [`CoreError::TooManyEntries`] when more than 255 pairs are
/// given; the one-byte count must never wrap.
pub fn encode(pairs: &[(u8, &str)]) -> Result<EncodedResult> {
    if pairs.len() > MAX_ENTRIES {
        return Err(CoreError::TooManyEntries { count: pairs.len() });
    }
    if pairs.is_empty() {
        return Ok(EncodedResult::EMPTY);
    }

    let mut payload = Vec::new();
    for &(id, value) in pairs {
        let mut bytes = value.as_bytes();
        if bytes.len() > VALUE_TRUNCATE_OVER {
            bytes = &bytes[..VALUE_TRUNCATE_TO];
        }

        // bytes.len() <= 250 here, so stored length fits a byte.
        #[allow(clippy::cast_possible_truncation)]
        let stored_len = (bytes.len() + 1) as u8;
        payload.push(id);
        payload.push(stored_len);
        payload.extend_from_slice(bytes);
        payload.push(0);
    }

    // pairs.len() <= 255 checked above.
    #[allow(clippy::cast_possible_truncation)]
    let count = pairs.len() as u8;
    Ok(EncodedResult { count, payload })
}

/// One raw wire entry: field id, stored length, value bytes.
struct RawEntry<'a> {
    id: u8,
    stored_len: u8,
    value: &'a [u8],
}

/// Walk exactly `count` entries off the front of `payload`.
///
/// Trailing bytes past the last declared entry are never inspected.
fn decode_raw(payload: &[u8], count: u8) -> Result<Vec<RawEntry<'_>>> {
    let mut entries = Vec::with_capacity(count as usize);
    let mut offset = 0usize;

    for i in 0..count {
        let header = payload.get(offset..offset + 2).ok_or_else(|| {
            CoreError::Malformed(format!("entry {i}: header past end of payload"))
        })?;
        let id = header[0];
        let stored_len = header[1];
        if stored_len == 0 {
            return Err(CoreError::Malformed(format!("entry {i}: zero stored length")));
        }

        let value_end = offset + 2 + stored_len as usize - 1;
        let value = payload.get(offset + 2..value_end).ok_or_else(|| {
            CoreError::Malformed(format!("entry {i}: value past end of payload"))
        })?;
        if payload.get(value_end).is_none() {
            return Err(CoreError::Malformed(format!("entry {i}: missing terminator")));
        }

        entries.push(RawEntry { id, stored_len, value });
        offset += 2 + stored_len as usize;
    }

    Ok(entries)
}

/// Decode `count` entries from an encoded payload.
///
/// Walks exactly `count` entries and never inspects trailing bytes beyond
/// them. Value bytes are decoded lossily; the wire format is byte-oriented
/// and a truncated value may end mid-character.
pub fn decode(payload: &[u8], count: u8) -> Result<Vec<(u8, String)>> {
    Ok(decode_raw(payload, count)?
        .into_iter()
        .map(|e| (e.id, String::from_utf8_lossy(e.value).into_owned()))
        .collect())
}

/// One decoded entry as rendered for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct DecodedEntry {
    /// Field name resolved through the registry.
    pub field: String,
    /// Stored length from the wire (value bytes + terminator).
    pub len: u8,
    /// Decoded value.
    pub value: String,
}

/// Decode a combined buffer (count in byte 0) into named entries.
pub fn decode_combined(buf: &[u8], registry: &FieldRegistry) -> Result<Vec<DecodedEntry>> {
    let count = *buf
        .first()
        .ok_or_else(|| CoreError::Malformed("empty combined buffer".to_string()))?;
    let raw = decode_raw(&buf[1..], count)?;

    let mut entries = Vec::with_capacity(raw.len());
    for entry in raw {
        entries.push(DecodedEntry {
            field: registry.name_of(entry.id)?,
            len: entry.stored_len,
            value: String::from_utf8_lossy(entry.value).into_owned(),
        });
    }
    Ok(entries)
}

/// Render a combined buffer as a human-readable entry list.
///
/// Output shape: `[{field: "tags", len: 8, value: "malware"}, …]`, one entry
/// per line, optionally indented. Diagnostics and tests only.
pub fn render(buf: &[u8], registry: &FieldRegistry, indent: &str) -> Result<String> {
    let entries = decode_combined(buf, registry)?;

    let mut out = String::from("[");
    for (i, entry) in entries.iter().enumerate() {
        if i > 0 {
            out.push_str(",\n");
        }
        out.push_str(indent);
        out.push_str(&format!(
            "{{field: \"{}\", len: {}, value: \"{}\"}}",
            entry.field, entry.len, entry.value
        ));
    }
    out.push_str("]\n");
    Ok(out)
}
