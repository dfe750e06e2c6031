//! Multi-source result combiner.
//!
//! At query time each source contributes at most one [`EncodedResult`] for a
//! key. The combiner concatenates the present payloads into one buffer whose
//! first byte carries the total entry count, which is what lookup clients
//! receive on the wire.

use std::sync::OnceLock;

use crate::codec::{EncodedResult, MAX_ENTRIES};
use crate::error::{CoreError, Result};

/// The union of several sources' results for one lookup key.
///
/// `payload[0]` always equals `count`; the remaining bytes are the member
/// payloads concatenated in input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CombinedResult {
    /// Total entry count across all combined results.
    pub count: u8,
    /// Full wire buffer: count byte followed by concatenated payloads.
    pub payload: Vec<u8>,
}

/// Canonical empty combined result: a single zero count byte.
///
/// Precomputed once; lookups that match no source all share this value.
pub fn empty_combined() -> &'static CombinedResult {
    static EMPTY: OnceLock<CombinedResult> = OnceLock::new();
    EMPTY.get_or_init(|| CombinedResult {
        count: 0,
        payload: vec![0],
    })
}

/// Merge per-source results for one key into a single buffer.
///
/// Absent entries (sources that failed to load or had no match) are skipped.
/// Fails with [`CoreError::CombinedOverflow`] when the summed entry count
/// would not fit the one-byte count field; the count must never wrap.
pub fn combine<'a, I>(results: I) -> Result<CombinedResult>
where
    I: IntoIterator<Item = Option<&'a EncodedResult>>,
{
    let present: Vec<&EncodedResult> = results.into_iter().flatten().collect();

    let total: u32 = present.iter().map(|r| u32::from(r.count)).sum();
    if total as usize > MAX_ENTRIES {
        return Err(CoreError::CombinedOverflow { total });
    }
    if present.is_empty() {
        return Ok(empty_combined().clone());
    }

    let len = 1 + present.iter().map(|r| r.payload.len()).sum::<usize>();
    let mut payload = Vec::with_capacity(len);
    // total <= 255 checked above.
    #[allow(clippy::cast_possible_truncation)]
    let count = total as u8;
    payload.push(count);
    for result in &present {
        payload.extend_from_slice(&result.payload);
    }

    Ok(CombinedResult { count, payload })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::encode;

    #[test]
    fn test_combine_concatenates_and_sums() {
        let a = encode(&[(0, "alpha"), (1, "beta")]).unwrap();
        let b = encode(&[(2, "gamma")]).unwrap();

        let combined = combine([Some(&a), Some(&b)]).unwrap();
        assert_eq!(combined.count, 3);
        assert_eq!(combined.payload[0], 3);

        let mut expected = vec![3u8];
        expected.extend_from_slice(&a.payload);
        expected.extend_from_slice(&b.payload);
        assert_eq!(combined.payload, expected);
    }

    #[test]
    fn test_combine_empty_input_is_canonical_singleton() {
        let combined = combine(std::iter::empty()).unwrap();
        assert_eq!(combined.count, 0);
        assert_eq!(combined.payload, vec![0u8]);
        assert_eq!(&combined, empty_combined());
    }

    #[test]
    fn test_combine_skips_absent_entries() {
        let a = encode(&[(0, "alpha")]).unwrap();
        let b = encode(&[(1, "beta")]).unwrap();

        let with_gap = combine([Some(&a), None, Some(&b)]).unwrap();
        let without = combine([Some(&a), Some(&b)]).unwrap();
        assert_eq!(with_gap, without);
    }

    #[test]
    fn test_combine_all_absent_is_empty() {
        let combined = combine([None, None]).unwrap();
        assert_eq!(combined.payload, vec![0u8]);
    }

    #[test]
    fn test_combine_overflow_fails_loudly() {
        let many: Vec<(u8, &str)> = (0..200).map(|_| (0u8, "x")).collect();
        let a = encode(&many).unwrap();
        let b = encode(&many).unwrap();

        assert!(matches!(
            combine([Some(&a), Some(&b)]),
            Err(CoreError::CombinedOverflow { total: 400 })
        ));
    }

    #[test]
    fn test_combine_at_exact_capacity_succeeds() {
        let many: Vec<(u8, &str)> = (0..255).map(|_| (0u8, "x")).collect();
        let a = encode(&many).unwrap();
        let combined = combine([Some(&a)]).unwrap();
        assert_eq!(combined.count, 255);
    }

    #[test]
    fn test_combine_with_empty_member_keeps_payload() {
        let a = encode(&[(0, "alpha")]).unwrap();
        let combined = combine([Some(&a), Some(&EncodedResult::EMPTY)]).unwrap();
        assert_eq!(combined.count, 1);
        let mut expected = vec![1u8];
        expected.extend_from_slice(&a.payload);
        assert_eq!(combined.payload, expected);
    }
}
