//! Delimited-columns adapter.
//!
//! Standard comma-separated input: `#` comment lines are ignored, blank
//! lines skipped, ragged rows tolerated. The lookup key comes from a
//! configured column index; shortcuts whose alias token is a column index
//! bind that column's value to a field.

use argus_core::EncodedResult;
use std::collections::HashMap;
use tracing::debug;

use crate::adapters::encode_row;
use crate::error::Result;

/// Parse a CSV body, emitting one encoded row per record.
///
/// Invalid CSV fails the whole pass; rows whose key column is missing are
/// skipped. Rows matching no bound column still emit the canonical empty
/// result so a lookup hit is recorded for the key.
pub fn parse<F>(
    body: &[u8],
    key_column: usize,
    shortcuts: &HashMap<String, u8>,
    section: &str,
    sink: &mut F,
) -> Result<()>
where
    F: FnMut(String, EncodedResult),
{
    // Shortcut tokens that name column indexes, in ascending column order.
    let mut bindings: Vec<(usize, u8)> = shortcuts
        .iter()
        .filter_map(|(token, &id)| match token.parse::<usize>() {
            Ok(column) => Some((column, id)),
            Err(_) => {
                debug!(section = %section, token = %token, "shortcut is not a column index, ignored");
                None
            }
        })
        .collect();
    bindings.sort_unstable();

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .comment(Some(b'#'))
        .from_reader(body);

    for record in reader.records() {
        let record = record?;

        let Some(key) = record.get(key_column) else {
            debug!(section = %section, columns = record.len(), "row missing key column, skipped");
            continue;
        };

        let pairs: Vec<(u8, &str)> = bindings
            .iter()
            .filter_map(|&(column, id)| record.get(column).map(|value| (id, value)))
            .collect();

        if let Some(result) = encode_row(section, key, &pairs) {
            sink(key.to_string(), result);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use argus_core::codec;

    fn collect(
        body: &[u8],
        key_column: usize,
        shortcuts: &HashMap<String, u8>,
    ) -> Result<Vec<(String, EncodedResult)>> {
        let mut rows = Vec::new();
        parse(body, key_column, shortcuts, "test", &mut |key, result| {
            rows.push((key, result));
        })?;
        Ok(rows)
    }

    #[test]
    fn test_key_and_bound_column() {
        let shortcuts = HashMap::from([("1".to_string(), 5u8)]);
        let rows = collect(b"1.2.3.4,evil,90\n", 0, &shortcuts).unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].0, "1.2.3.4");
        let decoded = codec::decode(&rows[0].1.payload, rows[0].1.count).unwrap();
        assert_eq!(decoded, vec![(5, "evil".to_string())]);
    }

    #[test]
    fn test_multiple_bindings_in_column_order() {
        let shortcuts = HashMap::from([("2".to_string(), 9u8), ("1".to_string(), 5u8)]);
        let rows = collect(b"1.2.3.4,evil,90\n", 0, &shortcuts).unwrap();

        let decoded = codec::decode(&rows[0].1.payload, rows[0].1.count).unwrap();
        assert_eq!(
            decoded,
            vec![(5, "evil".to_string()), (9, "90".to_string())]
        );
    }

    #[test]
    fn test_comment_lines_ignored() {
        let shortcuts = HashMap::from([("1".to_string(), 0u8)]);
        let body = b"# header comment\n1.2.3.4,evil\n# trailing\n";
        let rows = collect(body, 0, &shortcuts).unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_ragged_rows_tolerated() {
        let shortcuts = HashMap::from([("1".to_string(), 0u8), ("2".to_string(), 1u8)]);
        let body = b"1.2.3.4,evil\n5.6.7.8,bad,99\n";
        let rows = collect(body, 0, &shortcuts).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].1.count, 1);
        assert_eq!(rows[1].1.count, 2);
    }

    #[test]
    fn test_unbound_rows_emit_canonical_empty() {
        let rows = collect(b"1.2.3.4,evil\n", 0, &HashMap::new()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].1, EncodedResult::EMPTY);
    }

    #[test]
    fn test_row_missing_key_column_skipped() {
        let shortcuts = HashMap::from([("0".to_string(), 3u8)]);
        let body = b"only-one-column\na,b,c\n";
        let rows = collect(body, 2, &shortcuts).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].0, "c");
    }

    #[test]
    fn test_non_numeric_shortcut_ignored() {
        let shortcuts = HashMap::from([("name".to_string(), 4u8), ("1".to_string(), 5u8)]);
        let rows = collect(b"1.2.3.4,evil\n", 0, &shortcuts).unwrap();
        let decoded = codec::decode(&rows[0].1.payload, rows[0].1.count).unwrap();
        assert_eq!(decoded, vec![(5, "evil".to_string())]);
    }

    #[test]
    fn test_invalid_utf8_fails_pass() {
        let body = b"1.2.3.4,\xff\xfe\n";
        assert!(collect(body, 0, &HashMap::new()).is_err());
    }
}
