//! JSON adapter.
//!
//! Input is a JSON array of objects. A configured dotted key path is walked
//! through each object to find the lookup key; each shortcut token is itself
//! a dotted path walked the same way. Missing or null path segments skip the
//! row (for the key) or omit the field (for a shortcut) without failing the
//! pass. Anything other than a JSON array fails the whole pass.

use argus_core::EncodedResult;
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

use crate::adapters::encode_row;
use crate::error::{Result, SourceError};

/// Parse a JSON array body, emitting one encoded row per object with a
/// resolvable key.
pub fn parse<F>(
    body: &[u8],
    key_path: &[String],
    shortcuts: &HashMap<String, u8>,
    section: &str,
    sink: &mut F,
) -> Result<()>
where
    F: FnMut(String, EncodedResult),
{
    if key_path.is_empty() {
        return Err(SourceError::MissingKeyPath);
    }

    let root: Value = serde_json::from_slice(body)?;
    let rows = root
        .as_array()
        .ok_or_else(|| SourceError::Parse("expected a JSON array of objects".to_string()))?;

    // Shortcut tokens split into path segments once, in a stable order.
    let mut bindings: Vec<(Vec<&str>, u8)> = shortcuts
        .iter()
        .map(|(token, &id)| (token.split('.').collect(), id))
        .collect();
    bindings.sort_unstable_by(|a, b| a.1.cmp(&b.1));

    for row in rows {
        let Some(key) = walk(row, key_path).and_then(scalar_to_string) else {
            debug!(section = %section, "row without key path value, skipped");
            continue;
        };

        let mut values: Vec<(u8, String)> = Vec::new();
        for (path, id) in &bindings {
            if let Some(value) = walk(row, path).and_then(scalar_to_string) {
                values.push((*id, value));
            }
        }

        let pairs: Vec<(u8, &str)> = values.iter().map(|(id, v)| (*id, v.as_str())).collect();
        if let Some(result) = encode_row(section, &key, &pairs) {
            sink(key, result);
        }
    }

    Ok(())
}

/// Walk a dotted path through nested objects.
///
/// Returns `None` when any segment is missing, null, or applied to a
/// non-object; otherwise the non-null value at the end of the path.
fn walk<'a, S: AsRef<str>>(value: &'a Value, path: &[S]) -> Option<&'a Value> {
    match path.split_first() {
        None => (!value.is_null()).then_some(value),
        Some((head, rest)) => walk(value.as_object()?.get(head.as_ref())?, rest),
    }
}

/// Render a scalar leaf as a field value. Arrays and objects are omitted.
fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use argus_core::codec;

    fn collect(
        body: &[u8],
        key_path: &[&str],
        shortcuts: &HashMap<String, u8>,
    ) -> Result<Vec<(String, EncodedResult)>> {
        let key_path: Vec<String> = key_path.iter().map(ToString::to_string).collect();
        let mut rows = Vec::new();
        parse(body, &key_path, shortcuts, "test", &mut |key, result| {
            rows.push((key, result));
        })?;
        Ok(rows)
    }

    #[test]
    fn test_key_and_nested_shortcut() {
        let body = br#"[{"ip":"1.1.1.1","meta":{"score":5}}]"#;
        let shortcuts = HashMap::from([("meta.score".to_string(), 3u8)]);
        let rows = collect(body, &["ip"], &shortcuts).unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].0, "1.1.1.1");
        let decoded = codec::decode(&rows[0].1.payload, rows[0].1.count).unwrap();
        assert_eq!(decoded, vec![(3, "5".to_string())]);
    }

    #[test]
    fn test_missing_key_path_value_skips_row() {
        let body = br#"[{"ip":"1.1.1.1"},{"host":"no-ip.example"},{"ip":null}]"#;
        let rows = collect(body, &["ip"], &HashMap::new()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].0, "1.1.1.1");
    }

    #[test]
    fn test_missing_shortcut_path_omits_field() {
        let body = br#"[{"ip":"1.1.1.1","meta":{"score":5}},{"ip":"2.2.2.2"}]"#;
        let shortcuts = HashMap::from([("meta.score".to_string(), 3u8)]);
        let rows = collect(body, &["ip"], &shortcuts).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].1.count, 1);
        assert_eq!(rows[1].1, EncodedResult::EMPTY);
    }

    #[test]
    fn test_nested_key_path() {
        let body = br#"[{"net":{"addr":"10.0.0.1"},"tag":"scan"}]"#;
        let shortcuts = HashMap::from([("tag".to_string(), 0u8)]);
        let rows = collect(body, &["net", "addr"], &shortcuts).unwrap();
        assert_eq!(rows[0].0, "10.0.0.1");
    }

    #[test]
    fn test_numeric_key_stringified() {
        let body = br#"[{"asn":13335,"name":"cf"}]"#;
        let shortcuts = HashMap::from([("name".to_string(), 0u8)]);
        let rows = collect(body, &["asn"], &shortcuts).unwrap();
        assert_eq!(rows[0].0, "13335");
    }

    #[test]
    fn test_compound_leaf_omitted() {
        let body = br#"[{"ip":"1.1.1.1","meta":{"score":[1,2]}}]"#;
        let shortcuts = HashMap::from([("meta.score".to_string(), 3u8)]);
        let rows = collect(body, &["ip"], &shortcuts).unwrap();
        assert_eq!(rows[0].1, EncodedResult::EMPTY);
    }

    #[test]
    fn test_empty_key_path_fails() {
        let body = br#"[{"ip":"1.1.1.1"}]"#;
        assert!(matches!(
            collect(body, &[], &HashMap::new()),
            Err(SourceError::MissingKeyPath)
        ));
    }

    #[test]
    fn test_non_array_input_fails_pass() {
        let body = br#"{"ip":"1.1.1.1"}"#;
        assert!(matches!(
            collect(body, &["ip"], &HashMap::new()),
            Err(SourceError::Parse(_))
        ));
    }

    #[test]
    fn test_invalid_json_fails_pass() {
        assert!(matches!(
            collect(b"[{not json", &["ip"], &HashMap::new()),
            Err(SourceError::Json(_))
        ));
    }
}
