//! Tagged-lines adapter.
//!
//! Each data line has the form `key;name1=value1;name2=value2;…`. Lines
//! beginning with `#` are field/view declarations, not data: they register
//! fields and bind shortcuts as the file streams through, so a feed can
//! declare its own vocabulary inline.
//!
//! Field name resolution per pair, in order: the source's shortcut table,
//! then any globally registered field of that name, then a brand-new field
//! registered on the fly.

use argus_core::{EncodedResult, FieldRegistry};
use std::collections::HashMap;
use tracing::warn;

use crate::adapters::encode_row;
use crate::config::{parse_field_decl, FieldDecl};
use crate::error::Result;

/// Parse a tagged-lines body, emitting one encoded row per data line.
///
/// `shortcuts` and `view` are mutated by inline declarations. Malformed
/// `name=value` segments are logged and skipped; the only hard failure is
/// field-capacity exhaustion while registering a new name.
pub fn parse<F>(
    body: &[u8],
    shortcuts: &mut HashMap<String, u8>,
    view: &mut String,
    registry: &FieldRegistry,
    section: &str,
    sink: &mut F,
) -> Result<()>
where
    F: FnMut(String, EncodedResult),
{
    let text = String::from_utf8_lossy(body);

    for line in text.lines() {
        if line.starts_with('#') {
            apply_decl(line, shortcuts, view, registry)?;
            continue;
        }
        if line.trim().is_empty() {
            continue;
        }

        let mut segments = line.split(';');
        let key = segments.next().unwrap_or_default();

        let mut pairs: Vec<(u8, &str)> = Vec::new();
        for segment in segments {
            let Some((name, value)) = segment.split_once('=') else {
                warn!(
                    section = %section,
                    segment = %segment,
                    line = %line,
                    "ignored segment without '='"
                );
                continue;
            };

            let id = match shortcuts.get(name) {
                Some(&id) => id,
                None => match registry.lookup(name) {
                    Some(id) => id,
                    None => registry.register(name)?,
                },
            };
            pairs.push((id, value));
        }

        if let Some(result) = encode_row(section, key, &pairs) {
            sink(key.to_string(), result);
        }
    }

    Ok(())
}

/// Apply one `#`-prefixed declaration line.
fn apply_decl(
    line: &str,
    shortcuts: &mut HashMap<String, u8>,
    view: &mut String,
    registry: &FieldRegistry,
) -> Result<()> {
    match parse_field_decl(line) {
        Some(FieldDecl::Field { name, shortcut }) => {
            let id = registry.register(&name)?;
            if let Some(token) = shortcut {
                shortcuts.insert(token, id);
            }
        }
        Some(FieldDecl::View(template)) => {
            view.push_str(&template);
            view.push('\n');
        }
        None => {} // plain comment
    }
    Ok(())
}
