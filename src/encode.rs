//! Snapshot-to-wire encoding.
//!
//! Produces the Carbon plaintext format, one line per sample:
//!
//! ```text
//! <prefix>.<path> <value> <unix-timestamp-seconds>\n
//! ```
//!
//! Encoding is a pure function of its inputs; identical snapshots encode to
//! byte-identical payloads.

use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;

use crate::error::EncodeError;
use crate::registry::MetricFamily;
use crate::template::LabelTemplate;

/// Replace every character outside `[a-zA-Z0-9_-]` with `_`.
///
/// Dots are replaced too, so sanitized segments can never collide with the
/// dot-delimited path structure.
pub fn sanitize(s: &str) -> String {
    s.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Encode one snapshot into the wire payload.
///
/// Samples are emitted in family-then-sample encounter order. A template
/// placeholder with no matching label aborts the whole payload; there is no
/// partial output.
pub fn encode(
    families: &[MetricFamily],
    prefix: &str,
    timestamp: i64,
    templates: &HashMap<String, LabelTemplate>,
) -> Result<Vec<u8>, EncodeError> {
    let mut output = String::new();

    for family in families {
        for sample in &family.samples {
            // Sorted by sanitized key; a later duplicate sanitized key wins.
            let labels: BTreeMap<String, String> = sample
                .labels
                .iter()
                .map(|(k, v)| (sanitize(k), sanitize(v)))
                .collect();

            let path = match templates.get(&sample.name) {
                Some(template) => {
                    let mut values = labels.clone();
                    // Reserved binding; shadows a real label named `name`.
                    values.insert("name".to_string(), sanitize(&sample.name));
                    template.render(&sample.name, &values)?
                }
                None => {
                    let mut path = sanitize(&sample.name);
                    for (key, value) in &labels {
                        write!(path, ".{key}.{value}").expect("writing to a String cannot fail");
                    }
                    path
                }
            };

            writeln!(output, "{prefix}.{path} {} {timestamp}", format_value(sample.value))
                .expect("writing to a String cannot fail");
        }
    }

    Ok(output.into_bytes())
}

/// Shortest round-trip decimal form, keeping the trailing `.0` on integral
/// values (`5.0`, not `5`). NaN and infinities pass through as `NaN`/`inf`
/// and Carbon will reject those lines; they are not special-cased here.
fn format_value(value: f64) -> String {
    format!("{value:?}")
}
