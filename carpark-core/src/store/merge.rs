//! Merge helpers shared by store implementations.

use serde_json::Value;

use super::{Document, FieldPath};

/// Replace each top-level field of `target` named in `fields`.
pub(crate) fn merge_top_level(target: &mut Document, fields: &Document) {
    for (name, value) in fields {
        target.insert(name.clone(), value.clone());
    }
}

/// Write `value` at `path`, creating or replacing intermediate maps.
pub(crate) fn set_nested(target: &mut Document, path: &FieldPath, value: Value) {
    set_segments(target, path.segments(), value);
}

fn set_segments(target: &mut Document, segments: &[String], value: Value) {
    match segments {
        [] => {}
        [last] => {
            target.insert(last.clone(), value);
        }
        [head, rest @ ..] => {
            let child = target
                .entry(head.clone())
                .or_insert_with(|| Value::Object(Document::new()));
            if !child.is_object() {
                *child = Value::Object(Document::new());
            }
            if let Value::Object(map) = child {
                set_segments(map, rest, value);
            }
        }
    }
}
