//! Structural diff: path-aware comparison of two parsed value trees.
//!
//! Values are `serde_json::Value`, whatever format they were parsed from.
//! The result is a list of located differences; an empty list means the two
//! values are equivalent. Entry order follows the traversal and carries no
//! meaning.

use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};

/// Display labels of the two sides, used verbatim in messages.
#[derive(Clone, Copy, Debug)]
pub struct Sides<'a> {
    pub old: &'a str,
    pub new: &'a str,
}

/// What kind of difference a [`StructuralChange`] describes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    /// The two sides hold values of different kinds.
    TypeMismatch,
    /// A key exists on the new side only.
    OnlyInNew,
    /// A key exists on the old side only.
    OnlyInOld,
    /// Two arrays have different lengths.
    LengthMismatch,
    /// Two terminal values differ.
    ValueMismatch,
}

/// One located difference between two value trees.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StructuralChange {
    /// Dotted/bracketed location, e.g. `run_list[2]` or `attrs.port`.
    /// Empty for the top-level value.
    pub path: String,
    pub kind: ChangeKind,
    /// Human-readable description naming both sides.
    pub message: String,
}

impl StructuralChange {
    pub(crate) fn new(path: &str, kind: ChangeKind, message: String) -> Self {
        Self {
            path: path.to_string(),
            kind,
            message,
        }
    }
}

impl fmt::Display for StructuralChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Compare `old` and `new`, reporting each difference under `prefix`.
///
/// Objects are compared key by key, arrays index by index over the shared
/// length. The array branch is entered only when the new value is an array:
/// an old array against a new scalar is reported as a plain value mismatch.
pub fn diff_structured(old: &Value, new: &Value, sides: Sides<'_>, prefix: &str) -> Vec<StructuralChange> {
    let mut changes = Vec::new();
    diff_at(old, new, sides, prefix, &mut changes);
    changes
}

fn diff_at(old: &Value, new: &Value, sides: Sides<'_>, path: &str, out: &mut Vec<StructuralChange>) {
    if let Value::Object(old_map) = old {
        match new {
            Value::Object(new_map) => diff_objects(old_map, new_map, sides, path, out),
            _ => out.push(type_mismatch(old, new, sides, path)),
        }
        return;
    }

    if let Value::Array(new_items) = new {
        let Value::Array(old_items) = old else {
            out.push(type_mismatch(old, new, sides, path));
            return;
        };
        if old_items.len() != new_items.len() {
            out.push(StructuralChange::new(
                path,
                ChangeKind::LengthMismatch,
                format!(
                    "{} is length {} in {}, and {} in {}",
                    label(path),
                    new_items.len(),
                    sides.new,
                    old_items.len(),
                    sides.old
                ),
            ));
        }
        for (i, (old_item, new_item)) in old_items.iter().zip(new_items).enumerate() {
            diff_at(old_item, new_item, sides, &format!("{path}[{i}]"), out);
        }
        return;
    }

    if !scalars_equal(old, new) {
        out.push(StructuralChange::new(
            path,
            ChangeKind::ValueMismatch,
            format!(
                "{} is {} in {} and {} in {}",
                label(path),
                new,
                sides.new,
                old,
                sides.old
            ),
        ));
    }
}

fn diff_objects(
    old: &Map<String, Value>,
    new: &Map<String, Value>,
    sides: Sides<'_>,
    path: &str,
    out: &mut Vec<StructuralChange>,
) {
    for (key, new_value) in new {
        let child = child_path(path, key);
        match old.get(key) {
            Some(old_value) => diff_at(old_value, new_value, sides, &child, out),
            None => out.push(StructuralChange::new(
                &child,
                ChangeKind::OnlyInNew,
                format!("{child} exists in {} but not in {}", sides.new, sides.old),
            )),
        }
    }
    for key in old.keys().filter(|key| !new.contains_key(*key)) {
        let child = child_path(path, key);
        out.push(StructuralChange::new(
            &child,
            ChangeKind::OnlyInOld,
            format!("{child} exists in {} but not in {}", sides.old, sides.new),
        ));
    }
}

fn type_mismatch(old: &Value, new: &Value, sides: Sides<'_>, path: &str) -> StructuralChange {
    StructuralChange::new(
        path,
        ChangeKind::TypeMismatch,
        format!(
            "{} has type {} in {} and {} in {}",
            label(path),
            kind_name(new),
            sides.new,
            kind_name(old),
            sides.old
        ),
    )
}

/// Numbers compare by value, so `1` and `1.0` are equal.
fn scalars_equal(old: &Value, new: &Value) -> bool {
    match (old, new) {
        (Value::Number(a), Value::Number(b)) if a.is_f64() || b.is_f64() => a.as_f64() == b.as_f64(),
        _ => old == new,
    }
}

fn child_path(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

fn label(path: &str) -> &str {
    if path.is_empty() { "(root)" } else { path }
}

/// Name of a value's kind as shown in type mismatch messages.
pub fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
