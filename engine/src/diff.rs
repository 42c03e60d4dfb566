//! Structural diff between two value trees.
//!
//! # Algorithm
//!
//! 1. Objects: keys only in the old tree are `Removed`, keys only in the new
//!    tree are `Added`, keys in both with unequal values are recursed into
//!    when both sides are containers of the same kind, else `Modified`
//! 2. Arrays: compared index by index with the same rule; indices past the
//!    end of one side are `Added` or `Removed`
//! 3. Scalars: equal only when type and value match
//!
//! Arrays are aligned by index only. An element inserted at the front of an
//! array shows up as a modification of every later index plus one `Added` at
//! the end; moves and insertions are not detected.

use crate::format::canonical_json;
use crate::{Number, Path, Segment, Value};
use serde::Serialize;
use std::fmt::Write;

/// What happened at a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Added,
    Removed,
    Modified,
}

impl ChangeKind {
    fn marker(&self) -> char {
        match self {
            ChangeKind::Added => '+',
            ChangeKind::Removed => '-',
            ChangeKind::Modified => '~',
        }
    }
}

/// One difference, rooted at `path`.
#[derive(Debug, Clone, PartialEq)]
pub struct Change {
    pub path: Path,
    pub kind: ChangeKind,
    /// Present for `Removed` and `Modified`
    pub old_value: Option<Value>,
    /// Present for `Added` and `Modified`
    pub new_value: Option<Value>,
}

impl Change {
    pub fn added(path: Path, value: Value) -> Self {
        Self {
            path,
            kind: ChangeKind::Added,
            old_value: None,
            new_value: Some(value),
        }
    }

    pub fn removed(path: Path, value: Value) -> Self {
        Self {
            path,
            kind: ChangeKind::Removed,
            old_value: Some(value),
            new_value: None,
        }
    }

    pub fn modified(path: Path, old: Value, new: Value) -> Self {
        Self {
            path,
            kind: ChangeKind::Modified,
            old_value: Some(old),
            new_value: Some(new),
        }
    }
}

/// Ordered list of changes between two trees.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DiffResult {
    changes: Vec<Change>,
}

impl DiffResult {
    /// True when the two trees are semantically equal.
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn changes(&self) -> &[Change] {
        &self.changes
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Change> {
        self.changes.iter()
    }

    pub fn count(&self, kind: ChangeKind) -> usize {
        self.changes.iter().filter(|c| c.kind == kind).count()
    }
}

impl<'a> IntoIterator for &'a DiffResult {
    type Item = &'a Change;
    type IntoIter = std::slice::Iter<'a, Change>;

    fn into_iter(self) -> Self::IntoIter {
        self.changes.iter()
    }
}

impl IntoIterator for DiffResult {
    type Item = Change;
    type IntoIter = std::vec::IntoIter<Change>;

    fn into_iter(self) -> Self::IntoIter {
        self.changes.into_iter()
    }
}

/// Compute the changes that turn `old` into `new`.
pub fn compare(old: &Value, new: &Value) -> DiffResult {
    let mut changes = Vec::new();
    diff_node(old, new, &Path::root(), &mut changes);
    DiffResult { changes }
}

fn diff_node(old: &Value, new: &Value, path: &Path, changes: &mut Vec<Change>) {
    match (old, new) {
        (Value::Object(a), Value::Object(b)) => {
            for (key, old_child) in a.iter() {
                let child_path = path.key(key.as_str());
                match b.get(key) {
                    Some(new_child) => diff_node(old_child, new_child, &child_path, changes),
                    None => changes.push(Change::removed(child_path, old_child.clone())),
                }
            }
            for (key, new_child) in b.iter() {
                if !a.contains_key(key) {
                    changes.push(Change::added(path.key(key.as_str()), new_child.clone()));
                }
            }
        }
        (Value::Array(a), Value::Array(b)) => {
            for index in 0..a.len().max(b.len()) {
                let child_path = path.index(index);
                match (a.get(index), b.get(index)) {
                    (Some(x), Some(y)) => diff_node(x, y, &child_path, changes),
                    (Some(x), None) => changes.push(Change::removed(child_path, x.clone())),
                    (None, Some(y)) => changes.push(Change::added(child_path, y.clone())),
                    (None, None) => {}
                }
            }
        }
        (a, b) if a == b => {}
        (a, b) => changes.push(Change::modified(path.clone(), a.clone(), b.clone())),
    }
}

/// Render a diff as annotated text.
///
/// `baseline` is the tree the diff was computed from (the old side); it
/// supplies the context shown next to each path. Unchanged parts of the
/// document are never printed.
///
/// ```text
/// ~ title
///   - "Old"
///   + "New"
/// + tags[2] (array of 2)
///   + "news"
/// ```
pub fn render(diff: &DiffResult, baseline: &Value) -> String {
    let mut out = String::new();
    for change in diff {
        let _ = write!(out, "{} {}", change.kind.marker(), change.path);
        if let Some(note) = annotation(change, baseline) {
            let _ = write!(out, " ({})", note);
        }
        out.push('\n');

        if let Some(old) = &change.old_value {
            write_value_lines(&mut out, '-', old);
        }
        if let Some(new) = &change.new_value {
            write_value_lines(&mut out, '+', new);
        }
    }
    out
}

fn annotation(change: &Change, baseline: &Value) -> Option<String> {
    if let (Some(old), Some(new)) = (&change.old_value, &change.new_value) {
        if old.kind() != new.kind() {
            return Some(format!("{} → {}", old.kind(), new.kind()));
        }
        return None;
    }

    // added or removed array elements: show how long the array was
    match change.path.last() {
        Some(Segment::Index(_)) => {
            let parent = change.path.parent()?;
            let len = baseline.at(&parent)?.as_array()?.len();
            Some(format!("array of {}", len))
        }
        _ => None,
    }
}

fn write_value_lines(out: &mut String, sign: char, value: &Value) {
    let mut text = String::new();
    write_pretty(value, 0, &mut text);
    for line in text.lines() {
        let _ = writeln!(out, "  {} {}", sign, line);
    }
}

/// Two-space indented JSON; non-finite floats use the YAML spellings.
fn write_pretty(value: &Value, depth: usize, out: &mut String) {
    let (open, close, len) = match value {
        Value::Array(items) => ('[', ']', items.len()),
        Value::Object(map) => ('{', '}', map.len()),
        scalar => {
            out.push_str(&scalar_text(scalar));
            return;
        }
    };
    out.push(open);
    if len > 0 {
        let pad = "  ".repeat(depth + 1);
        let mut first = true;
        let mut row = |out: &mut String| {
            out.push_str(if first { "\n" } else { ",\n" });
            out.push_str(&pad);
            first = false;
        };
        match value {
            Value::Array(items) => {
                for item in items {
                    row(out);
                    write_pretty(item, depth + 1, out);
                }
            }
            Value::Object(map) => {
                for (key, item) in map.iter() {
                    row(out);
                    out.push_str(&scalar_text(&Value::String(key.clone())));
                    out.push_str(": ");
                    write_pretty(item, depth + 1, out);
                }
            }
            _ => {}
        }
        out.push('\n');
        out.push_str(&"  ".repeat(depth));
    }
    out.push(close);
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::Number(Number::Float(f)) if f.is_nan() => ".nan".to_string(),
        Value::Number(Number::Float(f)) if f.is_infinite() => {
            let text = if f.is_sign_positive() { ".inf" } else { "-.inf" };
            text.to_string()
        }
        scalar => canonical_json(scalar).unwrap_or_default(),
    }
}
