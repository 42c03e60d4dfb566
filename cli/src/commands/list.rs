//! `list`: collection names, or the entries of one collection.

use crate::error::Result;
use docsync_engine::{DocumentStore, EntryQuery, Value, ID_FIELD};
use std::io::Write;

pub fn run<S, W>(
    store: &S,
    collection: Option<&str>,
    limit: Option<usize>,
    out: &mut W,
) -> Result<()>
where
    S: DocumentStore + ?Sized,
    W: Write,
{
    let Some(collection) = collection else {
        for name in store.list_collections()? {
            writeln!(out, "{}", name)?;
        }
        return Ok(());
    };

    let mut query = EntryQuery::new();
    if let Some(limit) = limit {
        query = query.with_limit(limit);
    }

    let entries = store.fetch_entries(collection, &query)?;
    tracing::debug!(collection, count = entries.len(), "listed entries");
    for entry in &entries {
        writeln!(out, "{}", label(entry))?;
    }
    Ok(())
}

/// `id - title`, or just the ID when the entry has no title.
fn label(entry: &Value) -> String {
    let id = entry.get(ID_FIELD).and_then(Value::as_str).unwrap_or_default();
    match entry.get("title").and_then(Value::as_str) {
        Some(title) if !title.is_empty() => format!("{} - {}", id, title),
        _ => id.to_string(),
    }
}
