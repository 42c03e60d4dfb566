//! `get`: download a document into the local mirror.

use super::display_revision;
use crate::error::Result;
use crate::mirror::{write_file, Mirror};
use docsync_engine::{format, DocumentStore, Format};
use std::io::Write;
use std::path::{Path, PathBuf};

pub struct GetArgs<'a> {
    pub collection: &'a str,
    pub id: &'a str,
    pub format: Format,
    /// Write here instead of the mirror path
    pub output: Option<&'a Path>,
}

/// Returns the path the document was written to.
pub fn run<S, W>(store: &S, mirror: &Mirror, args: GetArgs<'_>, out: &mut W) -> Result<PathBuf>
where
    S: DocumentStore + ?Sized,
    W: Write,
{
    let doc = store.fetch_document(args.collection, args.id)?;
    let bytes = format::serialize(doc.content(), args.format)?;

    let path = match args.output {
        Some(path) => path.to_path_buf(),
        None => mirror.path_for(args.collection, args.id, args.format),
    };
    write_file(&path, &bytes)?;

    writeln!(
        out,
        "saved {} (rev {}) -> {}",
        doc.id(),
        display_revision(doc.revision()),
        path.display()
    )?;
    Ok(path)
}
