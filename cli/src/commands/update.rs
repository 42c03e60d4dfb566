//! `update`: push a local edit with optimistic locking.

use super::display_revision;
use crate::error::{CliError, Result};
use crate::mirror::{read_file, Mirror};
use docsync_engine::{DocumentStore, Format, LocalEdit, Outcome, ReconcileOptions, Reconciler};
use std::io::Write;
use std::path::{Path, PathBuf};

pub const DIFF_HEADER: &str = "=== Diff (server → local) ===";
pub const NO_CHANGES: &str = "No changes detected - nothing to do.";

pub struct UpdateArgs<'a> {
    pub collection: &'a str,
    pub id: Option<&'a str>,
    /// Format of the local file; inferred from `tempfile` when absent
    pub format: Option<Format>,
    /// Read the edit from here instead of the mirror
    pub tempfile: Option<&'a Path>,
    pub dry_run: bool,
}

impl UpdateArgs<'_> {
    fn source(&self, mirror: &Mirror) -> Result<(PathBuf, Format)> {
        if let Some(path) = self.tempfile {
            let format = self
                .format
                .or_else(|| Format::from_path(path))
                .unwrap_or_default();
            return Ok((path.to_path_buf(), format));
        }

        let id = self.id.filter(|id| !id.is_empty()).ok_or_else(|| {
            CliError::Usage("collection and either document ID or --tempfile are required".into())
        })?;
        let format = self.format.unwrap_or_default();
        Ok((mirror.path_for(self.collection, id, format), format))
    }
}

/// Conflicts are returned as errors; every other outcome is reported on `out`.
pub fn run<S, W>(
    store: &S,
    mirror: &Mirror,
    args: UpdateArgs<'_>,
    out: &mut W,
) -> Result<Outcome>
where
    S: DocumentStore + ?Sized,
    W: Write,
{
    let (path, format) = args.source(mirror)?;
    tracing::debug!(path = %path.display(), %format, "reading local edit");
    let edit = LocalEdit::parse(&read_file(&path)?, format)?;

    let options = ReconcileOptions {
        dry_run: args.dry_run,
    };
    let mut write_error = None;
    let outcome = Reconciler::new(store).reconcile(
        args.collection,
        edit,
        args.id,
        options,
        |report| {
            if let Err(e) = write!(out, "{}\n{}", DIFF_HEADER, report.text) {
                write_error.get_or_insert(e);
            }
        },
    );
    let outcome = outcome?.into_result()?;
    if let Some(e) = write_error {
        return Err(e.into());
    }

    match &outcome {
        Outcome::NoChange { .. } => writeln!(out, "{}", NO_CHANGES)?,
        Outcome::Planned(plan) => writeln!(
            out,
            "[DRY-RUN] Would update collection '{}' document '{}' (rev {}) via {}",
            plan.collection,
            plan.id,
            display_revision(plan.revision),
            plan.target
        )?,
        Outcome::Committed { id, from, to } => writeln!(
            out,
            "updated {}: rev {} -> {}",
            id,
            display_revision(*from),
            display_revision(*to)
        )?,
        Outcome::Conflict { .. } => {}
    }
    Ok(outcome)
}
