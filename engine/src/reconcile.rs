//! Reconciliation of a local edit against the remote document.
//!
//! This is the safety-critical part of the engine. One attempt runs a fixed,
//! linear sequence:
//!
//! 1. Resolve the document ID of the edit
//! 2. Fetch the current remote document
//! 3. Diff remote content against the edit; an empty diff ends the attempt
//!    with [`Outcome::NoChange`]
//! 4. Hand the rendered diff to the caller
//! 5. Optimistic lock: the edit's embedded revision must equal the remote
//!    revision, otherwise [`Outcome::Conflict`]. A missing `_modified` reads
//!    as 0 on both sides
//! 6. Dry run: report the [`Plan`]; otherwise save and report the new revision
//!
//! `_modified` is compared like any other field, so an edit made against an
//! older revision always shows at least that field as modified. Nothing is
//! merged: a conflict is reported and left to the operator.

use crate::diff::{compare, render, DiffResult};
use crate::{
    CollectionName, DocumentId, DocumentStore, Error, LocalEdit, Result, Revision,
};
use serde::Serialize;

/// Options for one reconciliation attempt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileOptions {
    /// Compute and report everything, but never save
    pub dry_run: bool,
}

impl ReconcileOptions {
    pub fn dry_run() -> Self {
        Self { dry_run: true }
    }
}

/// The diff between remote and local content, as handed to the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub diff: DiffResult,
    /// Rendered form of `diff`, against the remote content
    pub text: String,
}

/// The save a dry run would have made.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub collection: CollectionName,
    pub id: DocumentId,
    /// Revision the save would be based on
    pub revision: Revision,
    /// Call target reported by the store
    pub target: String,
}

/// How a reconciliation attempt ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum Outcome {
    /// Local content equals remote content; nothing was saved
    NoChange { id: DocumentId, revision: Revision },
    /// The document moved on since the edit was made; nothing was saved
    Conflict {
        id: DocumentId,
        remote: Revision,
        local: Revision,
    },
    /// Dry run with a saveable change
    Planned(Plan),
    /// The change was saved
    Committed {
        id: DocumentId,
        from: Revision,
        to: Revision,
    },
}

impl Outcome {
    /// Turn a conflict into [`Error::Conflict`]; every other outcome is a
    /// success.
    pub fn into_result(self) -> Result<Outcome> {
        match self {
            Outcome::Conflict { id, remote, local } => {
                Err(Error::Conflict { id, remote, local })
            }
            other => Ok(other),
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Outcome::Conflict { .. })
    }
}

/// Drives reconciliation attempts against one store.
pub struct Reconciler<'a, S: DocumentStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: DocumentStore + ?Sized> Reconciler<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Run one attempt.
    ///
    /// `fallback_id` is used when the edit does not carry `_id` itself.
    /// `emit` receives the diff report as soon as a real change is found,
    /// before the lock check, so the operator sees the change even when the
    /// attempt is rejected or the save fails.
    pub fn reconcile<F>(
        &self,
        collection: &str,
        edit: LocalEdit,
        fallback_id: Option<&str>,
        options: ReconcileOptions,
        mut emit: F,
    ) -> Result<Outcome>
    where
        F: FnMut(&Report),
    {
        let edit = edit.resolve_id(fallback_id)?;
        let id = edit
            .id()
            .ok_or_else(|| Error::Validation("document ID could not be resolved".into()))?
            .to_string();

        let span = tracing::debug_span!("reconcile", %collection, %id, dry_run = options.dry_run);
        let _enter = span.enter();

        let remote = self.store.fetch_document(collection, &id)?;
        tracing::debug!(revision = remote.revision(), "fetched remote document");

        let diff = compare(remote.content(), edit.content());
        if diff.is_empty() {
            tracing::debug!("no changes");
            return Ok(Outcome::NoChange {
                id,
                revision: remote.revision(),
            });
        }

        let text = render(&diff, remote.content());
        emit(&Report { diff, text });

        if edit.revision() != remote.revision() {
            tracing::warn!(
                remote = remote.revision(),
                local = edit.revision(),
                "revision mismatch, refusing to save"
            );
            return Ok(Outcome::Conflict {
                id,
                remote: remote.revision(),
                local: edit.revision(),
            });
        }

        if options.dry_run {
            return Ok(Outcome::Planned(Plan {
                collection: collection.to_string(),
                id,
                revision: remote.revision(),
                target: self.store.save_target(collection),
            }));
        }

        let to = self.store.save_document(collection, edit.content())?;
        tracing::debug!(from = remote.revision(), to, "saved");
        Ok(Outcome::Committed {
            id,
            from: remote.revision(),
            to,
        })
    }
}
