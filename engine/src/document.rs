//! Documents fetched from the store and local edits made against them.

use crate::{format, DocumentId, Error, Format, Result, Revision, Value};
use chrono::{DateTime, SecondsFormat};
use std::ops::RangeInclusive;

/// Content field holding the store-assigned document ID.
pub const ID_FIELD: &str = "_id";
/// Content field holding the store-assigned revision.
pub const REVISION_FIELD: &str = "_modified";

/// Revisions in this range are unix timestamps (years 2000 to 2100).
const TIMESTAMP_RANGE: RangeInclusive<Revision> = 946_684_800..=4_102_444_800;

/// Revision as shown to the operator, with its time when it is a timestamp.
pub fn display_revision(revision: Revision) -> String {
    if TIMESTAMP_RANGE.contains(&revision) {
        if let Some(time) = DateTime::from_timestamp(revision, 0) {
            return format!(
                "{}, {}",
                revision,
                time.to_rfc3339_opts(SecondsFormat::Secs, true)
            );
        }
    }
    revision.to_string()
}

/// A document as the remote store returned it.
///
/// Immutable once built: edits are made on a [`LocalEdit`], never here.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    id: DocumentId,
    revision: Revision,
    content: Value,
}

impl Document {
    /// Build a document from raw store content.
    ///
    /// The content must be an object with a non-empty `_id`. A missing
    /// `_modified` is read as revision 0.
    pub fn from_content(content: Value) -> Result<Self> {
        let map = content.as_object().ok_or_else(|| {
            Error::Validation(format!(
                "document content must be an object, got {}",
                content.kind()
            ))
        })?;

        let id = embedded_id(map.get(ID_FIELD))
            .ok_or_else(|| Error::Validation(format!("document is missing {}", ID_FIELD)))?;
        let revision = map.get(REVISION_FIELD).and_then(Value::as_i64).unwrap_or(0);

        Ok(Self {
            id,
            revision,
            content,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn revision(&self) -> Revision {
        self.revision
    }

    pub fn content(&self) -> &Value {
        &self.content
    }

    pub fn into_content(self) -> Value {
        self.content
    }
}

/// The operator's intended new content for a document.
///
/// Carries the `_id` and `_modified` found inside its own content; the
/// revision records which remote revision the edit was based on and, like
/// [`Document::revision`], reads as 0 when `_modified` is absent.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalEdit {
    content: Value,
    id: Option<DocumentId>,
    revision: Revision,
}

impl LocalEdit {
    pub fn from_content(content: Value) -> Result<Self> {
        let map = content.as_object().ok_or_else(|| {
            Error::Validation(format!(
                "local document must be an object, got {}",
                content.kind()
            ))
        })?;

        let id = embedded_id(map.get(ID_FIELD));
        let revision = map.get(REVISION_FIELD).and_then(Value::as_i64).unwrap_or(0);

        Ok(Self {
            content,
            id,
            revision,
        })
    }

    /// Parse an edit from a file or buffer in the given format.
    pub fn parse(bytes: &[u8], format: Format) -> Result<Self> {
        Self::from_content(format::parse(bytes, format)?)
    }

    pub fn content(&self) -> &Value {
        &self.content
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn revision(&self) -> Revision {
        self.revision
    }

    /// Ensure the edit names its document.
    ///
    /// The ID embedded in the content wins; otherwise `fallback` is written
    /// into the content as `_id`. Fails when neither is available.
    pub fn resolve_id(self, fallback: Option<&str>) -> Result<Self> {
        let fallback = fallback.filter(|id| !id.is_empty());

        match (&self.id, fallback) {
            (Some(own), Some(other)) if own != other => {
                tracing::warn!(
                    embedded = %own,
                    requested = %other,
                    "local document carries a different {}; using the embedded one",
                    ID_FIELD
                );
                Ok(self)
            }
            (Some(_), _) => Ok(self),
            (None, Some(id)) => {
                let mut content = self.content;
                if let Some(map) = content.as_object_mut() {
                    map.insert(ID_FIELD, Value::from(id));
                }
                Ok(Self {
                    content,
                    id: Some(id.to_string()),
                    revision: self.revision,
                })
            }
            (None, None) => Err(Error::Validation(format!(
                "document is missing {} and no document ID was provided",
                ID_FIELD
            ))),
        }
    }
}

fn embedded_id(value: Option<&Value>) -> Option<DocumentId> {
    value
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}
