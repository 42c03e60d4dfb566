//! Error types for the docsync engine.

use crate::{document::display_revision, DocumentId, Revision};
use thiserror::Error;

/// All possible errors from the docsync engine.
///
/// Every variant is terminal for the reconciliation attempt that produced it;
/// nothing in the engine retries.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// Input bytes are not well-formed for the declared format, or a value
    /// cannot be represented in the target format.
    #[error("format error: {0}")]
    Format(String),

    /// Network or protocol failure talking to the remote store.
    #[error("transport error: {0}")]
    Transport(String),

    #[error("document not found: {collection}/{id}")]
    NotFound { collection: String, id: DocumentId },

    /// Required data (usually the document ID) is missing or malformed.
    #[error("validation error: {0}")]
    Validation(String),

    #[error(
        "document changed on server (server rev {} != local rev {})",
        revision_text(.remote),
        revision_text(.local)
    )]
    Conflict {
        id: DocumentId,
        remote: Revision,
        local: Revision,
    },
}

fn revision_text(revision: &Revision) -> String {
    display_revision(*revision)
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = Error::NotFound {
            collection: "posts".into(),
            id: "abc".into(),
        };
        assert_eq!(err.to_string(), "document not found: posts/abc");

        let err = Error::Conflict {
            id: "abc".into(),
            remote: 3,
            local: 2,
        };
        assert_eq!(
            err.to_string(),
            "document changed on server (server rev 3 != local rev 2)"
        );

        let err = Error::Conflict {
            id: "abc".into(),
            remote: 1_700_000_060,
            local: 1_700_000_000,
        };
        assert_eq!(
            err.to_string(),
            "document changed on server (server rev 1700000060, 2023-11-14T22:14:20Z \
             != local rev 1700000000, 2023-11-14T22:13:20Z)"
        );

        let err = Error::Validation("missing _id".into());
        assert_eq!(err.to_string(), "validation error: missing _id");
    }
}
