//! Unified error handling for the command-line front end.

use crate::config::ConfigError;
use std::path::PathBuf;

/// Command error type.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Engine(#[from] docsync_engine::Error),

    #[error("{action} {}: {source}", path.display())]
    File {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write output: {0}")]
    Output(#[from] std::io::Error),

    #[error("{0}")]
    Usage(String),
}

impl CliError {
    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CliError::File {
            action: "failed to read",
            path: path.into(),
            source,
        }
    }

    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CliError::File {
            action: "failed to write",
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for commands.
pub type Result<T> = std::result::Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn file_error_names_the_path() {
        let err = CliError::read(
            "docs/posts/a.json",
            io::Error::new(io::ErrorKind::NotFound, "No such file"),
        );
        assert_eq!(
            err.to_string(),
            "failed to read docs/posts/a.json: No such file"
        );
    }

    #[test]
    fn engine_errors_pass_through() {
        let err = CliError::from(docsync_engine::Error::Conflict {
            id: "a".into(),
            remote: 3,
            local: 2,
        });
        assert_eq!(
            err.to_string(),
            "document changed on server (server rev 3 != local rev 2)"
        );
    }
}
