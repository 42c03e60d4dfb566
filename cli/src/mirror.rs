//! Local mirror of remote documents, laid out as `<root>/<collection>/<id>.<ext>`.

use crate::error::{CliError, Result};
use docsync_engine::Format;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct Mirror {
    root: PathBuf,
}

impl Mirror {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where a document lives in the mirror.
    pub fn path_for(&self, collection: &str, id: &str, format: Format) -> PathBuf {
        self.root
            .join(collection)
            .join(format!("{}.{}", id, format.extension()))
    }
}

/// Write a file, creating its parent directories.
pub fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| CliError::write(parent, e))?;
    }
    fs::write(path, bytes).map_err(|e| CliError::write(path, e))?;
    tracing::debug!(path = %path.display(), bytes = bytes.len(), "wrote document");
    Ok(())
}

pub fn read_file(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| CliError::read(path, e))
}
