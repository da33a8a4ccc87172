use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{BindingError, Result};

/// The file a generated script writes the saved module location into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactHandoff {
    path: PathBuf,
}

impl ArtifactHandoff {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Location written by the script, trimmed.
    pub fn read(&self) -> Result<String> {
        let content = fs::read_to_string(&self.path)
            .map_err(|e| BindingError::handoff(&self.path, e.to_string()))?;
        let location = content.trim();
        if location.is_empty() {
            return Err(BindingError::handoff(&self.path, "transfer file is empty"));
        }
        Ok(location.to_string())
    }

    /// Remove the transfer file. A file that is already gone is fine.
    pub fn cleanup(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(BindingError::handoff(&self.path, e.to_string())),
        }
    }
}
