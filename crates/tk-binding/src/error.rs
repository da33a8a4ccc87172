use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BindingError {
    #[error(transparent)]
    Trace(#[from] tk_core::Error),

    #[error("Compiler exited with {status}: {stderr}")]
    Compile { status: String, stderr: String },

    #[error("Artifact handoff through {}: {reason}", path.display())]
    Handoff { path: PathBuf, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl BindingError {
    pub fn handoff(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        BindingError::Handoff {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, BindingError>;
