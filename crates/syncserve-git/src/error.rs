//! Error types for syncserve-git

use std::path::PathBuf;

/// Result type for syncserve-git operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in syncserve-git operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("Failed to read SSH key {path}: {source}")]
    KeyRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse SSH key {path}: {message}")]
    KeyParse { path: PathBuf, message: String },

    #[error("Failed to clone {url}: {message}")]
    CloneFailed { url: String, message: String },

    #[error("Failed to pull {path}: {message}")]
    PullFailed { path: PathBuf, message: String },

    #[error("Remote '{name}' not found")]
    RemoteNotFound { name: String },

    #[error("HEAD of {path} is detached; cannot determine the branch to pull")]
    DetachedHead { path: PathBuf },

    #[error("{message}")]
    CannotFastForward { message: String },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Transfer aborted")]
    Aborted,
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
