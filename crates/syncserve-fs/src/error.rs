//! Error types for syncserve-fs

use std::path::PathBuf;

/// Result type for syncserve-fs operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in syncserve-fs operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Requested entry is missing, hidden, or outside the served root.
    ///
    /// The three cases are deliberately indistinguishable to callers.
    #[error("Not found: {path}")]
    NotFound { path: String },

    #[error("Failed to parse {format} config at {path}: {message}")]
    ConfigParse {
        path: PathBuf,
        format: String,
        message: String,
    },

    #[error("Unsupported config format: {extension}")]
    UnsupportedFormat { extension: String },
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound { path: path.into() }
    }

    /// Whether this error should be reported to HTTP clients as a 404.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
