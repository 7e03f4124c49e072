//! Error types for syncserve-cli

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Errors that end the process with a non-zero exit status
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Error from syncserve-core
    #[error(transparent)]
    Core(#[from] syncserve_core::Error),

    /// Error from syncserve-fs
    #[error(transparent)]
    Fs(#[from] syncserve_fs::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Invalid or missing setting
    #[error("{message}")]
    Config { message: String },

    /// Logging could not be initialised
    #[error("Failed to initialise logging: {0}")]
    Logging(String),
}

impl CliError {
    /// Create a configuration error with the given message
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}
