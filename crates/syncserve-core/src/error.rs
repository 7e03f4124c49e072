//! Error types for syncserve-core

use std::path::PathBuf;
use std::time::Duration;

/// Result type for syncserve-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in syncserve-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No checkout directory name can be derived from the repository URL
    #[error("Invalid repository URL {url:?}: cannot derive a checkout directory name")]
    InvalidRepositoryUrl { url: String },

    /// Checking whether the checkout exists failed for a reason other than absence
    #[error("Error checking if checkout exists at {path}: {source}")]
    Stat {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A clone or pull did not finish within the operation timeout
    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    /// The event consumer went away while the engine was still producing
    #[error("Event queue closed; no consumer is draining events")]
    QueueClosed,

    /// The blocking git task panicked or was cancelled by the runtime
    #[error("Sync task failed: {0}")]
    Task(String),

    /// Shutdown was requested while the operation was in progress
    #[error("Shutdown requested")]
    Shutdown,

    /// Payload template failed to parse or render
    #[error("Template error: {0}")]
    Template(String),

    /// Webhook URL or method could not be used
    #[error("Invalid webhook configuration: {0}")]
    InvalidWebhook(String),

    /// Transport-level webhook failure (connect, timeout, TLS)
    #[error("Webhook request to {url} failed: {source}")]
    Webhook {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The webhook sink answered with a non-success status
    #[error("Webhook {url} responded with {status}")]
    WebhookStatus {
        url: String,
        status: reqwest::StatusCode,
    },

    /// Git error from syncserve-git
    #[error(transparent)]
    Git(#[from] syncserve_git::Error),
}
