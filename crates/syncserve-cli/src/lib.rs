//! git-sync-static
//!
//! Periodically clones or pulls a git repository into a local directory,
//! serves that directory read-only over HTTP and notifies a webhook after
//! every sync.
//!
//! The binary in `main.rs` only parses arguments and reports errors; the
//! modules here hold everything else so integration tests can drive them.

pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod server;

pub use cli::{Cli, LogFormat, NotifyMode};
pub use config::Settings;
pub use error::{CliError, Result};
