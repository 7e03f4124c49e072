//! Filesystem layer for git-sync-static
//!
//! Serves the synchronized checkout read-only through [`StaticGateway`], which
//! hides dot-entries and refuses directory listings, and loads optional
//! configuration files in a format-agnostic way.

pub mod config;
pub mod content_type;
pub mod error;
pub mod gateway;
pub mod path;

pub use config::load_config;
pub use content_type::content_type_for;
pub use error::{Error, Result};
pub use gateway::{INDEX_FILE, Resolved, ServedFile, StaticGateway};
pub use path::NormalizedPath;
