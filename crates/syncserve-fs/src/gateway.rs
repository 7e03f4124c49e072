//! Static file gateway over the synchronized checkout
//!
//! The gateway is a filter in front of plain file serving:
//!
//! - any request path with a segment starting with `.` is reported as not
//!   found (this keeps `.git/` and other dot-entries private);
//! - a directory is only served through its index document, never as a
//!   listing;
//! - entries that resolve (through symlinks) outside the served root are
//!   reported as not found.
//!
//! Hidden, escaping and missing entries all yield the same
//! [`Error::NotFound`], so clients cannot detect hidden files.
//!
//! The gateway takes no lock against the sync engine. A request racing a pull
//! may observe a partially updated tree; that eventual consistency is accepted
//! because syncs are infrequent compared to request latency.

use std::fs::{self, Metadata};
use std::io::ErrorKind;

use crate::{Error, NormalizedPath, Result, content_type_for};

/// Document served in place of a directory listing.
pub const INDEX_FILE: &str = "index.html";

/// A regular file resolved for serving.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServedFile {
    path: NormalizedPath,
    len: u64,
    content_type: &'static str,
}

impl ServedFile {
    fn new(path: NormalizedPath, len: u64) -> Self {
        let content_type = content_type_for(&path);
        Self {
            path,
            len,
            content_type,
        }
    }

    /// Location of the file on disk.
    pub fn path(&self) -> &NormalizedPath {
        &self.path
    }

    /// Size in bytes at resolution time.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn content_type(&self) -> &'static str {
        self.content_type
    }
}

/// Outcome of resolving a request path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    /// Serve this file.
    File(ServedFile),
    /// The path names a servable directory but lacks its trailing slash;
    /// the client should be redirected to `<path>/`.
    NeedsTrailingSlash,
}

/// Read-only gateway rooted at a directory.
#[derive(Debug, Clone)]
pub struct StaticGateway {
    root: NormalizedPath,
    index_file: String,
}

impl StaticGateway {
    /// Create a gateway serving files below `root`.
    ///
    /// `root` does not need to exist yet; until it does, every request
    /// resolves to not found.
    pub fn new(root: impl Into<NormalizedPath>) -> Self {
        Self {
            root: root.into(),
            index_file: INDEX_FILE.to_string(),
        }
    }

    /// Override the index document name (defaults to [`INDEX_FILE`]).
    pub fn with_index_file(mut self, name: impl Into<String>) -> Self {
        self.index_file = name.into();
        self
    }

    pub fn root(&self) -> &NormalizedPath {
        &self.root
    }

    /// Resolve an HTTP request path (already percent-decoded) to a file.
    pub fn open(&self, request_path: &str) -> Result<Resolved> {
        let segments = visible_segments(request_path)?;
        let target = self.root.join(&segments.join("/"));
        let meta = stat(&target, request_path)?;

        if meta.is_dir() {
            let index = target.join(&self.index_file);
            let index_meta = stat(&index, request_path)?;
            if !index_meta.is_file() {
                return Err(Error::not_found(request_path));
            }
            self.ensure_contained(&index, request_path)?;

            if !request_path.ends_with('/') {
                return Ok(Resolved::NeedsTrailingSlash);
            }
            return Ok(Resolved::File(ServedFile::new(index, index_meta.len())));
        }

        if !meta.is_file() || request_path.ends_with('/') {
            return Err(Error::not_found(request_path));
        }
        self.ensure_contained(&target, request_path)?;

        Ok(Resolved::File(ServedFile::new(target, meta.len())))
    }

    fn ensure_contained(&self, path: &NormalizedPath, request_path: &str) -> Result<()> {
        let root = canonical(&self.root, request_path)?;
        let resolved = canonical(path, request_path)?;

        if resolved.starts_with(&root) {
            Ok(())
        } else {
            tracing::debug!(
                request = %request_path,
                resolved = %resolved.display(),
                "Refusing to serve entry outside the served root"
            );
            Err(Error::not_found(request_path))
        }
    }
}

/// Split a request path into segments, rejecting hidden and unsafe ones.
fn visible_segments(request_path: &str) -> Result<Vec<&str>> {
    let mut segments = Vec::new();
    for segment in request_path.split('/') {
        if segment.is_empty() {
            continue;
        }
        // Covers dotfiles as well as `.` and `..`.
        if segment.starts_with('.') || segment.contains(['\\', '\0']) {
            return Err(Error::not_found(request_path));
        }
        segments.push(segment);
    }
    Ok(segments)
}

fn stat(path: &NormalizedPath, request_path: &str) -> Result<Metadata> {
    fs::metadata(path.to_native()).map_err(|e| classify(path, request_path, e))
}

fn canonical(path: &NormalizedPath, request_path: &str) -> Result<std::path::PathBuf> {
    dunce::canonicalize(path.to_native()).map_err(|e| classify(path, request_path, e))
}

fn classify(path: &NormalizedPath, request_path: &str, err: std::io::Error) -> Error {
    match err.kind() {
        ErrorKind::NotFound | ErrorKind::NotADirectory => Error::not_found(request_path),
        _ => Error::io(path.to_native(), err),
    }
}
