//! Normalized path handling for cross-platform compatibility

use std::path::{Path, PathBuf};

/// A path normalized to use forward slashes internally.
///
/// Paths are stored with forward slashes and converted to the platform-native
/// form only at I/O boundaries. Joined segments have `.` and `..` resolved, so
/// a join can never silently produce `root/../..` strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NormalizedPath {
    inner: String,
}

impl NormalizedPath {
    /// Create a new NormalizedPath from any path-like input.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path_str = path.as_ref().to_string_lossy();
        Self {
            inner: path_str.replace('\\', "/"),
        }
    }

    /// Get the internal normalized string representation.
    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// Convert to a platform-native PathBuf for I/O operations.
    pub fn to_native(&self) -> PathBuf {
        PathBuf::from(&self.inner)
    }

    /// Join this path with a (possibly multi-segment) relative path.
    ///
    /// Empty and `.` segments are skipped; `..` pops the previous segment but
    /// never climbs above the first segment of `self`.
    pub fn join(&self, segment: &str) -> Self {
        let mut joined = self.inner.trim_end_matches('/').to_string();
        let floor = joined.len();

        for part in segment.split(['/', '\\']) {
            match part {
                "" | "." => {}
                ".." => {
                    if joined.len() > floor
                        && let Some(idx) = joined.rfind('/')
                    {
                        joined.truncate(idx.max(floor));
                    }
                }
                _ => {
                    joined.push('/');
                    joined.push_str(part);
                }
            }
        }

        if joined.is_empty() {
            joined.push('/');
        }
        Self { inner: joined }
    }

    /// Get the file name component.
    pub fn file_name(&self) -> Option<&str> {
        let trimmed = self.inner.trim_end_matches('/');
        trimmed.rsplit('/').next().filter(|name| !name.is_empty())
    }

    /// Get the extension if present. Dotfiles such as `.env` have none.
    pub fn extension(&self) -> Option<&str> {
        self.file_name().and_then(|name| {
            let idx = name.rfind('.')?;
            if idx == 0 { None } else { Some(&name[idx + 1..]) }
        })
    }
}

impl AsRef<Path> for NormalizedPath {
    fn as_ref(&self) -> &Path {
        Path::new(&self.inner)
    }
}

impl std::fmt::Display for NormalizedPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl From<&str> for NormalizedPath {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<PathBuf> for NormalizedPath {
    fn from(p: PathBuf) -> Self {
        Self::new(p)
    }
}

impl From<&Path> for NormalizedPath {
    fn from(p: &Path) -> Self {
        Self::new(p)
    }
}
