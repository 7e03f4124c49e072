//! What to sync and where it lands on disk

use std::path::{Path, PathBuf};

use syncserve_fs::NormalizedPath;

use crate::{Error, Result};

/// Branch checked out when none is configured.
pub const DEFAULT_BRANCH: &str = "master";

/// A repository bound to its local checkout.
///
/// Built once at startup and never mutated afterwards. The checkout lives at
/// `destination_root/<last URL segment>`, so `https://host/org/site.git`
/// synced under `/data` lands in `/data/site.git`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncTarget {
    repository_url: String,
    destination_root: NormalizedPath,
    local_path: NormalizedPath,
    branch: String,
    key_path: Option<PathBuf>,
    verify_host_key: bool,
}

impl SyncTarget {
    /// Bind `repository_url` to a checkout under `destination_root`.
    ///
    /// Fails with [`Error::InvalidRepositoryUrl`] when the URL has no usable
    /// final segment.
    pub fn new(repository_url: impl Into<String>, destination_root: impl AsRef<Path>) -> Result<Self> {
        let repository_url = repository_url.into();
        let destination_root = NormalizedPath::new(destination_root);
        let local_path = derive_local_path(&destination_root, &repository_url)?;

        Ok(Self {
            repository_url,
            destination_root,
            local_path,
            branch: DEFAULT_BRANCH.to_string(),
            key_path: None,
            verify_host_key: true,
        })
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = branch.into();
        self
    }

    /// Use the private key at `path` for SSH transports. `None` or an empty
    /// path means anonymous access.
    pub fn with_key_path(mut self, path: Option<PathBuf>) -> Self {
        self.key_path = path.filter(|p| !p.as_os_str().is_empty());
        self
    }

    pub fn with_host_key_verification(mut self, verify: bool) -> Self {
        self.verify_host_key = verify;
        self
    }

    pub fn repository_url(&self) -> &str {
        &self.repository_url
    }

    pub fn destination_root(&self) -> &NormalizedPath {
        &self.destination_root
    }

    pub fn local_path(&self) -> &NormalizedPath {
        &self.local_path
    }

    pub fn branch(&self) -> &str {
        &self.branch
    }

    pub fn key_path(&self) -> Option<&Path> {
        self.key_path.as_deref()
    }

    pub fn verify_host_key(&self) -> bool {
        self.verify_host_key
    }
}

/// Checkout path for `repository_url` under `destination_root`.
///
/// The last `/`-separated segment is kept verbatim, `.git` suffix included.
/// A trailing slash is ignored. scp-style URLs without any slash
/// (`git@host:site.git`) use the part after the colon.
pub fn derive_local_path(destination_root: &NormalizedPath, repository_url: &str) -> Result<NormalizedPath> {
    let name = checkout_name(repository_url).ok_or_else(|| Error::InvalidRepositoryUrl {
        url: repository_url.to_string(),
    })?;
    Ok(destination_root.join(name))
}

fn checkout_name(url: &str) -> Option<&str> {
    let trimmed = url.trim().trim_end_matches('/');
    let name = if trimmed.contains('/') {
        trimmed.rsplit('/').next()?
    } else {
        trimmed.rsplit(':').next()?
    };

    match name {
        "" | "." | ".." => None,
        _ => Some(name),
    }
}
