//! SSH credential resolution
//!
//! A [`Credential`] is built once per sync cycle from the configured key path
//! and dropped when the cycle ends; key material is never written anywhere.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// Transport user for SSH remotes. Fixed by convention for git hosting.
pub const SSH_USER: &str = "git";

/// Authentication material for the git transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    /// Anonymous transport (public HTTPS, local paths, ssh-agent-less SSH).
    None,
    /// SSH public-key authentication.
    Key(KeyCredential),
}

impl Credential {
    /// Whether the transport should skip host-key verification.
    pub fn disables_host_key_check(&self) -> bool {
        matches!(self, Self::Key(key) if !key.verify_host_key)
    }
}

/// A parsed SSH private key plus its transport options.
#[derive(Clone, PartialEq, Eq)]
pub struct KeyCredential {
    user: String,
    key_path: PathBuf,
    private_key: String,
    verify_host_key: bool,
}

impl KeyCredential {
    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn key_path(&self) -> &Path {
        &self.key_path
    }

    /// PEM/OpenSSH encoded private key.
    pub fn private_key(&self) -> &str {
        &self.private_key
    }

    /// `false` means any host key is accepted.
    ///
    /// Turning verification off lets anyone able to intercept the connection
    /// impersonate the remote and serve arbitrary content, which this process
    /// would then publish over HTTP.
    pub fn verify_host_key(&self) -> bool {
        self.verify_host_key
    }
}

impl fmt::Debug for KeyCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyCredential")
            .field("user", &self.user)
            .field("key_path", &self.key_path)
            .field("private_key", &"<redacted>")
            .field("verify_host_key", &self.verify_host_key)
            .finish()
    }
}

/// Resolve a credential from an optional SSH key path.
///
/// - No path (or an empty one): [`Credential::None`].
/// - Unreadable file: [`Error::KeyRead`].
/// - Key material that does not parse as an unencrypted private key:
///   [`Error::KeyParse`]. Passphrase-protected keys are not supported.
pub fn resolve(key_path: Option<&Path>, verify_host_key: bool) -> Result<Credential> {
    let Some(path) = key_path.filter(|p| !p.as_os_str().is_empty()) else {
        return Ok(Credential::None);
    };

    let bytes = fs::read(path).map_err(|source| Error::KeyRead {
        path: path.to_path_buf(),
        source,
    })?;
    let private_key = String::from_utf8(bytes).map_err(|_| Error::KeyParse {
        path: path.to_path_buf(),
        message: "key file is not valid UTF-8".into(),
    })?;

    russh_keys::decode_secret_key(&private_key, None).map_err(|e| Error::KeyParse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    if !verify_host_key {
        tracing::warn!(
            key = %path.display(),
            "SSH host key verification is disabled; the remote cannot be authenticated"
        );
    }

    Ok(Credential::Key(KeyCredential {
        user: SSH_USER.to_string(),
        key_path: path.to_path_buf(),
        private_key,
        verify_host_key,
    }))
}
