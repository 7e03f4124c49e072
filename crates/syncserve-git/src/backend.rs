//! Version-control capability consumed by the sync engine

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::{Credential, Result};

/// Result of a successful pull.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullOutcome {
    /// New commits were fetched and checked out.
    Updated,
    /// The local branch already matched the remote.
    NoChange,
}

/// Cooperative cancellation for a running transfer.
///
/// Raised by the caller (on timeout or shutdown); backends poll it from their
/// progress callbacks and stop at the next opportunity.
#[derive(Debug, Clone, Default)]
pub struct AbortSignal {
    raised: Arc<AtomicBool>,
}

impl AbortSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&self) {
        self.raised.store(true, Ordering::SeqCst);
    }

    pub fn is_raised(&self) -> bool {
        self.raised.load(Ordering::SeqCst)
    }
}

/// Clone/pull operations against a remote repository.
///
/// Calls are blocking; async callers run them on a blocking thread.
pub trait VcsBackend: Send + Sync {
    /// Clone `url` at `branch` into `dest`.
    ///
    /// Must be atomic-or-absent: on failure `dest` must not exist afterwards,
    /// because the sync engine treats the mere presence of `dest` as a valid
    /// checkout.
    fn clone_repo(
        &self,
        url: &str,
        branch: &str,
        dest: &Path,
        credential: &Credential,
        abort: &AbortSignal,
    ) -> Result<()>;

    /// Fetch the checked-out branch from `origin` and fast-forward to it.
    fn pull(&self, path: &Path, credential: &Credential, abort: &AbortSignal)
    -> Result<PullOutcome>;
}
