//! Periodic clone-or-pull loop
//!
//! Each cycle re-derives its state from disk: if the checkout path is absent
//! the repository is cloned, otherwise it is pulled. A completed cycle emits
//! one [`Event`] and the engine sleeps for the configured interval. Any
//! clone, pull, auth or stat failure ends the loop with an error.

use std::io::ErrorKind;
use std::sync::Arc;
use std::time::Duration;

use syncserve_fs::NormalizedPath;
use syncserve_git::{AbortSignal, Credential, PullOutcome, VcsBackend};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, Span, debug, error, info};

use crate::{Error, Event, EventSender, Result, SyncAction, SyncTarget};

/// Pause between two sync cycles when none is configured.
pub const DEFAULT_SYNC_INTERVAL: Duration = Duration::from_secs(15 * 60);

/// Upper bound for a single clone or pull.
pub const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(30);

/// Disk state of the checkout at the start of a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepoState {
    /// Nothing at the checkout path; the next action is a clone.
    Absent,
    /// Something exists at the checkout path; the next action is a pull.
    Present,
}

/// Inspect the checkout path.
///
/// Only "not found" counts as absent. Any other stat failure (permissions,
/// broken mount) is an error, so the engine never clones over a path it
/// could not look at.
pub fn checkout_state(path: &NormalizedPath) -> Result<RepoState> {
    let native = path.to_native();
    match std::fs::metadata(&native) {
        Ok(_) => Ok(RepoState::Present),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(RepoState::Absent),
        Err(source) => Err(Error::Stat {
            path: native,
            source,
        }),
    }
}

/// When a pull that changed nothing still produces an event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NotifyPolicy {
    /// Every completed cycle emits an event.
    #[default]
    Always,
    /// Pulls that found nothing new stay silent.
    OnChange,
}

/// Keeps one checkout in sync with its remote.
pub struct SyncEngine {
    target: SyncTarget,
    backend: Arc<dyn VcsBackend>,
    events: Option<EventSender>,
    interval: Duration,
    operation_timeout: Duration,
    notify: NotifyPolicy,
    shutdown: CancellationToken,
    span: Span,
}

impl SyncEngine {
    /// Engine for `target` with default interval, timeout and policy.
    ///
    /// Without [`with_events`](Self::with_events) events are logged and
    /// dropped.
    pub fn new(target: SyncTarget, backend: Arc<dyn VcsBackend>) -> Self {
        let span = tracing::info_span!(
            "sync",
            repository = %target.repository_url(),
            branch = %target.branch(),
        );
        Self {
            target,
            backend,
            events: None,
            interval: DEFAULT_SYNC_INTERVAL,
            operation_timeout: DEFAULT_OPERATION_TIMEOUT,
            notify: NotifyPolicy::default(),
            shutdown: CancellationToken::new(),
            span,
        }
    }

    pub fn with_events(mut self, sender: EventSender) -> Self {
        self.events = Some(sender);
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = timeout;
        self
    }

    pub fn with_notify_policy(mut self, policy: NotifyPolicy) -> Self {
        self.notify = policy;
        self
    }

    /// Observe `token`; cancelling it stops the loop between cycles, during
    /// the sleep, or while waiting on a full queue.
    pub fn with_shutdown(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    /// Run inside `span` instead of the default `sync` span.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn target(&self) -> &SyncTarget {
        &self.target
    }

    /// Sync until shutdown or the first fatal error.
    ///
    /// Returns `Ok(())` on shutdown.
    pub async fn run(&self) -> Result<()> {
        async {
            info!(
                path = %self.target.local_path(),
                interval = ?self.interval,
                "Starting sync loop"
            );
            loop {
                match self.cycle().await {
                    Ok(_) => {}
                    Err(Error::Shutdown) => break,
                    Err(e) => {
                        error!(error = %e, "Sync failed");
                        return Err(e);
                    }
                }

                debug!(interval = ?self.interval, "Sleeping until next sync");
                tokio::select! {
                    _ = self.shutdown.cancelled() => break,
                    _ = tokio::time::sleep(self.interval) => {}
                }
            }
            info!("Sync loop stopped");
            Ok(())
        }
        .instrument(self.span.clone())
        .await
    }

    /// Perform a single clone-or-pull and publish its event.
    ///
    /// Returns the event produced, or `None` when the notify policy
    /// suppressed it.
    pub async fn run_cycle(&self) -> Result<Option<Event>> {
        self.cycle().instrument(self.span.clone()).await
    }

    async fn cycle(&self) -> Result<Option<Event>> {
        if self.shutdown.is_cancelled() {
            return Err(Error::Shutdown);
        }

        let path = self.target.local_path().clone();
        let state = tokio::task::spawn_blocking(move || checkout_state(&path))
            .await
            .map_err(|e| Error::Task(e.to_string()))??;
        let credential =
            syncserve_git::resolve(self.target.key_path(), self.target.verify_host_key())?;

        let action = match state {
            RepoState::Absent => {
                info!(path = %self.target.local_path(), "Cloning repository");
                self.clone_checkout(credential).await?;
                info!("Clone completed");
                Some(SyncAction::Cloned)
            }
            RepoState::Present => {
                info!(path = %self.target.local_path(), "Pulling repository");
                match self.pull_checkout(credential).await? {
                    PullOutcome::Updated => {
                        info!("Pull completed");
                        Some(SyncAction::Updated)
                    }
                    PullOutcome::NoChange => {
                        info!("Already up to date");
                        match self.notify {
                            NotifyPolicy::Always => Some(SyncAction::Updated),
                            NotifyPolicy::OnChange => None,
                        }
                    }
                }
            }
        };

        let Some(action) = action else {
            return Ok(None);
        };
        let event = Event::new(self.target.repository_url(), self.target.branch(), action);
        self.publish(event.clone()).await?;
        Ok(Some(event))
    }

    async fn clone_checkout(&self, credential: Credential) -> Result<()> {
        let backend = Arc::clone(&self.backend);
        let url = self.target.repository_url().to_string();
        let branch = self.target.branch().to_string();
        let dest = self.target.local_path().to_native();
        self.blocking("clone", move |abort| {
            backend.clone_repo(&url, &branch, &dest, &credential, abort)
        })
        .await
    }

    async fn pull_checkout(&self, credential: Credential) -> Result<PullOutcome> {
        let backend = Arc::clone(&self.backend);
        let path = self.target.local_path().to_native();
        self.blocking("pull", move |abort| backend.pull(&path, &credential, abort))
            .await
    }

    /// Run a git operation on the blocking pool under the operation timeout.
    ///
    /// On timeout or shutdown the abort signal is raised and the blocking
    /// task is left to wind down on its own.
    async fn blocking<T, F>(&self, operation: &'static str, task: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&AbortSignal) -> syncserve_git::Result<T> + Send + 'static,
    {
        let abort = AbortSignal::new();
        let handle = tokio::task::spawn_blocking({
            let abort = abort.clone();
            move || task(&abort)
        });

        let joined = tokio::select! {
            joined = tokio::time::timeout(self.operation_timeout, handle) => joined,
            _ = self.shutdown.cancelled() => {
                abort.raise();
                return Err(Error::Shutdown);
            }
        };

        match joined {
            Ok(Ok(result)) => result.map_err(Error::from),
            Ok(Err(join_error)) => Err(Error::Task(join_error.to_string())),
            Err(_) => {
                abort.raise();
                Err(Error::Timeout {
                    operation,
                    after: self.operation_timeout,
                })
            }
        }
    }

    async fn publish(&self, event: Event) -> Result<()> {
        let Some(sender) = &self.events else {
            info!(event = %event, "No webhook configured; event dropped");
            return Ok(());
        };

        debug!(event = %event, "Queueing event");
        tokio::select! {
            sent = sender.send(event) => sent,
            _ = self.shutdown.cancelled() => Err(Error::Shutdown),
        }
    }
}

impl std::fmt::Debug for SyncEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEngine")
            .field("target", &self.target)
            .field("interval", &self.interval)
            .field("operation_timeout", &self.operation_timeout)
            .field("notify", &self.notify)
            .field("events", &self.events.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checkout_state_missing_path_is_absent() {
        let temp = tempfile::tempdir().unwrap();
        let path = NormalizedPath::new(temp.path()).join("missing");
        assert_eq!(checkout_state(&path).unwrap(), RepoState::Absent);
    }

    #[test]
    fn test_checkout_state_existing_path_is_present() {
        let temp = tempfile::tempdir().unwrap();
        let path = NormalizedPath::new(temp.path());
        assert_eq!(checkout_state(&path).unwrap(), RepoState::Present);
    }

    #[cfg(unix)]
    #[test]
    fn test_checkout_state_through_file_is_stat_error() {
        // A path component that is a regular file yields ENOTDIR, not ENOENT.
        let temp = tempfile::tempdir().unwrap();
        std::fs::write(temp.path().join("file"), "x").unwrap();
        let path = NormalizedPath::new(temp.path()).join("file/child");
        assert!(matches!(checkout_state(&path), Err(Error::Stat { .. })));
    }
}
