//! libgit2-backed implementation of [`VcsBackend`]

use std::cell::Cell;
use std::fs;
use std::path::{Path, PathBuf};

use git2::build::{CheckoutBuilder, RepoBuilder};
use git2::{CertificateCheckStatus, Cred, CredentialType, FetchOptions, RemoteCallbacks, Repository};

use crate::{AbortSignal, Credential, Error, PullOutcome, Result, VcsBackend};

/// Remote the checkout tracks.
const ORIGIN: &str = "origin";

/// libgit2 re-invokes the credential callback after every rejected attempt.
const MAX_AUTH_ATTEMPTS: usize = 3;

/// [`VcsBackend`] using libgit2 through the `git2` crate.
///
/// Clones are staged in a hidden sibling directory and renamed into place
/// only once complete, which gives the atomic-or-absent behavior the sync
/// engine relies on.
#[derive(Debug, Default, Clone, Copy)]
pub struct Git2Backend;

impl Git2Backend {
    pub fn new() -> Self {
        Self
    }
}

impl VcsBackend for Git2Backend {
    fn clone_repo(
        &self,
        url: &str,
        branch: &str,
        dest: &Path,
        credential: &Credential,
        abort: &AbortSignal,
    ) -> Result<()> {
        if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }

        let staging = staging_path(dest);
        if staging.exists() {
            // Left behind by a previous process that died mid-clone.
            fs::remove_dir_all(&staging).map_err(|e| Error::io(&staging, e))?;
        }

        tracing::debug!(url, branch, staging = %staging.display(), "Cloning into staging directory");

        let result = clone_into(url, branch, &staging, credential, abort)
            .and_then(|()| {
                if abort.is_raised() {
                    Err(Error::Aborted)
                } else {
                    Ok(())
                }
            })
            .and_then(|()| fs::rename(&staging, dest).map_err(|e| Error::io(dest, e)));

        if result.is_err()
            && staging.exists()
            && let Err(e) = fs::remove_dir_all(&staging)
        {
            tracing::warn!(
                staging = %staging.display(),
                error = %e,
                "Failed to remove staging directory after failed clone"
            );
        }

        result
    }

    fn pull(
        &self,
        path: &Path,
        credential: &Credential,
        abort: &AbortSignal,
    ) -> Result<PullOutcome> {
        let repo = Repository::open(path)?;
        let branch = current_branch(&repo)?.ok_or_else(|| Error::DetachedHead {
            path: path.to_path_buf(),
        })?;

        let mut remote = repo.find_remote(ORIGIN).map_err(|_| Error::RemoteNotFound {
            name: ORIGIN.to_string(),
        })?;

        let mut fetch = FetchOptions::new();
        fetch.remote_callbacks(remote_callbacks(credential, abort));
        remote
            .fetch(&[&branch], Some(&mut fetch), None)
            .map_err(|e| pull_error(path, "Fetch failed", &e, abort))?;

        let fetch_head = repo
            .find_reference("FETCH_HEAD")
            .map_err(|e| pull_error(path, "Could not find FETCH_HEAD", &e, abort))?;
        let fetch_commit = repo.reference_to_annotated_commit(&fetch_head)?;

        let (analysis, _) = repo.merge_analysis(&[&fetch_commit])?;

        if analysis.is_up_to_date() {
            return Ok(PullOutcome::NoChange);
        }

        if analysis.is_fast_forward() {
            let refname = format!("refs/heads/{branch}");
            let mut reference = repo.find_reference(&refname)?;
            reference.set_target(
                fetch_commit.id(),
                &format!("pull: fast-forward to {}", fetch_commit.id()),
            )?;
            repo.set_head(&refname)?;
            repo.checkout_head(Some(CheckoutBuilder::default().force()))?;

            tracing::debug!(branch = %branch, commit = %fetch_commit.id(), "Fast-forwarded");
            return Ok(PullOutcome::Updated);
        }

        let head_commit = repo.head()?.peel_to_commit()?;
        Err(Error::CannotFastForward {
            message: format!(
                "Cannot fast-forward {} from {} to {}. Local history diverged from {}.",
                branch,
                head_commit.id(),
                fetch_commit.id(),
                ORIGIN
            ),
        })
    }
}

fn clone_into(
    url: &str,
    branch: &str,
    staging: &Path,
    credential: &Credential,
    abort: &AbortSignal,
) -> Result<()> {
    let mut fetch = FetchOptions::new();
    fetch.remote_callbacks(remote_callbacks(credential, abort));

    let mut builder = RepoBuilder::new();
    builder.branch(branch);
    builder.fetch_options(fetch);

    builder.clone(url, staging).map_err(|e| {
        if abort.is_raised() {
            Error::Aborted
        } else {
            Error::CloneFailed {
                url: url.to_string(),
                message: e.message().to_string(),
            }
        }
    })?;

    Ok(())
}

/// Only SSH host keys may skip verification; TLS certificates always go
/// through libgit2's own checks.
fn certificate_status(verify_host_key: bool, is_ssh_host_key: bool) -> CertificateCheckStatus {
    if !verify_host_key && is_ssh_host_key {
        CertificateCheckStatus::CertificateOk
    } else {
        CertificateCheckStatus::CertificatePassthrough
    }
}

/// Build transport callbacks for one fetch/clone.
fn remote_callbacks<'a>(credential: &'a Credential, abort: &'a AbortSignal) -> RemoteCallbacks<'a> {
    let mut callbacks = RemoteCallbacks::new();

    if let Credential::Key(key) = credential {
        let attempts = Cell::new(0usize);
        callbacks.credentials(move |_url, _username_from_url, allowed| {
            attempts.set(attempts.get() + 1);
            if attempts.get() > MAX_AUTH_ATTEMPTS {
                return Err(git2::Error::from_str("SSH authentication failed"));
            }
            if allowed.contains(CredentialType::USERNAME) {
                return Cred::username(key.user());
            }
            if !allowed.contains(CredentialType::SSH_KEY) {
                return Err(git2::Error::from_str(
                    "remote does not accept SSH key authentication",
                ));
            }
            Cred::ssh_key_from_memory(key.user(), None, key.private_key(), None)
        });

        let verify = key.verify_host_key();
        callbacks.certificate_check(move |cert, host| {
            let status = certificate_status(verify, cert.as_hostkey().is_some());
            if matches!(status, CertificateCheckStatus::CertificateOk) {
                tracing::debug!(host, "Accepting host key without verification");
            }
            Ok(status)
        });
    }

    callbacks.transfer_progress(move |progress| {
        tracing::trace!(
            received = progress.received_objects(),
            total = progress.total_objects(),
            "Transfer progress"
        );
        !abort.is_raised()
    });
    callbacks.sideband_progress(move |_| !abort.is_raised());

    callbacks
}

/// Get the current branch name, or `None` if HEAD is detached.
fn current_branch(repo: &Repository) -> Result<Option<String>> {
    let head = repo.head()?;

    if head.is_branch() {
        Ok(head.shorthand().map(str::to_string))
    } else {
        Ok(None)
    }
}

fn staging_path(dest: &Path) -> PathBuf {
    let name = dest
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "checkout".to_string());
    dest.with_file_name(format!(".{}.partial-{}", name, std::process::id()))
}

fn pull_error(path: &Path, context: &str, err: &git2::Error, abort: &AbortSignal) -> Error {
    if abort.is_raised() {
        return Error::Aborted;
    }
    Error::PullFailed {
        path: path.to_path_buf(),
        message: format!("{}: {}", context, err.message()),
    }
}
