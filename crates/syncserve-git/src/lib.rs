//! Git transport for git-sync-static
//!
//! - [`auth`] resolves SSH key material into a [`Credential`].
//! - [`backend`] defines the [`VcsBackend`] capability the sync engine drives.
//! - [`git2_backend`] implements it on top of libgit2.

pub mod auth;
pub mod backend;
pub mod error;
pub mod git2_backend;

pub use auth::{Credential, KeyCredential, SSH_USER, resolve};
pub use backend::{AbortSignal, PullOutcome, VcsBackend};
pub use error::{Error, Result};
pub use git2_backend::Git2Backend;
