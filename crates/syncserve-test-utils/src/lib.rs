//! Shared test utilities for the git-sync-static workspace.
//!
//! This crate provides standardised test fixtures to eliminate duplication
//! across crate test suites. It is a dev-dependency only and never published.
//!
//! # Modules
//!
//! - [`git`]: upstream repositories with real history, built with `git2`
//! - [`keys`]: paths to the SSH key fixtures under `test-fixtures/keys`

pub mod git;
pub mod keys;

pub use git::{UpstreamRepo, real_git_repo};
