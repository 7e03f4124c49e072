//! Git repository fixtures.
//!
//! Everything is built through `git2`, so tests do not depend on a `git`
//! binary or on the user's git configuration.

use std::fs;
use std::path::Path;

use git2::{Oid, Repository, Signature};
use tempfile::TempDir;

/// Initialises an empty git repository (no commits, no remotes).
///
/// # Panics
/// Panics if `git2::Repository::init` fails.
pub fn real_git_repo(path: &Path) -> Repository {
    Repository::init(path).unwrap_or_else(|e| {
        panic!(
            "real_git_repo: failed to init repository at {}: {e}",
            path.display()
        )
    })
}

/// A repository acting as the remote that the sync engine clones and pulls.
///
/// Lives in its own temporary directory and starts with one commit
/// containing `README.md` on the configured branch.
///
/// # Example
///
/// ```rust,no_run
/// use syncserve_test_utils::UpstreamRepo;
///
/// let upstream = UpstreamRepo::new();
/// upstream.commit_file("index.html", "<h1>v2</h1>", "Publish v2");
/// let url = upstream.url();
/// ```
pub struct UpstreamRepo {
    // Dropped before `temp_dir` so the directory is released first.
    repo: Repository,
    temp_dir: TempDir,
    branch: String,
}

impl Default for UpstreamRepo {
    fn default() -> Self {
        Self::new()
    }
}

impl UpstreamRepo {
    /// Create an upstream on branch `main`.
    pub fn new() -> Self {
        Self::with_branch("main")
    }

    /// Create an upstream whose initial commit lands on `branch`.
    ///
    /// # Panics
    /// Panics if any git or filesystem operation fails.
    pub fn with_branch(branch: &str) -> Self {
        let temp_dir = TempDir::new().expect("UpstreamRepo: failed to create temp dir");
        let repo = real_git_repo(temp_dir.path());
        repo.set_head(&format!("refs/heads/{branch}"))
            .unwrap_or_else(|e| panic!("UpstreamRepo: failed to point HEAD at {branch}: {e}"));

        let upstream = Self {
            repo,
            temp_dir,
            branch: branch.to_string(),
        };
        upstream.commit_file("README.md", "# upstream\n", "Initial commit");
        upstream
    }

    /// Working directory of the upstream repository.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// URL suitable for cloning (a local filesystem path).
    pub fn url(&self) -> String {
        self.path().display().to_string()
    }

    pub fn branch(&self) -> &str {
        &self.branch
    }

    /// Write `relative` with `content` and commit it on the current branch.
    ///
    /// # Panics
    /// Panics if any git or filesystem operation fails.
    pub fn commit_file(&self, relative: &str, content: &str, message: &str) -> Oid {
        let full = self.path().join(relative);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&full, content)
            .unwrap_or_else(|e| panic!("UpstreamRepo: failed to write {relative}: {e}"));

        let mut index = self.repo.index().unwrap();
        index.add_path(Path::new(relative)).unwrap();
        index.write().unwrap();
        let tree_id = index.write_tree().unwrap();
        let tree = self.repo.find_tree(tree_id).unwrap();

        let sig = Signature::now("Test User", "test@test.com").unwrap();
        let parent = self
            .repo
            .head()
            .ok()
            .and_then(|head| head.peel_to_commit().ok());
        let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();

        self.repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .unwrap_or_else(|e| panic!("UpstreamRepo: failed to commit {relative}: {e}"))
    }

    /// Id of the commit the upstream branch points at.
    pub fn head(&self) -> Oid {
        self.repo.head().unwrap().peel_to_commit().unwrap().id()
    }
}
