//! Tests that invoke the compiled `git-sync-static` binary using assert_cmd.

use assert_cmd::Command;
use predicates::prelude::*;
use syncserve_test_utils::UpstreamRepo;
use tempfile::TempDir;

const ENV_VARS: &[&str] = &[
    "GIT_SYNC_REPO",
    "GIT_SYNC_DEST",
    "GIT_SYNC_BRANCH",
    "GIT_SYNC_PORT",
    "GIT_SYNC_INTERVAL",
    "GIT_SYNC_TIMEOUT",
    "GIT_SYNC_SSH_KEY_PATH",
    "GIT_SYNC_KNOWN_HOSTS_VERIFICATION",
    "GIT_SYNC_WEBHOOK_URL",
    "GIT_SYNC_WEBHOOK_METHOD",
    "GIT_SYNC_WEBHOOK_PAYLOAD_TEMPLATE",
    "GIT_SYNC_ROOT",
    "GIT_SYNC_NOTIFY",
    "GIT_SYNC_LOG_FORMAT",
];

/// The binary with a clean `GIT_SYNC_*` environment.
fn git_sync() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("git-sync-static"));
    for var in ENV_VARS {
        cmd.env_remove(var);
    }
    cmd
}

#[test]
fn test_help_lists_settings() {
    git_sync()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--repo"))
        .stdout(predicate::str::contains("--webhook-url"))
        .stdout(predicate::str::contains("GIT_SYNC_INTERVAL"));
}

#[test]
fn test_missing_repo_exits_with_error() {
    git_sync()
        .assert()
        .code(1)
        .stderr(predicate::str::contains("error"))
        .stderr(predicate::str::contains("--repo"));
}

#[test]
fn test_invalid_webhook_method_exits_before_sync() {
    let dest = TempDir::new().unwrap();
    git_sync()
        .args(["--repo", "https://example.com/site.git", "--once"])
        .arg("--dest")
        .arg(dest.path())
        .args(["--webhook-url", "http://127.0.0.1:9/hook"])
        .args(["--webhook-method", "NOT VALID"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Invalid webhook configuration"));

    assert!(!dest.path().join("site.git").exists());
}

#[test]
fn test_unreachable_repo_exits_with_error() {
    let dest = TempDir::new().unwrap();
    let missing = dest.path().join("nowhere").join("upstream");

    git_sync()
        .arg("--repo")
        .arg(&missing)
        .arg("--dest")
        .arg(dest.path().join("checkouts"))
        .args(["--once", "--timeout", "20s"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("error"));

    assert!(!dest.path().join("checkouts").join("upstream").exists());
}

#[test]
fn test_once_clones_local_upstream() {
    let upstream = UpstreamRepo::new();
    upstream.commit_file("index.html", "<h1>hello</h1>", "Add index");
    let dest = TempDir::new().unwrap();

    git_sync()
        .args(["--repo", &upstream.url(), "--branch", "main", "--once"])
        .arg("--dest")
        .arg(dest.path())
        .args(["--log-format", "json"])
        .assert()
        .success();

    let name = upstream.path().file_name().unwrap();
    let html = std::fs::read_to_string(dest.path().join(name).join("index.html")).unwrap();
    assert_eq!(html, "<h1>hello</h1>");
}

#[test]
fn test_once_reads_config_file() {
    let upstream = UpstreamRepo::new();
    let dest = TempDir::new().unwrap();
    let config = dest.path().join("sync.yaml");
    std::fs::write(
        &config,
        format!(
            "repo: \"{}\"\nbranch: main\ndest: \"{}\"\n",
            upstream.url(),
            dest.path().join("out").display()
        ),
    )
    .unwrap();

    git_sync()
        .arg("--config")
        .arg(&config)
        .arg("--once")
        .assert()
        .success();

    let name = upstream.path().file_name().unwrap();
    assert!(dest.path().join("out").join(name).join("README.md").exists());
}
