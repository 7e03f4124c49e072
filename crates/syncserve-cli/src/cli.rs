//! CLI argument parsing using clap derive
//!
//! Every setting can come from a flag or its `GIT_SYNC_*` environment
//! variable. Values left unset here fall through to the config file and then
//! to the built-in defaults (see [`crate::config::Settings::resolve`]), which
//! is why nothing below carries a `default_value`.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use serde::Deserialize;
use syncserve_core::NotifyPolicy;

use crate::config::parse_duration;

/// Keep a git checkout in sync and serve it as static files
#[derive(Parser, Debug, Default)]
#[command(name = "git-sync-static")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Repository URL to sync (https, ssh or a local path)
    #[arg(long, env = "GIT_SYNC_REPO")]
    pub repo: Option<String>,

    /// Directory the checkout is placed under [default: /tmp/git]
    #[arg(long, env = "GIT_SYNC_DEST")]
    pub dest: Option<PathBuf>,

    /// Branch to check out [default: master]
    #[arg(long, env = "GIT_SYNC_BRANCH")]
    pub branch: Option<String>,

    /// HTTP port for the static file server [default: 3000]
    #[arg(long, env = "GIT_SYNC_PORT")]
    pub port: Option<u16>,

    /// Pause between syncs, e.g. 30s, 5m, 1h or bare seconds [default: 15m]
    #[arg(long, env = "GIT_SYNC_INTERVAL", value_parser = parse_duration)]
    pub interval: Option<Duration>,

    /// Upper bound for a single clone or pull [default: 30s]
    #[arg(long, env = "GIT_SYNC_TIMEOUT", value_parser = parse_duration)]
    pub timeout: Option<Duration>,

    /// Private key used for SSH remotes
    #[arg(long, env = "GIT_SYNC_SSH_KEY_PATH")]
    pub ssh_key_path: Option<PathBuf>,

    /// Verify the SSH host key against known hosts [default: true]
    #[arg(long, env = "GIT_SYNC_KNOWN_HOSTS_VERIFICATION", value_name = "BOOL")]
    pub known_hosts_verification: Option<bool>,

    /// URL notified after each sync; no notifications when unset
    #[arg(long, env = "GIT_SYNC_WEBHOOK_URL")]
    pub webhook_url: Option<String>,

    /// HTTP method for webhook requests [default: POST]
    #[arg(long, env = "GIT_SYNC_WEBHOOK_METHOD")]
    pub webhook_method: Option<String>,

    /// Handlebars template for the webhook body [default: {{String}}]
    #[arg(long, env = "GIT_SYNC_WEBHOOK_PAYLOAD_TEMPLATE")]
    pub webhook_payload_template: Option<String>,

    /// Sub-directory of the checkout to serve [default: whole checkout]
    #[arg(long, env = "GIT_SYNC_ROOT")]
    pub root: Option<String>,

    /// When a pull without new commits still triggers the webhook [default: always]
    #[arg(long, env = "GIT_SYNC_NOTIFY", value_enum)]
    pub notify: Option<NotifyMode>,

    /// Log output format [default: text]
    #[arg(long, env = "GIT_SYNC_LOG_FORMAT", value_enum)]
    pub log_format: Option<LogFormat>,

    /// Settings file (.toml, .json, .yaml or .yml)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Run a single sync, deliver its notification and exit
    #[arg(long)]
    pub once: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Command-line spelling of [`NotifyPolicy`]
#[derive(ValueEnum, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum NotifyMode {
    Always,
    OnChange,
}

impl From<NotifyMode> for NotifyPolicy {
    fn from(mode: NotifyMode) -> Self {
        match mode {
            NotifyMode::Always => NotifyPolicy::Always,
            NotifyMode::OnChange => NotifyPolicy::OnChange,
        }
    }
}

#[derive(ValueEnum, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_full_flag_set() {
        let cli = Cli::try_parse_from([
            "git-sync-static",
            "--repo",
            "https://example.com/site.git",
            "--dest",
            "/srv",
            "--port",
            "8080",
            "--interval",
            "5m",
            "--known-hosts-verification",
            "false",
            "--notify",
            "on-change",
            "--log-format",
            "json",
            "--once",
        ])
        .unwrap();

        assert_eq!(cli.repo.as_deref(), Some("https://example.com/site.git"));
        assert_eq!(cli.dest, Some(PathBuf::from("/srv")));
        assert_eq!(cli.port, Some(8080));
        assert_eq!(cli.interval, Some(Duration::from_secs(300)));
        assert_eq!(cli.known_hosts_verification, Some(false));
        assert_eq!(cli.notify, Some(NotifyMode::OnChange));
        assert_eq!(cli.log_format, Some(LogFormat::Json));
        assert!(cli.once);
    }

    #[test]
    fn test_bad_interval_is_rejected() {
        let result = Cli::try_parse_from(["git-sync-static", "--interval", "soon"]);
        assert!(result.is_err());
    }
}
