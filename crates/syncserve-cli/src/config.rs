//! Layered settings: flag > environment > config file > default

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use syncserve_core::{
    DEFAULT_BRANCH, DEFAULT_OPERATION_TIMEOUT, DEFAULT_PAYLOAD_TEMPLATE, DEFAULT_SYNC_INTERVAL,
    DEFAULT_WEBHOOK_METHOD, NotifyPolicy, PayloadTemplate, SyncTarget, WebhookConfig,
};
use syncserve_fs::{NormalizedPath, load_config};

use crate::cli::{Cli, LogFormat, NotifyMode};
use crate::error::{CliError, Result};

pub const DEFAULT_DEST: &str = "/tmp/git";
pub const DEFAULT_PORT: u16 = 3000;

/// Contents of a `--config` file. Every key is optional.
///
/// ```toml
/// repo = "https://github.com/org/site.git"
/// branch = "main"
/// interval = "5m"
/// webhook_url = "https://hooks.example.com/deploy"
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub repo: Option<String>,
    pub dest: Option<PathBuf>,
    pub branch: Option<String>,
    pub port: Option<u16>,
    pub interval: Option<String>,
    pub timeout: Option<String>,
    pub ssh_key_path: Option<PathBuf>,
    pub known_hosts_verification: Option<bool>,
    pub webhook_url: Option<String>,
    pub webhook_method: Option<String>,
    pub webhook_payload_template: Option<String>,
    pub root: Option<String>,
    pub notify: Option<NotifyMode>,
    pub log_format: Option<LogFormat>,
}

/// Fully resolved runtime settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub repo: String,
    pub dest: PathBuf,
    pub branch: String,
    pub port: u16,
    pub interval: Duration,
    pub timeout: Duration,
    pub ssh_key_path: Option<PathBuf>,
    pub known_hosts_verification: bool,
    pub webhook_url: Option<String>,
    pub webhook_method: String,
    pub webhook_payload_template: String,
    pub root: String,
    pub notify: NotifyPolicy,
    pub log_format: LogFormat,
    pub once: bool,
    pub verbose: bool,
}

impl Settings {
    /// Merge parsed arguments with the optional config file and defaults.
    pub fn resolve(cli: Cli) -> Result<Self> {
        let file = match &cli.config {
            Some(path) => load_config::<FileConfig>(&NormalizedPath::new(path))?,
            None => FileConfig::default(),
        };
        Self::merge(cli, file)
    }

    fn merge(cli: Cli, file: FileConfig) -> Result<Self> {
        let repo = cli
            .repo
            .or(file.repo)
            .filter(|repo| !repo.trim().is_empty())
            .ok_or_else(|| {
                CliError::config("No repository configured; pass --repo or set GIT_SYNC_REPO")
            })?;

        let interval = match cli.interval {
            Some(interval) => interval,
            None => file_duration("interval", file.interval)?.unwrap_or(DEFAULT_SYNC_INTERVAL),
        };
        if interval.is_zero() {
            return Err(CliError::config("interval must be greater than zero"));
        }
        let timeout = match cli.timeout {
            Some(timeout) => timeout,
            None => file_duration("timeout", file.timeout)?.unwrap_or(DEFAULT_OPERATION_TIMEOUT),
        };
        if timeout.is_zero() {
            return Err(CliError::config("timeout must be greater than zero"));
        }

        Ok(Self {
            repo,
            dest: cli
                .dest
                .or(file.dest)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DEST)),
            branch: cli
                .branch
                .or(file.branch)
                .unwrap_or_else(|| DEFAULT_BRANCH.to_string()),
            port: cli.port.or(file.port).unwrap_or(DEFAULT_PORT),
            interval,
            timeout,
            ssh_key_path: cli.ssh_key_path.or(file.ssh_key_path),
            known_hosts_verification: cli
                .known_hosts_verification
                .or(file.known_hosts_verification)
                .unwrap_or(true),
            webhook_url: cli
                .webhook_url
                .or(file.webhook_url)
                .filter(|url| !url.trim().is_empty()),
            webhook_method: cli
                .webhook_method
                .or(file.webhook_method)
                .unwrap_or_else(|| DEFAULT_WEBHOOK_METHOD.to_string()),
            webhook_payload_template: cli
                .webhook_payload_template
                .or(file.webhook_payload_template)
                .unwrap_or_else(|| DEFAULT_PAYLOAD_TEMPLATE.to_string()),
            root: cli.root.or(file.root).unwrap_or_default(),
            notify: cli.notify.or(file.notify).map(NotifyPolicy::from).unwrap_or_default(),
            log_format: cli.log_format.or(file.log_format).unwrap_or_default(),
            once: cli.once,
            verbose: cli.verbose,
        })
    }

    /// Repository binding for the sync engine.
    pub fn target(&self) -> Result<SyncTarget> {
        Ok(SyncTarget::new(&self.repo, &self.dest)?
            .with_branch(&self.branch)
            .with_key_path(self.ssh_key_path.clone())
            .with_host_key_verification(self.known_hosts_verification))
    }

    /// Webhook settings, or `None` when no URL is configured.
    pub fn webhook(&self) -> Result<Option<WebhookConfig>> {
        let Some(url) = &self.webhook_url else {
            return Ok(None);
        };
        let template = PayloadTemplate::new(&self.webhook_payload_template);
        Ok(Some(WebhookConfig::new(url, &self.webhook_method, template)?))
    }

    /// Directory served over HTTP: the checkout, or `root` inside it.
    pub fn serve_root(&self, target: &SyncTarget) -> NormalizedPath {
        target.local_path().join(&self.root)
    }
}

fn file_duration(key: &str, value: Option<String>) -> Result<Option<Duration>> {
    value
        .map(|raw| parse_duration(&raw).map_err(|e| CliError::config(format!("{key}: {e}"))))
        .transpose()
}

/// Parse `90`, `30s`, `5m`, `1h`, `1d`, `250ms` or combinations like `1h30m`.
///
/// A bare number is seconds.
pub fn parse_duration(input: &str) -> std::result::Result<Duration, String> {
    let input = input.trim();
    if input.is_empty() {
        return Err("empty duration".to_string());
    }
    if let Ok(secs) = input.parse::<u64>() {
        return Ok(Duration::from_secs(secs));
    }

    let mut total = Duration::ZERO;
    let mut rest = input;
    while !rest.is_empty() {
        let digits = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
        if digits == 0 {
            return Err(format!("invalid duration {input:?}: expected a number"));
        }
        let value: u64 = rest[..digits]
            .parse()
            .map_err(|e| format!("invalid duration {input:?}: {e}"))?;
        rest = &rest[digits..];

        let unit_len = rest.find(|c: char| c.is_ascii_digit()).unwrap_or(rest.len());
        let part = match &rest[..unit_len] {
            "ms" => Duration::from_millis(value),
            "s" => Duration::from_secs(value),
            "m" => Duration::from_secs(value.saturating_mul(60)),
            "h" => Duration::from_secs(value.saturating_mul(60 * 60)),
            "d" => Duration::from_secs(value.saturating_mul(60 * 60 * 24)),
            unit => return Err(format!("invalid duration {input:?}: unknown unit {unit:?}")),
        };
        total = total.saturating_add(part);
        rest = &rest[unit_len..];
    }
    Ok(total)
}
