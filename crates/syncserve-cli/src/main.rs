//! git-sync-static binary

use clap::Parser;
use colored::Colorize;

use syncserve_cli::{Cli, Result, Settings, app, logging};

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::resolve(cli)?;
    logging::init(settings.verbose, settings.log_format)?;
    tracing::debug!(?settings, "Settings resolved");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(app::run(settings))
}
