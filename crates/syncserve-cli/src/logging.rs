//! Process-wide tracing subscriber

use tracing_subscriber::{EnvFilter, Layer, fmt, prelude::*};

use crate::cli::LogFormat;
use crate::error::{CliError, Result};

/// Install the global subscriber, writing to stderr.
///
/// `RUST_LOG` selects the filter and defaults to `info`; `verbose` forces
/// `debug`. Call once per process.
pub fn init(verbose: bool, format: LogFormat) -> Result<()> {
    let filter_layer = if verbose {
        EnvFilter::try_new("debug")
    } else {
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))
    }
    .map_err(|e| CliError::Logging(e.to_string()))?;

    let fmt_layer = match format {
        LogFormat::Text => fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(verbose)
            .compact()
            .boxed(),
        LogFormat::Json => fmt::layer()
            .with_writer(std::io::stderr)
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| CliError::Logging(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::{info, info_span};

    #[test]
    fn test_logging_init() {
        // Only the first init in a process succeeds.
        let _ = init(false, LogFormat::Json);
        let span = info_span!("sync", repository = "https://example.com/site.git");
        let _guard = span.enter();
        info!(action = "Cloned", "This is an info message");
        assert!(init(false, LogFormat::Text).is_err());
    }
}
