use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::core::config::HarnessConfig;
use crate::errors::Result;
use crate::utils::artifacts;

/// Install the run-wide subscriber: compact stderr output plus a plain-text
/// log file under the configured log directory. The returned guard must stay
/// alive for the whole run or buffered lines are lost.
///
/// `RUST_LOG` overrides the level; otherwise `--verbose` selects debug.
pub fn init_logging(config: &HarnessConfig, verbose: bool) -> Result<Option<WorkerGuard>> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    std::fs::create_dir_all(&config.log_dir)?;
    let file_name = format!("test_run_{}.log", artifacts::timestamp_slug());
    let file_appender = tracing_appender::rolling::never(&config.log_dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_writer(non_blocking)
                .with_target(true),
        )
        .try_init();

    if installed.is_err() {
        // A subscriber installed earlier in this process (another harness
        // instance, a test runner) stays in place; file logging is skipped.
        return Ok(None);
    }
    Ok(Some(guard))
}
