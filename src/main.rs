use std::process::Command;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use browser_testkit::core::config::{BrowserKind, HarnessConfig};
use browser_testkit::logging;
use browser_testkit::reporting::environment;

/// Run the test suites with preconfigured options.
#[derive(Debug, Parser)]
#[command(name = "run-tests", version)]
struct RunnerArgs {
    /// Run the smoke suite
    #[arg(long)]
    smoke: bool,
    /// Run the regression suite
    #[arg(long)]
    regression: bool,
    /// Run the API suite
    #[arg(long)]
    api: bool,
    /// Run the UI suite
    #[arg(long)]
    ui: bool,
    /// Run every suite (the default when no suite flag is given)
    #[arg(long)]
    all: bool,

    /// Browser to drive (chrome, firefox, edge, safari)
    #[arg(long, default_value = "chrome")]
    browser: String,
    /// Run the browser in headless mode
    #[arg(long)]
    headless: bool,
    /// Connect to a remote WebDriver hub instead of launching locally
    #[arg(long)]
    remote: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
    /// Number of parallel test threads
    #[arg(short = 'n', long)]
    parallel: Option<usize>,

    /// Additional test name filters
    #[arg(value_name = "FILTER")]
    filters: Vec<String>,
}

/// First matching suite flag wins; none selected (or --all) means run
/// everything.
fn suite_filter(args: &RunnerArgs) -> Option<&'static str> {
    if args.smoke {
        Some("smoke")
    } else if args.regression {
        Some("regression")
    } else if args.api {
        Some("api")
    } else if args.ui {
        Some("ui")
    } else {
        None
    }
}

fn main() -> anyhow::Result<()> {
    let args = RunnerArgs::parse();

    let mut config = HarnessConfig::from_env().context("invalid run configuration")?;
    config.browser = args.browser.parse::<BrowserKind>()?;
    if args.headless {
        config.headless = true;
    }
    if args.remote {
        config.remote = true;
    }

    let _log_guard = logging::init_logging(&config, args.verbose)?;
    environment::prepare_run_workspace(&config)
        .context("could not prepare the report workspace")?;

    let mut command = Command::new("cargo");
    command.arg("test");
    if let Some(filter) = suite_filter(&args) {
        command.arg(filter);
    }
    command.env("BROWSER", config.browser.to_string());
    command.env("HEADLESS", config.headless.to_string());
    command.env("USE_REMOTE", config.remote.to_string());
    command.arg("--");
    for filter in &args.filters {
        command.arg(filter);
    }
    if let Some(threads) = args.parallel {
        command.args(["--test-threads", &threads.to_string()]);
    }
    if args.verbose {
        command.arg("--nocapture");
    }

    info!("running: {command:?}");
    let status = command.status().context("could not launch the test run")?;
    info!(
        "test execution completed; report written to {}",
        config.report_dir.display()
    );

    std::process::exit(status.code().unwrap_or(1));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> RunnerArgs {
        RunnerArgs::try_parse_from(argv).unwrap()
    }

    #[test]
    fn no_suite_flag_means_everything() {
        let args = parse(&["run-tests"]);
        assert_eq!(suite_filter(&args), None);
        let args = parse(&["run-tests", "--all"]);
        assert_eq!(suite_filter(&args), None);
    }

    #[test]
    fn first_matching_suite_flag_wins() {
        let args = parse(&["run-tests", "--regression", "--ui"]);
        assert_eq!(suite_filter(&args), Some("regression"));
        let args = parse(&["run-tests", "--smoke", "--regression"]);
        assert_eq!(suite_filter(&args), Some("smoke"));
    }

    #[test]
    fn browser_and_mode_flags_parse() {
        let args = parse(&[
            "run-tests",
            "--browser",
            "firefox",
            "--headless",
            "--remote",
            "-n",
            "4",
            "login",
        ]);
        assert_eq!(args.browser, "firefox");
        assert!(args.headless);
        assert!(args.remote);
        assert_eq!(args.parallel, Some(4));
        assert_eq!(args.filters, vec!["login".to_string()]);
    }
}
