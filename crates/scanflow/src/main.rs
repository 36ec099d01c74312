//! scanflow launcher
//!
//! Startup responsibilities only: CLI parsing, external-program checks,
//! config/log directory bootstrap, tracing setup, and exit-code mapping.
//! Everything interactive lives in [`scanflow::tui`].

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

use scanflow::config::{self, FileSettingsStore};
use scanflow::tui;

/// External programs the wizard shells out to.
const REQUIRED_PROGRAMS: [&str; 2] = ["scanimage", "img2pdf"];

#[derive(Parser, Debug)]
#[command(name = "scanflow", about = "Scan multi-page documents into a single PDF")]
struct Cli {
    /// Force scanner selection even if one is already configured
    #[arg(short = 's', long)]
    select: bool,

    /// Enable debug logging (file log only; the TUI owns the terminal)
    #[arg(short, long)]
    verbose: bool,
}

fn missing_programs() -> Vec<&'static str> {
    REQUIRED_PROGRAMS
        .iter()
        .filter(|program| which::which(program).is_err())
        .copied()
        .collect()
}

fn init_tracing(verbose: bool) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let default_filter = if verbose { "scanflow=debug" } else { "scanflow=info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    let mut guard = None;
    let file_layer = match config::ensure_logs_dir() {
        Ok(log_dir) => {
            let file_appender = tracing_appender::rolling::daily(log_dir, "scanflow.log");
            let (file_writer, g) = tracing_appender::non_blocking(file_appender);
            guard = Some(g);
            Some(
                tracing_subscriber::fmt::layer()
                    .with_writer(file_writer)
                    .with_ansi(false)
                    .with_filter(env_filter),
            )
        }
        Err(err) => {
            eprintln!("Warning: failed to create logs directory: {}", err);
            None
        }
    };

    // While the TUI runs, only errors may reach the terminal, on stderr.
    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(tracing_subscriber::EnvFilter::new("error"));

    tracing_subscriber::registry()
        .with(file_layer)
        .with(console_layer)
        .init();

    guard
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let missing = missing_programs();
    if !missing.is_empty() {
        eprintln!(
            "Required programs not found: {}\nPlease install them and ensure they are in your PATH.",
            missing.join(", ")
        );
        return ExitCode::FAILURE;
    }

    if let Err(err) = config::ensure_config_dir() {
        eprintln!("Failed to create config directory: {}", err);
        return ExitCode::FAILURE;
    }

    let _log_guard = init_tracing(cli.verbose);

    let store = Box::new(FileSettingsStore::default_location());
    match tui::run(store, cli.select).await {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}
