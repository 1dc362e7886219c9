mod commands;
mod config;
mod diagnostics;
mod error;
mod filters;
mod grammar;
mod identifier;
mod parser;
mod report;
mod spec;
mod types;
mod verifier;
mod walker;

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use crate::commands::Mode;
use crate::identifier::Identifier;

/// Exit code for any error that aborted the run.
const ERROR_EXIT: u8 = 2;

/// Check that every Python function has the test scenarios its spec claims.
#[derive(Parser)]
#[command(name = "covspec", version)]
struct Cli {
    /// Add a placeholder spec entry for the first uncovered function (requires --first)
    #[arg(long)]
    create: bool,
    /// Stop at the first uncovered function and print only that
    #[arg(long)]
    first: bool,
    /// Project root to walk
    #[arg(long, default_value = ".")]
    root: PathBuf,
    /// Restrict the run to `path.py` or `path.py::qualified::name`
    #[arg(long, default_value = "")]
    target: String,
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Run the parsed command line.
///
/// # Errors
///
/// Returns usage, identifier, and any error from the run itself.
fn execute(cli: &Cli) -> Result<ExitCode, error::Error> {
    let mode = Mode::from_flags(cli.first, cli.create)?;
    let target = Identifier::parse(&cli.target)?;
    if let Some(identifier) = &target {
        tracing::info!("Target: {identifier}");
    }

    let mut out = io::stdout().lock();
    let outcome = commands::run(&cli.root, target.as_ref(), mode, &mut out)?;
    return Ok(outcome.exit_code());
}

/// Set up `tracing` on stderr. `RUST_LOG` wins over the `-v` count.
fn init_tracing(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_err| return EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

/// Log level for a `-v` count.
const fn level_for(verbose: u8) -> &'static str {
    return match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(level_for(cli.verbose));

    return match execute(&cli) {
        Ok(code) => code,
        Err(e) => {
            diagnostics::print_error(&e);
            ExitCode::from(ERROR_EXIT)
        },
    };
}
