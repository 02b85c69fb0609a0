//! courseware CLI entry point
//!
//! This is a minimal entrypoint that:
//! 1. Parses CLI arguments
//! 2. Installs the stderr log subscriber
//! 3. Dispatches to CLI commands (via cli::run)
//! 4. Exits with non-zero on failure

use courseware::cli::{self, Cli};
use tracing_subscriber::EnvFilter;

fn main() {
    let args = Cli::parse_args();

    let filter = match args.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    // stdout carries the JSON responses
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = cli::run(args) {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
