//! CLI module for courseware
//!
//! Provides command-line interface for:
//! - check: Validate newline-delimited JSON records from stdin
//! - schema: Print an entity's field schema

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{check, load_config, run, run_command, CheckSummary, EntityKind};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{parse_record, write_error, write_json, write_parse_error, write_response};
