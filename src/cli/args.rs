//! CLI argument definitions using clap
//!
//! Commands:
//! - courseware check --entity <name>
//! - courseware schema --entity <name>

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// courseware - validate and normalize course data records
#[derive(Parser, Debug)]
#[command(name = "courseware")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to a JSON store configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate newline-delimited JSON records read from stdin
    Check {
        /// Entity to construct from each record
        #[arg(long)]
        entity: String,
    },

    /// Print the field schema of an entity
    Schema {
        /// Entity whose schema to print
        #[arg(long)]
        entity: String,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
