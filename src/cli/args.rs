//! CLI argument definitions using clap
//!
//! Commands:
//! - hkeyexec scan --fixture <path> [--config <path>] [--table <name>] [--hkey <json>] [--deep|--shallow]
//! - hkeyexec count --fixture <path> [--config <path>] --table <name>
//! - hkeyexec explain --fixture <path> [--table <name>] [--hkey <json>] [--deep|--shallow]

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// hkeyexec - cursor execution over hierarchical group tables
#[derive(Parser, Debug)]
#[command(name = "hkeyexec")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Scan a group table and print one JSON object per row
    Scan(ScanArgs),

    /// Print the maintained row count of a table
    Count {
        /// Path to fixture file
        #[arg(long)]
        fixture: PathBuf,

        /// Path to execution configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Table to count
        #[arg(long)]
        table: String,
    },

    /// Print the plan a scan would run, without running it
    Explain(ScanArgs),
}

/// Arguments shared by `scan` and `explain`
#[derive(Args, Debug, Clone)]
pub struct ScanArgs {
    /// Path to fixture file
    #[arg(long)]
    pub fixture: PathBuf,

    /// Path to execution configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Table whose group is scanned (and whose rows --hkey addresses);
    /// defaults to the first root table
    #[arg(long)]
    pub table: Option<String>,

    /// Start position as one JSON list of key values per level, e.g. '[[1],[10]]'
    #[arg(long)]
    pub hkey: Option<String>,

    /// Return the row at --hkey and all its descendants (default)
    #[arg(long, conflicts_with = "shallow", requires = "hkey")]
    pub deep: bool,

    /// Return only the row at --hkey
    #[arg(long, requires = "hkey")]
    pub shallow: bool,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
