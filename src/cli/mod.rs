//! CLI module for hkeyexec
//!
//! Provides command-line interface for:
//! - scan: Run a full or positional group scan over a fixture
//! - count: Print a table's maintained row count
//! - explain: Print the plan a scan would run

mod args;
mod commands;
mod errors;
mod fixture;
mod io;

pub use args::{Cli, Command, ScanArgs};
pub use commands::{count, count_rows, explain, explain_plan, run, run_command, scan, scan_rows};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use fixture::{build_hkey, Fixture, FixtureError, FixtureStore};
pub use io::{write_error, write_response, write_rows};
