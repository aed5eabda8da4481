//! hkeyexec CLI entry point
//!
//! Parses arguments and dispatches through `cli::run`, which writes the
//! error envelope to stdout. The error is repeated on stderr and the
//! process exits non-zero.

use hkeyexec::cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
