//! JSON output for the CLI
//!
//! - Rows: one JSON object per line on stdout
//! - Plans: a single `{"status": "ok", "data": ...}` object
//! - Errors: a single `{"status": "error", "code": ..., "message": ...}` object
//! - UTF-8 only; logs go to stderr

use std::io::{self, Write};

use serde_json::Value;

use super::errors::CliResult;

/// Write one JSON object per line
pub fn write_rows<W: Write>(writer: &mut W, rows: &[Value]) -> CliResult<()> {
    for row in rows {
        serde_json::to_writer(&mut *writer, row)?;
        writeln!(writer)?;
    }
    writer.flush()?;
    Ok(())
}

/// Write a success response to stdout
pub fn write_response(data: Value) -> CliResult<()> {
    let response = serde_json::json!({
        "status": "ok",
        "data": data
    });

    let mut stdout = io::stdout();
    serde_json::to_writer(&mut stdout, &response)?;
    writeln!(stdout)?;
    stdout.flush()?;

    Ok(())
}

/// Write an error response to stdout
pub fn write_error(code: &str, message: &str) -> CliResult<()> {
    let response = serde_json::json!({
        "status": "error",
        "code": code,
        "message": message
    });

    let mut stdout = io::stdout();
    serde_json::to_writer(&mut stdout, &response)?;
    writeln!(stdout)?;
    stdout.flush()?;

    Ok(())
}
