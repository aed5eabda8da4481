//! CLI command implementations
//!
//! Each command loads the execution config (if given) and the fixture,
//! builds an operator tree, and drives it through the cursor protocol.
//! The `*_rows` functions return JSON values and are what the tests call;
//! the command wrappers only print.

use std::io;
use std::path::Path;
use std::sync::Arc;

use serde_json::{json, Value as JsonValue};

use crate::executor::{collect_rows, Bindings, ExecutionConfig, QueryContext};
use crate::observability::{log_event, Event, ObservationScope};
use crate::operator::{Count, GroupScan, Limit, Operator};
use crate::row::{HKey, RowType, Value};
use crate::storage::StoreAdapter;

use super::args::{Cli, Command, ScanArgs};
use super::errors::{CliError, CliResult};
use super::fixture::{build_hkey, Fixture};
use super::io::{write_error, write_response, write_rows};

/// Parse arguments, run the command, and report any error on stdout
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    let result = run_command(cli.command);
    if let Err(ref e) = result {
        let _ = write_error(e.code_str(), e.message());
    }
    result
}

pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Scan(args) => scan(&args),
        Command::Count {
            fixture,
            config,
            table,
        } => count(&fixture, config.as_deref(), &table),
        Command::Explain(args) => explain(&args),
    }
}

/// Run a group scan and print its rows
pub fn scan(args: &ScanArgs) -> CliResult<()> {
    let rows = scan_rows(args)?;
    write_rows(&mut io::stdout(), &rows)
}

/// Print a table's row count as a single row
pub fn count(fixture_path: &Path, config_path: Option<&Path>, table: &str) -> CliResult<()> {
    let rows = count_rows(fixture_path, config_path, table)?;
    write_rows(&mut io::stdout(), &rows)
}

/// Print the plan `scan` would run
pub fn explain(args: &ScanArgs) -> CliResult<()> {
    write_response(explain_plan(args)?)
}

/// Rows `scan` prints, as JSON
pub fn scan_rows(args: &ScanArgs) -> CliResult<Vec<JsonValue>> {
    let config = load_config(args.config.as_deref())?;
    let fixture = Fixture::load(&args.fixture)?;
    let (plan, bindings) = plan_scan(&fixture, args, &config)?;
    let store = fixture.into_store(config.row_count_mode)?;
    let adapter: Arc<dyn StoreAdapter> = store.adapter;
    execute(&plan, &bindings, &adapter, config)
}

/// Rows `count` prints, as JSON
pub fn count_rows(fixture_path: &Path, config_path: Option<&Path>, table: &str) -> CliResult<Vec<JsonValue>> {
    let config = load_config(config_path)?;
    let mut fixture = Fixture::load(fixture_path)?;
    let table_type = table_by_name(&fixture, table)?;
    let plan = Count::new(&mut fixture.schema, table_type)?;
    let store = fixture.into_store(config.row_count_mode)?;
    let adapter: Arc<dyn StoreAdapter> = store.adapter;
    execute(&plan, &Bindings::new(0), &adapter, config)
}

/// Plan description `explain` prints
pub fn explain_plan(args: &ScanArgs) -> CliResult<JsonValue> {
    let config = load_config(args.config.as_deref())?;
    let fixture = Fixture::load(&args.fixture)?;
    let (plan, bindings) = plan_scan(&fixture, args, &config)?;
    Ok(json!({
        "plan": plan.describe(),
        "row_type": plan.row_type().to_string(),
        "binding_slots": plan.binding_slots(),
        "bindings": bindings.to_string(),
    }))
}

fn load_config(path: Option<&Path>) -> CliResult<ExecutionConfig> {
    let config = match path {
        Some(path) => ExecutionConfig::load(path)?,
        None => ExecutionConfig::default(),
    };
    log_event(
        Event::ConfigLoaded,
        &[
            ("log_operator_execution", if config.log_operator_execution { "true" } else { "false" }),
            ("row_count_mode", config.row_count_mode.as_str()),
        ],
    );
    Ok(config)
}

fn table_by_name(fixture: &Fixture, name: &str) -> CliResult<Arc<RowType>> {
    fixture
        .schema
        .table_by_name(name)
        .cloned()
        .ok_or_else(|| CliError::invalid_argument(format!("unknown table '{}'", name)))
}

/// Group scan for `args`, plus the bindings it must be opened with
fn plan_scan(fixture: &Fixture, args: &ScanArgs, config: &ExecutionConfig) -> CliResult<(GroupScan, Bindings)> {
    let table = match &args.table {
        Some(name) => table_by_name(fixture, name)?,
        None => fixture
            .schema
            .groups()
            .next()
            .and_then(|g| fixture.schema.table(g.root()))
            .cloned()
            .ok_or_else(|| CliError::invalid_argument("fixture defines no tables"))?,
    };
    let group = table
        .table_id()
        .and_then(|id| fixture.schema.group_of(id))
        .cloned()
        .ok_or_else(|| CliError::invalid_argument(format!("no group for table '{}'", table.name())))?;

    let (scan, bindings) = match &args.hkey {
        Some(text) => {
            let hkey = parse_hkey(fixture, &table, text)?;
            let scan = GroupScan::positional(group, 0, !args.shallow);
            let mut bindings = Bindings::for_plan(&scan);
            bindings.set(0, hkey)?;
            (scan, bindings)
        }
        None => (GroupScan::full(group), Bindings::new(0)),
    };

    let scan = match config.max_rows {
        Some(max) => scan.with_limit(Limit::rows(max)),
        None => scan,
    };
    Ok((scan, bindings))
}

fn parse_hkey(fixture: &Fixture, table: &RowType, text: &str) -> CliResult<HKey> {
    let levels: Vec<Vec<Value>> = serde_json::from_str(text)
        .map_err(|e| CliError::invalid_argument(format!("--hkey is not a list of key lists: {}", e)))?;
    Ok(build_hkey(&fixture.schema, table, &levels)?)
}

/// Drive `plan` to completion inside a QUERY observation scope
fn execute(
    plan: &dyn Operator,
    bindings: &Bindings,
    adapter: &Arc<dyn StoreAdapter>,
    config: ExecutionConfig,
) -> CliResult<Vec<JsonValue>> {
    let context = QueryContext::new(config);
    let query_id = context.query_id().to_string();
    let description = plan.describe();
    let scope = ObservationScope::with_fields("QUERY", &[("plan", &description), ("query_id", &query_id)]);

    let mut cursor = plan.cursor(adapter, &context)?;
    let result = collect_rows(cursor.as_mut(), bindings);
    let destroyed = cursor.destroy();

    match result {
        Ok(rows) => {
            destroyed?;
            scope.complete(&[
                ("metrics", &context.metrics().to_json()),
                ("rows", &rows.len().to_string()),
            ]);
            Ok(rows.iter().map(|r| r.to_json()).collect())
        }
        Err(e) if e.is_cancellation() => {
            scope.canceled();
            Err(e.into())
        }
        Err(e) => {
            scope.fail(e.severity().into(), e.code().code(), e.message());
            Err(e.into())
        }
    }
}
