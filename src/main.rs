//! CLI entry point for `pgsplit`.

use std::path::PathBuf;
use std::process;

use clap::Parser;
use pgsplit::classifier::diagnostics::Diagnostics;
use pgsplit::classifier::outcome::{SplitConfig, Strategy};
use pgsplit::classifier::{split_table, SplitError};
use pgsplit::output::{formatter, report};
use pgsplit::store::postgres::PgStore;
use pgsplit::store::RecordingStore;

#[derive(Parser)]
#[command(
    name = "pgsplit",
    about = "Split a longitudinal PostgreSQL table into time-invariant and time-variant tables"
)]
struct Cli {
    /// PostgreSQL connection URL
    #[arg(long)]
    db_url: String,

    /// Source table holding repeated observations per entity
    #[arg(long, required_unless_present = "config")]
    table: Option<String>,

    /// Column uniquely identifying each entity (e.g. patient ID)
    #[arg(long, required_unless_present = "config")]
    unique_id: Option<String>,

    /// JSON run-configuration file (alternative to --table/--unique-id)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Database name used in diagnostics only
    #[arg(long, default_value = "")]
    database_label: String,

    /// Fraction of entities allowed to violate invariance
    #[arg(long, default_value_t = 0.01)]
    error_tolerance: f64,

    /// Execution strategy: server-side or in-memory
    #[arg(long, default_value = "server-side")]
    strategy: Strategy,

    /// Output directory for the report and generated statements
    #[arg(long, default_value = "pgsplit-output")]
    output_dir: PathBuf,

    /// Print verbose diagnostics
    #[arg(long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut diagnostics = Diagnostics::new();

    // Stage 1: assemble the run configuration
    let config = match build_config(&cli, &mut diagnostics) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            process::exit(2);
        }
    };

    // Stage 2: connect
    let mut store = match PgStore::connect(&cli.db_url) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("Connection error: {e}");
            process::exit(2);
        }
    };

    // Stage 3: classify and materialize, recording the SQL that runs so the
    // statements artifact matches the selected strategy exactly
    let mut recorder = RecordingStore::new(&mut store);
    let outcome = match split_table(&mut recorder, &config, &mut diagnostics) {
        Ok(outcome) => outcome,
        Err(e) => {
            eprintln!("Split error: {e}");
            process::exit(2);
        }
    };
    let executed_statements = recorder.into_log();

    if cli.verbose {
        for record in diagnostics.records() {
            eprintln!("[{}] {}", record.level, record.message);
        }
    }

    // Stage 4: write report and statements
    let report_content = report::build_report(&config, &outcome, &diagnostics);
    if let Err(e) = formatter::write_output(
        &cli.output_dir,
        &config.table_name,
        &report_content,
        &executed_statements,
    ) {
        eprintln!("Error writing output: {e}");
        process::exit(2);
    }

    println!(
        "Invariant columns ({}): {:?}",
        outcome.classification.invariant_columns.len(),
        outcome.classification.invariant_columns
    );
    println!(
        "Variant columns ({}): {:?}",
        outcome.classification.variant_columns.len(),
        outcome.classification.variant_columns
    );

    // Exit 1 when anything was skipped or failed, so callers can tell a
    // partial result from a complete one.
    if outcome.is_partial() {
        process::exit(1);
    }
}

fn build_config(cli: &Cli, diagnostics: &mut Diagnostics) -> Result<SplitConfig, SplitError> {
    if let Some(path) = &cli.config {
        let content = std::fs::read_to_string(path)
            .map_err(|e| SplitError::Config(format!("failed to read {}: {e}", path.display())))?;
        return SplitConfig::from_json(&content, diagnostics);
    }

    let table = cli.table.clone().unwrap_or_default();
    let unique_id = cli.unique_id.clone().unwrap_or_default();
    let mut config = SplitConfig::new(table, unique_id);
    config.database_label = cli.database_label.clone();
    config.error_tolerance = cli.error_tolerance;
    config.strategy = cli.strategy;
    config.validate(diagnostics)?;
    Ok(config)
}
