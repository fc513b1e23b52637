//! Derived-table materialization.
//!
//! A creation failure on one side is contained: it is logged, recorded in
//! the returned status, and never prevents the other side from proceeding.
//! An empty side is skipped with a warning.

use crate::classifier::diagnostics::Diagnostics;
use crate::classifier::outcome::{Classification, MaterializationStatus, SplitConfig};
use crate::store::frame::Frame;
use crate::store::StoreLike;

use super::statements;

/// Create both derived tables server-side with create-if-absent semantics.
pub fn create_split_tables(
    store: &mut dyn StoreLike,
    config: &SplitConfig,
    classification: &Classification,
    diagnostics: &mut Diagnostics,
) -> (MaterializationStatus, MaterializationStatus) {
    let invariant = if classification.invariant_columns.is_empty() {
        warn_skipped(config, "time_invariant", diagnostics);
        MaterializationStatus::SkippedEmpty
    } else {
        run_create(
            store,
            statements::invariant_table_name(&config.table_name),
            statements::create_invariant_table(
                &config.table_name,
                &config.unique_id,
                &classification.invariant_columns,
            ),
            diagnostics,
        )
    };

    let variant = if classification.variant_columns.is_empty() {
        warn_skipped(config, "time_variant", diagnostics);
        MaterializationStatus::SkippedEmpty
    } else {
        run_create(
            store,
            statements::variant_table_name(&config.table_name),
            statements::create_variant_table(
                &config.table_name,
                &config.unique_id,
                &classification.variant_columns,
            ),
            diagnostics,
        )
    };

    (invariant, variant)
}

/// Write both derived frames back with replace semantics.
///
/// The invariant frame keeps the first row per entity in original row order;
/// the variant frame keeps all rows. Output tables carry the `_local`
/// suffix so they never collide with the server-side strategy's output.
pub fn write_local_tables(
    store: &mut dyn StoreLike,
    config: &SplitConfig,
    frame: &Frame,
    classification: &Classification,
    diagnostics: &mut Diagnostics,
) -> (MaterializationStatus, MaterializationStatus) {
    let invariant = if classification.invariant_columns.is_empty() {
        warn_skipped(config, "time_invariant", diagnostics);
        MaterializationStatus::SkippedEmpty
    } else {
        let table = statements::local_invariant_table_name(&config.table_name);
        match build_invariant_frame(frame, config, classification) {
            Ok(derived) => replace_table(store, table, &derived, diagnostics),
            Err(reason) => fail_side(table, reason, diagnostics),
        }
    };

    let variant = if classification.variant_columns.is_empty() {
        warn_skipped(config, "time_variant", diagnostics);
        MaterializationStatus::SkippedEmpty
    } else {
        let table = statements::local_variant_table_name(&config.table_name);
        match build_variant_frame(frame, config, classification) {
            Ok(derived) => replace_table(store, table, &derived, diagnostics),
            Err(reason) => fail_side(table, reason, diagnostics),
        }
    };

    (invariant, variant)
}

fn build_invariant_frame(
    frame: &Frame,
    config: &SplitConfig,
    classification: &Classification,
) -> Result<Frame, String> {
    let mut columns = vec![config.unique_id.clone()];
    columns.extend(classification.invariant_columns.iter().cloned());
    frame
        .first_rows_per_entity(&config.unique_id)
        .and_then(|representatives| representatives.project(&columns))
        .map_err(|e| e.to_string())
}

fn build_variant_frame(
    frame: &Frame,
    config: &SplitConfig,
    classification: &Classification,
) -> Result<Frame, String> {
    let mut columns = vec![config.unique_id.clone()];
    columns.extend(classification.variant_columns.iter().cloned());
    frame.project(&columns).map_err(|e| e.to_string())
}

fn run_create(
    store: &mut dyn StoreLike,
    table: String,
    sql: String,
    diagnostics: &mut Diagnostics,
) -> MaterializationStatus {
    match store.execute(&sql) {
        Ok(()) => {
            diagnostics.info(format!("Created table '{table}'."));
            MaterializationStatus::Created { table }
        }
        Err(error) => fail_side(table, error.to_string(), diagnostics),
    }
}

fn replace_table(
    store: &mut dyn StoreLike,
    table: String,
    frame: &Frame,
    diagnostics: &mut Diagnostics,
) -> MaterializationStatus {
    let mut batch = vec![
        statements::drop_table(&table),
        statements::create_table_for_frame(&table, frame),
    ];
    batch.extend(statements::insert_frame(&table, frame));

    for sql in batch {
        if let Err(error) = store.execute(&sql) {
            return fail_side(table, error.to_string(), diagnostics);
        }
    }

    diagnostics.info(format!(
        "Created table '{table}' with {} rows.",
        frame.row_count()
    ));
    MaterializationStatus::Created { table }
}

fn fail_side(table: String, reason: String, diagnostics: &mut Diagnostics) -> MaterializationStatus {
    diagnostics.error(format!("Failed to create '{table}' table: {reason}"));
    MaterializationStatus::Failed { table, reason }
}

fn warn_skipped(config: &SplitConfig, side: &str, diagnostics: &mut Diagnostics) {
    diagnostics.warn(format!(
        "No {side} columns identified. Skipping creation of '{}_{side}' table in '{}' database.",
        config.table_name, config.database_label,
    ));
}
