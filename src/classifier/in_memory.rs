use crate::classifier::diagnostics::Diagnostics;
use crate::classifier::outcome::{Classification, ColumnProfile, SplitConfig, SplitOutcome};
use crate::classifier::{SplitError, TableSplitter};
use crate::generator::materializer;
use crate::identifiers::{self, IdentifierPolicy};
use crate::store::frame::Frame;
use crate::store::StoreLike;

/// Classify every non-identifier column of a fully loaded frame.
///
/// Unlike the server-side path there is no per-column skip route: any
/// computation failure aborts the call, and the resulting partition is
/// strictly total over the non-identifier columns.
pub fn classify_frame(
    frame: &Frame,
    table_name: &str,
    unique_id: &str,
    error_tolerance: f64,
    diagnostics: &mut Diagnostics,
) -> Result<(Classification, Vec<ColumnProfile>), SplitError> {
    let groups = frame.entity_groups(unique_id)?;
    if groups.is_empty() {
        return Err(SplitError::NoEntities {
            table: table_name.to_string(),
            unique_id: unique_id.to_string(),
        });
    }
    let total_entities = groups.len() as u64;

    let mut invariant_columns = Vec::new();
    let mut variant_columns = Vec::new();
    let mut profiles = Vec::new();

    for column in frame.columns() {
        if column == unique_id {
            continue;
        }

        let outlier_entities = frame.outlier_entities(&groups, column)? as u64;
        let outlier_fraction = outlier_entities as f64 / total_entities as f64;
        profiles.push(ColumnProfile {
            name: column.clone(),
            outlier_entities,
            total_entities,
            outlier_fraction,
        });

        if outlier_fraction <= error_tolerance {
            invariant_columns.push(column.clone());
            if outlier_fraction > 0.0 {
                diagnostics.warn(format!(
                    "Column {column} has {:.2}% of entities with more than one distinct \
                     value, below tolerance. Marked as time-invariant.",
                    outlier_fraction * 100.0
                ));
            }
        } else {
            variant_columns.push(column.clone());
        }
    }

    diagnostics.info(format!(
        "Identified {} time-invariant columns: {:?}",
        invariant_columns.len(),
        invariant_columns
    ));

    Ok((
        Classification {
            invariant_columns,
            variant_columns,
        },
        profiles,
    ))
}

/// Strategy that loads the whole table into memory and computes locally.
///
/// Simpler than the server-side path but bounded by available memory.
pub struct InMemorySplitter;

impl TableSplitter for InMemorySplitter {
    fn split(
        &self,
        store: &mut dyn StoreLike,
        config: &SplitConfig,
        diagnostics: &mut Diagnostics,
    ) -> Result<SplitOutcome, SplitError> {
        config.validate(diagnostics)?;
        diagnostics.info(format!(
            "Loading table '{}' into memory.",
            config.table_name
        ));

        let mut frame = store.fetch_table(&config.table_name)?;
        let cleaned: Vec<String> = frame
            .columns()
            .iter()
            .map(|column| identifiers::clean_column(column))
            .collect();
        if cleaned != frame.columns() {
            diagnostics.info("Normalized loaded column names to safe lowercase identifiers.");
        }
        frame.rename_columns(cleaned)?;
        // Loaded column names feed the write-back DDL, so they get the same
        // treatment as introspected names on the server-side path.
        identifiers::validate_identifiers(
            frame.columns().iter().map(String::as_str),
            IdentifierPolicy::Column,
            diagnostics,
        )?;
        diagnostics.info(format!(
            "Loaded {} rows across {} columns.",
            frame.row_count(),
            frame.columns().len()
        ));

        let (classification, profiles) = classify_frame(
            &frame,
            &config.table_name,
            &config.unique_id,
            config.error_tolerance,
            diagnostics,
        )?;

        let (invariant_table, variant_table) =
            materializer::write_local_tables(store, config, &frame, &classification, diagnostics);

        Ok(SplitOutcome {
            classification,
            profiles,
            failed_columns: Vec::new(),
            invariant_table,
            variant_table,
        })
    }
}
