use crate::classifier::diagnostics::Diagnostics;
use crate::classifier::outcome::{
    Classification, ColumnProfile, FailedColumn, SplitConfig, SplitOutcome,
};
use crate::classifier::{SplitError, TableSplitter};
use crate::generator::{materializer, statements};
use crate::identifiers::{self, IdentifierPolicy};
use crate::store::StoreLike;

/// Strategy that pushes per-column aggregation to the relational engine.
///
/// Suitable for tables too large to load; per-column failures are contained
/// so one broken column never aborts classification of the rest.
pub struct ServerSideSplitter;

impl ServerSideSplitter {
    /// Classify every non-identifier column of `columns` via store-side
    /// aggregation.
    ///
    /// A column whose check fails is excluded from both classification lists
    /// and reported in the returned failures instead.
    pub fn classify_columns(
        store: &mut dyn StoreLike,
        config: &SplitConfig,
        column_names: &[String],
        diagnostics: &mut Diagnostics,
    ) -> Result<(Classification, Vec<ColumnProfile>, Vec<FailedColumn>), SplitError> {
        let total_entities = store.query_count(&statements::entity_count(
            &config.table_name,
            &config.unique_id,
        ))?;
        if total_entities <= 0 {
            return Err(SplitError::NoEntities {
                table: config.table_name.clone(),
                unique_id: config.unique_id.clone(),
            });
        }
        let total_entities = total_entities as u64;

        let mut invariant_columns = Vec::new();
        let mut profiles = Vec::new();
        let mut failed_columns = Vec::new();

        for column in column_names {
            let sql = statements::outlier_count(&config.table_name, &config.unique_id, column);
            let outlier_entities = match store.query_count(&sql) {
                Ok(count) => count.max(0) as u64,
                Err(error) => {
                    diagnostics.error(format!("Error analyzing column '{column}': {error}"));
                    failed_columns.push(FailedColumn {
                        name: column.clone(),
                        reason: error.to_string(),
                    });
                    continue;
                }
            };

            let outlier_fraction = outlier_entities as f64 / total_entities as f64;
            profiles.push(ColumnProfile {
                name: column.clone(),
                outlier_entities,
                total_entities,
                outlier_fraction,
            });

            if outlier_fraction <= config.error_tolerance {
                invariant_columns.push(column.clone());
                if outlier_fraction > 0.0 {
                    diagnostics.warn(format!(
                        "Column {column} has {:.2}% of entities with more than one distinct \
                         value, below tolerance. Marked as time-invariant.",
                        outlier_fraction * 100.0
                    ));
                }
            }
        }

        diagnostics.info(format!(
            "Identified {} time-invariant columns: {:?}",
            invariant_columns.len(),
            invariant_columns
        ));

        // Failed columns appear in neither list; the outcome carries them so
        // callers can decide whether the partial partition is acceptable.
        let variant_columns = column_names
            .iter()
            .filter(|column| {
                !invariant_columns.contains(column)
                    && !failed_columns.iter().any(|failed| &failed.name == *column)
            })
            .cloned()
            .collect();

        Ok((
            Classification {
                invariant_columns,
                variant_columns,
            },
            profiles,
            failed_columns,
        ))
    }
}

impl TableSplitter for ServerSideSplitter {
    fn split(
        &self,
        store: &mut dyn StoreLike,
        config: &SplitConfig,
        diagnostics: &mut Diagnostics,
    ) -> Result<SplitOutcome, SplitError> {
        config.validate(diagnostics)?;
        diagnostics.info(format!(
            "Starting process to identify time-invariant and time-variant columns in table '{}'.",
            config.table_name
        ));

        let all_columns = store.table_columns(&config.table_name)?;
        // Introspected names are treated as untrusted even though they come
        // from the store itself.
        identifiers::validate_identifiers(
            all_columns.iter().map(String::as_str),
            IdentifierPolicy::Column,
            diagnostics,
        )?;
        let column_names: Vec<String> = all_columns
            .into_iter()
            .filter(|column| column != &config.unique_id)
            .collect();

        let (classification, profiles, failed_columns) =
            Self::classify_columns(store, config, &column_names, diagnostics)?;

        let (invariant_table, variant_table) =
            materializer::create_split_tables(store, config, &classification, diagnostics);

        Ok(SplitOutcome {
            classification,
            profiles,
            failed_columns,
            invariant_table,
            variant_table,
        })
    }
}
