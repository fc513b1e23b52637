use std::fmt::Write;

use crate::classifier::diagnostics::Diagnostics;
use crate::classifier::outcome::{MaterializationStatus, SplitConfig, SplitOutcome};

/// Build a markdown report for one split run.
pub fn build_report(
    config: &SplitConfig,
    outcome: &SplitOutcome,
    diagnostics: &Diagnostics,
) -> String {
    let mut report = String::new();

    writeln!(report, "# pgsplit Split Report").unwrap();
    writeln!(report).unwrap();
    writeln!(report, "- Table: `{}`", config.table_name).unwrap();
    writeln!(report, "- Entity column: `{}`", config.unique_id).unwrap();
    writeln!(report, "- Strategy: {}", config.strategy).unwrap();
    writeln!(report, "- Error tolerance: {}", config.error_tolerance).unwrap();
    if !config.database_label.is_empty() {
        writeln!(report, "- Database: {}", config.database_label).unwrap();
    }

    writeln!(report).unwrap();
    writeln!(report, "## Columns").unwrap();
    writeln!(report).unwrap();
    writeln!(report, "| Column | Outlier entities | Outlier fraction | Classification |").unwrap();
    writeln!(report, "|--------|------------------|------------------|----------------|").unwrap();

    for profile in &outcome.profiles {
        let classification = if outcome
            .classification
            .invariant_columns
            .contains(&profile.name)
        {
            "time-invariant"
        } else {
            "time-variant"
        };
        writeln!(
            report,
            "| {} | {} / {} | {:.4} | {} |",
            profile.name,
            profile.outlier_entities,
            profile.total_entities,
            profile.outlier_fraction,
            classification
        )
        .unwrap();
    }
    for failed in &outcome.failed_columns {
        writeln!(report, "| {} | N/A | N/A | failed: {} |", failed.name, failed.reason).unwrap();
    }

    writeln!(report).unwrap();
    writeln!(report, "## Materialization").unwrap();
    writeln!(report).unwrap();
    writeln!(
        report,
        "- Invariant side: {}",
        format_status(&outcome.invariant_table)
    )
    .unwrap();
    writeln!(
        report,
        "- Variant side: {}",
        format_status(&outcome.variant_table)
    )
    .unwrap();

    let warnings: Vec<&str> = diagnostics
        .warnings()
        .map(|record| record.message.as_str())
        .collect();
    if !warnings.is_empty() {
        writeln!(report).unwrap();
        writeln!(report, "## Warnings").unwrap();
        writeln!(report).unwrap();
        for warning in warnings {
            writeln!(report, "- {warning}").unwrap();
        }
    }

    report
}

fn format_status(status: &MaterializationStatus) -> String {
    match status {
        MaterializationStatus::Created { table } => format!("created `{table}`"),
        MaterializationStatus::SkippedEmpty => "skipped (no columns on this side)".to_string(),
        MaterializationStatus::Failed { table, reason } => {
            format!("FAILED to create `{table}`: {reason}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::outcome::{Classification, ColumnProfile, FailedColumn};

    fn sample_outcome() -> SplitOutcome {
        SplitOutcome {
            classification: Classification {
                invariant_columns: vec!["sex".to_string()],
                variant_columns: vec!["weight".to_string()],
            },
            profiles: vec![
                ColumnProfile {
                    name: "sex".to_string(),
                    outlier_entities: 1,
                    total_entities: 1000,
                    outlier_fraction: 0.001,
                },
                ColumnProfile {
                    name: "weight".to_string(),
                    outlier_entities: 990,
                    total_entities: 1000,
                    outlier_fraction: 0.99,
                },
            ],
            failed_columns: vec![FailedColumn {
                name: "notes".to_string(),
                reason: "count query failed: boom".to_string(),
            }],
            invariant_table: MaterializationStatus::Created {
                table: "visits_time_invariant".to_string(),
            },
            variant_table: MaterializationStatus::SkippedEmpty,
        }
    }

    #[test]
    fn report_lists_columns_failures_statuses_and_warnings() {
        let config = SplitConfig::new("visits", "patient_id");
        let mut diagnostics = Diagnostics::new();
        diagnostics.warn("Column sex has 0.10% of entities with more than one distinct value");

        let report = build_report(&config, &sample_outcome(), &diagnostics);

        assert!(report.contains("# pgsplit Split Report"));
        assert!(report.contains("| sex | 1 / 1000 | 0.0010 | time-invariant |"));
        assert!(report.contains("| weight | 990 / 1000 | 0.9900 | time-variant |"));
        assert!(report.contains("| notes | N/A | N/A | failed: count query failed: boom |"));
        assert!(report.contains("created `visits_time_invariant`"));
        assert!(report.contains("skipped (no columns on this side)"));
        assert!(report.contains("## Warnings"));
        assert!(report.contains("0.10%"));
    }
}
