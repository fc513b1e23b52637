use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::classifier::diagnostics::Diagnostics;
use crate::classifier::SplitError;
use crate::identifiers::{self, IdentifierPolicy};

/// Where the invariance computation runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Push aggregation to the relational engine via generated queries.
    ServerSide,
    /// Load the full table into memory and compute locally.
    InMemory,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::ServerSide => write!(f, "server-side"),
            Strategy::InMemory => write!(f, "in-memory"),
        }
    }
}

impl FromStr for Strategy {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "server-side" | "server" => Ok(Strategy::ServerSide),
            "in-memory" | "memory" => Ok(Strategy::InMemory),
            _ => Err(format!("Invalid strategy: {s}")),
        }
    }
}

fn default_error_tolerance() -> f64 {
    0.01
}

fn default_strategy() -> Strategy {
    Strategy::ServerSide
}

/// Run configuration for one split invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitConfig {
    /// Source table holding repeated observations per entity.
    pub table_name: String,
    /// Column uniquely identifying each entity.
    pub unique_id: String,
    /// Database name, used in diagnostics only.
    #[serde(default)]
    pub database_label: String,
    /// Fraction of entities allowed to violate invariance, in `[0, 1]`.
    #[serde(default = "default_error_tolerance")]
    pub error_tolerance: f64,
    /// Which strategy computes the split.
    #[serde(default = "default_strategy")]
    pub strategy: Strategy,
}

impl SplitConfig {
    /// Configuration with default tolerance (0.01) and server-side strategy.
    pub fn new(table_name: impl Into<String>, unique_id: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            unique_id: unique_id.into(),
            database_label: String::new(),
            error_tolerance: default_error_tolerance(),
            strategy: default_strategy(),
        }
    }

    /// Parse a JSON run-configuration file.
    ///
    /// Identifier fields are validated as raw JSON values first, so a
    /// non-string value is reported as `not-a-string` rather than as a type
    /// error from deserialization.
    pub fn from_json(json: &str, diagnostics: &mut Diagnostics) -> Result<Self, SplitError> {
        let raw: serde_json::Value = serde_json::from_str(json)
            .map_err(|e| SplitError::Config(format!("malformed JSON: {e}")))?;

        let identifier_fields: Vec<serde_json::Value> = ["table_name", "unique_id"]
            .iter()
            .filter_map(|field| raw.get(*field).cloned())
            .collect();
        identifiers::validate_json_identifiers(
            &identifier_fields,
            IdentifierPolicy::Column,
            diagnostics,
        )?;

        let config: SplitConfig = serde_json::from_value(raw)
            .map_err(|e| SplitError::Config(e.to_string()))?;
        config.validate(diagnostics)?;
        Ok(config)
    }

    /// Check preconditions and identifier safety.
    ///
    /// Fails before any store interaction: empty required arguments, a
    /// tolerance outside `[0, 1]`, or an unsafe identifier are all fatal.
    pub fn validate(&self, diagnostics: &mut Diagnostics) -> Result<(), SplitError> {
        if self.table_name.is_empty() {
            return Err(SplitError::MissingArgument("table_name"));
        }
        if self.unique_id.is_empty() {
            return Err(SplitError::MissingArgument("unique_id"));
        }
        if !(0.0..=1.0).contains(&self.error_tolerance) {
            return Err(SplitError::InvalidTolerance(self.error_tolerance));
        }

        // The table name is suffixed when derived tables are created, so the
        // stricter length-capped policy applies.
        identifiers::validate_identifiers(
            [self.table_name.as_str(), self.unique_id.as_str()],
            IdentifierPolicy::Column,
            diagnostics,
        )?;
        if !self.database_label.is_empty() {
            identifiers::validate_identifier(
                &self.database_label,
                IdentifierPolicy::Column,
                diagnostics,
            )?;
        }
        Ok(())
    }
}

/// Per-column statistics computed during classification.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnProfile {
    /// Column name.
    pub name: String,
    /// Entities for which the column takes more than one distinct value.
    pub outlier_entities: u64,
    /// Distinct entity identifiers in the table.
    pub total_entities: u64,
    /// `outlier_entities / total_entities`.
    pub outlier_fraction: f64,
}

/// The invariant/variant partition of the non-identifier columns.
///
/// Every classified column appears in exactly one of the two sequences, in
/// introspected column order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Classification {
    /// Columns effectively constant within each entity.
    pub invariant_columns: Vec<String>,
    /// Columns that vary across an entity's rows beyond tolerance.
    pub variant_columns: Vec<String>,
}

/// A column whose per-column check failed on the server-side path.
///
/// Failed columns appear in neither classification list; they are surfaced
/// here so callers can decide whether a partial result is acceptable.
#[derive(Debug, Clone, PartialEq)]
pub struct FailedColumn {
    /// Column name.
    pub name: String,
    /// Store-reported failure detail.
    pub reason: String,
}

/// What happened to one side of the materialization.
#[derive(Debug, Clone, PartialEq)]
pub enum MaterializationStatus {
    /// The derived table was created (or already existed, idempotently).
    Created {
        /// Name of the derived table.
        table: String,
    },
    /// The side had no columns; creation was skipped with a warning.
    SkippedEmpty,
    /// Table creation failed; the failure was contained and logged.
    Failed {
        /// Name of the derived table that could not be created.
        table: String,
        /// Store-reported failure detail.
        reason: String,
    },
}

/// Structured result of a split invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitOutcome {
    /// The invariant/variant partition.
    pub classification: Classification,
    /// Per-column statistics in introspected column order.
    pub profiles: Vec<ColumnProfile>,
    /// Columns whose checks failed (server-side strategy only).
    pub failed_columns: Vec<FailedColumn>,
    /// Materialization status of the invariant side.
    pub invariant_table: MaterializationStatus,
    /// Materialization status of the variant side.
    pub variant_table: MaterializationStatus,
}

impl SplitOutcome {
    /// True when any column check or materialization was skipped or failed.
    pub fn is_partial(&self) -> bool {
        !self.failed_columns.is_empty()
            || matches!(self.invariant_table, MaterializationStatus::Failed { .. })
            || matches!(self.variant_table, MaterializationStatus::Failed { .. })
    }
}
