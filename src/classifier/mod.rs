//! Longitudinal column classification.
//!
//! Two interchangeable strategies implement one contract: consume a table
//! name, an entity-identifier column, and an error-tolerance fraction;
//! produce the invariant/variant column partition and materialize two
//! derived tables reflecting the split.

/// Explicitly passed diagnostics collector.
pub mod diagnostics;
/// In-memory strategy over a fully loaded frame.
pub mod in_memory;
/// Run configuration, column profiles, and structured split outcomes.
pub mod outcome;
/// Server-side strategy pushing aggregation to the store.
pub mod server_side;

use crate::identifiers::IdentifierError;
use crate::store::{StoreError, StoreLike};
use diagnostics::Diagnostics;
use outcome::{SplitConfig, SplitOutcome, Strategy};

/// Errors that abort a split invocation.
///
/// Per-column and materialization failures are deliberately absent: those
/// are contained, logged, and surfaced through [`outcome::SplitOutcome`].
#[derive(Debug, thiserror::Error)]
pub enum SplitError {
    /// One or more identifiers failed SQL-safety validation.
    #[error(transparent)]
    InvalidIdentifiers(#[from] IdentifierError),
    /// A required argument was empty or missing; raised before any store
    /// interaction.
    #[error("missing required argument: '{0}' must be provided")]
    MissingArgument(&'static str),
    /// The error tolerance lies outside `[0, 1]`.
    #[error("error tolerance must lie in [0, 1], got {0}")]
    InvalidTolerance(f64),
    /// The source table holds no distinct entity identifiers, so outlier
    /// fractions are undefined.
    #[error("table '{table}' has no distinct '{unique_id}' entities; outlier fractions are undefined")]
    NoEntities {
        /// Source table name.
        table: String,
        /// Entity-identifier column.
        unique_id: String,
    },
    /// The backing store failed while loading or aggregating.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// The run configuration could not be parsed.
    #[error("invalid run configuration: {0}")]
    Config(String),
}

/// A strategy that classifies one longitudinal table and materializes the
/// resulting split.
pub trait TableSplitter {
    /// Classify columns per `config` and create the derived tables.
    fn split(
        &self,
        store: &mut dyn StoreLike,
        config: &SplitConfig,
        diagnostics: &mut Diagnostics,
    ) -> Result<SplitOutcome, SplitError>;
}

/// Run the strategy selected by `config.strategy`.
pub fn split_table(
    store: &mut dyn StoreLike,
    config: &SplitConfig,
    diagnostics: &mut Diagnostics,
) -> Result<SplitOutcome, SplitError> {
    match config.strategy {
        Strategy::ServerSide => server_side::ServerSideSplitter.split(store, config, diagnostics),
        Strategy::InMemory => in_memory::InMemorySplitter.split(store, config, diagnostics),
    }
}
