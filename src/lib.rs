//! Split longitudinal `PostgreSQL` tables into time-invariant and time-variant tables.
#![warn(missing_docs)]

/// Invariance classification: strategies, run configuration, outcomes, and diagnostics.
pub mod classifier;
/// Generated SQL statements, derived-table materialization, and provisioning DDL.
pub mod generator;
/// SQL identifier validation and column-name cleaning.
pub mod identifiers;
/// Markdown split reports, output-directory writing, and `.env` URL updates.
pub mod output;
/// Store access seam: the `StoreLike` trait, in-memory frames, and the `PostgreSQL` backend.
pub mod store;
