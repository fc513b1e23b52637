/// Derived-table creation and local frame write-back.
pub mod materializer;
/// Database provisioning DDL and runner.
pub mod provisioning;
/// Value-based SQL column-type inference.
pub mod sql_types;
/// Generated SQL statement shapes.
pub mod statements;
