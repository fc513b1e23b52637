#![allow(dead_code)]

use std::collections::HashMap;

use pgsplit::store::frame::{Frame, Value};
use pgsplit::store::{StoreError, StoreLike};

/// Scripted store for exercising strategies without a live database.
///
/// Count queries are answered from a script keyed by exact SQL text (the
/// tests build keys with the same statement generators the classifier
/// uses), and every executed statement is recorded for inspection.
#[derive(Debug, Default)]
pub struct FakeStore {
    /// Scripted responses for count queries.
    pub counts: HashMap<String, i64>,
    /// Count queries that must fail, with their error message.
    pub failing_counts: HashMap<String, String>,
    /// Introspected column names, in ordinal order.
    pub columns: Vec<String>,
    /// Full table content for `fetch_table`.
    pub frame: Option<Frame>,
    /// Error returned by `fetch_table` instead of the frame.
    pub fetch_error: Option<String>,
    /// Statements that fail `execute` when the SQL contains this text.
    pub failing_execute_containing: Option<String>,
    /// Every executed statement, in order.
    pub executed: Vec<String>,
    /// Every count query consulted, in order.
    pub count_queries: Vec<String>,
}

impl StoreLike for FakeStore {
    fn query_count(&mut self, sql: &str) -> Result<i64, StoreError> {
        self.count_queries.push(sql.to_string());
        if let Some(message) = self.failing_counts.get(sql) {
            return Err(StoreError::new("count query", message.clone()));
        }
        self.counts
            .get(sql)
            .copied()
            .ok_or_else(|| StoreError::new("count query", format!("unscripted query: {sql}")))
    }

    fn execute(&mut self, sql: &str) -> Result<(), StoreError> {
        if let Some(fragment) = &self.failing_execute_containing {
            if sql.contains(fragment.as_str()) {
                return Err(StoreError::new("statement execution", "scripted failure"));
            }
        }
        self.executed.push(sql.to_string());
        Ok(())
    }

    fn table_columns(&mut self, _table: &str) -> Result<Vec<String>, StoreError> {
        Ok(self.columns.clone())
    }

    fn fetch_table(&mut self, table: &str) -> Result<Frame, StoreError> {
        if let Some(message) = &self.fetch_error {
            return Err(StoreError::new("table load", message.clone()));
        }
        self.frame
            .clone()
            .ok_or_else(|| StoreError::new("table load", format!("no frame scripted for {table}")))
    }
}

/// Longitudinal fixture: two visits per patient, `sex` constant except for
/// the first `conflicting_sex` patients, `weight` different on every visit.
pub fn visits_frame(patients: i64, conflicting_sex: i64) -> Frame {
    let mut frame = Frame::new(vec![
        "patient_id".to_string(),
        "sex".to_string(),
        "weight".to_string(),
    ]);

    for patient in 0..patients {
        let first_sex = if patient % 2 == 0 { "F" } else { "M" };
        let second_sex = if patient < conflicting_sex {
            // Data-entry error: a different value on the second visit.
            if first_sex == "F" {
                "M"
            } else {
                "F"
            }
        } else {
            first_sex
        };

        frame
            .push_row(vec![
                Value::Int(patient),
                Value::Text(first_sex.to_string()),
                Value::Float(60.0 + patient as f64),
            ])
            .expect("fixture rows should match arity");
        frame
            .push_row(vec![
                Value::Int(patient),
                Value::Text(second_sex.to_string()),
                Value::Float(61.0 + patient as f64),
            ])
            .expect("fixture rows should match arity");
    }

    frame
}
