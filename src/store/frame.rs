use std::collections::{HashMap, HashSet};

use crate::store::StoreError;

/// A single cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// SQL NULL.
    Null,
    /// Boolean.
    Bool(bool),
    /// Integral number.
    Int(i64),
    /// Floating-point number.
    Float(f64),
    /// Text or any value without a more specific representation.
    Text(String),
}

impl Value {
    /// Canonical key for distinct-value counting; `None` for NULL.
    ///
    /// NULLs never count as a distinct value, matching `COUNT(DISTINCT ...)`
    /// on the server side.
    pub fn distinct_key(&self) -> Option<String> {
        match self {
            Value::Null => None,
            Value::Bool(b) => Some(format!("b:{b}")),
            Value::Int(i) => Some(format!("i:{i}")),
            Value::Float(f) => Some(format!("f:{f}")),
            Value::Text(s) => Some(format!("t:{s}")),
        }
    }

    /// Render as a SQL literal for generated INSERT statements.
    pub fn to_sql_literal(&self) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            Value::Bool(true) => "TRUE".to_string(),
            Value::Bool(false) => "FALSE".to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Text(s) => format!("'{}'", s.replace('\'', "''")),
        }
    }

    /// Convert a decoded JSON cell into a `Value`.
    ///
    /// Integral JSON numbers become [`Value::Int`]; composite JSON (arrays,
    /// objects) is kept as its text rendering.
    pub fn from_json(value: &serde_json::Value) -> Value {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map(Value::Int)
                .or_else(|| n.as_f64().map(Value::Float))
                .unwrap_or_else(|| Value::Text(n.to_string())),
            serde_json::Value::String(s) => Value::Text(s.clone()),
            other => Value::Text(other.to_string()),
        }
    }
}

/// Row groups sharing one entity-identifier value.
///
/// Groups are ordered by first appearance; rows with a NULL identifier are
/// dropped, so they belong to no entity.
#[derive(Debug, Clone)]
pub struct EntityGroups {
    groups: Vec<Vec<usize>>,
}

impl EntityGroups {
    /// Number of distinct entities.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// True when the table holds no entity at all.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Row indices per entity, in first-appearance order.
    pub fn row_indices(&self) -> &[Vec<usize>] {
        &self.groups
    }
}

/// Column-ordered in-memory snapshot of a table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Frame {
    /// Empty frame with the given column names.
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Append one row; its arity must match the column count.
    pub fn push_row(&mut self, row: Vec<Value>) -> Result<(), StoreError> {
        if row.len() != self.columns.len() {
            return Err(StoreError::new(
                "frame append",
                format!(
                    "row has {} values but the frame has {} columns",
                    row.len(),
                    self.columns.len()
                ),
            ));
        }
        self.rows.push(row);
        Ok(())
    }

    /// Column names in table order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// All rows in original order.
    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Position of `name` among the columns.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    fn require_column(&self, name: &str) -> Result<usize, StoreError> {
        self.column_index(name).ok_or_else(|| {
            StoreError::new("frame lookup", format!("column '{name}' not present in frame"))
        })
    }

    /// Group rows by the value of the `unique_id` column.
    pub fn entity_groups(&self, unique_id: &str) -> Result<EntityGroups, StoreError> {
        let id_index = self.require_column(unique_id)?;

        let mut groups: Vec<Vec<usize>> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();

        for (row_index, row) in self.rows.iter().enumerate() {
            let Some(key) = row[id_index].distinct_key() else {
                continue;
            };
            match positions.get(&key) {
                Some(&group) => groups[group].push(row_index),
                None => {
                    positions.insert(key, groups.len());
                    groups.push(vec![row_index]);
                }
            }
        }

        Ok(EntityGroups { groups })
    }

    /// Number of entities for which `column` holds more than one distinct
    /// non-null value.
    pub fn outlier_entities(
        &self,
        groups: &EntityGroups,
        column: &str,
    ) -> Result<usize, StoreError> {
        let column_index = self.require_column(column)?;

        let mut outliers = 0;
        for rows in groups.row_indices() {
            let mut distinct: HashSet<String> = HashSet::new();
            for &row_index in rows {
                if let Some(key) = self.rows[row_index][column_index].distinct_key() {
                    distinct.insert(key);
                    if distinct.len() > 1 {
                        break;
                    }
                }
            }
            if distinct.len() > 1 {
                outliers += 1;
            }
        }

        Ok(outliers)
    }

    /// Project onto `columns`, preserving the requested order and all rows.
    pub fn project(&self, columns: &[String]) -> Result<Frame, StoreError> {
        let indices: Vec<usize> = columns
            .iter()
            .map(|c| self.require_column(c))
            .collect::<Result<_, _>>()?;

        let rows = self
            .rows
            .iter()
            .map(|row| indices.iter().map(|&i| row[i].clone()).collect())
            .collect();

        Ok(Frame {
            columns: columns.to_vec(),
            rows,
        })
    }

    /// Keep the first row per entity, in original row order.
    ///
    /// This is the in-memory representative-row rule; the server-side rule
    /// orders by the identifier instead, and the two are implementation-
    /// defined rather than reconciled.
    pub fn first_rows_per_entity(&self, unique_id: &str) -> Result<Frame, StoreError> {
        let groups = self.entity_groups(unique_id)?;
        let mut first_rows: Vec<usize> = groups
            .row_indices()
            .iter()
            .map(|rows| rows[0])
            .collect();
        first_rows.sort_unstable();

        let rows = first_rows
            .into_iter()
            .map(|index| self.rows[index].clone())
            .collect();

        Ok(Frame {
            columns: self.columns.clone(),
            rows,
        })
    }

    /// Replace the column names, preserving positional order.
    pub fn rename_columns(&mut self, columns: Vec<String>) -> Result<(), StoreError> {
        if columns.len() != self.columns.len() {
            return Err(StoreError::new(
                "frame rename",
                format!(
                    "{} names offered for {} columns",
                    columns.len(),
                    self.columns.len()
                ),
            ));
        }
        self.columns = columns;
        Ok(())
    }

    /// Values of `column` in row order.
    pub fn column_values(&self, column: &str) -> Result<Vec<&Value>, StoreError> {
        let index = self.require_column(column)?;
        Ok(self.rows.iter().map(|row| &row[index]).collect())
    }
}
