use std::thread;
use std::time::Duration;

use diesel::connection::SimpleConnection;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Text};

use crate::store::frame::{Frame, Value};
use crate::store::{StoreError, StoreLike};

#[derive(QueryableByName)]
struct CountRow {
    #[diesel(sql_type = BigInt)]
    count: i64,
}

#[derive(QueryableByName)]
struct ColumnRow {
    #[diesel(sql_type = Text)]
    column_name: String,
}

#[derive(QueryableByName)]
struct JsonRow {
    #[diesel(sql_type = Text)]
    row_json: String,
}

/// Store backed by a live `PostgreSQL` connection.
///
/// The connection is owned exclusively by one invocation and closed when the
/// store drops, on every exit path.
pub struct PgStore {
    connection: PgConnection,
}

impl PgStore {
    /// Connect to `database_url` in a single attempt.
    pub fn connect(database_url: &str) -> Result<Self, StoreError> {
        PgConnection::establish(database_url)
            .map(|connection| Self { connection })
            .map_err(|e| StoreError::new("connect", e.to_string()))
    }

    /// Connect with retries, for servers that are still starting up.
    pub fn connect_with_retry(database_url: &str, attempts: u32) -> Result<Self, StoreError> {
        let mut last_error = String::new();
        for _ in 0..attempts {
            match PgConnection::establish(database_url) {
                Ok(connection) => return Ok(Self { connection }),
                Err(error) => {
                    last_error = error.to_string();
                    thread::sleep(Duration::from_millis(200));
                }
            }
        }
        Err(StoreError::new("connect", last_error))
    }
}

impl StoreLike for PgStore {
    fn query_count(&mut self, sql: &str) -> Result<i64, StoreError> {
        // COUNT(...) without an alias arrives under the column name "count".
        let row: CountRow = diesel::sql_query(sql)
            .get_result(&mut self.connection)
            .map_err(|e| StoreError::new("count query", e.to_string()))?;
        Ok(row.count)
    }

    fn execute(&mut self, sql: &str) -> Result<(), StoreError> {
        self.connection
            .batch_execute(sql)
            .map_err(|e| StoreError::new("statement execution", e.to_string()))
    }

    fn table_columns(&mut self, table: &str) -> Result<Vec<String>, StoreError> {
        let rows: Vec<ColumnRow> = diesel::sql_query(
            "SELECT column_name::text AS column_name \
             FROM information_schema.columns \
             WHERE table_schema = 'public' AND table_name = $1 \
             ORDER BY ordinal_position",
        )
        .bind::<Text, _>(table)
        .load(&mut self.connection)
        .map_err(|e| StoreError::new("column introspection", e.to_string()))?;

        Ok(rows.into_iter().map(|row| row.column_name).collect())
    }

    fn fetch_table(&mut self, table: &str) -> Result<Frame, StoreError> {
        let columns = self.table_columns(table)?;
        if columns.is_empty() {
            return Err(StoreError::new(
                "table load",
                format!("table '{table}' has no columns or does not exist"),
            ));
        }

        // One JSON document per row keeps the query shape independent of the
        // table's column types. The caller validates `table` before this
        // point; identifiers cannot be parameterized.
        let sql = format!("SELECT ROW_TO_JSON(t)::text AS row_json FROM {table} t;");
        let rows: Vec<JsonRow> = diesel::sql_query(sql)
            .load(&mut self.connection)
            .map_err(|e| StoreError::new("table load", e.to_string()))?;

        let mut frame = Frame::new(columns.clone());
        for row in rows {
            let decoded: serde_json::Value = serde_json::from_str(&row.row_json)
                .map_err(|e| StoreError::new("row decode", e.to_string()))?;
            let object = decoded
                .as_object()
                .ok_or_else(|| StoreError::new("row decode", "row JSON is not an object"))?;
            let values = columns
                .iter()
                .map(|column| object.get(column).map_or(Value::Null, Value::from_json))
                .collect();
            frame.push_row(values)?;
        }

        Ok(frame)
    }
}
