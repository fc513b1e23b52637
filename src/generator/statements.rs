//! Generated SQL statement shapes.
//!
//! Every function here splices pre-validated identifiers into statement
//! text; callers must run names through [`crate::identifiers`] first. The
//! aggregation and `CREATE TABLE ... AS` shapes are compatibility-relevant
//! and covered by exact-text tests.

use crate::store::frame::Frame;

use super::sql_types::infer_sql_type;

/// Rows per generated INSERT statement when writing frames back.
const INSERT_CHUNK_ROWS: usize = 500;

/// Name of the server-side invariant table.
pub fn invariant_table_name(table: &str) -> String {
    format!("{table}_time_invariant")
}

/// Name of the server-side variant table.
pub fn variant_table_name(table: &str) -> String {
    format!("{table}_time_variant")
}

/// Name of the in-memory strategy's invariant table.
///
/// Carries a distinguishing suffix so both strategies can run against the
/// same source table without colliding.
pub fn local_invariant_table_name(table: &str) -> String {
    format!("{table}_time_invariant_local")
}

/// Name of the in-memory strategy's variant table.
pub fn local_variant_table_name(table: &str) -> String {
    format!("{table}_time_variant_local")
}

fn quoted_column_list(columns: &[String]) -> String {
    columns
        .iter()
        .map(|column| format!("\"{column}\""))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Count of distinct entities: `SELECT COUNT(DISTINCT <id>) FROM <table>`.
pub fn entity_count(table: &str, unique_id: &str) -> String {
    format!("SELECT COUNT(DISTINCT {unique_id}) FROM {table};")
}

/// Count of entities for which `column` takes more than one distinct value.
pub fn outlier_count(table: &str, unique_id: &str, column: &str) -> String {
    format!(
        "SELECT COUNT(*) FROM (SELECT {unique_id} FROM {table} GROUP BY {unique_id} \
         HAVING COUNT(DISTINCT \"{column}\") > 1) AS sub;"
    )
}

/// Create the invariant table: one representative row per entity, chosen by
/// `DISTINCT ON` under the identifier ordering.
pub fn create_invariant_table(table: &str, unique_id: &str, invariant_columns: &[String]) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {name} AS \
         SELECT DISTINCT ON (\"{unique_id}\") \"{unique_id}\", {columns} \
         FROM {table} ORDER BY \"{unique_id}\";",
        name = invariant_table_name(table),
        columns = quoted_column_list(invariant_columns),
    )
}

/// Create the variant table: all original rows, projected to the variant
/// columns.
pub fn create_variant_table(table: &str, unique_id: &str, variant_columns: &[String]) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {name} AS \
         SELECT {unique_id}, {columns} FROM {table};",
        name = variant_table_name(table),
        columns = quoted_column_list(variant_columns),
    )
}

/// Drop a table when present (replace semantics for local write-back).
pub fn drop_table(table: &str) -> String {
    format!("DROP TABLE IF EXISTS {table};")
}

/// CREATE TABLE for a frame, with column types inferred from its values.
pub fn create_table_for_frame(table: &str, frame: &Frame) -> String {
    let columns = frame
        .columns()
        .iter()
        .map(|column| {
            let values = frame
                .column_values(column)
                .unwrap_or_default();
            format!("\"{column}\" {}", infer_sql_type(values.into_iter()))
        })
        .collect::<Vec<_>>()
        .join(", ");
    format!("CREATE TABLE {table} ({columns});")
}

/// Batched INSERT statements for every row of a frame.
pub fn insert_frame(table: &str, frame: &Frame) -> Vec<String> {
    let columns = quoted_column_list(frame.columns());

    frame
        .rows()
        .chunks(INSERT_CHUNK_ROWS)
        .map(|chunk| {
            let values = chunk
                .iter()
                .map(|row| {
                    let literals = row
                        .iter()
                        .map(|value| value.to_sql_literal())
                        .collect::<Vec<_>>()
                        .join(", ");
                    format!("({literals})")
                })
                .collect::<Vec<_>>()
                .join(", ");
            format!("INSERT INTO {table} ({columns}) VALUES {values};")
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::frame::Value;

    #[test]
    fn entity_count_shape_is_exact() {
        assert_eq!(
            entity_count("visits", "patient_id"),
            "SELECT COUNT(DISTINCT patient_id) FROM visits;"
        );
    }

    #[test]
    fn outlier_count_shape_is_exact() {
        assert_eq!(
            outlier_count("visits", "patient_id", "sex"),
            "SELECT COUNT(*) FROM (SELECT patient_id FROM visits GROUP BY patient_id \
             HAVING COUNT(DISTINCT \"sex\") > 1) AS sub;"
        );
    }

    #[test]
    fn invariant_table_ddl_uses_distinct_on_with_identifier_ordering() {
        let columns = vec!["sex".to_string(), "dob".to_string()];
        assert_eq!(
            create_invariant_table("visits", "patient_id", &columns),
            "CREATE TABLE IF NOT EXISTS visits_time_invariant AS \
             SELECT DISTINCT ON (\"patient_id\") \"patient_id\", \"sex\", \"dob\" \
             FROM visits ORDER BY \"patient_id\";"
        );
    }

    #[test]
    fn variant_table_ddl_projects_all_rows() {
        let columns = vec!["weight".to_string()];
        assert_eq!(
            create_variant_table("visits", "patient_id", &columns),
            "CREATE TABLE IF NOT EXISTS visits_time_variant AS \
             SELECT patient_id, \"weight\" FROM visits;"
        );
    }

    #[test]
    fn local_table_names_carry_distinguishing_suffix() {
        assert_eq!(local_invariant_table_name("visits"), "visits_time_invariant_local");
        assert_eq!(local_variant_table_name("visits"), "visits_time_variant_local");
    }

    #[test]
    fn frame_ddl_and_inserts_round_out_replace_semantics() {
        let mut frame = Frame::new(vec!["patient_id".to_string(), "sex".to_string()]);
        frame
            .push_row(vec![Value::Int(1), Value::Text("F".into())])
            .unwrap();
        frame
            .push_row(vec![Value::Int(2), Value::Text("M".into())])
            .unwrap();

        assert_eq!(drop_table("t"), "DROP TABLE IF EXISTS t;");
        assert_eq!(
            create_table_for_frame("t", &frame),
            "CREATE TABLE t (\"patient_id\" INT, \"sex\" TEXT);"
        );
        assert_eq!(
            insert_frame("t", &frame),
            vec![
                "INSERT INTO t (\"patient_id\", \"sex\") VALUES (1, 'F'), (2, 'M');".to_string()
            ]
        );
    }

    #[test]
    fn insert_frame_chunks_large_frames() {
        let mut frame = Frame::new(vec!["n".to_string()]);
        for i in 0..(INSERT_CHUNK_ROWS + 1) {
            frame.push_row(vec![Value::Int(i as i64)]).unwrap();
        }
        let inserts = insert_frame("t", &frame);
        assert_eq!(inserts.len(), 2);
        assert!(inserts[1].ends_with(&format!("({});", INSERT_CHUNK_ROWS)));
    }
}
