use chrono::{NaiveDate, NaiveDateTime};

use crate::store::frame::Value;

fn is_timestamp_text(text: &str) -> bool {
    NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S").is_ok()
        || NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S").is_ok()
        || chrono::DateTime::parse_from_rfc3339(text).is_ok()
        || NaiveDate::parse_from_str(text, "%Y-%m-%d").is_ok()
}

/// Infer a `PostgreSQL` column type from observed values.
///
/// NULLs are ignored. Integral columns map to `INT`, mixed numerics to
/// `FLOAT`, booleans to `BOOLEAN`, text that consistently parses as a date
/// or timestamp to `TIMESTAMP`, and everything else to `TEXT`.
pub fn infer_sql_type<'a>(values: impl Iterator<Item = &'a Value>) -> &'static str {
    let mut seen_any = false;
    let mut all_int = true;
    let mut all_numeric = true;
    let mut all_bool = true;
    let mut all_timestamp_text = true;

    for value in values {
        match value {
            Value::Null => continue,
            Value::Int(_) => {
                all_bool = false;
                all_timestamp_text = false;
            }
            Value::Float(_) => {
                all_int = false;
                all_bool = false;
                all_timestamp_text = false;
            }
            Value::Bool(_) => {
                all_int = false;
                all_numeric = false;
                all_timestamp_text = false;
            }
            Value::Text(text) => {
                all_int = false;
                all_numeric = false;
                all_bool = false;
                if !is_timestamp_text(text) {
                    all_timestamp_text = false;
                }
            }
        }
        seen_any = true;
        if !all_int && !all_numeric && !all_bool && !all_timestamp_text {
            return "TEXT";
        }
    }

    if !seen_any {
        return "TEXT";
    }
    if all_int {
        "INT"
    } else if all_numeric {
        "FLOAT"
    } else if all_bool {
        "BOOLEAN"
    } else if all_timestamp_text {
        "TIMESTAMP"
    } else {
        "TEXT"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn infer(values: &[Value]) -> &'static str {
        infer_sql_type(values.iter())
    }

    #[test]
    fn integral_columns_map_to_int() {
        assert_eq!(infer(&[Value::Int(1), Value::Null, Value::Int(-3)]), "INT");
    }

    #[test]
    fn mixed_numerics_map_to_float() {
        assert_eq!(infer(&[Value::Int(1), Value::Float(2.5)]), "FLOAT");
        assert_eq!(infer(&[Value::Float(0.25)]), "FLOAT");
    }

    #[test]
    fn booleans_map_to_boolean() {
        assert_eq!(infer(&[Value::Bool(true), Value::Bool(false)]), "BOOLEAN");
    }

    #[test]
    fn timestamp_like_text_maps_to_timestamp() {
        assert_eq!(
            infer(&[
                Value::Text("2024-01-01 10:30:00".into()),
                Value::Text("2024-02-03".into()),
            ]),
            "TIMESTAMP"
        );
    }

    #[test]
    fn plain_text_and_empty_columns_map_to_text() {
        assert_eq!(infer(&[Value::Text("F".into()), Value::Text("M".into())]), "TEXT");
        assert_eq!(infer(&[]), "TEXT");
        assert_eq!(infer(&[Value::Null]), "TEXT");
        assert_eq!(infer(&[Value::Int(1), Value::Text("x".into())]), "TEXT");
    }
}
