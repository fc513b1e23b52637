use std::path::{Component, Path};

/// Write the run artifacts to the output directory.
///
/// Produces `<name>_report.md` and `<name>_statements.sql`.
pub fn write_output(
    output_dir: &Path,
    name: &str,
    report: &str,
    statements: &[String],
) -> Result<(), String> {
    validate_output_name(name)?;

    std::fs::create_dir_all(output_dir)
        .map_err(|e| format!("Failed to create output directory: {e}"))?;

    let report_path = output_dir.join(format!("{name}_report.md"));
    std::fs::write(&report_path, report)
        .map_err(|e| format!("Failed to write {}: {e}", report_path.display()))?;

    let statements_path = output_dir.join(format!("{name}_statements.sql"));
    let statements_content = format_statements(statements);
    std::fs::write(&statements_path, &statements_content)
        .map_err(|e| format!("Failed to write {}: {e}", statements_path.display()))?;

    Ok(())
}

/// Join generated statements one per line with a trailing newline.
pub fn format_statements(statements: &[String]) -> String {
    let mut out = String::new();
    for statement in statements {
        out.push_str(statement);
        out.push('\n');
    }
    out
}

fn validate_output_name(name: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("Output name must not be empty".to_string());
    }
    let candidate = Path::new(name);
    if candidate.is_absolute() {
        return Err(format!(
            "Invalid output name '{name}': absolute paths are not allowed"
        ));
    }
    if candidate.components().any(|component| {
        matches!(
            component,
            Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    }) {
        return Err(format!(
            "Invalid output name '{name}': traversal segments are not allowed"
        ));
    }
    if name.contains('/') || name.contains('\\') {
        return Err(format!(
            "Invalid output name '{name}': path separators are not allowed"
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn unique_path(prefix: &str) -> std::path::PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be monotonic")
            .as_nanos();
        std::env::temp_dir().join(format!("{prefix}_{nanos}"))
    }

    #[test]
    fn write_output_reports_directory_creation_errors() {
        let path = unique_path("pgsplit_formatter_file");
        std::fs::write(&path, "not a directory").expect("should create marker file");

        let err = write_output(&path, "visits", "# report", &[])
            .expect_err("directory creation should fail");
        assert!(err.contains("Failed to create output directory"));
    }

    #[test]
    fn write_output_rejects_unsafe_name_paths() {
        let dir = unique_path("pgsplit_formatter_dir");
        std::fs::create_dir_all(&dir).expect("should create temp directory");

        let err = write_output(&dir, "nested/visits", "# report", &[])
            .expect_err("unsafe output name should fail validation");
        assert!(err.contains("Invalid output name"));

        let err = write_output(&dir, "../escape", "# report", &[])
            .expect_err("path traversal should fail validation");
        assert!(err.contains("Invalid output name"));
    }

    #[test]
    fn write_output_writes_all_artifacts_on_success() {
        let dir = unique_path("pgsplit_formatter_ok");
        let statements = vec!["SELECT 1;".to_string(), "SELECT 2;".to_string()];

        write_output(&dir, "visits", "# pgsplit Split Report", &statements)
            .expect("write_output should succeed");

        let report = std::fs::read_to_string(dir.join("visits_report.md"))
            .expect("report should exist");
        let sql = std::fs::read_to_string(dir.join("visits_statements.sql"))
            .expect("statements file should exist");

        assert!(report.contains("# pgsplit Split Report"));
        assert_eq!(sql, "SELECT 1;\nSELECT 2;\n");
    }
}
