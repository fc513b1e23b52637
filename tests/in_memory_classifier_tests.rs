use pgsplit::classifier::diagnostics::Diagnostics;
use pgsplit::classifier::in_memory::{classify_frame, InMemorySplitter};
use pgsplit::classifier::outcome::{MaterializationStatus, SplitConfig, Strategy};
use pgsplit::classifier::{SplitError, TableSplitter};
use pgsplit::store::frame::{Frame, Value};
use pgsplit::store::RecordingStore;

mod support;
use support::{visits_frame, FakeStore};

fn classify(
    frame: &Frame,
    tolerance: f64,
) -> (Vec<String>, Vec<String>, Diagnostics) {
    let mut diagnostics = Diagnostics::new();
    let (classification, _profiles) =
        classify_frame(frame, "visits", "patient_id", tolerance, &mut diagnostics)
            .expect("classification should succeed");
    (
        classification.invariant_columns,
        classification.variant_columns,
        diagnostics,
    )
}

#[test]
fn constant_sex_and_varying_weight_split_as_expected() {
    // Sex is constant per patient, weight varies per visit.
    let frame = visits_frame(1000, 0);
    let (invariant, variant, diagnostics) = classify(&frame, 0.01);

    assert_eq!(invariant, vec!["sex".to_string()]);
    assert_eq!(variant, vec!["weight".to_string()]);
    assert_eq!(diagnostics.warnings().count(), 0);
}

#[test]
fn single_conflicting_patient_stays_invariant_with_warning() {
    // 1 of 1000 patients has two sex values recorded.
    let frame = visits_frame(1000, 1);
    let (invariant, variant, diagnostics) = classify(&frame, 0.01);

    assert_eq!(invariant, vec!["sex".to_string()]);
    assert_eq!(variant, vec!["weight".to_string()]);

    let warning = diagnostics
        .warnings()
        .next()
        .expect("borderline column should warn");
    assert!(warning.message.contains("sex"));
    assert!(warning.message.contains("0.10%"));
}

#[test]
fn widespread_conflicts_reclassify_the_column_as_variant() {
    // 50 of 1000 patients conflict; 0.05 > 0.01.
    let frame = visits_frame(1000, 50);
    let (invariant, variant, _diagnostics) = classify(&frame, 0.01);

    assert!(invariant.is_empty());
    assert_eq!(
        variant,
        vec!["sex".to_string(), "weight".to_string()]
    );
}

#[test]
fn partition_is_total_over_non_identifier_columns() {
    let frame = visits_frame(100, 7);
    for tolerance in [0.0, 0.01, 0.07, 0.5, 1.0] {
        let (invariant, variant, _diagnostics) = classify(&frame, tolerance);
        let mut all: Vec<String> = invariant.clone();
        all.extend(variant.clone());
        all.sort();
        assert_eq!(all, vec!["sex".to_string(), "weight".to_string()]);
        assert!(invariant.iter().all(|c| !variant.contains(c)));
    }
}

#[test]
fn raising_tolerance_never_moves_a_column_out_of_invariant() {
    let frame = visits_frame(1000, 30);
    let tolerances = [0.0, 0.01, 0.03, 0.5, 1.0];

    let mut previous: Vec<String> = Vec::new();
    for tolerance in tolerances {
        let (invariant, _variant, _diagnostics) = classify(&frame, tolerance);
        assert!(
            previous.iter().all(|column| invariant.contains(column)),
            "tolerance {tolerance} dropped a previously invariant column"
        );
        previous = invariant;
    }
}

#[test]
fn fraction_exactly_at_tolerance_is_invariant() {
    // 10 of 1000 patients conflict: fraction 0.01 == tolerance 0.01.
    let frame = visits_frame(1000, 10);
    let (invariant, _variant, diagnostics) = classify(&frame, 0.01);
    assert!(invariant.contains(&"sex".to_string()));
    assert_eq!(diagnostics.warnings().count(), 1);
}

#[test]
fn zero_entities_fail_fast() {
    let empty = Frame::new(vec!["patient_id".to_string(), "sex".to_string()]);
    let mut diagnostics = Diagnostics::new();
    let err = classify_frame(&empty, "visits", "patient_id", 0.01, &mut diagnostics)
        .expect_err("no entities should fail fast");
    assert!(matches!(err, SplitError::NoEntities { .. }));

    // Rows whose identifier is NULL form no entity either.
    let mut null_ids = Frame::new(vec!["patient_id".to_string(), "sex".to_string()]);
    null_ids
        .push_row(vec![Value::Null, Value::Text("F".into())])
        .unwrap();
    let err = classify_frame(&null_ids, "visits", "patient_id", 0.01, &mut diagnostics)
        .expect_err("null-only identifiers should fail fast");
    assert!(matches!(err, SplitError::NoEntities { .. }));
}

fn in_memory_config() -> SplitConfig {
    let mut config = SplitConfig::new("visits", "patient_id");
    config.strategy = Strategy::InMemory;
    config
}

#[test]
fn splitter_writes_local_tables_with_replace_semantics() {
    let mut store = FakeStore {
        frame: Some(visits_frame(10, 0)),
        ..FakeStore::default()
    };
    let mut diagnostics = Diagnostics::new();

    let outcome = InMemorySplitter
        .split(&mut store, &in_memory_config(), &mut diagnostics)
        .expect("split should succeed");

    assert_eq!(
        outcome.invariant_table,
        MaterializationStatus::Created {
            table: "visits_time_invariant_local".to_string()
        }
    );
    assert_eq!(
        outcome.variant_table,
        MaterializationStatus::Created {
            table: "visits_time_variant_local".to_string()
        }
    );
    assert!(outcome.failed_columns.is_empty());
    assert!(!outcome.is_partial());

    // Replace semantics: drop, create, insert for each side.
    assert!(store
        .executed
        .iter()
        .any(|sql| sql == "DROP TABLE IF EXISTS visits_time_invariant_local;"));
    assert!(store
        .executed
        .iter()
        .any(|sql| sql.starts_with("CREATE TABLE visits_time_invariant_local ")));
    assert!(store
        .executed
        .iter()
        .any(|sql| sql.starts_with("INSERT INTO visits_time_variant_local ")));

    // One representative row per patient on the invariant side.
    let invariant_insert = store
        .executed
        .iter()
        .find(|sql| sql.starts_with("INSERT INTO visits_time_invariant_local "))
        .expect("invariant insert should exist");
    assert_eq!(invariant_insert.matches('(').count() - 1, 10);
}

#[test]
fn splitter_is_repeatable_with_identical_statements() {
    let frame = visits_frame(10, 0);
    let config = in_memory_config();

    let mut first_store = FakeStore {
        frame: Some(frame.clone()),
        ..FakeStore::default()
    };
    let mut second_store = FakeStore {
        frame: Some(frame),
        ..FakeStore::default()
    };

    let mut diagnostics = Diagnostics::new();
    InMemorySplitter
        .split(&mut first_store, &config, &mut diagnostics)
        .expect("first run should succeed");
    InMemorySplitter
        .split(&mut second_store, &config, &mut diagnostics)
        .expect("second run should succeed");

    // The replace form makes a rerun produce the same content, not more.
    assert_eq!(first_store.executed, second_store.executed);
}

#[test]
fn load_failure_aborts_the_whole_call() {
    let mut store = FakeStore {
        fetch_error: Some("connection reset".to_string()),
        ..FakeStore::default()
    };
    let mut diagnostics = Diagnostics::new();

    let err = InMemorySplitter
        .split(&mut store, &in_memory_config(), &mut diagnostics)
        .expect_err("load failure should abort");
    assert!(matches!(err, SplitError::Store(_)));
    assert!(store.executed.is_empty());
}

#[test]
fn empty_variant_side_is_skipped_with_a_warning() {
    // Single visit per patient: every column is trivially invariant.
    let mut frame = Frame::new(vec!["patient_id".to_string(), "sex".to_string()]);
    frame
        .push_row(vec![Value::Int(1), Value::Text("F".into())])
        .unwrap();
    frame
        .push_row(vec![Value::Int(2), Value::Text("M".into())])
        .unwrap();

    let mut store = FakeStore {
        frame: Some(frame),
        ..FakeStore::default()
    };
    let mut diagnostics = Diagnostics::new();

    let outcome = InMemorySplitter
        .split(&mut store, &in_memory_config(), &mut diagnostics)
        .expect("split should succeed");

    assert_eq!(outcome.variant_table, MaterializationStatus::SkippedEmpty);
    assert!(matches!(
        outcome.invariant_table,
        MaterializationStatus::Created { .. }
    ));
    assert!(diagnostics
        .warnings()
        .any(|record| record.message.contains("Skipping creation")));
}

#[test]
fn recorded_statement_log_reflects_local_replace_semantics() {
    let mut store = FakeStore {
        frame: Some(visits_frame(5, 0)),
        ..FakeStore::default()
    };
    let mut recorder = RecordingStore::new(&mut store);
    let mut diagnostics = Diagnostics::new();

    InMemorySplitter
        .split(&mut recorder, &in_memory_config(), &mut diagnostics)
        .expect("split should succeed");
    let log = recorder.into_log();

    // In-memory runs count nothing on the server and never touch the
    // server-side derived tables; the log carries only the replace batch.
    assert!(log
        .iter()
        .any(|sql| sql == "DROP TABLE IF EXISTS visits_time_invariant_local;"));
    assert!(log
        .iter()
        .any(|sql| sql.starts_with("CREATE TABLE visits_time_variant_local")));
    assert!(log
        .iter()
        .any(|sql| sql.starts_with("INSERT INTO visits_time_invariant_local")));
    assert!(!log.iter().any(|sql| sql.starts_with("SELECT COUNT")));
    assert!(!log.iter().any(|sql| sql.contains("CREATE TABLE IF NOT EXISTS")));
}

#[test]
fn loaded_column_headers_are_normalized_before_write_back() {
    let mut frame = Frame::new(vec!["patient_id".to_string(), "Visit Weight".to_string()]);
    frame
        .push_row(vec![Value::Int(1), Value::Float(60.0)])
        .unwrap();
    frame
        .push_row(vec![Value::Int(1), Value::Float(62.5)])
        .unwrap();

    let mut store = FakeStore {
        frame: Some(frame),
        ..FakeStore::default()
    };
    let mut diagnostics = Diagnostics::new();

    let outcome = InMemorySplitter
        .split(&mut store, &in_memory_config(), &mut diagnostics)
        .expect("split should succeed");

    assert_eq!(
        outcome.classification.variant_columns,
        vec!["visit_weight".to_string()]
    );
    assert!(store
        .executed
        .iter()
        .any(|sql| sql.contains("\"visit_weight\"")));
}

#[test]
fn unsafe_loaded_column_names_are_fatal() {
    // Hyphens and spaces are normalized away after loading; a semicolon
    // survives cleaning and must still be fatal.
    let mut frame = Frame::new(vec!["patient_id".to_string(), "bad;col".to_string()]);
    frame
        .push_row(vec![Value::Int(1), Value::Text("x".into())])
        .unwrap();

    let mut store = FakeStore {
        frame: Some(frame),
        ..FakeStore::default()
    };
    let mut diagnostics = Diagnostics::new();

    let err = InMemorySplitter
        .split(&mut store, &in_memory_config(), &mut diagnostics)
        .expect_err("unsafe column name should abort");
    assert!(matches!(err, SplitError::InvalidIdentifiers(_)));
}
