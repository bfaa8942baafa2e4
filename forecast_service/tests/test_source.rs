use chrono::NaiveDate;
use forecast_service::source::TOTAL_SERIES_NAME;
use forecast_service::{
    normalize_frame, CategoryGroup, HistorySource, JsonDirSource, Row, ServiceError,
};
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::json;
use std::fs;
use tempfile::TempDir;

fn date(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

#[rstest]
#[case(CategoryGroup::Total, "weekly-projects", "projects_total_forecast.json")]
#[case(CategoryGroup::Line, "weekly-by-line", "projects_line_forecast.json")]
#[case(CategoryGroup::Tech, "weekly-by-tech", "projects_tech_forecast.json")]
#[case(CategoryGroup::Scope, "weekly-by-scope", "projects_scope_forecast.json")]
fn test_group_names(#[case] group: CategoryGroup, #[case] endpoint: &str, #[case] cache: &str) {
    assert_eq!(group.endpoint(), endpoint);
    assert_eq!(group.cache_file(), cache);
}

#[test]
fn test_json_dir_source_reads_endpoint_file() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("weekly-by-tech.json"),
        r#"[{"week": "2023-02-06", "Python": 2, "React": null}]"#,
    )
    .unwrap();

    let source = JsonDirSource::new(dir.path());
    let rows = source.fetch(CategoryGroup::Tech).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["Python"], json!(2));
}

#[test]
fn test_json_dir_source_missing_file() {
    let dir = TempDir::new().unwrap();
    let source = JsonDirSource::new(dir.path());

    let result = source.fetch(CategoryGroup::Line);
    assert!(matches!(result, Err(ServiceError::Source(_))));
}

#[test]
fn test_json_dir_source_empty_file() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("weekly-by-scope.json"), "  \n").unwrap();

    let source = JsonDirSource::new(dir.path());
    assert!(source.fetch(CategoryGroup::Scope).unwrap().is_empty());
}

#[test]
fn test_json_dir_source_invalid_json() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("weekly-projects.json"), "{not json").unwrap();

    let source = JsonDirSource::new(dir.path());
    let result = source.fetch(CategoryGroup::Total);
    assert!(matches!(result, Err(ServiceError::Json(_))));
}

#[test]
fn test_normalize_sorts_and_drops_bad_dates() {
    let rows: Vec<Row> = serde_json::from_value(json!([
        { "week": "2023-03-06", "Line A": 3, "Line B": 1 },
        { "week": "not a date", "Line A": 99 },
        { "week": "2023-02-06", "Line A": 2 },
        { "Line A": 50 },
    ]))
    .unwrap();

    let frame = normalize_frame(CategoryGroup::Line, &rows).unwrap();
    assert_eq!(frame.dates(), &[date("2023-02-06"), date("2023-03-06")]);

    let names: Vec<&str> = frame.columns().iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Line A", "Line B"]);
    assert_eq!(frame.columns()[0].values, vec![Some(2.0), Some(3.0)]);
    assert_eq!(frame.columns()[1].values, vec![None, Some(1.0)]);
}

#[test]
fn test_normalize_total_renames_column() {
    let rows: Vec<Row> = serde_json::from_value(json!([
        { "week": "2023-02-06", "total": 4 },
        { "week": "2023-02-13", "total": 6 },
    ]))
    .unwrap();

    let frame = normalize_frame(CategoryGroup::Total, &rows).unwrap();
    assert_eq!(frame.columns().len(), 1);
    assert_eq!(frame.columns()[0].name, TOTAL_SERIES_NAME);
}

#[test]
fn test_normalize_marks_non_numeric_cells() {
    let rows: Vec<Row> = serde_json::from_value(json!([
        { "week": "2023-02-06", "Python": "many" },
    ]))
    .unwrap();

    let frame = normalize_frame(CategoryGroup::Tech, &rows).unwrap();
    let cell = frame.columns()[0].values[0];
    assert!(cell.map_or(false, f64::is_nan));
}

#[test]
fn test_normalize_empty_payload() {
    let frame = normalize_frame(CategoryGroup::Scope, &[]).unwrap();
    assert!(frame.is_empty());
}
