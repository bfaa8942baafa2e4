//! Weekly activity payloads and their normalization into series frames
//!
//! The cleaning client delivers one JSON array per category group. Each row
//! carries a `week` date and one numeric cell per category:
//!
//! ```text
//! [ { "week": "2023-02-06", "Python": 2, "React": 1 }, ... ]
//! ```

use crate::error::{Result, ServiceError};
use chrono::{DateTime, NaiveDate};
use forecast_core::SeriesFrame;
use serde_json::{Map, Value};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

/// One payload row, keyed by column name
pub type Row = Map<String, Value>;

/// Column holding the row date
pub const DATE_COLUMN: &str = "week";

/// Value column of the total endpoint
pub const TOTAL_COLUMN: &str = "total";

/// Category name the total series is published under
pub const TOTAL_SERIES_NAME: &str = "total_projects";

/// The four families of project series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CategoryGroup {
    Total,
    Line,
    Tech,
    Scope,
}

impl CategoryGroup {
    /// All groups in generation order
    pub const ALL: [CategoryGroup; 4] = [
        CategoryGroup::Total,
        CategoryGroup::Line,
        CategoryGroup::Tech,
        CategoryGroup::Scope,
    ];

    /// Name of the cleaning-client endpoint serving this group
    pub fn endpoint(&self) -> &'static str {
        match self {
            CategoryGroup::Total => "weekly-projects",
            CategoryGroup::Line => "weekly-by-line",
            CategoryGroup::Tech => "weekly-by-tech",
            CategoryGroup::Scope => "weekly-by-scope",
        }
    }

    /// File name of this group's forecast cache
    pub fn cache_file(&self) -> &'static str {
        match self {
            CategoryGroup::Total => "projects_total_forecast.json",
            CategoryGroup::Line => "projects_line_forecast.json",
            CategoryGroup::Tech => "projects_tech_forecast.json",
            CategoryGroup::Scope => "projects_scope_forecast.json",
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            CategoryGroup::Total => "total",
            CategoryGroup::Line => "line",
            CategoryGroup::Tech => "tech",
            CategoryGroup::Scope => "scope",
        }
    }
}

impl fmt::Display for CategoryGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for CategoryGroup {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self> {
        CategoryGroup::ALL
            .into_iter()
            .find(|group| group.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ServiceError::Source(format!("Unknown category group: {}", s)))
    }
}

/// Supplier of raw weekly rows for a category group
pub trait HistorySource {
    /// Fetch the rows of one group, in delivery order
    fn fetch(&self, group: CategoryGroup) -> Result<Vec<Row>>;
}

/// Reads `<dir>/<endpoint>.json` exports of the cleaning client
#[derive(Debug, Clone)]
pub struct JsonDirSource {
    dir: PathBuf,
}

impl JsonDirSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, group: CategoryGroup) -> PathBuf {
        self.dir.join(format!("{}.json", group.endpoint()))
    }
}

impl HistorySource for JsonDirSource {
    fn fetch(&self, group: CategoryGroup) -> Result<Vec<Row>> {
        let path = self.path(group);
        let text = fs::read_to_string(&path).map_err(|err| {
            ServiceError::Source(format!("Cannot read {}: {}", path.display(), err))
        })?;

        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&text)?)
    }
}

/// Accepts `YYYY-MM-DD` or a full RFC 3339 timestamp
fn parse_row_date(value: &Value) -> Option<NaiveDate> {
    let text = value.as_str()?.trim();
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(text).ok().map(|dt| dt.date_naive()))
}

/// Missing and null cells are gaps; anything non-numeric is malformed
fn parse_cell(value: Option<&Value>) -> Option<f64> {
    match value {
        None | Some(Value::Null) => None,
        Some(Value::Number(number)) => Some(number.as_f64().unwrap_or(f64::NAN)),
        Some(_) => Some(f64::NAN),
    }
}

/// Build a date-sorted frame from raw rows.
///
/// Rows without a parseable date are dropped. The total group keeps only its
/// `total` column, renamed to `total_projects`; other groups keep every column
/// in order of first appearance. Malformed cells become NaN so the affected
/// category fails on its own later.
pub fn normalize_frame(group: CategoryGroup, rows: &[Row]) -> Result<SeriesFrame> {
    let mut dated: Vec<(NaiveDate, &Row)> = Vec::with_capacity(rows.len());
    for row in rows {
        match row.get(DATE_COLUMN).and_then(parse_row_date) {
            Some(date) => dated.push((date, row)),
            None => debug!(%group, "dropping row without a valid date"),
        }
    }
    dated.sort_by_key(|(date, _)| *date);

    let mut columns: Vec<(String, String)> = Vec::new();
    for (_, row) in &dated {
        for key in row.keys() {
            if key == DATE_COLUMN || columns.iter().any(|(source, _)| source == key) {
                continue;
            }
            match group {
                CategoryGroup::Total if key == TOTAL_COLUMN => {
                    columns.push((key.clone(), TOTAL_SERIES_NAME.to_string()))
                }
                CategoryGroup::Total => {}
                _ => columns.push((key.clone(), key.clone())),
            }
        }
    }

    let mut frame = SeriesFrame::new(dated.iter().map(|(date, _)| *date).collect());
    for (source, name) in columns {
        let values = dated
            .iter()
            .map(|(_, row)| parse_cell(row.get(&source)))
            .collect();
        frame.push_column(name, values)?;
    }

    debug!(
        %group,
        rows = frame.dates().len(),
        columns = frame.columns().len(),
        "normalized history"
    );
    Ok(frame)
}
