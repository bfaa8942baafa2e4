//! Records flowing through the forecasting pipeline

use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A raw dated count as delivered by the cleaning client
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub date: NaiveDate,
    pub value: f64,
}

impl Observation {
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self { date, value }
    }
}

/// An integer-rounded historical count, as published alongside a forecast
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoricalPoint {
    pub date: NaiveDate,
    pub value: i64,
}

impl HistoricalPoint {
    /// Round a raw observation, clamping negative counts to zero
    pub fn from_observation(observation: &Observation) -> Self {
        let value = if observation.value.is_finite() {
            observation.value.max(0.0).round() as i64
        } else {
            0
        };
        Self {
            date: observation.date,
            value,
        }
    }
}

/// One point of a variance-stabilized series
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreparedPoint {
    pub date: NaiveDate,
    /// `ln(1 + value)`
    pub transformed: f64,
}

/// Date-ordered, log1p-transformed history of a single category
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreparedSeries {
    points: Vec<PreparedPoint>,
}

impl PreparedSeries {
    pub(crate) fn new(points: Vec<PreparedPoint>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[PreparedPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.date).collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.transformed).collect()
    }

    pub fn last(&self) -> Option<&PreparedPoint> {
        self.points.last()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.last().map(|p| p.date)
    }
}

/// A single forecasted semester
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub value: i64,
    pub lower: i64,
    pub upper: i64,
    pub confidence_pct: f64,
}

/// History and forecast of one named category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryForecast {
    pub name: String,
    pub history: Vec<HistoricalPoint>,
    pub forecasting: Vec<ForecastPoint>,
    /// Number of future semesters forecast
    #[serde(rename = "semesters")]
    pub horizon: usize,
}

/// A named column of a wide frame, with missing cells
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesColumn {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

/// Date-indexed table of several category series sharing one date column
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeriesFrame {
    dates: Vec<NaiveDate>,
    columns: Vec<SeriesColumn>,
}

impl SeriesFrame {
    /// Create a frame with a date column and no value columns
    pub fn new(dates: Vec<NaiveDate>) -> Self {
        Self {
            dates,
            columns: Vec::new(),
        }
    }

    /// Append a value column; it must have one cell per date
    pub fn push_column(&mut self, name: impl Into<String>, values: Vec<Option<f64>>) -> Result<()> {
        let name = name.into();
        if values.len() != self.dates.len() {
            return Err(ForecastError::InvalidSeries(format!(
                "Column '{}' has {} cells but the frame has {} dates",
                name,
                values.len(),
                self.dates.len()
            )));
        }
        self.columns.push(SeriesColumn { name, values });
        Ok(())
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn columns(&self) -> &[SeriesColumn] {
        &self.columns
    }

    /// True when the frame has no rows or no value columns
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty() || self.columns.is_empty()
    }

    /// Observations of one column with missing cells filled as zero
    pub fn observations(&self, column: &SeriesColumn) -> Vec<Observation> {
        self.dates
            .iter()
            .zip(&column.values)
            .map(|(date, value)| Observation::new(*date, value.unwrap_or(0.0)))
            .collect()
    }
}
