//! Forecasting models for transformed semester series

use crate::data::PreparedSeries;
use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use std::fmt::Debug;

/// Predictions on the transformed scale, one per requested date
#[derive(Debug, Clone)]
pub struct ForecastResult {
    /// Predicted values
    values: Vec<f64>,
    /// Uncertainty intervals (optional)
    intervals: Option<Vec<(f64, f64)>>,
    /// Dates the predictions belong to
    dates: Vec<NaiveDate>,
}

impl ForecastResult {
    /// Create a new forecast result
    pub fn new(dates: Vec<NaiveDate>, values: Vec<f64>) -> Result<Self> {
        if values.len() != dates.len() {
            return Err(ForecastError::ModelFit(format!(
                "Values length ({}) doesn't match dates ({})",
                values.len(),
                dates.len()
            )));
        }

        Ok(Self {
            values,
            intervals: None,
            dates,
        })
    }

    /// Create a new forecast result with uncertainty intervals
    pub fn new_with_intervals(
        dates: Vec<NaiveDate>,
        values: Vec<f64>,
        intervals: Vec<(f64, f64)>,
    ) -> Result<Self> {
        if values.len() != intervals.len() {
            return Err(ForecastError::ModelFit(format!(
                "Values length ({}) doesn't match intervals length ({})",
                values.len(),
                intervals.len()
            )));
        }

        let mut result = Self::new(dates, values)?;
        result.intervals = Some(intervals);
        Ok(result)
    }

    /// Get the predicted values
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Get the intervals, if available
    pub fn intervals(&self) -> Option<&[(f64, f64)]> {
        self.intervals.as_deref()
    }

    /// Get the dates
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Keep the first `count` rows and the rest as two results
    pub fn split_at(&self, count: usize) -> (ForecastResult, ForecastResult) {
        let count = count.min(self.len());
        let part = |range: std::ops::Range<usize>| ForecastResult {
            values: self.values[range.clone()].to_vec(),
            intervals: self
                .intervals
                .as_ref()
                .map(|intervals| intervals[range.clone()].to_vec()),
            dates: self.dates[range].to_vec(),
        };
        (part(0..count), part(count..self.len()))
    }

    /// Calculate mean absolute error between predictions and actual values
    pub fn mean_absolute_error(&self, actual: &[f64]) -> Result<f64> {
        if self.is_empty() || self.len() != actual.len() {
            return Err(ForecastError::InvalidParameter(format!(
                "Prediction length ({}) doesn't match actual length ({})",
                self.values.len(),
                actual.len()
            )));
        }

        let sum: f64 = self
            .values
            .iter()
            .zip(actual.iter())
            .map(|(f, a)| (f - a).abs())
            .sum();

        Ok(sum / self.values.len() as f64)
    }
}

/// Trained forecast model
pub trait TrainedForecastModel: Debug {
    /// Predict values and intervals at arbitrary dates
    fn predict(&self, dates: &[NaiveDate]) -> Result<ForecastResult>;

    /// Name of the model
    fn name(&self) -> &str;
}

/// Forecast model that can be trained on a prepared series
pub trait ForecastModel: Debug + Clone {
    /// The type of trained model produced
    type Trained: TrainedForecastModel;

    /// Train the model on a prepared series
    fn train(&self, series: &PreparedSeries) -> Result<Self::Trained>;

    /// Get the name of the model
    fn name(&self) -> &str;
}

pub mod trend;

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn test_split_keeps_dates_aligned() {
        let dates = vec![date("2023-02-01"), date("2023-08-01"), date("2024-02-01")];
        let result = ForecastResult::new_with_intervals(
            dates,
            vec![1.0, 2.0, 3.0],
            vec![(0.5, 1.5), (1.5, 2.5), (2.5, 3.5)],
        )
        .unwrap();

        let (head, tail) = result.split_at(2);
        assert_eq!(head.dates(), &[date("2023-02-01"), date("2023-08-01")]);
        assert_eq!(tail.dates(), &[date("2024-02-01")]);
        assert_eq!(tail.intervals(), Some(&[(2.5, 3.5)][..]));

        let (_, rest) = result.split_at(5);
        assert!(rest.is_empty());
    }

    #[test]
    fn test_mean_absolute_error() {
        let result =
            ForecastResult::new(vec![date("2023-02-01"), date("2023-08-01")], vec![1.0, 3.0]).unwrap();
        assert_eq!(result.mean_absolute_error(&[2.0, 2.0]).unwrap(), 1.0);
        assert!(result.mean_absolute_error(&[2.0]).is_err());

        let empty = ForecastResult::new(Vec::new(), Vec::new()).unwrap();
        assert!(empty.mean_absolute_error(&[]).is_err());
    }
}
