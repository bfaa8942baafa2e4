//! Engine parameters
//!
//! Every constant the engine uses lives here so it can be fixed in tests
//! and overridden from settings files.

use crate::error::{ForecastError, Result};
use crate::models::trend::TrendModel;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Forecast engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    /// Semesters forecast when the caller does not ask for a number
    pub default_horizon: usize,
    /// Jitter fraction applied to published point estimates
    pub noise_pct: f64,
    /// Fewer observations than this use the sparse fallback
    pub min_fit_observations: usize,
    /// Recency floor factor, applied to the last value and again to the floor
    pub floor_factor: f64,
    /// Minimum gap between the lowest lower bound and each upper bound
    pub min_interval_width: i64,
    /// Confidence lost between the interval center and either bound
    pub confidence_decay: f64,
    /// Half-width of the fallback band as a fraction of the estimate
    pub fallback_band: f64,
    /// Confidence reported for fallback points
    pub fallback_confidence: f64,
    /// Forecasts averaging more than this multiple of the last three
    /// observations are replaced by that recent average
    pub instability_ratio: Option<f64>,
    /// Anchor date for categories without history; today when unset
    pub reference_date: Option<NaiveDate>,
    /// Trend model parameters
    pub trend: TrendModel,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            default_horizon: 1,
            noise_pct: 0.1,
            min_fit_observations: 2,
            floor_factor: 0.85,
            min_interval_width: 5,
            confidence_decay: 20.0,
            fallback_band: 0.1,
            fallback_confidence: 95.0,
            instability_ratio: Some(2.5),
            reference_date: None,
            trend: TrendModel::default(),
        }
    }
}

impl ForecastConfig {
    /// Check every parameter
    pub fn validate(&self) -> Result<()> {
        if self.default_horizon == 0 {
            return Err(ForecastError::InvalidParameter(
                "default_horizon must be at least 1".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&self.noise_pct) {
            return Err(ForecastError::InvalidParameter(format!(
                "noise_pct must be in [0, 1), got {}",
                self.noise_pct
            )));
        }
        if self.min_fit_observations < 2 {
            return Err(ForecastError::InvalidParameter(
                "min_fit_observations must be at least 2".to_string(),
            ));
        }
        if !(self.floor_factor > 0.0 && self.floor_factor <= 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "floor_factor must be in (0, 1], got {}",
                self.floor_factor
            )));
        }
        if self.min_interval_width < 2 {
            return Err(ForecastError::InvalidParameter(format!(
                "min_interval_width must be at least 2, got {}",
                self.min_interval_width
            )));
        }
        if !(0.0..=100.0).contains(&self.confidence_decay) {
            return Err(ForecastError::InvalidParameter(format!(
                "confidence_decay must be in [0, 100], got {}",
                self.confidence_decay
            )));
        }
        if !(0.0..1.0).contains(&self.fallback_band) {
            return Err(ForecastError::InvalidParameter(format!(
                "fallback_band must be in [0, 1), got {}",
                self.fallback_band
            )));
        }
        if !(0.0..=100.0).contains(&self.fallback_confidence) {
            return Err(ForecastError::InvalidParameter(format!(
                "fallback_confidence must be in [0, 100], got {}",
                self.fallback_confidence
            )));
        }
        if let Some(ratio) = self.instability_ratio {
            if !ratio.is_finite() || ratio <= 1.0 {
                return Err(ForecastError::InvalidParameter(format!(
                    "instability_ratio must be greater than 1, got {}",
                    ratio
                )));
            }
        }
        self.trend.validate()
    }
}
