//! Forecast engine
//!
//! Turns a prepared series into dated forecast points. Series with enough
//! observations go through the trend model; shorter ones get a flat
//! estimate from their mean. Either way the published estimate is jittered
//! by the [`NoiseInjector`], while bounds and model output stay deterministic.

use crate::confidence::confidence_pct;
use crate::config::ForecastConfig;
use crate::data::{ForecastPoint, PreparedSeries};
use crate::error::{ForecastError, Result};
use crate::models::trend::TrendModel;
use crate::models::{ForecastModel, TrainedForecastModel};
use crate::noise::NoiseInjector;
use crate::prepare::inverse_transform;
use crate::semester::future_semesters;
use chrono::{Local, NaiveDate};
use rand::Rng;
use tracing::{debug, warn};
use trend_math::statistics::{mean, trailing_mean};

/// Observations averaged by the instability guard
const RECENT_WINDOW: usize = 3;

/// Which path a series takes through the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sufficiency {
    /// Too short to fit; flat fallback estimate
    Sparse,
    /// Enough observations for the trend model
    Fit,
}

impl Sufficiency {
    pub fn classify(series: &PreparedSeries, min_fit_observations: usize) -> Self {
        if series.len() < min_fit_observations {
            Sufficiency::Sparse
        } else {
            Sufficiency::Fit
        }
    }
}

/// Per-category forecasting with fixed parameters
#[derive(Debug, Clone)]
pub struct ForecastEngine<M: ForecastModel = TrendModel> {
    config: ForecastConfig,
    model: M,
}

impl ForecastEngine<TrendModel> {
    /// Create an engine fitting the configured trend model
    pub fn new(config: ForecastConfig) -> Result<Self> {
        let model = config.trend.clone();
        Self::with_model(config, model)
    }
}

impl<M: ForecastModel> ForecastEngine<M> {
    /// Create an engine around another model; `config.trend` is then unused
    pub fn with_model(config: ForecastConfig, model: M) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, model })
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    /// Forecast `horizon` semesters after the last observation.
    ///
    /// # Errors
    ///
    /// [`ForecastError::ModelFit`] when the trend fit fails; callers may
    /// retry with [`ForecastEngine::forecast_sparse`].
    pub fn forecast<R: Rng>(
        &self,
        series: &PreparedSeries,
        horizon: usize,
        noise: &mut NoiseInjector<R>,
    ) -> Result<Vec<ForecastPoint>> {
        match Sufficiency::classify(series, self.config.min_fit_observations) {
            Sufficiency::Sparse => self.forecast_sparse(series, horizon, noise),
            Sufficiency::Fit => self.forecast_fitted(series, horizon, noise),
        }
    }

    fn check_horizon(horizon: usize) -> Result<()> {
        if horizon == 0 {
            return Err(ForecastError::InvalidParameter(
                "Horizon must be at least 1 semester".to_string(),
            ));
        }
        Ok(())
    }

    fn anchor_date(&self, series: &PreparedSeries) -> NaiveDate {
        series
            .last_date()
            .or(self.config.reference_date)
            .unwrap_or_else(|| Local::now().date_naive())
    }

    /// Flat band around an estimate. A zero estimate gets `[0, 1]`;
    /// otherwise the lower bound is at least 1 and the band at least 1 wide.
    fn fallback_bounds(&self, estimate: i64) -> (i64, i64) {
        if estimate <= 0 {
            return (0, 1);
        }
        let band = self.config.fallback_band;
        let lower = ((estimate as f64 * (1.0 - band)).round() as i64).max(1);
        let upper = ((estimate as f64 * (1.0 + band)).round() as i64).max(lower.saturating_add(1));
        (lower, upper)
    }

    /// Mean-based forecast for series too short to fit
    pub fn forecast_sparse<R: Rng>(
        &self,
        series: &PreparedSeries,
        horizon: usize,
        noise: &mut NoiseInjector<R>,
    ) -> Result<Vec<ForecastPoint>> {
        Self::check_horizon(horizon)?;

        let dates = future_semesters(self.anchor_date(series), horizon)?;
        let levels: Vec<f64> = series.values().into_iter().map(inverse_transform).collect();
        let estimate = mean(&levels).map_or(0, |m| m.round() as i64);
        let (lower, upper) = self.fallback_bounds(estimate);

        debug!(
            observations = series.len(),
            estimate, lower, upper, "sparse fallback forecast"
        );

        let jittered = noise.jitter(&vec![estimate; horizon]);
        Ok(dates
            .into_iter()
            .zip(jittered)
            .map(|(date, value)| ForecastPoint {
                date,
                value: value.clamp(lower, upper),
                lower,
                upper,
                confidence_pct: self.config.fallback_confidence,
            })
            .collect())
    }

    /// Average of the last observations when the forecast runs away from them
    fn unstable_replacement(&self, levels: &[f64], estimates: &[i64]) -> Option<i64> {
        let ratio = self.config.instability_ratio?;
        if levels.len() < RECENT_WINDOW || estimates.is_empty() {
            return None;
        }

        let rounded: Vec<f64> = levels.iter().map(|v| v.round()).collect();
        let recent = trailing_mean(&rounded, RECENT_WINDOW)?;
        let projected =
            estimates.iter().map(|v| *v as f64).sum::<f64>() / estimates.len() as f64;

        if recent > 0.0 && projected > recent * ratio {
            Some(recent.round() as i64)
        } else {
            None
        }
    }

    /// Trend-model forecast with recency-anchored bounds
    pub fn forecast_fitted<R: Rng>(
        &self,
        series: &PreparedSeries,
        horizon: usize,
        noise: &mut NoiseInjector<R>,
    ) -> Result<Vec<ForecastPoint>> {
        Self::check_horizon(horizon)?;

        let last = series.last().ok_or_else(|| {
            ForecastError::ModelFit("Cannot fit an empty series".to_string())
        })?;
        let future = future_semesters(last.date, horizon)?;

        let trained = self.model.train(series)?;
        let mut dates = series.dates();
        dates.extend(&future);
        let prediction = trained.predict(&dates)?;

        let (in_sample, projected) = prediction.split_at(series.len());
        if let Ok(mae) = in_sample.mean_absolute_error(&series.values()) {
            debug!(model = trained.name(), mae, "in-sample fit");
        }

        if projected.len() != horizon {
            return Err(ForecastError::ModelFit(format!(
                "{} returned {} projections for {} semesters",
                trained.name(),
                projected.len(),
                horizon
            )));
        }
        let intervals = projected.intervals().ok_or_else(|| {
            ForecastError::ModelFit("Trend model returned no intervals".to_string())
        })?;

        let floor_factor = self.config.floor_factor;
        let last_val = inverse_transform(last.transformed);
        let min_val = ((last_val * floor_factor).round() as i64).max(1);
        let floor = (min_val as f64 * floor_factor).round() as i64;

        let lower: Vec<i64> = intervals
            .iter()
            .map(|(l, _)| (inverse_transform(*l).round() as i64).max(floor))
            .collect();
        let lowest = lower.iter().copied().min().unwrap_or(floor);
        let upper: Vec<i64> = intervals
            .iter()
            .zip(&lower)
            .map(|((_, u), l)| {
                (inverse_transform(*u).round() as i64)
                    .max(lowest.saturating_add(self.config.min_interval_width))
                    // room for one integer strictly inside
                    .max(l.saturating_add(2))
            })
            .collect();

        let mut estimates: Vec<i64> = projected
            .values()
            .iter()
            .map(|v| inverse_transform(*v).round() as i64)
            .collect();

        let levels: Vec<f64> = series.values().into_iter().map(inverse_transform).collect();
        if let Some(recent) = self.unstable_replacement(&levels, &estimates) {
            warn!(
                recent,
                projected = ?estimates,
                "forecast diverges from recent history, using recent average"
            );
            estimates = vec![recent; horizon];
        }

        let jittered = noise.jitter(&estimates);

        Ok(projected
            .dates()
            .iter()
            .copied()
            .zip(jittered)
            .zip(lower.into_iter().zip(upper))
            .map(|((date, raw), (lower, upper))| {
                let mut value = raw;
                if value <= lower {
                    value = lower.saturating_add(1);
                }
                if value >= upper {
                    value = upper - 1;
                }
                ForecastPoint {
                    date,
                    value,
                    lower,
                    upper,
                    confidence_pct: confidence_pct(
                        value,
                        lower,
                        upper,
                        self.config.confidence_decay,
                    ),
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Observation;
    use crate::prepare::prepare_series;

    fn engine() -> ForecastEngine {
        ForecastEngine::new(ForecastConfig::default()).unwrap()
    }

    #[test]
    fn test_classify() {
        let empty = PreparedSeries::default();
        assert_eq!(Sufficiency::classify(&empty, 2), Sufficiency::Sparse);

        let series = prepare_series(&[
            Observation::new("2023-02-01".parse().unwrap(), 1.0),
            Observation::new("2023-08-01".parse().unwrap(), 2.0),
        ])
        .unwrap();
        assert_eq!(Sufficiency::classify(&series, 2), Sufficiency::Fit);
        assert_eq!(Sufficiency::classify(&series, 3), Sufficiency::Sparse);
    }

    #[test]
    fn test_fallback_bounds() {
        let engine = engine();
        assert_eq!(engine.fallback_bounds(0), (0, 1));
        assert_eq!(engine.fallback_bounds(1), (1, 2));
        assert_eq!(engine.fallback_bounds(2), (2, 3));
        assert_eq!(engine.fallback_bounds(20), (18, 22));
    }

    #[test]
    fn test_unstable_replacement() {
        let engine = engine();
        let levels = [4.0, 5.0, 6.0];
        assert_eq!(engine.unstable_replacement(&levels, &[20]), Some(5));
        assert_eq!(engine.unstable_replacement(&levels, &[10]), None);
        assert_eq!(engine.unstable_replacement(&levels[1..], &[20]), None);

        let disabled = ForecastEngine::new(ForecastConfig {
            instability_ratio: None,
            ..ForecastConfig::default()
        })
        .unwrap();
        assert_eq!(disabled.unstable_replacement(&levels, &[20]), None);
    }

    #[test]
    fn test_zero_horizon_rejected() {
        let mut noise = NoiseInjector::disabled();
        let result = engine().forecast(&PreparedSeries::default(), 0, &mut noise);
        assert!(matches!(result, Err(ForecastError::InvalidParameter(_))));
    }
}
