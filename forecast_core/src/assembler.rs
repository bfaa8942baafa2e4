//! Per-category glue between raw histories and forecast records

use crate::config::ForecastConfig;
use crate::data::{CategoryForecast, HistoricalPoint, Observation, SeriesFrame};
use crate::engine::ForecastEngine;
use crate::error::{ForecastError, Result};
use crate::models::trend::TrendModel;
use crate::models::ForecastModel;
use crate::noise::NoiseInjector;
use crate::prepare::{canonical_observations, prepare_series};
use rand::rngs::StdRng;
use rand::Rng;
use tracing::{info, warn};

/// Runs preparer and engine for each category and packages the result
#[derive(Debug)]
pub struct ForecastAssembler<R: Rng = StdRng, M: ForecastModel = TrendModel> {
    engine: ForecastEngine<M>,
    noise: NoiseInjector<R>,
}

impl ForecastAssembler<StdRng, TrendModel> {
    /// Assembler with entropy-seeded jitter at the configured fraction
    pub fn from_config(config: ForecastConfig) -> Result<Self> {
        let noise = NoiseInjector::from_entropy(config.noise_pct)?;
        Ok(Self::new(ForecastEngine::new(config)?, noise))
    }
}

impl<R: Rng, M: ForecastModel> ForecastAssembler<R, M> {
    pub fn new(engine: ForecastEngine<M>, noise: NoiseInjector<R>) -> Self {
        Self { engine, noise }
    }

    pub fn engine(&self) -> &ForecastEngine<M> {
        &self.engine
    }

    /// Forecast one category over the engine's default horizon
    pub fn assemble_default(
        &mut self,
        name: &str,
        observations: &[Observation],
    ) -> Result<CategoryForecast> {
        let horizon = self.engine.config().default_horizon;
        self.assemble(name, observations, horizon)
    }

    /// Forecast one named category.
    ///
    /// A failed trend fit is retried with the sparse fallback, so the only
    /// errors surfaced are malformed input and invalid parameters.
    pub fn assemble(
        &mut self,
        name: &str,
        observations: &[Observation],
        horizon: usize,
    ) -> Result<CategoryForecast> {
        let series = prepare_series(observations)?;
        let history = canonical_observations(observations)
            .iter()
            .map(HistoricalPoint::from_observation)
            .collect();

        let forecasting = match self.engine.forecast(&series, horizon, &mut self.noise) {
            Ok(points) => points,
            Err(ForecastError::ModelFit(reason)) => {
                warn!(category = name, %reason, "trend fit failed, using sparse fallback");
                self.engine
                    .forecast_sparse(&series, horizon, &mut self.noise)?
            }
            Err(err) => return Err(err),
        };

        Ok(CategoryForecast {
            name: name.to_string(),
            history,
            forecasting,
            horizon,
        })
    }

    /// Forecast every column of a frame independently.
    ///
    /// Missing cells count as zero. A column that fails is logged and left
    /// out of the result; it never blocks the other columns.
    pub fn assemble_frame(&mut self, frame: &SeriesFrame, horizon: usize) -> Vec<CategoryForecast> {
        let mut forecasts = Vec::with_capacity(frame.columns().len());

        for column in frame.columns() {
            let observations = frame.observations(column);
            match self.assemble(&column.name, &observations, horizon) {
                Ok(forecast) => forecasts.push(forecast),
                Err(err) => {
                    warn!(category = %column.name, error = %err, "category omitted from forecast pass")
                }
            }
        }

        info!(
            forecasts = forecasts.len(),
            columns = frame.columns().len(),
            "frame forecast complete"
        );
        forecasts
    }
}
