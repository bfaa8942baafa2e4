//! # Forecast Core
//!
//! Semester-granular forecasting of sparse categorical activity counts.
//!
//! ## Features
//!
//! - Variance-stabilizing preparation of raw histories (`ln(1 + x)`)
//! - Piecewise-linear trend model with changepoints and simulated intervals
//! - Mean-based fallback for histories too short to fit
//! - Recency-anchored bounds and a centrality confidence score
//! - Bounded jitter on published estimates behind an injectable RNG
//! - Per-category assembly of `{name, history, forecasting, semesters}` records
//!
//! ## Pipeline
//!
//! Each category runs independently:
//!
//! ```text
//! observations -> prepare_series -> ForecastEngine (-> NoiseInjector) -> CategoryForecast
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use forecast_core::{ForecastAssembler, ForecastConfig, ForecastEngine, NoiseInjector, Observation};
//!
//! let history = vec![
//!     Observation::new("2023-02-01".parse().unwrap(), 10.0),
//!     Observation::new("2023-08-01".parse().unwrap(), 12.0),
//! ];
//!
//! let engine = ForecastEngine::new(ForecastConfig::default()).unwrap();
//! let mut assembler = ForecastAssembler::new(engine, NoiseInjector::seeded(0.1, 7).unwrap());
//!
//! let forecast = assembler.assemble("total_projects", &history, 1).unwrap();
//! assert_eq!(forecast.forecasting.len(), 1);
//! assert_eq!(forecast.forecasting[0].date.to_string(), "2024-02-01");
//! ```

pub mod assembler;
pub mod confidence;
pub mod config;
pub mod data;
pub mod engine;
pub mod error;
pub mod models;
pub mod noise;
pub mod prepare;
pub mod semester;

// Re-export commonly used types
pub use crate::assembler::ForecastAssembler;
pub use crate::config::ForecastConfig;
pub use crate::data::{
    CategoryForecast, ForecastPoint, HistoricalPoint, Observation, PreparedSeries, SeriesFrame,
};
pub use crate::engine::{ForecastEngine, Sufficiency};
pub use crate::error::{ForecastError, Result};
pub use crate::models::trend::TrendModel;
pub use crate::models::{ForecastModel, ForecastResult, TrainedForecastModel};
pub use crate::noise::NoiseInjector;
pub use crate::prepare::prepare_series;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
