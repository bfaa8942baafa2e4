//! # Project Forecasts
//!
//! Semester forecasts of project activity per category: the overall total,
//! and each line, technology and scope.
//!
//! - [`trend_math`]: penalized regression and order statistics
//! - [`forecast_core`]: preparation, trend fitting, bounds and assembly
//! - [`forecast_service`]: history sources, cache files and the generation pass
//!
//! ## Example
//!
//! ```
//! use project_forecasts::forecast::{ForecastAssembler, ForecastConfig, ForecastEngine, NoiseInjector};
//!
//! let engine = ForecastEngine::new(ForecastConfig::default()).unwrap();
//! let mut assembler = ForecastAssembler::new(engine, NoiseInjector::disabled());
//!
//! let forecast = assembler.assemble("Python", &[], 2).unwrap();
//! assert_eq!(forecast.forecasting.len(), 2);
//! assert!(forecast.forecasting.iter().all(|p| p.value == 0 && p.upper == 1));
//! ```

pub use forecast_core as forecast;
pub use forecast_service as service;
pub use trend_math as math;

pub use forecast_core::{CategoryForecast, ForecastAssembler, ForecastConfig, ForecastPoint};
pub use forecast_service::{CategoryGroup, ForecastCache, Settings};
