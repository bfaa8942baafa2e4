//! # Forecast Service
//!
//! Batch side of the project forecasts: reads the cleaning client's weekly
//! exports, runs [`forecast_core`] over every category and keeps one JSON
//! cache file per category group.
//!
//! ```text
//! HistorySource -> normalize_frame -> ForecastAssembler -> ForecastCache
//! ```
//!
//! Cache files hold a JSON array of `{name, history, forecasting, semesters}`
//! records and are replaced atomically on every pass.

pub mod cache;
pub mod error;
pub mod generate;
pub mod settings;
pub mod source;

pub use crate::cache::ForecastCache;
pub use crate::error::{Result, ServiceError};
pub use crate::generate::{generate_all, generate_group, GroupSummary};
pub use crate::settings::Settings;
pub use crate::source::{normalize_frame, CategoryGroup, HistorySource, JsonDirSource, Row};
