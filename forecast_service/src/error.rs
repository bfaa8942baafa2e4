//! Error types for the forecast_service crate

use crate::source::CategoryGroup;
use forecast_core::ForecastError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Forecast error: {0}")]
    Forecast(#[from] ForecastError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("No cached {group} forecast named '{name}' with {semesters} semesters")]
    NotFound {
        group: CategoryGroup,
        name: String,
        semesters: usize,
    },

    /// The history source could not deliver a payload
    #[error("History source error: {0}")]
    Source(String),
}

pub type Result<T> = std::result::Result<T, ServiceError>;
