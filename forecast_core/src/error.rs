//! Error types for the forecast_core crate

use thiserror::Error;
use trend_math::MathError;

/// Custom error types for the forecast_core crate
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ForecastError {
    /// Malformed input history; the category produces no output
    #[error("Invalid series: {0}")]
    InvalidSeries(String),

    /// The trend model could not produce a finite result
    #[error("Model fit error: {0}")]
    ModelFit(String),

    /// Error from invalid parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl From<MathError> for ForecastError {
    fn from(err: MathError) -> Self {
        ForecastError::ModelFit(err.to_string())
    }
}
