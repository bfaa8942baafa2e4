//! # Trend Math
//!
//! Numerical kernels behind the semester forecasting engine.
//! This crate provides penalized least squares solved by coordinate descent
//! and the small set of summary statistics the engine needs.

use thiserror::Error;

pub mod regression;
pub mod statistics;

pub use regression::{soft_threshold, CoordinateDescentFit, PenalizedRegression, Penalty};

/// Errors that can occur in trend calculations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),
}

/// Result type for trend math operations
pub type Result<T> = std::result::Result<T, MathError>;
