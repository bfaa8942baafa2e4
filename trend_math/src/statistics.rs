//! Summary statistics over plain slices

use crate::{MathError, Result};
use statrs::statistics::{Data, OrderStatistics, Statistics};

/// Arithmetic mean, `None` for an empty slice
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.mean())
    }
}

/// Mean of the last `count` values (fewer if the slice is shorter)
pub fn trailing_mean(values: &[f64], count: usize) -> Option<f64> {
    let start = values.len().saturating_sub(count);
    mean(&values[start..])
}

/// Sample quantile at probability `tau` in [0, 1]
pub fn quantile(values: &[f64], tau: f64) -> Result<f64> {
    if values.is_empty() {
        return Err(MathError::InsufficientData(
            "Cannot take a quantile of an empty sample".to_string(),
        ));
    }
    if !(0.0..=1.0).contains(&tau) {
        return Err(MathError::InvalidInput(format!(
            "Quantile probability must be in [0, 1], got {}",
            tau
        )));
    }
    if values.iter().any(|v| v.is_nan()) {
        return Err(MathError::InvalidInput(
            "Sample contains NaN".to_string(),
        ));
    }

    let mut data = Data::new(values.to_vec());
    Ok(data.quantile(tau))
}

/// Lower and upper quantiles of a central interval covering `width`
pub fn central_interval(values: &[f64], width: f64) -> Result<(f64, f64)> {
    if !(0.0..1.0).contains(&width) {
        return Err(MathError::InvalidInput(format!(
            "Interval width must be in [0, 1), got {}",
            width
        )));
    }
    let tail = (1.0 - width) / 2.0;
    Ok((quantile(values, tail)?, quantile(values, 1.0 - tail)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[]), None);
        assert_abs_diff_eq!(mean(&[1.0, 2.0, 3.0]).unwrap(), 2.0);
        assert_abs_diff_eq!(trailing_mean(&[5.0, 5.0, 5.0, 50.0, 52.0], 3).unwrap(), 107.0 / 3.0);
        assert_abs_diff_eq!(trailing_mean(&[4.0], 3).unwrap(), 4.0);
    }

    #[test]
    fn test_quantile_bounds() {
        let sample: Vec<f64> = (1..=100).map(|v| v as f64).collect();
        let (lower, upper) = central_interval(&sample, 0.8).unwrap();

        assert!(lower > 5.0 && lower < 15.0);
        assert!(upper > 85.0 && upper < 95.0);
        assert!(lower < upper);
        assert_abs_diff_eq!(quantile(&[7.0], 0.3).unwrap(), 7.0);
    }

    #[test]
    fn test_quantile_errors() {
        assert!(quantile(&[], 0.5).is_err());
        assert!(quantile(&[1.0], 1.5).is_err());
        assert!(quantile(&[1.0, f64::NAN], 0.5).is_err());
        assert!(central_interval(&[1.0], 1.0).is_err());
    }
}
