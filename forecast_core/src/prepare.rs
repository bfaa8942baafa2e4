//! Conversion of raw histories into model-ready series

use crate::data::{Observation, PreparedPoint, PreparedSeries};
use crate::error::{ForecastError, Result};

/// Variance-stabilizing transform `ln(1 + max(value, 0))`
pub fn transform(value: f64) -> f64 {
    value.max(0.0).ln_1p()
}

/// Inverse of [`transform`], clamped at zero
pub fn inverse_transform(transformed: f64) -> f64 {
    transformed.exp_m1().max(0.0)
}

/// Date-ordered observations with one entry per date; when dates repeat,
/// the later observation in input order wins
pub fn canonical_observations(observations: &[Observation]) -> Vec<Observation> {
    let mut ordered = observations.to_vec();
    ordered.sort_by_key(|o| o.date);

    let mut unique: Vec<Observation> = Vec::with_capacity(ordered.len());
    for observation in ordered {
        match unique.last_mut() {
            Some(last) if last.date == observation.date => *last = observation,
            _ => unique.push(observation),
        }
    }
    unique
}

/// Sort, clamp and log1p-transform a raw history.
///
/// Negative counts are silently clamped to zero. When two observations
/// share a date, the later one in input order wins. An empty history is
/// valid and yields an empty series.
///
/// # Errors
///
/// Returns [`ForecastError::InvalidSeries`] if any value is not finite.
pub fn prepare_series(observations: &[Observation]) -> Result<PreparedSeries> {
    if let Some(bad) = observations.iter().find(|o| !o.value.is_finite()) {
        return Err(ForecastError::InvalidSeries(format!(
            "Non-finite value {} on {}",
            bad.value, bad.date
        )));
    }

    let points = canonical_observations(observations)
        .into_iter()
        .map(|observation| PreparedPoint {
            date: observation.date,
            transformed: transform(observation.value),
        })
        .collect();

    Ok(PreparedSeries::new(points))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use chrono::NaiveDate;

    fn obs(date: &str, value: f64) -> Observation {
        Observation::new(date.parse::<NaiveDate>().unwrap(), value)
    }

    #[test]
    fn test_transform_clamps_negative() {
        assert_eq!(transform(-5.0), 0.0);
        assert_abs_diff_eq!(transform(9.0), 10f64.ln(), epsilon = 1e-12);
        assert_eq!(inverse_transform(-1.0), 0.0);
    }

    #[test]
    fn test_duplicate_dates_last_write_wins() {
        let series = prepare_series(&[
            obs("2023-08-01", 3.0),
            obs("2023-02-01", 1.0),
            obs("2023-08-01", 7.0),
        ])
        .unwrap();

        assert_eq!(series.len(), 2);
        assert_abs_diff_eq!(series.values()[1], transform(7.0));
    }
}
