//! Additive piecewise-linear trend with changepoints
//!
//! The trend is `m + k t + sum_j delta_j (t - s_j)_+` on time rescaled to
//! `[0, 1]` over the history. Changepoints `s_j` are spread over the first
//! part of the history and their slope changes carry a Laplace prior, so
//! most of them stay at zero unless the data shows an abrupt shift.
//! There are no periodic components.
//!
//! Fitting is maximum a posteriori: coordinate descent on the coefficients
//! alternates with a closed-form update of the observation noise.
//! Uncertainty intervals come from simulating future slope changes at the
//! historical changepoint rate plus Gaussian observation noise. The
//! simulation is seeded, so intervals are deterministic for a given fit.

use crate::data::PreparedSeries;
use crate::error::{ForecastError, Result};
use crate::models::{ForecastModel, ForecastResult, TrainedForecastModel};
use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal, Poisson};
use serde::{Deserialize, Serialize};
use tracing::debug;
use trend_math::statistics::{central_interval, mean};
use trend_math::{PenalizedRegression, Penalty};

/// Standard deviation of the Gaussian prior on offset and base rate
const BASE_PRIOR_SCALE: f64 = 5.0;
/// Scale of the half-normal prior on observation noise
const NOISE_PRIOR_SCALE: f64 = 0.5;
/// Noise never collapses below this, on the scaled axis
const MIN_NOISE: f64 = 1e-3;
const MAX_NOISE_UPDATES: usize = 50;
const NOISE_TOLERANCE: f64 = 1e-8;
const SWEEP_TOLERANCE: f64 = 1e-8;
const MAX_SWEEPS: usize = 500;
/// Noise levels the alternating fit restarts from, warm-started in turn;
/// the lowest negative log posterior wins
const NOISE_STARTS: [f64; 5] = [NOISE_PRIOR_SCALE, 0.1, 0.02, 0.005, MIN_NOISE];

/// Piecewise-linear trend model parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendModel {
    /// Upper bound on the number of potential changepoints
    pub n_changepoints: usize,
    /// Fraction of the history where changepoints may be placed
    pub changepoint_range: f64,
    /// Laplace scale of slope changes; larger is more flexible
    pub changepoint_prior_scale: f64,
    /// Coverage of the uncertainty interval
    pub interval_width: f64,
    /// Number of simulated trajectories behind each interval
    pub uncertainty_samples: usize,
    /// Seed of the interval simulation
    pub uncertainty_seed: u64,
}

impl Default for TrendModel {
    fn default() -> Self {
        Self {
            n_changepoints: 25,
            changepoint_range: 0.8,
            // abrupt staffing and policy shifts, so well above the usual 0.05
            changepoint_prior_scale: 0.5,
            interval_width: 0.8,
            uncertainty_samples: 1000,
            uncertainty_seed: 20_240_201,
        }
    }
}

impl TrendModel {
    /// Check every parameter
    pub fn validate(&self) -> Result<()> {
        if !(self.changepoint_range > 0.0 && self.changepoint_range <= 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "changepoint_range must be in (0, 1], got {}",
                self.changepoint_range
            )));
        }
        if !self.changepoint_prior_scale.is_finite() || self.changepoint_prior_scale <= 0.0 {
            return Err(ForecastError::InvalidParameter(format!(
                "changepoint_prior_scale must be positive, got {}",
                self.changepoint_prior_scale
            )));
        }
        if !(self.interval_width > 0.0 && self.interval_width < 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "interval_width must be in (0, 1), got {}",
                self.interval_width
            )));
        }
        if self.uncertainty_samples == 0 {
            return Err(ForecastError::InvalidParameter(
                "uncertainty_samples must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Positions (scaled time) of the potential changepoints
    fn changepoint_locations(&self, t: &[f64]) -> Vec<f64> {
        let eligible = (t.len() as f64 * self.changepoint_range).floor() as usize;
        let count = self.n_changepoints.min(eligible.saturating_sub(1));
        if count == 0 {
            return Vec::new();
        }

        let last = (eligible - 1) as f64;
        (1..=count)
            .map(|i| {
                let index = (i as f64 * last / count as f64).round() as usize;
                t[index]
            })
            .collect()
    }
}

/// Closed-form MAP noise under a half-normal prior
fn noise_update(residual_sum_squares: f64, n: usize) -> f64 {
    let n = n as f64;
    let s2 = NOISE_PRIOR_SCALE * NOISE_PRIOR_SCALE;
    // positive root of sigma^4 / s2 + n sigma^2 - rss = 0
    let variance = 2.0 * residual_sum_squares
        / (n + (n * n + 4.0 * residual_sum_squares / s2).sqrt());
    variance.sqrt().max(MIN_NOISE)
}

/// Negative log posterior of a fit, up to a constant
fn neg_log_posterior(prior_cost: f64, residual_sum_squares: f64, noise: f64, n: usize) -> f64 {
    residual_sum_squares / (2.0 * noise * noise)
        + n as f64 * noise.ln()
        + noise * noise / (2.0 * NOISE_PRIOR_SCALE * NOISE_PRIOR_SCALE)
        + prior_cost
}

/// Best of the alternating fits started from each level in [`NOISE_STARTS`]
struct MapFit {
    coefficients: Vec<f64>,
    noise: f64,
    objective: f64,
    sweeps: usize,
    converged: bool,
}

/// Alternate coordinate descent with the closed-form noise update,
/// restarting from every noise level and keeping the best posterior
fn fit_map(regression: &PenalizedRegression, y: &[f64], start: Vec<f64>) -> Result<MapFit> {
    let n = y.len();
    let mut coefficients = start;
    let mut best: Option<MapFit> = None;
    let mut sweeps = 0;

    for &initial in NOISE_STARTS.iter() {
        let mut noise = initial;
        let mut converged = false;
        let mut residual_sum_squares = 0.0;

        for _ in 0..MAX_NOISE_UPDATES {
            let fit = regression.solve(y, noise, &coefficients)?;
            coefficients = fit.coefficients;
            residual_sum_squares = fit.residual_sum_squares;
            sweeps += fit.sweeps;
            converged = fit.converged;

            let updated = noise_update(residual_sum_squares, n);
            let settled = (updated - noise).abs() < NOISE_TOLERANCE;
            noise = updated;
            if settled {
                break;
            }
        }

        let objective = neg_log_posterior(
            regression.penalty(&coefficients),
            residual_sum_squares,
            noise,
            n,
        );
        if objective.is_finite() && best.as_ref().map_or(true, |b| objective < b.objective) {
            best = Some(MapFit {
                coefficients: coefficients.clone(),
                noise,
                objective,
                sweeps,
                converged,
            });
        }
    }

    best.map(|fit| MapFit { sweeps, ..fit }).ok_or_else(|| {
        ForecastError::ModelFit("Trend fit produced no finite posterior".to_string())
    })
}

/// Draw from Laplace(0, scale) by inverting the CDF
fn sample_laplace<R: Rng>(rng: &mut R, scale: f64) -> f64 {
    let u: f64 = rng.gen::<f64>() - 0.5;
    let tail = (1.0 - 2.0 * u.abs()).max(f64::MIN_POSITIVE);
    -scale * u.signum() * tail.ln()
}

impl ForecastModel for TrendModel {
    type Trained = TrainedTrendModel;

    fn train(&self, series: &PreparedSeries) -> Result<TrainedTrendModel> {
        self.validate()?;

        let n = series.len();
        if n < 2 {
            return Err(ForecastError::ModelFit(format!(
                "Trend fit needs at least 2 observations, got {}",
                n
            )));
        }

        let values = series.values();
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::ModelFit(
                "Series contains non-finite values".to_string(),
            ));
        }

        let dates = series.dates();
        let start = dates[0];
        let span_days = (dates[n - 1] - start).num_days() as f64;
        if span_days <= 0.0 {
            return Err(ForecastError::ModelFit(
                "History spans zero days".to_string(),
            ));
        }

        let t: Vec<f64> = dates
            .iter()
            .map(|d| (*d - start).num_days() as f64 / span_days)
            .collect();
        let y_scale = match values.iter().fold(0.0_f64, |acc, v| acc.max(v.abs())) {
            s if s > 0.0 => s,
            _ => 1.0,
        };
        let y: Vec<f64> = values.iter().map(|v| v / y_scale).collect();

        let changepoints = self.changepoint_locations(&t);

        let mut columns = vec![vec![1.0; n], t.clone()];
        let mut penalties = vec![Penalty::Ridge { scale: BASE_PRIOR_SCALE }; 2];
        for &s in &changepoints {
            columns.push(t.iter().map(|&ti| (ti - s).max(0.0)).collect());
            penalties.push(Penalty::Lasso {
                scale: self.changepoint_prior_scale,
            });
        }
        let regression = PenalizedRegression::new(columns, penalties)?
            .with_stopping(SWEEP_TOLERANCE, MAX_SWEEPS);

        // start from the line through the first and last observations
        let mut initial = vec![0.0; regression.width()];
        initial[0] = y[0];
        initial[1] = y[n - 1] - y[0];

        let MapFit {
            mut coefficients,
            noise,
            objective,
            sweeps,
            converged,
        } = fit_map(&regression, &y, initial)?;

        if coefficients.iter().any(|c| !c.is_finite()) || !noise.is_finite() {
            return Err(ForecastError::ModelFit(
                "Trend fit produced non-finite parameters".to_string(),
            ));
        }

        debug!(
            observations = n,
            changepoints = changepoints.len(),
            sweeps,
            converged,
            noise,
            objective,
            "trend fitted"
        );

        let deltas = coefficients.split_off(2);
        Ok(TrainedTrendModel {
            name: self.name().to_string(),
            start,
            span_days,
            y_scale,
            offset: coefficients[0],
            base_rate: coefficients[1],
            changepoints,
            deltas,
            noise,
            interval_width: self.interval_width,
            uncertainty_samples: self.uncertainty_samples,
            uncertainty_seed: self.uncertainty_seed,
        })
    }

    fn name(&self) -> &str {
        "Piecewise Linear Trend"
    }
}

/// Fitted piecewise-linear trend
#[derive(Debug, Clone)]
pub struct TrainedTrendModel {
    name: String,
    start: NaiveDate,
    span_days: f64,
    y_scale: f64,
    offset: f64,
    base_rate: f64,
    changepoints: Vec<f64>,
    deltas: Vec<f64>,
    noise: f64,
    interval_width: f64,
    uncertainty_samples: usize,
    uncertainty_seed: u64,
}

impl TrainedTrendModel {
    fn scaled_time(&self, date: NaiveDate) -> f64 {
        (date - self.start).num_days() as f64 / self.span_days
    }

    /// Trend on the scaled axis
    fn trend_at(&self, t: f64) -> f64 {
        let bends: f64 = self
            .changepoints
            .iter()
            .zip(&self.deltas)
            .map(|(s, d)| d * (t - s).max(0.0))
            .sum();
        self.offset + self.base_rate * t + bends
    }

    /// Slope changes detected in the history, on the scaled axis
    pub fn deltas(&self) -> &[f64] {
        &self.deltas
    }

    /// Observation noise on the scaled axis
    pub fn noise(&self) -> f64 {
        self.noise
    }

    fn simulate_intervals(&self, t: &[f64]) -> Result<Vec<(f64, f64)>> {
        let mut rng = StdRng::seed_from_u64(self.uncertainty_seed);
        let end = t.iter().copied().fold(1.0_f64, f64::max);
        let delta_scale = mean(
            &self.deltas.iter().map(|d| d.abs()).collect::<Vec<_>>(),
        )
        .unwrap_or(0.0)
            + 1e-8;
        let rate = self.changepoints.len() as f64 * (end - 1.0);

        let future_changes = if rate > 0.0 {
            Some(Poisson::new(rate).map_err(|e| ForecastError::ModelFit(e.to_string()))?)
        } else {
            None
        };
        let observation_noise =
            Normal::new(0.0, self.noise).map_err(|e| ForecastError::ModelFit(e.to_string()))?;

        let mut samples = vec![Vec::with_capacity(self.uncertainty_samples); t.len()];
        for _ in 0..self.uncertainty_samples {
            let bends: Vec<(f64, f64)> = match &future_changes {
                Some(poisson) => {
                    let count: f64 = poisson.sample(&mut rng);
                    (0..count as usize)
                        .map(|_| {
                            let at = rng.gen_range(1.0..end);
                            (at, sample_laplace(&mut rng, delta_scale))
                        })
                        .collect()
                }
                None => Vec::new(),
            };

            for (column, &ti) in samples.iter_mut().zip(t) {
                let extra: f64 = bends.iter().map(|(s, d)| d * (ti - s).max(0.0)).sum();
                let draw = self.trend_at(ti) + extra + observation_noise.sample(&mut rng);
                column.push(draw * self.y_scale);
            }
        }

        samples
            .iter()
            .map(|column| central_interval(column, self.interval_width).map_err(ForecastError::from))
            .collect()
    }
}

impl TrainedForecastModel for TrainedTrendModel {
    fn predict(&self, dates: &[NaiveDate]) -> Result<ForecastResult> {
        let t: Vec<f64> = dates.iter().map(|d| self.scaled_time(*d)).collect();
        let values: Vec<f64> = t.iter().map(|&ti| self.trend_at(ti) * self.y_scale).collect();
        let intervals = self.simulate_intervals(&t)?;

        let finite = values.iter().all(|v| v.is_finite())
            && intervals.iter().all(|(l, u)| l.is_finite() && u.is_finite());
        if !finite {
            return Err(ForecastError::ModelFit(
                "Trend prediction is not finite".to_string(),
            ));
        }

        ForecastResult::new_with_intervals(dates.to_vec(), values, intervals)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
