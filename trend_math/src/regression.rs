//! Penalized least squares solved by cyclic coordinate descent
//!
//! Minimizes
//!
//! ```text
//! sum_i (y_i - sum_j x_ij b_j)^2 / (2 sigma^2) + sum_j P_j(b_j)
//! ```
//!
//! where each coefficient carries either a Gaussian (ridge) or a Laplace
//! (lasso) penalty. This is the MAP problem of a linear model whose
//! coefficients have independent Gaussian or Laplace priors.

use crate::{MathError, Result};
use serde::{Deserialize, Serialize};

/// Prior placed on a single coefficient
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Penalty {
    /// Gaussian prior N(0, scale^2): adds `b^2 / (2 scale^2)`
    Ridge { scale: f64 },
    /// Laplace prior Laplace(0, scale): adds `|b| / scale`
    Lasso { scale: f64 },
}

impl Penalty {
    fn scale(&self) -> f64 {
        match self {
            Penalty::Ridge { scale } | Penalty::Lasso { scale } => *scale,
        }
    }

    /// Negative log prior of a coefficient, up to a constant
    pub fn cost(&self, coefficient: f64) -> f64 {
        match self {
            Penalty::Ridge { scale } => coefficient * coefficient / (2.0 * scale * scale),
            Penalty::Lasso { scale } => coefficient.abs() / scale,
        }
    }
}

/// Soft-thresholding operator `sign(z) * max(|z| - gamma, 0)`
pub fn soft_threshold(z: f64, gamma: f64) -> f64 {
    if z > gamma {
        z - gamma
    } else if z < -gamma {
        z + gamma
    } else {
        0.0
    }
}

/// Outcome of a coordinate descent solve
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinateDescentFit {
    /// Fitted coefficients, one per design column
    pub coefficients: Vec<f64>,
    /// Residual sum of squares at the solution
    pub residual_sum_squares: f64,
    /// Number of full sweeps performed
    pub sweeps: usize,
    /// Whether the largest coefficient update fell below the tolerance
    pub converged: bool,
}

/// Linear model with per-coefficient priors
#[derive(Debug, Clone)]
pub struct PenalizedRegression {
    columns: Vec<Vec<f64>>,
    penalties: Vec<Penalty>,
    squared_norms: Vec<f64>,
    rows: usize,
    tolerance: f64,
    max_sweeps: usize,
}

impl PenalizedRegression {
    /// Create a regression from design columns and their penalties
    pub fn new(columns: Vec<Vec<f64>>, penalties: Vec<Penalty>) -> Result<Self> {
        if columns.is_empty() {
            return Err(MathError::InvalidInput(
                "Design matrix needs at least one column".to_string(),
            ));
        }
        if columns.len() != penalties.len() {
            return Err(MathError::InvalidInput(format!(
                "Got {} columns but {} penalties",
                columns.len(),
                penalties.len()
            )));
        }

        let rows = columns[0].len();
        if rows == 0 {
            return Err(MathError::InsufficientData(
                "Design matrix has no rows".to_string(),
            ));
        }
        if columns.iter().any(|c| c.len() != rows) {
            return Err(MathError::InvalidInput(
                "Design columns must all have the same length".to_string(),
            ));
        }
        if columns.iter().flatten().any(|x| !x.is_finite()) {
            return Err(MathError::InvalidInput(
                "Design matrix contains non-finite entries".to_string(),
            ));
        }
        if penalties
            .iter()
            .any(|p| !p.scale().is_finite() || p.scale() <= 0.0)
        {
            return Err(MathError::InvalidInput(
                "Penalty scales must be positive and finite".to_string(),
            ));
        }

        let squared_norms = columns
            .iter()
            .map(|c| c.iter().map(|x| x * x).sum())
            .collect();

        Ok(Self {
            columns,
            penalties,
            squared_norms,
            rows,
            tolerance: 1e-8,
            max_sweeps: 500,
        })
    }

    /// Override the stopping rule
    pub fn with_stopping(mut self, tolerance: f64, max_sweeps: usize) -> Self {
        self.tolerance = tolerance;
        self.max_sweeps = max_sweeps.max(1);
        self
    }

    /// Number of coefficients
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Total prior cost of a coefficient vector
    pub fn penalty(&self, coefficients: &[f64]) -> f64 {
        self.penalties
            .iter()
            .zip(coefficients)
            .map(|(p, b)| p.cost(*b))
            .sum()
    }

    /// Evaluate the linear predictor for a coefficient vector
    pub fn predict(&self, coefficients: &[f64]) -> Vec<f64> {
        let mut fitted = vec![0.0; self.rows];
        for (column, b) in self.columns.iter().zip(coefficients) {
            for (f, x) in fitted.iter_mut().zip(column) {
                *f += x * b;
            }
        }
        fitted
    }

    /// Solve for the coefficients at observation noise `noise_scale`,
    /// warm-started from `start`
    pub fn solve(
        &self,
        target: &[f64],
        noise_scale: f64,
        start: &[f64],
    ) -> Result<CoordinateDescentFit> {
        if target.len() != self.rows {
            return Err(MathError::InvalidInput(format!(
                "Target length ({}) doesn't match design rows ({})",
                target.len(),
                self.rows
            )));
        }
        if start.len() != self.width() {
            return Err(MathError::InvalidInput(format!(
                "Start vector length ({}) doesn't match design width ({})",
                start.len(),
                self.width()
            )));
        }
        if target.iter().any(|y| !y.is_finite()) {
            return Err(MathError::InvalidInput(
                "Target contains non-finite values".to_string(),
            ));
        }
        if !noise_scale.is_finite() || noise_scale <= 0.0 {
            return Err(MathError::InvalidInput(format!(
                "Noise scale must be positive, got {}",
                noise_scale
            )));
        }

        let precision = 1.0 / (noise_scale * noise_scale);
        let mut coefficients = start.to_vec();
        let fitted = self.predict(&coefficients);
        let mut residuals: Vec<f64> = target.iter().zip(&fitted).map(|(y, f)| y - f).collect();

        let mut sweeps = 0;
        let mut converged = false;
        while sweeps < self.max_sweeps {
            sweeps += 1;
            let mut largest_step: f64 = 0.0;

            for j in 0..self.width() {
                let column = &self.columns[j];
                let old = coefficients[j];
                let curvature = precision * self.squared_norms[j];

                // correlation with the partial residual (residual with b_j added back)
                let rho = precision
                    * column
                        .iter()
                        .zip(&residuals)
                        .map(|(x, r)| x * (r + x * old))
                        .sum::<f64>();

                let updated = match self.penalties[j] {
                    Penalty::Ridge { scale } => rho / (curvature + 1.0 / (scale * scale)),
                    Penalty::Lasso { scale } => {
                        if curvature > 0.0 {
                            soft_threshold(rho, 1.0 / scale) / curvature
                        } else {
                            0.0
                        }
                    }
                };

                let step = updated - old;
                if step != 0.0 {
                    for (r, x) in residuals.iter_mut().zip(column) {
                        *r -= x * step;
                    }
                    coefficients[j] = updated;
                }
                largest_step = largest_step.max(step.abs());
            }

            if !largest_step.is_finite() {
                return Err(MathError::CalculationError(
                    "Coordinate descent diverged".to_string(),
                ));
            }
            if largest_step < self.tolerance {
                converged = true;
                break;
            }
        }

        let residual_sum_squares = residuals.iter().map(|r| r * r).sum();

        Ok(CoordinateDescentFit {
            coefficients,
            residual_sum_squares,
            sweeps,
            converged,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_soft_threshold() {
        assert_eq!(soft_threshold(3.0, 1.0), 2.0);
        assert_eq!(soft_threshold(-3.0, 1.0), -2.0);
        assert_eq!(soft_threshold(0.5, 1.0), 0.0);
        assert_eq!(soft_threshold(-1.0, 1.0), 0.0);
    }

    #[test]
    fn test_weak_priors_recover_line() {
        // y = 2 + 3x
        let x = vec![0.0, 0.25, 0.5, 0.75, 1.0];
        let y: Vec<f64> = x.iter().map(|v| 2.0 + 3.0 * v).collect();
        let regression = PenalizedRegression::new(
            vec![vec![1.0; 5], x],
            vec![Penalty::Ridge { scale: 1e3 }; 2],
        )
        .unwrap()
        .with_stopping(1e-12, 20_000);

        let fit = regression.solve(&y, 0.01, &[0.0, 0.0]).unwrap();

        assert!(fit.converged);
        assert_abs_diff_eq!(fit.coefficients[0], 2.0, epsilon = 1e-4);
        assert_abs_diff_eq!(fit.coefficients[1], 3.0, epsilon = 1e-4);
        assert!(fit.residual_sum_squares < 1e-8);
    }

    #[test]
    fn test_lasso_zeroes_small_effects() {
        // The second column carries almost no signal, the Laplace prior removes it
        let y = vec![1.0, 1.0, 1.0, 1.0];
        let regression = PenalizedRegression::new(
            vec![vec![1.0; 4], vec![0.0, 0.0, 0.01, 0.02]],
            vec![Penalty::Ridge { scale: 5.0 }, Penalty::Lasso { scale: 0.05 }],
        )
        .unwrap();

        let fit = regression.solve(&y, 1.0, &[0.0, 0.0]).unwrap();

        assert_eq!(fit.coefficients[1], 0.0);
        assert!(fit.coefficients[0] > 0.5);
    }

    #[test]
    fn test_penalty_cost() {
        assert_abs_diff_eq!(Penalty::Ridge { scale: 2.0 }.cost(2.0), 0.5);
        assert_abs_diff_eq!(Penalty::Lasso { scale: 0.5 }.cost(-1.5), 3.0);

        let regression = PenalizedRegression::new(
            vec![vec![1.0, 1.0], vec![0.0, 1.0]],
            vec![Penalty::Ridge { scale: 1.0 }, Penalty::Lasso { scale: 0.5 }],
        )
        .unwrap();
        assert_abs_diff_eq!(regression.penalty(&[2.0, -1.0]), 4.0);
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(PenalizedRegression::new(vec![], vec![]).is_err());
        assert!(PenalizedRegression::new(
            vec![vec![1.0, 2.0]],
            vec![Penalty::Ridge { scale: 1.0 }; 2]
        )
        .is_err());
        assert!(PenalizedRegression::new(
            vec![vec![1.0, 2.0], vec![1.0]],
            vec![Penalty::Ridge { scale: 1.0 }; 2]
        )
        .is_err());
        assert!(PenalizedRegression::new(
            vec![vec![1.0, f64::NAN]],
            vec![Penalty::Lasso { scale: 1.0 }]
        )
        .is_err());
        assert!(PenalizedRegression::new(
            vec![vec![1.0, 2.0]],
            vec![Penalty::Lasso { scale: 0.0 }]
        )
        .is_err());

        let regression =
            PenalizedRegression::new(vec![vec![1.0, 1.0]], vec![Penalty::Ridge { scale: 1.0 }])
                .unwrap();
        assert!(regression.solve(&[1.0], 1.0, &[0.0]).is_err());
        assert!(regression.solve(&[1.0, f64::INFINITY], 1.0, &[0.0]).is_err());
        assert!(regression.solve(&[1.0, 1.0], 0.0, &[0.0]).is_err());
    }
}
