//! Ordinary least squares regression

use super::models::Regressor;
use crate::error::{PredictorError, Result};
use ndarray::{Array1, Array2, Axis};
use tracing::warn;

/// Pivots below this fraction of the diagonal scale are treated as zero
const PIVOT_TOLERANCE: f64 = 1e-10;

/// Cholesky solve of a symmetric positive-definite system `A x = b`.
///
/// Returns `None` when a pivot collapses, i.e. the system is singular or
/// numerically rank deficient.
fn cholesky_solve(a: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
    let n = a.nrows();
    if n != a.ncols() || n != b.len() {
        return None;
    }

    let scale = a.diag().iter().fold(0.0f64, |m, v| m.max(v.abs())).max(f64::MIN_POSITIVE);

    // A = L * L^T
    let mut l = Array2::<f64>::zeros((n, n));
    for i in 0..n {
        for j in 0..=i {
            let mut sum = 0.0;
            for k in 0..j {
                sum += l[[i, k]] * l[[j, k]];
            }

            if i == j {
                let diag = a[[i, i]] - sum;
                if diag <= PIVOT_TOLERANCE * scale {
                    return None;
                }
                l[[i, j]] = diag.sqrt();
            } else {
                l[[i, j]] = (a[[i, j]] - sum) / l[[j, j]];
            }
        }
    }

    // L * y = b
    let mut y = Array1::<f64>::zeros(n);
    for i in 0..n {
        let mut sum = 0.0;
        for j in 0..i {
            sum += l[[i, j]] * y[j];
        }
        y[i] = (b[i] - sum) / l[[i, i]];
    }

    // L^T * x = y
    let mut x = Array1::<f64>::zeros(n);
    for i in (0..n).rev() {
        let mut sum = 0.0;
        for j in (i + 1)..n {
            sum += l[[j, i]] * x[j];
        }
        x[i] = (y[i] - sum) / l[[i, i]];
    }

    Some(x)
}

/// Matrix inversion using Gauss-Jordan elimination with partial pivoting
fn matrix_inverse(m: &Array2<f64>) -> Option<Array2<f64>> {
    let n = m.nrows();
    if n != m.ncols() {
        return None;
    }

    // [M | I]
    let mut aug = Array2::<f64>::zeros((n, 2 * n));
    for i in 0..n {
        for j in 0..n {
            aug[[i, j]] = m[[i, j]];
        }
        aug[[i, n + i]] = 1.0;
    }

    for col in 0..n {
        let mut max_row = col;
        for row in col + 1..n {
            if aug[[row, col]].abs() > aug[[max_row, col]].abs() {
                max_row = row;
            }
        }

        if max_row != col {
            for j in 0..2 * n {
                aug.swap([col, j], [max_row, j]);
            }
        }

        if aug[[col, col]].abs() < 1e-12 {
            return None;
        }

        let pivot = aug[[col, col]];
        for j in 0..2 * n {
            aug[[col, j]] /= pivot;
        }

        for row in 0..n {
            if row != col {
                let factor = aug[[row, col]];
                if factor != 0.0 {
                    for j in 0..2 * n {
                        aug[[row, j]] -= factor * aug[[col, j]];
                    }
                }
            }
        }
    }

    Some(aug.slice(ndarray::s![.., n..]).to_owned())
}

/// Solve least squares via normal equations `(X^T X) w = X^T y`.
///
/// Rank-deficient systems get a ridge term scaled to the mean diagonal,
/// which converges on the minimum-norm solution; Gauss-Jordan is the last
/// resort.
fn solve_least_squares(x: &Array2<f64>, y: &Array1<f64>) -> Option<Array1<f64>> {
    let xtx = x.t().dot(x);
    let xty = x.t().dot(y);

    if let Some(w) = cholesky_solve(&xtx, &xty) {
        return Some(w);
    }

    let n = xtx.nrows();
    let mean_diag = xtx.diag().iter().map(|v| v.abs()).sum::<f64>() / n.max(1) as f64;
    let ridge = 1e-8 * mean_diag.max(1.0);
    warn!(ridge, "Normal equations are rank deficient, adding ridge term");

    let mut regularized = xtx.clone();
    for k in 0..n {
        regularized[[k, k]] += ridge;
    }
    if let Some(w) = cholesky_solve(&regularized, &xty) {
        return Some(w);
    }

    matrix_inverse(&regularized).map(|inv| inv.dot(&xty))
}

/// Linear regression model
#[derive(Debug, Clone)]
pub struct LinearRegression {
    /// Fitted coefficients (weights)
    pub coefficients: Option<Array1<f64>>,
    /// Fitted intercept (bias)
    pub intercept: Option<f64>,
    /// Whether to fit intercept
    pub fit_intercept: bool,
}

impl Default for LinearRegression {
    fn default() -> Self {
        Self::new()
    }
}

impl LinearRegression {
    /// Create a new linear regression model
    pub fn new() -> Self {
        Self {
            coefficients: None,
            intercept: None,
            fit_intercept: true,
        }
    }

    /// Enable/disable fitting intercept
    pub fn with_fit_intercept(mut self, fit_intercept: bool) -> Self {
        self.fit_intercept = fit_intercept;
        self
    }

    pub fn is_fitted(&self) -> bool {
        self.coefficients.is_some()
    }

    /// Fit the model to training data
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        let n_samples = x.nrows();

        if n_samples != y.len() {
            return Err(PredictorError::InvalidInput(format!(
                "feature matrix has {} rows but label vector has {}",
                n_samples,
                y.len()
            )));
        }
        if n_samples == 0 || x.ncols() == 0 {
            return Err(PredictorError::InvalidInput("feature matrix is empty".to_string()));
        }

        // Center data if fitting intercept
        let (x_work, y_work, x_mean, y_mean) = if self.fit_intercept {
            let x_mean = x
                .mean_axis(Axis(0))
                .ok_or_else(|| PredictorError::InvalidInput("feature matrix is empty".to_string()))?;
            let y_mean = y.mean().unwrap_or(0.0);
            let x_centered = x - &x_mean.view().insert_axis(Axis(0));
            let y_centered = y - y_mean;
            (x_centered, y_centered, Some(x_mean), y_mean)
        } else {
            (x.to_owned(), y.to_owned(), None, 0.0)
        };

        let coefficients = solve_least_squares(&x_work, &y_work).ok_or_else(|| {
            PredictorError::Computation("least squares system could not be solved".to_string())
        })?;

        if coefficients.iter().any(|c| !c.is_finite()) {
            return Err(PredictorError::Computation(
                "least squares produced non-finite coefficients".to_string(),
            ));
        }

        let intercept = match x_mean {
            Some(x_mean) => y_mean - x_mean.dot(&coefficients),
            None => 0.0,
        };

        self.coefficients = Some(coefficients);
        self.intercept = Some(intercept);
        Ok(self)
    }

    /// Make predictions
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let coefficients = self.coefficients.as_ref().ok_or_else(|| {
            PredictorError::Computation("linear model has not been fitted".to_string())
        })?;

        if x.ncols() != coefficients.len() {
            return Err(PredictorError::InvalidInput(format!(
                "expected {} features, got {}",
                coefficients.len(),
                x.ncols()
            )));
        }

        Ok(x.dot(coefficients) + self.intercept.unwrap_or(0.0))
    }
}

impl Regressor for LinearRegression {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        LinearRegression::fit(self, x, y).map(|_| ())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        LinearRegression::predict(self, x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_linear_regression_simple() {
        let x = array![
            [1.0, 1.0],
            [2.0, 1.0],
            [1.0, 2.0],
            [2.0, 2.0],
            [3.0, 1.0],
        ];
        // y = 2*x1 + 3*x2 + 1
        let y = array![6.0, 8.0, 9.0, 11.0, 10.0];

        let mut model = LinearRegression::new();
        model.fit(&x, &y).unwrap();

        let coefficients = model.coefficients.as_ref().unwrap();
        assert!((coefficients[0] - 2.0).abs() < 1e-8);
        assert!((coefficients[1] - 3.0).abs() < 1e-8);
        assert!((model.intercept.unwrap() - 1.0).abs() < 1e-8);

        let predictions = model.predict(&x).unwrap();
        for (p, t) in predictions.iter().zip(y.iter()) {
            assert!((p - t).abs() < 1e-8);
        }
    }

    #[test]
    fn test_without_intercept() {
        let x = array![[1.0], [2.0], [3.0]];
        let y = array![2.0, 4.0, 6.0];

        let mut model = LinearRegression::new().with_fit_intercept(false);
        model.fit(&x, &y).unwrap();

        assert!((model.coefficients.as_ref().unwrap()[0] - 2.0).abs() < 1e-10);
        assert_eq!(model.intercept, Some(0.0));
    }

    #[test]
    fn test_rank_deficient_two_rows() {
        // More unknowns than independent rows; the minimum-norm solution interpolates
        let x = array![[5.0, 3.0], [1.0, 9.0]];
        let y = array![2.0, 3.5];

        let mut model = LinearRegression::new();
        model.fit(&x, &y).unwrap();

        let predictions = model.predict(&x).unwrap();
        assert!((predictions[0] - 2.0).abs() < 1e-4, "got {}", predictions[0]);
        assert!((predictions[1] - 3.5).abs() < 1e-4, "got {}", predictions[1]);
    }

    #[test]
    fn test_collinear_features() {
        let x = array![[1.0, 2.0], [2.0, 4.0], [3.0, 6.0], [4.0, 8.0]];
        let y = array![1.0, 2.0, 3.0, 4.0];

        let mut model = LinearRegression::new();
        model.fit(&x, &y).unwrap();

        let predictions = model.predict(&x).unwrap();
        for (p, t) in predictions.iter().zip(y.iter()) {
            assert!((p - t).abs() < 1e-4);
        }
    }

    #[test]
    fn test_constant_feature() {
        let x = array![[1.0, 7.0], [2.0, 7.0], [3.0, 7.0]];
        let y = array![1.0, 2.0, 3.0];

        let mut model = LinearRegression::new();
        model.fit(&x, &y).unwrap();
        assert!(model.coefficients.as_ref().unwrap().iter().all(|c| c.is_finite()));
    }

    #[test]
    fn test_length_mismatch() {
        let x = array![[1.0], [2.0]];
        let y = array![1.0];
        let mut model = LinearRegression::new();
        assert!(matches!(model.fit(&x, &y), Err(PredictorError::InvalidInput(_))));
    }

    #[test]
    fn test_predict_wrong_width() {
        let mut model = LinearRegression::new();
        model.fit(&array![[1.0, 2.0], [2.0, 1.0], [3.0, 3.0]], &array![1.0, 2.0, 3.0]).unwrap();
        assert!(model.predict(&array![[1.0]]).is_err());
    }
}
