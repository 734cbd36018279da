//! Least-squares line fitting.
//!
//! The standard curve is a straight line in `(log10(copies), Ct)` space:
//!
//! ```text
//! minimize Σ (y_i - slope·x_i - intercept)^2
//! ```
//!
//! Implementation choices:
//! - We center x before building the design matrix. The columns `[1, x - x̄]`
//!   are then orthogonal, which keeps the solve well conditioned even when the
//!   copy numbers span ten orders of magnitude.
//! - The small tall system is solved with SVD (nalgebra's `QR::solve` is
//!   intended for square systems).
//! - The intercept is recovered as `β0 - slope·x̄`.

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    for &tol in &[1e-12, 1e-10, 1e-8] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// Result of a simple linear regression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineFit {
    pub slope: f64,
    pub intercept: f64,
    /// Squared Pearson correlation (`1 - SS_res / SS_tot`), clamped to `[0, 1]`.
    /// Zero when y has no variance.
    pub r_squared: f64,
}

/// Fit `y = slope·x + intercept` by ordinary least squares.
///
/// Returns `None` when fewer than two points are given, the slices differ in
/// length, any value is non-finite, or all x-values are identical.
pub fn fit_line(x: &[f64], y: &[f64]) -> Option<LineFit> {
    let n = x.len();
    if n < 2 || y.len() != n {
        return None;
    }
    if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
        return None;
    }
    if x.iter().all(|&v| v == x[0]) {
        return None;
    }

    let x_mean = x.iter().sum::<f64>() / n as f64;
    let y_mean = y.iter().sum::<f64>() / n as f64;

    let mut design = DMatrix::zeros(n, 2);
    for (i, &xi) in x.iter().enumerate() {
        design[(i, 0)] = 1.0;
        design[(i, 1)] = xi - x_mean;
    }
    let target = DVector::from_column_slice(y);
    let beta = solve_least_squares(&design, &target)?;

    let slope = beta[1];
    let intercept = beta[0] - slope * x_mean;

    let ss_tot: f64 = y.iter().map(|&yi| (yi - y_mean).powi(2)).sum();
    let ss_res: f64 = x
        .iter()
        .zip(y)
        .map(|(&xi, &yi)| (yi - (slope * xi + intercept)).powi(2))
        .sum();
    let r_squared = if ss_tot > 0.0 {
        (1.0 - ss_res / ss_tot).clamp(0.0, 1.0)
    } else {
        0.0
    };

    if !(slope.is_finite() && intercept.is_finite()) {
        return None;
    }

    Some(LineFit {
        slope,
        intercept,
        r_squared,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn least_squares_solves_simple_system() {
        // Fit y = 2 + 3x on x = [0,1,2]
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-10);
        assert!((beta[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn fit_line_recovers_exact_line() {
        let x = [10.0, 9.0, 8.0, 7.0, 6.0];
        let y: Vec<f64> = x.iter().map(|v| -3.3 * v + 42.0).collect();

        let fit = fit_line(&x, &y).unwrap();
        assert!((fit.slope + 3.3).abs() < 1e-10);
        assert!((fit.intercept - 42.0).abs() < 1e-9);
        assert!((fit.r_squared - 1.0).abs() < 1e-12);
    }

    #[test]
    fn fit_line_matches_textbook_example() {
        // Hand-computed: x̄ = 2, ȳ = 3, Sxy = 8, Sxx = 10, Syy = 10.
        let x = [0.0, 1.0, 2.0, 3.0, 4.0];
        let y = [1.0, 3.0, 2.0, 5.0, 4.0];

        let fit = fit_line(&x, &y).unwrap();
        assert!((fit.slope - 0.8).abs() < 1e-10);
        assert!((fit.intercept - 1.4).abs() < 1e-10);
        // r² = Sxy² / (Sxx·Syy) = 64 / (10·10)
        assert!((fit.r_squared - 0.64).abs() < 1e-10);
    }

    #[test]
    fn fit_line_rejects_degenerate_x() {
        assert!(fit_line(&[1.0], &[2.0]).is_none());
        assert!(fit_line(&[3.0, 3.0, 3.0], &[1.0, 2.0, 3.0]).is_none());
        assert!(fit_line(&[1.0, f64::NAN], &[1.0, 2.0]).is_none());
        assert!(fit_line(&[1.0, 2.0], &[1.0]).is_none());
    }
}
