//! Standard curve fitting.
//!
//! Given standards `(copies_i, ct_i)` we fit
//!
//! ```text
//! ct = slope · log10(copies) + intercept
//! ```
//!
//! by ordinary least squares and derive:
//! - `r_squared` (squared Pearson correlation)
//! - amplification efficiency `(10^(-1/slope) - 1) · 100`
//! - the series floor `min(copies_i)` reported as LOD
//!
//! Fitting is a pure function of the points; refitting the same points gives
//! bit-identical output.

use log::{debug, warn};

use crate::domain::{StandardCurve, StandardPoint};
use crate::error::QuantError;
use crate::math::fit_line;

/// Fit a standard curve over `points`.
///
/// Points with non-positive copies or an unusable Ct are left out of the fit
/// (and of the returned curve); fewer than 2 remaining points is degenerate.
pub fn fit_standard_curve(points: &[StandardPoint]) -> Result<StandardCurve, QuantError> {
    let points = usable_points(points);
    if points.len() < 2 {
        return Err(QuantError::degenerate(format!(
            "a standard curve needs at least 2 points with positive copies, got {}",
            points.len()
        )));
    }

    let x: Vec<f64> = points.iter().map(StandardPoint::log10_copies).collect();
    let y: Vec<f64> = points.iter().map(|p| p.ct).collect();

    if x.iter().all(|&v| v == x[0]) {
        return Err(QuantError::degenerate(
            "all standards have the same copy number; slope is undefined",
        ));
    }
    if y.iter().all(|&v| v == y[0]) {
        return Err(QuantError::degenerate(
            "all standards have the same Ct; the curve is flat",
        ));
    }

    let line = fit_line(&x, &y)
        .ok_or_else(|| QuantError::degenerate("least-squares solve failed for the standards"))?;
    if line.slope == 0.0 {
        return Err(QuantError::degenerate("fitted slope is zero"));
    }

    let efficiency_pct = efficiency_from_slope(line.slope);
    if !efficiency_pct.is_finite() {
        return Err(QuantError::degenerate(format!(
            "efficiency is undefined for slope {}",
            line.slope
        )));
    }

    let lod_copies = points
        .iter()
        .map(|p| p.copies)
        .fold(f64::INFINITY, f64::min);

    debug!(
        "fit {} standards: slope={:.5} intercept={:.5} r2={:.6} eff={:.2}%",
        points.len(),
        line.slope,
        line.intercept,
        line.r_squared,
        efficiency_pct
    );

    Ok(StandardCurve {
        points,
        slope: line.slope,
        intercept: line.intercept,
        r_squared: line.r_squared,
        efficiency_pct,
        lod_copies,
    })
}

/// Amplification efficiency in percent for a Ct-vs-log10 slope.
///
/// A slope of about −3.32 means perfect doubling per cycle (100 %).
pub fn efficiency_from_slope(slope: f64) -> f64 {
    (10f64.powf(-1.0 / slope) - 1.0) * 100.0
}

fn usable_points(points: &[StandardPoint]) -> Vec<StandardPoint> {
    let mut usable = Vec::with_capacity(points.len());
    for (i, p) in points.iter().enumerate() {
        if p.copies.is_finite() && p.copies > 0.0 && p.ct.is_finite() && p.ct >= 0.0 {
            usable.push(p.clone());
        } else {
            warn!(
                "standard {} ('{}') left out of the fit: copies={} ct={}",
                i + 1,
                p.name,
                p.copies,
                p.ct
            );
        }
    }
    usable
}

impl StandardCurve {
    /// Refit with the Ct of point `index` replaced, returning a new curve.
    pub fn with_ct(&self, index: usize, ct: f64) -> Result<StandardCurve, QuantError> {
        let points = crate::standards::with_ct(&self.points, index, ct)?;
        fit_standard_curve(&points)
    }
}

/// Fitted Ct and residual for one standard.
#[derive(Debug, Clone, PartialEq)]
pub struct StandardResidual {
    pub point: StandardPoint,
    pub ct_fit: f64,
    pub residual: f64,
}

/// Residual `ct - ct_fit` for every standard of the curve.
pub fn compute_residuals(curve: &StandardCurve) -> Vec<StandardResidual> {
    curve
        .points()
        .iter()
        .map(|p| {
            let ct_fit = curve.predict_ct(p.copies);
            StandardResidual {
                point: p.clone(),
                ct_fit,
                residual: p.ct - ct_fit,
            }
        })
        .collect()
}
