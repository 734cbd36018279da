//! Serial dilution series construction.
//!
//! Point `i` (0-based) of a series with factor `f` has been diluted `f^i`
//! times from stock, so it holds `base_copies / f^i` copies. Its Ct defaults
//! to the arithmetic progression `start_ct + i · ct_interval` unless the
//! caller supplies a measured value.

use log::debug;

use crate::domain::StandardPoint;
use crate::error::QuantError;

/// Dilution series parameters.
///
/// `Default` mirrors a typical 10-fold, five point series with Ct values three
/// cycles apart starting at 9.
#[derive(Debug, Clone, PartialEq)]
pub struct DilutionSeries {
    pub base_copies: f64,
    pub n_points: usize,
    pub dilution_factor: f64,
    pub start_ct: f64,
    pub ct_interval: f64,
    /// Measured Ct per point; `None` keeps the default progression.
    pub ct_overrides: Vec<Option<f64>>,
    /// Names per point; missing or blank entries fall back to `Standard {i+1}`.
    pub names: Vec<String>,
}

impl Default for DilutionSeries {
    fn default() -> Self {
        Self {
            base_copies: 1.0,
            n_points: 5,
            dilution_factor: 10.0,
            start_ct: 9.0,
            ct_interval: 3.0,
            ct_overrides: Vec::new(),
            names: Vec::new(),
        }
    }
}

impl DilutionSeries {
    pub fn new(base_copies: f64) -> Self {
        Self {
            base_copies,
            ..Self::default()
        }
    }

    pub fn n_points(mut self, n_points: usize) -> Self {
        self.n_points = n_points;
        self
    }

    pub fn dilution_factor(mut self, factor: f64) -> Self {
        self.dilution_factor = factor;
        self
    }

    pub fn ct_progression(mut self, start_ct: f64, ct_interval: f64) -> Self {
        self.start_ct = start_ct;
        self.ct_interval = ct_interval;
        self
    }

    pub fn ct_overrides(mut self, overrides: Vec<Option<f64>>) -> Self {
        self.ct_overrides = overrides;
        self
    }

    pub fn names(mut self, names: Vec<String>) -> Self {
        self.names = names;
        self
    }

    /// Expand into ordered standard points, most concentrated first.
    pub fn build(&self) -> Result<Vec<StandardPoint>, QuantError> {
        if !self.base_copies.is_finite() || self.base_copies <= 0.0 {
            return Err(QuantError::invalid(format!(
                "base copies must be positive, got {}",
                self.base_copies
            )));
        }
        if self.n_points < 2 {
            return Err(QuantError::invalid(format!(
                "a standard curve needs at least 2 points, got {}",
                self.n_points
            )));
        }
        if !self.dilution_factor.is_finite() || self.dilution_factor <= 1.0 {
            return Err(QuantError::invalid(format!(
                "dilution factor must be greater than 1, got {}",
                self.dilution_factor
            )));
        }
        if !(self.start_ct.is_finite() && self.ct_interval.is_finite()) {
            return Err(QuantError::invalid("Ct progression must be finite"));
        }
        if self.ct_overrides.len() > self.n_points {
            return Err(QuantError::invalid(format!(
                "{} Ct values given for {} points",
                self.ct_overrides.len(),
                self.n_points
            )));
        }

        // The last point is the most dilute; fail before allocating anything
        // if it cannot be represented.
        let floor = self.base_copies / self.dilution_factor.powf((self.n_points - 1) as f64);
        if !(floor.is_finite() && floor > 0.0) {
            return Err(QuantError::invalid(format!(
                "{} points at factor {} underflow to {floor} copies",
                self.n_points, self.dilution_factor
            )));
        }

        let mut points = Vec::with_capacity(self.n_points.min(64));
        for i in 0..self.n_points {
            let dilution_total = self.dilution_factor.powf(i as f64);
            let copies = self.base_copies / dilution_total;
            if !(copies.is_finite() && copies > 0.0) {
                return Err(QuantError::invalid(format!(
                    "point {} underflows to {copies} copies",
                    i + 1
                )));
            }

            let ct = match self.ct_overrides.get(i).copied().flatten() {
                Some(ct) => ct,
                None => self.start_ct + i as f64 * self.ct_interval,
            };
            if !ct.is_finite() || ct < 0.0 {
                return Err(QuantError::invalid(format!(
                    "Ct for point {} must be non-negative, got {ct}",
                    i + 1
                )));
            }

            let name = match self.names.get(i) {
                Some(name) if !name.trim().is_empty() => name.clone(),
                _ => default_name(i),
            };

            points.push(StandardPoint {
                name,
                dilution_factor: dilution_total,
                ct,
                copies,
            });
        }

        debug!(
            "built {} standards: base={:.4e} factor={} floor={:.4e}",
            points.len(),
            self.base_copies,
            self.dilution_factor,
            points.last().map(|p| p.copies).unwrap_or(f64::NAN)
        );

        Ok(points)
    }
}

/// Positional default name for point `i` (0-based).
pub fn default_name(i: usize) -> String {
    format!("Standard {}", i + 1)
}

/// Functional form of [`DilutionSeries::build`] with default naming.
pub fn build_dilution_series(
    base_copies: f64,
    n_points: usize,
    dilution_factor: f64,
    start_ct: f64,
    ct_interval: f64,
    overrides: &[Option<f64>],
) -> Result<Vec<StandardPoint>, QuantError> {
    DilutionSeries::new(base_copies)
        .n_points(n_points)
        .dilution_factor(dilution_factor)
        .ct_progression(start_ct, ct_interval)
        .ct_overrides(overrides.to_vec())
        .build()
}

/// Return a copy of `points` with the Ct of point `index` replaced.
pub fn with_ct(points: &[StandardPoint], index: usize, ct: f64) -> Result<Vec<StandardPoint>, QuantError> {
    if index >= points.len() {
        return Err(QuantError::invalid(format!(
            "no standard at position {} (series has {})",
            index + 1,
            points.len()
        )));
    }
    if !ct.is_finite() || ct < 0.0 {
        return Err(QuantError::invalid(format!("Ct must be non-negative, got {ct}")));
    }
    let mut out = points.to_vec();
    out[index].ct = ct;
    Ok(out)
}
