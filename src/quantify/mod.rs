//! Back-calculation of unknown samples from a fitted standard curve.
//!
//! ```text
//! log10_copies = (ct - intercept) / slope
//! copies       = 10^log10_copies × dilution_factor
//! ```
//!
//! `dilution_factor` acts as a multiplicative loading factor. A Ct outside the
//! standards' Ct range is still quantified but flagged as extrapolated.

use log::warn;

use crate::domain::{StandardCurve, UnknownInput, UnknownSample};
use crate::error::QuantError;

/// Quantify a single unknown with the default name.
pub fn quantify_unknown(
    curve: &StandardCurve,
    ct: f64,
    dilution_factor: f64,
) -> Result<UnknownSample, QuantError> {
    quantify_named(curve, default_unknown_name(0), ct, dilution_factor)
}

pub fn quantify_named(
    curve: &StandardCurve,
    name: impl Into<String>,
    ct: f64,
    dilution_factor: f64,
) -> Result<UnknownSample, QuantError> {
    let name = name.into();
    if !ct.is_finite() || ct < 0.0 {
        return Err(QuantError::invalid(format!(
            "Ct for '{name}' must be non-negative, got {ct}"
        )));
    }
    if !dilution_factor.is_finite() || dilution_factor <= 0.0 {
        return Err(QuantError::invalid(format!(
            "dilution factor for '{name}' must be positive, got {dilution_factor}"
        )));
    }
    if curve.slope() == 0.0 {
        return Err(QuantError::degenerate("standard curve slope is zero"));
    }

    let log10_copies = (ct - curve.intercept()) / curve.slope();
    let copies = 10f64.powf(log10_copies) * dilution_factor;

    let (ct_min, ct_max) = curve.ct_range();
    let out_of_range = ct < ct_min || ct > ct_max;
    if out_of_range {
        warn!("'{name}' Ct {ct} lies outside the standards' range [{ct_min}, {ct_max}]");
    }

    Ok(UnknownSample {
        name,
        ct,
        dilution_factor,
        copies,
        out_of_range,
        curve_key: curve.key(),
    })
}

/// Quantify several unknowns; blank names become `Unknown {j+1}`.
///
/// Stops at the first invalid input.
pub fn quantify_batch(
    curve: &StandardCurve,
    inputs: &[UnknownInput],
) -> Result<Vec<UnknownSample>, QuantError> {
    inputs
        .iter()
        .enumerate()
        .map(|(j, input)| {
            let name = if input.name.trim().is_empty() {
                default_unknown_name(j)
            } else {
                input.name.clone()
            };
            quantify_named(curve, name, input.ct, input.dilution_factor)
        })
        .collect()
}

pub fn default_unknown_name(j: usize) -> String {
    format!("Unknown {}", j + 1)
}

impl UnknownSample {
    /// `log10` of the copies before the loading factor was applied.
    pub fn log10_copies(&self) -> f64 {
        (self.copies / self.dilution_factor).log10()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::StandardPoint;
    use crate::fit::fit_standard_curve;

    fn curve() -> StandardCurve {
        let points: Vec<StandardPoint> = [(1e6, 15.0), (1e5, 18.3), (1e4, 21.6), (1e3, 24.9)]
            .iter()
            .enumerate()
            .map(|(i, &(copies, ct))| StandardPoint {
                name: format!("S{i}"),
                dilution_factor: 10f64.powi(i as i32),
                ct,
                copies,
            })
            .collect();
        fit_standard_curve(&points).unwrap()
    }

    #[test]
    fn ct_at_intercept_returns_loading_factor() {
        let c = curve();
        let sample = quantify_unknown(&c, c.intercept(), 4.0).unwrap();
        assert!((sample.copies - 4.0).abs() < 1e-9);
        assert!(sample.out_of_range);
    }

    #[test]
    fn inside_range_inverts_the_line() {
        let c = curve();
        let sample = quantify_named(&c, "U1", 18.3, 1.0).unwrap();
        assert!((sample.copies / 1e5 - 1.0).abs() < 1e-6);
        assert!(!sample.out_of_range);
        assert!((sample.log10_copies() - 5.0).abs() < 1e-6);
    }

    #[test]
    fn range_edges_are_inside() {
        let c = curve();
        assert!(!quantify_unknown(&c, 15.0, 1.0).unwrap().out_of_range);
        assert!(!quantify_unknown(&c, 24.9, 1.0).unwrap().out_of_range);
        assert!(quantify_unknown(&c, 25.0, 1.0).unwrap().out_of_range);
    }

    #[test]
    fn invalid_inputs() {
        let c = curve();
        assert!(quantify_unknown(&c, -0.1, 1.0).unwrap_err().is_invalid_input());
        assert!(quantify_unknown(&c, 20.0, 0.0).unwrap_err().is_invalid_input());
        assert!(quantify_unknown(&c, 20.0, -2.0).unwrap_err().is_invalid_input());
    }

    #[test]
    fn zero_slope_is_degenerate() {
        let mut c = curve();
        c.slope = 0.0;
        assert!(quantify_unknown(&c, 20.0, 1.0).unwrap_err().is_degenerate());
    }

    #[test]
    fn batch_names_and_staleness() {
        let c = curve();
        let inputs = vec![
            UnknownInput { name: String::new(), ct: 20.0, dilution_factor: 1.0 },
            UnknownInput { name: "Patient 7".to_string(), ct: 22.0, dilution_factor: 10.0 },
        ];
        let samples = quantify_batch(&c, &inputs).unwrap();
        assert_eq!(samples[0].name, "Unknown 1");
        assert_eq!(samples[1].name, "Patient 7");
        assert!(samples.iter().all(|s| s.is_current_for(&c)));

        let refit = c.with_ct(0, 15.2).unwrap();
        assert!(!samples[0].is_current_for(&refit));
    }
}
