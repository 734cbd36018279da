//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the math/fitting code stays clean and testable
//! - output changes are localized

use std::collections::BTreeSet;

use crate::domain::{BootstrapResult, QcFlag, QcThresholds, StandardCurve, StandardPoint, UnknownSample};
use crate::fit::StandardResidual;

/// Stock summary: molar mass (when known) and undiluted copies.
pub fn format_stock_summary(molar_mass: Option<f64>, base_copies: f64) -> String {
    let mut out = String::new();
    if let Some(mm) = molar_mass {
        out.push_str(&format!("Molecular weight: {mm:.1} g/mol\n"));
    }
    out.push_str(&format!(
        "Undiluted stock contains {} copies\n",
        format_count(base_copies)
    ));
    out
}

pub fn format_standards_table(points: &[StandardPoint]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<20} {:>14} {:>8} {:>22}\n",
        "name", "dilution", "ct", "copies"
    ));
    out.push_str(&format!("{:-<20} {:-<14} {:-<8} {:-<22}\n", "", "", "", ""));
    for p in points {
        out.push_str(&format!(
            "{:<20} {:>14} {:>8.2} {:>22}\n",
            truncate(&p.name, 20),
            p.dilution_label(),
            p.ct,
            format_count(p.copies)
        ));
    }
    out
}

/// Curve parameters, derived metrics and QC verdict.
pub fn format_curve_summary(
    curve: &StandardCurve,
    flags: &BTreeSet<QcFlag>,
    thresholds: &QcThresholds,
) -> String {
    let mut out = String::new();
    out.push_str("=== qpcr - Standard Curve ===\n");
    out.push_str(&format!("Standards: n={}\n", curve.points().len()));
    out.push_str(&format!("Slope:      {:.3}\n", curve.slope()));
    out.push_str(&format!("Intercept:  {:.3}\n", curve.intercept()));
    out.push_str(&format!("R²:         {:.4}\n", curve.r_squared()));
    out.push_str(&format!("Efficiency: {:.1}%\n", curve.efficiency_pct()));
    out.push_str(&format!("LOD:        {} copies\n", format_count(curve.lod_copies())));

    out.push_str(&format!(
        "\nQC (slope in [{:.2}, {:.2}], R² >= {:.3}): ",
        thresholds.min_slope, thresholds.max_slope, thresholds.min_r_squared
    ));
    if flags.is_empty() {
        out.push_str("pass\n");
    } else {
        let names: Vec<&str> = flags.iter().map(|f| f.display_name()).collect();
        out.push_str(&format!("FAIL ({})\n", names.join(", ")));
    }
    out
}

pub fn format_bootstrap(result: &BootstrapResult) -> String {
    let pct = result.ci_level * 100.0;
    match (result.slope_ci, result.intercept_ci) {
        (Some(slope), Some(intercept)) => format!(
            "Bootstrap {pct:.0}% CI ({} of {} resamples valid)\n\
             Slope CI:     {:.3} - {:.3}\n\
             Intercept CI: {:.3} - {:.3}\n",
            result.n_valid_resamples,
            result.n_requested,
            slope.lower,
            slope.upper,
            intercept.lower,
            intercept.upper
        ),
        _ => "Insufficient data for bootstrap confidence intervals.\n".to_string(),
    }
}

pub fn format_residuals(residuals: &[StandardResidual]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<20} {:>10} {:>8} {:>8} {:>9}\n",
        "name", "log10(C)", "ct", "ct_fit", "residual"
    ));
    out.push_str(&format!("{:-<20} {:-<10} {:-<8} {:-<8} {:-<9}\n", "", "", "", "", ""));
    for r in residuals {
        out.push_str(&format!(
            "{:<20} {:>10.3} {:>8.2} {:>8.2} {:>9.3}\n",
            truncate(&r.point.name, 20),
            r.point.log10_copies(),
            r.point.ct,
            r.ct_fit,
            r.residual
        ));
    }
    out
}

pub fn format_unknowns(samples: &[UnknownSample]) -> String {
    let mut out = String::new();
    out.push_str("Results for unknown samples:\n");
    for s in samples {
        let note = if s.out_of_range { "  [outside standard range]" } else { "" };
        out.push_str(&format!(
            "- {}: {} copies (Ct={}, Dilution={}){note}\n",
            s.name,
            format_count(s.copies),
            s.ct,
            s.dilution_factor
        ));
    }
    out
}

/// Whole copies with thousands separators; scientific notation for huge or
/// tiny values.
pub fn format_count(value: f64) -> String {
    if !value.is_finite() {
        return format!("{value}");
    }
    if value.abs() >= 1e15 || (value != 0.0 && value.abs() < 1.0) {
        return format!("{value:.3e}");
    }

    let rounded = format!("{:.0}", value.abs());
    let mut grouped = String::with_capacity(rounded.len() + rounded.len() / 3);
    for (i, ch) in rounded.chars().enumerate() {
        if i > 0 && (rounded.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if value < 0.0 {
        grouped.insert(0, '-');
    }
    grouped
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ConfidenceInterval;

    #[test]
    fn counts_are_grouped() {
        assert_eq!(format_count(0.0), "0");
        assert_eq!(format_count(999.4), "999");
        assert_eq!(format_count(1000.0), "1,000");
        assert_eq!(format_count(92_646_153_846.15), "92,646,153,846");
        assert_eq!(format_count(-12_345.0), "-12,345");
        assert_eq!(format_count(2.5e20), "2.500e20");
        assert_eq!(format_count(0.25), "2.500e-1");
    }

    #[test]
    fn bootstrap_without_interval_says_so() {
        let result = BootstrapResult {
            slope_ci: None,
            intercept_ci: None,
            n_valid_resamples: 0,
            n_requested: 200,
            ci_level: 0.95,
        };
        assert_eq!(
            format_bootstrap(&result),
            "Insufficient data for bootstrap confidence intervals.\n"
        );
    }

    #[test]
    fn bootstrap_interval_lines() {
        let result = BootstrapResult {
            slope_ci: Some(ConfidenceInterval { lower: -3.41, upper: -3.22 }),
            intercept_ci: Some(ConfidenceInterval { lower: 37.9, upper: 39.1 }),
            n_valid_resamples: 198,
            n_requested: 200,
            ci_level: 0.95,
        };
        let txt = format_bootstrap(&result);
        assert!(txt.starts_with("Bootstrap 95% CI (198 of 200 resamples valid)\n"));
        assert!(txt.contains("Slope CI:     -3.410 - -3.220\n"));
        assert!(txt.contains("Intercept CI: 37.900 - 39.100\n"));
    }

    #[test]
    fn unknowns_mark_extrapolation() {
        let samples = vec![UnknownSample {
            name: "U1".to_string(),
            ct: 30.0,
            dilution_factor: 1.0,
            copies: 12.0,
            out_of_range: true,
            curve_key: Default::default(),
        }];
        let txt = format_unknowns(&samples);
        assert!(txt.contains("- U1: 12 copies (Ct=30, Dilution=1)  [outside standard range]"));
    }
}
