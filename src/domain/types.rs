//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - passed by value between the pure core functions
//! - exported to CSV as flat records
//! - saved into a session file and reloaded later

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// One standard of a serial dilution series.
///
/// Names need not be unique; points are identified by their position in the
/// owning series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardPoint {
    pub name: String,
    /// Cumulative dilution from stock (`1.0` for the undiluted stock).
    pub dilution_factor: f64,
    pub ct: f64,
    pub copies: f64,
}

impl StandardPoint {
    /// `log10(copies)`, the regression x-value.
    pub fn log10_copies(&self) -> f64 {
        self.copies.log10()
    }

    /// Dilution label as shown in tables, e.g. `1:100`.
    pub fn dilution_label(&self) -> String {
        format!("1:{}", format_dilution(self.dilution_factor))
    }
}

fn format_dilution(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        format!("{value}")
    }
}

/// Identity of a fitted curve.
///
/// Two curves share a key only if they were fit on the same points and
/// produced the same parameters; results derived from a curve remember its
/// key so stale results can be detected after a refit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct CurveKey(pub u64);

/// A fitted log-linear standard curve: `ct = slope · log10(copies) + intercept`.
///
/// The only way to obtain one is [`crate::fit::fit_standard_curve`], so the
/// fit statistics always belong to the points stored alongside them. Changing
/// a point means building a new curve (see [`StandardCurve::with_ct`]).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StandardCurve {
    pub(crate) points: Vec<StandardPoint>,
    pub(crate) slope: f64,
    pub(crate) intercept: f64,
    pub(crate) r_squared: f64,
    pub(crate) efficiency_pct: f64,
    pub(crate) lod_copies: f64,
}

impl StandardCurve {
    pub fn points(&self) -> &[StandardPoint] {
        &self.points
    }

    pub fn slope(&self) -> f64 {
        self.slope
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    pub fn r_squared(&self) -> f64 {
        self.r_squared
    }

    pub fn efficiency_pct(&self) -> f64 {
        self.efficiency_pct
    }

    /// Smallest copy number among the standards (a series floor).
    pub fn lod_copies(&self) -> f64 {
        self.lod_copies
    }

    /// Predicted Ct at the given copy number.
    pub fn predict_ct(&self, copies: f64) -> f64 {
        self.slope * copies.log10() + self.intercept
    }

    /// Ct range `(min, max)` covered by the standards.
    pub fn ct_range(&self) -> (f64, f64) {
        self.points
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
                (lo.min(p.ct), hi.max(p.ct))
            })
    }

    pub fn key(&self) -> CurveKey {
        let mut hasher = DefaultHasher::new();
        self.slope.to_bits().hash(&mut hasher);
        self.intercept.to_bits().hash(&mut hasher);
        for p in &self.points {
            p.name.hash(&mut hasher);
            p.dilution_factor.to_bits().hash(&mut hasher);
            p.ct.to_bits().hash(&mut hasher);
            p.copies.to_bits().hash(&mut hasher);
        }
        CurveKey(hasher.finish())
    }
}

/// An interval `[lower, upper]` for a fitted parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    pub lower: f64,
    pub upper: f64,
}

impl ConfidenceInterval {
    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }
}

/// Percentile bootstrap output.
///
/// Intervals are `None` when no resample produced a valid fit; that means
/// "insufficient data", never a zero-width interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BootstrapResult {
    pub slope_ci: Option<ConfidenceInterval>,
    pub intercept_ci: Option<ConfidenceInterval>,
    pub n_valid_resamples: usize,
    pub n_requested: usize,
    pub ci_level: f64,
}

/// A quantified unknown sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnknownSample {
    pub name: String,
    pub ct: f64,
    pub dilution_factor: f64,
    pub copies: f64,
    /// Ct lies outside the standards' Ct range (extrapolated, advisory).
    pub out_of_range: bool,
    #[serde(skip)]
    pub curve_key: CurveKey,
}

impl UnknownSample {
    /// Whether this result was computed against `curve` as it is now.
    pub fn is_current_for(&self, curve: &StandardCurve) -> bool {
        self.curve_key == curve.key()
    }
}

/// Raw inputs for one unknown sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnknownInput {
    pub name: String,
    pub ct: f64,
    pub dilution_factor: f64,
}

/// Acceptance window for a standard curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QcThresholds {
    pub min_slope: f64,
    pub max_slope: f64,
    pub min_r_squared: f64,
}

impl Default for QcThresholds {
    /// Slopes of −3.6 to −3.1 correspond to roughly 90–110 % efficiency.
    fn default() -> Self {
        Self {
            min_slope: -3.6,
            max_slope: -3.1,
            min_r_squared: 0.98,
        }
    }
}

/// Out-of-spec conditions reported by the quality gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QcFlag {
    LowRSquared,
    SlopeOutOfRange,
}

impl QcFlag {
    pub fn display_name(self) -> &'static str {
        match self {
            QcFlag::LowRSquared => "low R²",
            QcFlag::SlopeOutOfRange => "slope out of range",
        }
    }
}

/// Which tabulated residue weights to use for sequence-based molar mass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MassKind {
    #[default]
    Average,
    Monoisotopic,
}

/// How the stock molar mass is determined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MolarMassMode {
    /// `length_bp × 650 g/mol`.
    Length { length_bp: u64 },
    /// Composition-based RNA weight of the given sequence.
    Sequence { sequence: String, mass_kind: MassKind },
}

/// Bootstrap settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BootstrapSettings {
    pub resamples: usize,
    pub ci_level: f64,
    pub seed: u64,
}

impl Default for BootstrapSettings {
    fn default() -> Self {
        Self {
            resamples: 200,
            ci_level: 0.95,
            seed: 42,
        }
    }
}

/// Where the standards for a run come from.
#[derive(Debug, Clone)]
pub enum StandardsSource {
    /// Build a dilution series from a stock description.
    Series(SeriesConfig),
    /// Read standards from a CSV file.
    Csv(PathBuf),
}

/// Stock + dilution series parameters.
#[derive(Debug, Clone)]
pub struct SeriesConfig {
    pub conc_ng: f64,
    pub molar_mass: MolarMassMode,
    pub n_points: usize,
    pub dilution_factor: f64,
    pub start_ct: f64,
    pub ct_interval: f64,
    pub ct_overrides: Vec<Option<f64>>,
    pub names: Vec<String>,
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults and environment).
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub standards: StandardsSource,
    pub unknowns: Vec<UnknownInput>,
    pub unknowns_csv: Option<PathBuf>,
    pub thresholds: QcThresholds,
    pub bootstrap: BootstrapSettings,

    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,

    pub export_standards: Option<PathBuf>,
    pub export_unknowns: Option<PathBuf>,
    pub save_session: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(ct: f64, copies: f64) -> StandardPoint {
        StandardPoint {
            name: "S".to_string(),
            dilution_factor: 1.0,
            ct,
            copies,
        }
    }

    #[test]
    fn dilution_label_formats_whole_numbers() {
        let mut p = point(9.0, 1e6);
        p.dilution_factor = 10000.0;
        assert_eq!(p.dilution_label(), "1:10000");
        p.dilution_factor = 2.5;
        assert_eq!(p.dilution_label(), "1:2.5");
    }

    #[test]
    fn curve_key_changes_with_any_ct() {
        let curve = StandardCurve {
            points: vec![point(9.0, 1e6), point(12.0, 1e5)],
            slope: -3.0,
            intercept: 27.0,
            r_squared: 1.0,
            efficiency_pct: 115.4,
            lod_copies: 1e5,
        };
        let mut moved = curve.clone();
        moved.points[1].ct = 12.5;
        assert_eq!(curve.key(), curve.clone().key());
        assert_ne!(curve.key(), moved.key());
    }

    #[test]
    fn ct_range_spans_points() {
        let curve = StandardCurve {
            points: vec![point(15.0, 1e4), point(9.0, 1e6), point(12.0, 1e5)],
            slope: -3.0,
            intercept: 27.0,
            r_squared: 1.0,
            efficiency_pct: 115.4,
            lod_copies: 1e4,
        };
        assert_eq!(curve.ct_range(), (9.0, 15.0));
    }
}
