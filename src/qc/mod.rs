//! Standard curve acceptance checks.

use std::collections::BTreeSet;

use crate::domain::{QcFlag, QcThresholds, StandardCurve};

/// Flags for every threshold the curve violates. Empty means the curve passes.
pub fn evaluate_quality(curve: &StandardCurve, thresholds: &QcThresholds) -> BTreeSet<QcFlag> {
    evaluate_metrics(curve.slope(), curve.r_squared(), thresholds)
}

/// As [`evaluate_quality`], on raw slope and R².
pub fn evaluate_metrics(slope: f64, r_squared: f64, thresholds: &QcThresholds) -> BTreeSet<QcFlag> {
    let mut flags = BTreeSet::new();
    if r_squared < thresholds.min_r_squared {
        flags.insert(QcFlag::LowRSquared);
    }
    if slope < thresholds.min_slope || slope > thresholds.max_slope {
        flags.insert(QcFlag::SlopeOutOfRange);
    }
    flags
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::StandardPoint;
    use crate::fit::fit_standard_curve;

    #[test]
    fn low_r_squared_alone() {
        let flags = evaluate_metrics(-3.3, 0.95, &QcThresholds::default());
        assert_eq!(flags.into_iter().collect::<Vec<_>>(), vec![QcFlag::LowRSquared]);
    }

    #[test]
    fn both_flags_together() {
        let flags = evaluate_metrics(-2.5, 0.5, &QcThresholds::default());
        assert!(flags.contains(&QcFlag::LowRSquared));
        assert!(flags.contains(&QcFlag::SlopeOutOfRange));
    }

    #[test]
    fn bounds_are_inclusive() {
        let t = QcThresholds {
            min_slope: -3.6,
            max_slope: -3.1,
            min_r_squared: 0.98,
        };
        assert!(evaluate_metrics(-3.6, 0.98, &t).is_empty());
        assert!(evaluate_metrics(-3.1, 1.0, &t).is_empty());
        assert_eq!(
            evaluate_metrics(-3.0, 1.0, &t).into_iter().collect::<Vec<_>>(),
            vec![QcFlag::SlopeOutOfRange]
        );
    }

    #[test]
    fn ideal_curve_passes() {
        let points: Vec<StandardPoint> = (0..5)
            .map(|i| {
                let copies = 1e7 / 10f64.powi(i);
                StandardPoint {
                    name: format!("S{i}"),
                    dilution_factor: 10f64.powi(i),
                    ct: -3.32 * copies.log10() + 40.0,
                    copies,
                }
            })
            .collect();
        let curve = fit_standard_curve(&points).unwrap();
        assert!(evaluate_quality(&curve, &QcThresholds::default()).is_empty());
    }
}
