//! Percentile bootstrap confidence intervals for slope and intercept.
//!
//! Each resample draws `n` standards uniformly with replacement and refits the
//! line. Resamples that cannot be fit (fewer than two usable points, or a
//! single distinct copy number) are dropped and not retried; the number that
//! survived is reported as `n_valid_resamples`.
//!
//! Determinism: one `u64` seed per resample is drawn up front from the caller's
//! RNG, then resamples run in parallel, each on its own `StdRng`. Results are
//! collected in draw order, so the output depends only on the caller's RNG.

use log::{debug, warn};
use rand::prelude::*;
use rand::rngs::StdRng;
use rayon::prelude::*;

use crate::domain::{BootstrapResult, BootstrapSettings, ConfidenceInterval, StandardPoint};
use crate::error::QuantError;
use crate::math::{fit_line, percentile_sorted};

/// Bootstrap slope/intercept intervals using the given random source.
pub fn bootstrap_ci<R: Rng + ?Sized>(
    points: &[StandardPoint],
    n_resamples: usize,
    ci_level: f64,
    rng: &mut R,
) -> Result<BootstrapResult, QuantError> {
    if !(ci_level.is_finite() && ci_level > 0.0 && ci_level < 1.0) {
        return Err(QuantError::invalid(format!(
            "confidence level must be in (0, 1), got {ci_level}"
        )));
    }

    let seeds: Vec<u64> = (0..n_resamples).map(|_| rng.r#gen::<u64>()).collect();

    let fits: Vec<(f64, f64)> = seeds
        .par_iter()
        .filter_map(|&seed| {
            let mut local = StdRng::seed_from_u64(seed);
            fit_resample(points, &mut local)
        })
        .collect();

    let n_valid = fits.len();
    if n_valid < n_resamples {
        debug!("bootstrap dropped {} of {n_resamples} resamples", n_resamples - n_valid);
    }

    let (slope_ci, intercept_ci) = if n_valid == 0 {
        if n_resamples > 0 {
            warn!("no bootstrap resample produced a valid fit");
        }
        (None, None)
    } else {
        let mut slopes: Vec<f64> = fits.iter().map(|&(m, _)| m).collect();
        let mut intercepts: Vec<f64> = fits.iter().map(|&(_, b)| b).collect();
        (
            Some(interval(&mut slopes, ci_level)),
            Some(interval(&mut intercepts, ci_level)),
        )
    };

    Ok(BootstrapResult {
        slope_ci,
        intercept_ci,
        n_valid_resamples: n_valid,
        n_requested: n_resamples,
        ci_level,
    })
}

/// Bootstrap with a seeded `StdRng`; identical seeds give identical results.
pub fn bootstrap_confidence_intervals(
    points: &[StandardPoint],
    n_resamples: usize,
    ci_level: f64,
    rng_seed: u64,
) -> Result<BootstrapResult, QuantError> {
    let mut rng = StdRng::seed_from_u64(rng_seed);
    bootstrap_ci(points, n_resamples, ci_level, &mut rng)
}

/// Bootstrap using run settings.
pub fn bootstrap_with_settings(
    points: &[StandardPoint],
    settings: &BootstrapSettings,
) -> Result<BootstrapResult, QuantError> {
    bootstrap_confidence_intervals(points, settings.resamples, settings.ci_level, settings.seed)
}

/// Draw one resample and fit it. `None` if the resample is unusable.
fn fit_resample<R: Rng + ?Sized>(points: &[StandardPoint], rng: &mut R) -> Option<(f64, f64)> {
    let n = points.len();
    if n == 0 {
        return None;
    }

    let mut x = Vec::with_capacity(n);
    let mut y = Vec::with_capacity(n);
    for _ in 0..n {
        let p = &points[rng.gen_range(0..n)];
        if p.copies.is_finite() && p.copies > 0.0 && p.ct.is_finite() && p.ct >= 0.0 {
            x.push(p.copies.log10());
            y.push(p.ct);
        }
    }
    if x.len() < 2 {
        return None;
    }

    fit_line(&x, &y).map(|line| (line.slope, line.intercept))
}

fn interval(values: &mut [f64], ci_level: f64) -> ConfidenceInterval {
    values.sort_by(|a, b| a.total_cmp(b));
    let tail = (1.0 - ci_level) / 2.0;
    ConfidenceInterval {
        lower: percentile_sorted(values, tail),
        upper: percentile_sorted(values, 1.0 - tail),
    }
}
