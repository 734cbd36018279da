//! Shared quantification pipeline used by every subcommand.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! stock -> standards -> fit -> {QC, bootstrap, unknowns}
//!
//! The front-end can then focus on presentation (printing and files).

use std::collections::BTreeSet;

use chrono::Utc;
use log::{info, warn};

use crate::app::audit::AuditLog;
use crate::chem::{compute_copies, estimate_molar_mass};
use crate::domain::{
    BootstrapResult, BootstrapSettings, MolarMassMode, QcFlag, QcThresholds, RunConfig, SeriesConfig,
    StandardCurve, StandardPoint, StandardsSource, UnknownInput, UnknownSample,
};
use crate::error::{AppError, QuantError};
use crate::fit::{StandardResidual, bootstrap_with_settings, compute_residuals, fit_standard_curve};
use crate::io::{FitSnapshot, RowError, SESSION_TOOL, SESSION_VERSION, SessionFile};
use crate::qc::evaluate_quality;
use crate::quantify::quantify_batch;
use crate::standards::DilutionSeries;

/// Undiluted stock as derived from concentration and molar mass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StockSummary {
    pub molar_mass: f64,
    pub base_copies: f64,
}

/// All computed outputs of a single run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub stock: Option<StockSummary>,
    pub curve: StandardCurve,
    pub residuals: Vec<StandardResidual>,
    pub flags: BTreeSet<QcFlag>,
    pub bootstrap: BootstrapResult,
    pub unknown_inputs: Vec<UnknownInput>,
    pub unknowns: Vec<UnknownSample>,
    pub row_errors: Vec<RowError>,
    pub audit: AuditLog,
}

/// Molar mass and copy number of the undiluted stock.
pub fn resolve_stock(conc_ng: f64, mode: &MolarMassMode) -> Result<StockSummary, QuantError> {
    let molar_mass = estimate_molar_mass(mode)?.value();
    let base_copies = compute_copies(conc_ng, molar_mass)?;
    Ok(StockSummary {
        molar_mass,
        base_copies,
    })
}

/// Build the dilution series described by `series`.
pub fn build_series(series: &SeriesConfig) -> Result<(StockSummary, Vec<StandardPoint>), QuantError> {
    let stock = resolve_stock(series.conc_ng, &series.molar_mass)?;
    let points = DilutionSeries::new(stock.base_copies)
        .n_points(series.n_points)
        .dilution_factor(series.dilution_factor)
        .ct_progression(series.start_ct, series.ct_interval)
        .ct_overrides(series.ct_overrides.clone())
        .names(series.names.clone())
        .build()?;
    Ok((stock, points))
}

/// Execute the full pipeline for a run configuration.
pub fn run_fit(config: &RunConfig) -> Result<RunOutput, AppError> {
    let mut audit = AuditLog::new();
    let mut row_errors = Vec::new();

    // 1) Standards.
    let (stock, standards) = match &config.standards {
        StandardsSource::Series(series) => {
            let (stock, points) = build_series(series)?;
            audit.record(format!(
                "Base copies {:.4e} from {} ng (molar mass {:.1} g/mol)",
                stock.base_copies, series.conc_ng, stock.molar_mass
            ));
            (Some(stock), points)
        }
        StandardsSource::Csv(path) => {
            let ingested = crate::io::load_standards_csv(path)?;
            audit.record(format!(
                "Standards loaded from '{}' ({} rows, {} skipped)",
                path.display(),
                ingested.rows.len(),
                ingested.row_errors.len()
            ));
            row_errors.extend(ingested.row_errors);
            (None, ingested.rows)
        }
    };
    audit.record(format!("Standards defined ({} points)", standards.len()));

    // 2) Unknown inputs.
    let mut unknown_inputs = config.unknowns.clone();
    if let Some(path) = &config.unknowns_csv {
        let ingested = crate::io::load_unknowns_csv(path)?;
        audit.record(format!(
            "Unknowns loaded from '{}' ({} rows, {} skipped)",
            path.display(),
            ingested.rows.len(),
            ingested.row_errors.len()
        ));
        unknown_inputs.extend(ingested.rows);
        row_errors.extend(ingested.row_errors);
    }

    let mut run = analyze(
        &standards,
        &unknown_inputs,
        &config.thresholds,
        &config.bootstrap,
        audit,
    )?;
    run.stock = stock;
    run.row_errors = row_errors;
    Ok(run)
}

/// Fit, check and quantify a set of standards and unknown inputs.
///
/// This is also how a saved session is re-evaluated.
pub fn analyze(
    standards: &[StandardPoint],
    unknown_inputs: &[UnknownInput],
    thresholds: &QcThresholds,
    bootstrap: &BootstrapSettings,
    mut audit: AuditLog,
) -> Result<RunOutput, AppError> {
    let curve = fit_standard_curve(standards)?;
    audit.record(format!(
        "Curve fitted: slope={:.4} intercept={:.4} R²={:.4} efficiency={:.1}%",
        curve.slope(),
        curve.intercept(),
        curve.r_squared(),
        curve.efficiency_pct()
    ));

    let flags = evaluate_quality(&curve, thresholds);
    if flags.is_empty() {
        audit.record("QC passed");
    } else {
        let names: Vec<&str> = flags.iter().map(|f| f.display_name()).collect();
        warn!("standard curve failed QC: {}", names.join(", "));
        audit.record(format!("QC failed: {}", names.join(", ")));
    }

    let residuals = compute_residuals(&curve);

    let boot = bootstrap_with_settings(curve.points(), bootstrap)?;
    info!(
        "bootstrap: {} of {} resamples valid",
        boot.n_valid_resamples, boot.n_requested
    );
    audit.record(format!(
        "Bootstrap run (seed {}, {} of {} resamples valid)",
        bootstrap.seed, boot.n_valid_resamples, boot.n_requested
    ));

    let unknowns = quantify_batch(&curve, unknown_inputs)?;
    if !unknowns.is_empty() {
        let outside = unknowns.iter().filter(|u| u.out_of_range).count();
        audit.record(format!(
            "Unknowns quantified ({}, {outside} outside standard range)",
            unknowns.len()
        ));
    }

    Ok(RunOutput {
        stock: None,
        curve,
        residuals,
        flags,
        bootstrap: boot,
        unknown_inputs: unknown_inputs.to_vec(),
        unknowns,
        row_errors: Vec::new(),
        audit,
    })
}

/// Snapshot a run as a session file.
pub fn session_from_run(
    run: &RunOutput,
    thresholds: &QcThresholds,
    bootstrap: &BootstrapSettings,
) -> SessionFile {
    SessionFile {
        tool: SESSION_TOOL.to_string(),
        version: SESSION_VERSION,
        saved_at: Utc::now(),
        standards: run.curve.points().to_vec(),
        unknowns: run.unknown_inputs.clone(),
        thresholds: *thresholds,
        bootstrap: *bootstrap,
        fit: Some(FitSnapshot {
            slope: run.curve.slope(),
            intercept: run.curve.intercept(),
            r_squared: run.curve.r_squared(),
            efficiency_pct: run.curve.efficiency_pct(),
            lod_copies: run.curve.lod_copies(),
        }),
        audit: run.audit.clone(),
    }
}

/// Refit a loaded session. Stored fit values are ignored.
pub fn run_session(session: SessionFile) -> Result<RunOutput, AppError> {
    let mut audit = AuditLog::new();
    audit.extend(session.audit);
    audit.record(format!(
        "Session loaded (saved {})",
        session.saved_at.to_rfc3339()
    ));
    analyze(
        &session.standards,
        &session.unknowns,
        &session.thresholds,
        &session.bootstrap,
        audit,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> RunConfig {
        RunConfig {
            standards: StandardsSource::Series(SeriesConfig {
                conc_ng: 100.0,
                molar_mass: MolarMassMode::Length { length_bp: 1000 },
                n_points: 5,
                dilution_factor: 10.0,
                start_ct: 9.0,
                ct_interval: 3.0,
                ct_overrides: vec![Some(9.2), Some(12.5), Some(15.8), Some(19.1), Some(22.4)],
                names: Vec::new(),
            }),
            unknowns: vec![UnknownInput {
                name: "U1".to_string(),
                ct: 17.0,
                dilution_factor: 1.0,
            }],
            unknowns_csv: None,
            thresholds: QcThresholds::default(),
            bootstrap: BootstrapSettings {
                resamples: 100,
                ci_level: 0.95,
                seed: 5,
            },
            plot: false,
            plot_width: 72,
            plot_height: 20,
            export_standards: None,
            export_unknowns: None,
            save_session: None,
        }
    }

    #[test]
    fn run_fit_end_to_end() {
        let run = run_fit(&config()).unwrap();
        let stock = run.stock.unwrap();
        assert_eq!(stock.molar_mass, 650_000.0);
        assert_eq!(run.curve.points().len(), 5);
        assert!((run.curve.slope() + 3.3).abs() < 1e-9);
        assert!(run.flags.is_empty());
        assert!(run.bootstrap.slope_ci.is_some());
        assert_eq!(run.unknowns.len(), 1);
        assert!(!run.unknowns[0].out_of_range);
        assert!(!run.audit.is_empty());
    }

    #[test]
    fn session_reload_reproduces_the_run() {
        let run = run_fit(&config()).unwrap();
        let cfg = config();
        let session = session_from_run(&run, &cfg.thresholds, &cfg.bootstrap);
        let reloaded = run_session(session).unwrap();

        assert_eq!(reloaded.curve, run.curve);
        assert_eq!(reloaded.bootstrap, run.bootstrap);
        assert_eq!(reloaded.unknowns, run.unknowns);
        assert!(reloaded.audit.entries().len() > run.audit.entries().len());
    }

    #[test]
    fn degenerate_standards_map_to_exit_code_3() {
        let mut cfg = config();
        if let StandardsSource::Series(series) = &mut cfg.standards {
            series.ct_overrides = vec![Some(20.0); 5];
        }
        let err = run_fit(&cfg).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_DEGENERATE);
    }

    #[test]
    fn bad_unknown_rows_are_skipped_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("unknowns.csv");
        std::fs::write(&path, "name,ct,dilution_factor\nA,20,1\nB,-3,1\nC,22,0\n").unwrap();

        let mut cfg = config();
        cfg.unknowns.clear();
        cfg.unknowns_csv = Some(path);
        let run = run_fit(&cfg).unwrap();

        assert_eq!(run.unknowns.len(), 1);
        assert_eq!(run.unknowns[0].name, "A");
        assert_eq!(run.row_errors.len(), 2);
    }
}
