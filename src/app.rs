//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and parses CLI arguments
//! - resolves the stock and builds standards
//! - runs the fit / QC / bootstrap / quantification pipeline
//! - prints reports/plots
//! - writes optional exports and sessions

use std::path::Path;

use clap::Parser;
use log::{debug, warn};

use crate::cli::{Command, FitArgs, PlotArgs, SeriesArgs, SessionArgs, StandardsArgs, StockArgs};
use crate::domain::{
    BootstrapSettings, MolarMassMode, QcThresholds, RunConfig, SeriesConfig, StandardsSource, UnknownInput,
};
use crate::error::{AppError, EXIT_INVALID};

pub mod audit;
pub mod pipeline;

/// Entry point for the `qpcr` binary.
pub fn run() -> Result<(), AppError> {
    // Values in `.env` feed the `env = ...` defaults of the CLI.
    dotenvy::dotenv().ok();
    let cli = crate::cli::Cli::parse();

    match cli.command {
        Command::Copies(args) => handle_copies(args),
        Command::Standards(args) => handle_standards(args),
        Command::Fit(args) => handle_fit(args),
        Command::Session(args) => handle_session(args),
    }
}

fn handle_copies(args: StockArgs) -> Result<(), AppError> {
    let mode = molar_mass_mode_from_args(&args)?;
    let stock = pipeline::resolve_stock(args.conc_ng, &mode)?;
    println!(
        "{}",
        crate::report::format_stock_summary(Some(stock.molar_mass), stock.base_copies)
    );
    Ok(())
}

fn handle_standards(args: StandardsArgs) -> Result<(), AppError> {
    let series = series_config_from_args(&args.stock, &args.series)?;
    let (stock, points) = pipeline::build_series(&series)?;

    println!(
        "{}",
        crate::report::format_stock_summary(Some(stock.molar_mass), stock.base_copies)
    );
    println!("{}", crate::report::format_standards_table(&points));

    if let Some(path) = &args.export {
        crate::io::write_standards_csv(path, &points)?;
    }
    Ok(())
}

fn handle_fit(args: FitArgs) -> Result<(), AppError> {
    let config = run_config_from_args(&args)?;
    let mut run = pipeline::run_fit(&config)?;

    for err in &run.row_errors {
        eprintln!("skipped line {}: {}", err.line, err.message);
    }

    if let Some(stock) = run.stock {
        println!(
            "{}",
            crate::report::format_stock_summary(Some(stock.molar_mass), stock.base_copies)
        );
    }
    print_run(&run, &config.thresholds, config.plot, config.plot_width, config.plot_height);

    // Optional exports.
    if let Some(path) = &config.export_standards {
        crate::io::write_standards_csv(path, run.curve.points())?;
        run.audit.record(format!("Standards exported to '{}'", path.display()));
    }
    if let Some(path) = &config.export_unknowns {
        crate::io::write_unknowns_csv(path, &run.unknowns)?;
        run.audit.record(format!("Unknowns exported to '{}'", path.display()));
    }
    if let Some(path) = &config.save_session {
        run.audit.record(format!("Session saved to '{}'", path.display()));
        let session = pipeline::session_from_run(&run, &config.thresholds, &config.bootstrap);
        crate::io::write_session_json(path, &session)?;
    }

    Ok(())
}

fn handle_session(args: SessionArgs) -> Result<(), AppError> {
    let session = crate::io::read_session_json(&args.path)?;
    let thresholds = session.thresholds;
    let stored_fit = session.fit.clone();
    let run = pipeline::run_session(session)?;

    if let Some(fit) = stored_fit {
        let drift = (fit.slope - run.curve.slope()).abs() + (fit.intercept - run.curve.intercept()).abs();
        if drift > 1e-9 {
            warn!(
                "stored fit (slope {:.4}, intercept {:.4}) differs from refit",
                fit.slope,
                fit.intercept
            );
        }
    }

    let PlotArgs {
        no_plot,
        width,
        height,
    } = args.plot;
    print_run(&run, &thresholds, !no_plot, width, height);

    if args.audit {
        println!("Audit log:\n{}", run.audit.format());
    }
    Ok(())
}

fn print_run(
    run: &pipeline::RunOutput,
    thresholds: &QcThresholds,
    plot: bool,
    plot_width: usize,
    plot_height: usize,
) {
    println!("{}", crate::report::format_standards_table(run.curve.points()));
    println!(
        "{}",
        crate::report::format_curve_summary(&run.curve, &run.flags, thresholds)
    );
    println!("{}", crate::report::format_bootstrap(&run.bootstrap));
    println!("{}", crate::report::format_residuals(&run.residuals));
    if !run.unknowns.is_empty() {
        println!("{}", crate::report::format_unknowns(&run.unknowns));
    }
    if plot {
        let plot = crate::plot::render_curve_plot(&run.curve, &run.unknowns, plot_width, plot_height);
        println!("{plot}");
    }
}

pub fn run_config_from_args(args: &FitArgs) -> Result<RunConfig, AppError> {
    let standards = match &args.standards {
        Some(path) => StandardsSource::Csv(path.clone()),
        None => StandardsSource::Series(series_config_from_args(&args.stock, &args.series)?),
    };

    let unknowns = args
        .unknowns
        .iter()
        .enumerate()
        .map(|(j, spec)| parse_unknown(spec, j))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(RunConfig {
        standards,
        unknowns,
        unknowns_csv: args.unknowns_csv.clone(),
        thresholds: QcThresholds {
            min_slope: args.qc.min_slope,
            max_slope: args.qc.max_slope,
            min_r_squared: args.qc.min_r_squared,
        },
        bootstrap: BootstrapSettings {
            resamples: args.bootstrap.resamples,
            ci_level: args.bootstrap.ci_level,
            seed: args.bootstrap.seed,
        },
        plot: !args.plot.no_plot,
        plot_width: args.plot.width,
        plot_height: args.plot.height,
        export_standards: args.export_standards.clone(),
        export_unknowns: args.export_unknowns.clone(),
        save_session: args.save_session.clone(),
    })
}

pub fn series_config_from_args(stock: &StockArgs, series: &SeriesArgs) -> Result<SeriesConfig, AppError> {
    let ct_overrides = series
        .ct
        .iter()
        .map(|s| parse_ct_override(s))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(SeriesConfig {
        conc_ng: stock.conc_ng,
        molar_mass: molar_mass_mode_from_args(stock)?,
        n_points: series.points,
        dilution_factor: series.factor,
        start_ct: series.start_ct,
        ct_interval: series.ct_interval,
        ct_overrides,
        names: series.names.clone(),
    })
}

fn molar_mass_mode_from_args(args: &StockArgs) -> Result<MolarMassMode, AppError> {
    let sequence = match (&args.sequence, &args.sequence_file) {
        (Some(seq), _) => Some(seq.clone()),
        (None, Some(path)) => Some(read_sequence_file(path)?),
        (None, None) => None,
    };

    Ok(match sequence {
        Some(sequence) => MolarMassMode::Sequence {
            sequence,
            mass_kind: args.mass_kind(),
        },
        None => MolarMassMode::Length {
            length_bp: args.length_bp,
        },
    })
}

/// Read a plain or FASTA sequence file. Header (`>`) and comment (`;`) lines
/// are skipped; the remaining lines are concatenated.
fn read_sequence_file(path: &Path) -> Result<String, AppError> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        AppError::new(
            EXIT_INVALID,
            format!("Failed to read sequence file '{}': {e}", path.display()),
        )
    })?;
    let sequence = parse_sequence_text(&text);
    debug!("read {} residues from '{}'", sequence.len(), path.display());
    Ok(sequence)
}

fn parse_sequence_text(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.starts_with('>') && !line.starts_with(';'))
        .collect()
}

/// `-` or an empty entry keeps the default Ct for that position.
fn parse_ct_override(raw: &str) -> Result<Option<f64>, AppError> {
    let raw = raw.trim();
    if raw.is_empty() || raw == "-" {
        return Ok(None);
    }
    raw.parse::<f64>()
        .map(Some)
        .map_err(|_| AppError::new(EXIT_INVALID, format!("Invalid Ct value '{raw}'")))
}

/// Parse `NAME:CT[:DILUTION]`. An empty name falls back to `Unknown {j+1}`.
fn parse_unknown(spec: &str, index: usize) -> Result<UnknownInput, AppError> {
    let bad = || {
        AppError::new(
            EXIT_INVALID,
            format!("Invalid unknown '{spec}' (expected NAME:CT[:DILUTION])"),
        )
    };

    let parts: Vec<&str> = spec.split(':').map(str::trim).collect();
    let (name, ct, dilution) = match parts.as_slice() {
        [name, ct] => (*name, *ct, None),
        [name, ct, dilution] => (*name, *ct, Some(*dilution)),
        _ => return Err(bad()),
    };

    let ct: f64 = ct.parse().map_err(|_| bad())?;
    let dilution_factor: f64 = match dilution {
        Some(d) => d.parse().map_err(|_| bad())?,
        None => 1.0,
    };
    let name = if name.is_empty() {
        crate::quantify::default_unknown_name(index)
    } else {
        name.to_string()
    };

    Ok(UnknownInput {
        name,
        ct,
        dilution_factor,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_unknown_forms() {
        let u = parse_unknown("Sample A:24.5", 0).unwrap();
        assert_eq!(u.name, "Sample A");
        assert_eq!(u.ct, 24.5);
        assert_eq!(u.dilution_factor, 1.0);

        let u = parse_unknown(":18:10", 2).unwrap();
        assert_eq!(u.name, "Unknown 3");
        assert_eq!(u.dilution_factor, 10.0);

        assert_eq!(parse_unknown("A", 0).unwrap_err().exit_code(), EXIT_INVALID);
        assert_eq!(parse_unknown("A:x", 0).unwrap_err().exit_code(), EXIT_INVALID);
        assert!(parse_unknown("A:1:2:3", 0).is_err());
    }

    #[test]
    fn ct_override_placeholders() {
        assert_eq!(parse_ct_override("-").unwrap(), None);
        assert_eq!(parse_ct_override(" ").unwrap(), None);
        assert_eq!(parse_ct_override("12.25").unwrap(), Some(12.25));
        assert!(parse_ct_override("abc").is_err());
    }

    #[test]
    fn fasta_headers_are_skipped() {
        let text = ">amplicon 1\nACGU\n; note\n  ACG \n";
        assert_eq!(parse_sequence_text(text), "ACGUACG");
    }

    #[test]
    fn cli_args_map_to_run_config() {
        let cli = crate::cli::Cli::try_parse_from([
            "qpcr",
            "fit",
            "--length-bp",
            "500",
            "--ct",
            "9.1,-,15.2",
            "-u",
            "U1:20:5",
            "--seed",
            "7",
            "--no-plot",
        ])
        .unwrap();
        let Command::Fit(args) = cli.command else {
            panic!("expected fit");
        };
        let config = run_config_from_args(&args).unwrap();

        let StandardsSource::Series(series) = &config.standards else {
            panic!("expected series");
        };
        assert_eq!(series.molar_mass, MolarMassMode::Length { length_bp: 500 });
        assert_eq!(series.ct_overrides, vec![Some(9.1), None, Some(15.2)]);
        assert_eq!(config.unknowns[0].dilution_factor, 5.0);
        assert_eq!(config.bootstrap.seed, 7);
        assert!(!config.plot);
    }
}
