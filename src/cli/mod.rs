//! Command-line parsing for the qPCR quantification tool.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the quantification math.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::MassKind;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "qpcr", version, about = "qPCR standard curve & absolute copy number builder")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Compute molar mass and copy number of an undiluted stock.
    Copies(StockArgs),
    /// Build and print a dilution series of standards.
    Standards(StandardsArgs),
    /// Fit the standard curve, run QC and bootstrap, and quantify unknowns.
    Fit(FitArgs),
    /// Reload a saved session, refit it and print the results.
    Session(SessionArgs),
}

/// How the undiluted stock is described.
#[derive(Debug, Args, Clone)]
pub struct StockArgs {
    /// Stock concentration (ng).
    #[arg(long = "conc-ng", default_value_t = 100.0)]
    pub conc_ng: f64,

    /// Template length (bp); molar mass = length × 650 g/mol.
    #[arg(long, default_value_t = 1000, conflicts_with_all = ["sequence", "sequence_file"])]
    pub length_bp: u64,

    /// Template sequence (DNA or RNA); weighed as single-stranded RNA.
    #[arg(long)]
    pub sequence: Option<String>,

    /// Read the template sequence from a file (FASTA header lines are skipped).
    #[arg(long, value_name = "PATH", conflicts_with = "sequence")]
    pub sequence_file: Option<PathBuf>,

    /// Use monoisotopic instead of average residue weights.
    #[arg(long)]
    pub monoisotopic: bool,
}

impl StockArgs {
    pub fn mass_kind(&self) -> MassKind {
        if self.monoisotopic {
            MassKind::Monoisotopic
        } else {
            MassKind::Average
        }
    }
}

/// Dilution series layout.
#[derive(Debug, Args, Clone)]
pub struct SeriesArgs {
    /// Number of dilution points.
    #[arg(short = 'n', long, default_value_t = 5)]
    pub points: usize,

    /// Fold dilution between consecutive points.
    #[arg(short = 'f', long, default_value_t = 10.0)]
    pub factor: f64,

    /// Default Ct of the undiluted standard.
    #[arg(long, default_value_t = 9.0)]
    pub start_ct: f64,

    /// Default Ct step between consecutive points.
    #[arg(long, default_value_t = 3.0)]
    pub ct_interval: f64,

    /// Measured Ct values in series order; `-` keeps the default for that point.
    #[arg(long, value_delimiter = ',', value_name = "CT,CT,...")]
    pub ct: Vec<String>,

    /// Standard names in series order.
    #[arg(long, value_delimiter = ',', value_name = "NAME,NAME,...")]
    pub names: Vec<String>,
}

#[derive(Debug, Args, Clone)]
pub struct StandardsArgs {
    #[command(flatten)]
    pub stock: StockArgs,

    #[command(flatten)]
    pub series: SeriesArgs,

    /// Export the standards to CSV.
    #[arg(long, value_name = "CSV")]
    pub export: Option<PathBuf>,
}

/// QC acceptance thresholds.
#[derive(Debug, Args, Clone)]
pub struct QcArgs {
    /// Lowest acceptable slope.
    #[arg(long, env = "QPCR_MIN_SLOPE", default_value_t = -3.6, allow_negative_numbers = true)]
    pub min_slope: f64,

    /// Highest acceptable slope.
    #[arg(long, env = "QPCR_MAX_SLOPE", default_value_t = -3.1, allow_negative_numbers = true)]
    pub max_slope: f64,

    /// Lowest acceptable R².
    #[arg(long = "min-r2", env = "QPCR_MIN_R2", default_value_t = 0.98)]
    pub min_r_squared: f64,
}

/// Bootstrap settings.
#[derive(Debug, Args, Clone)]
pub struct BootstrapArgs {
    /// Number of bootstrap resamples (0 disables).
    #[arg(long, env = "QPCR_RESAMPLES", default_value_t = 200)]
    pub resamples: usize,

    /// Confidence level of the bootstrap intervals.
    #[arg(long = "ci", env = "QPCR_CI_LEVEL", default_value_t = 0.95)]
    pub ci_level: f64,

    /// Random seed for resampling.
    #[arg(long, env = "QPCR_SEED", default_value_t = 42)]
    pub seed: u64,
}

/// Terminal plot options.
#[derive(Debug, Args, Clone)]
pub struct PlotArgs {
    /// Disable the terminal plot.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 72)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,
}

#[derive(Debug, Args, Clone)]
pub struct FitArgs {
    #[command(flatten)]
    pub stock: StockArgs,

    #[command(flatten)]
    pub series: SeriesArgs,

    /// Read standards from CSV (name,dilution_factor,ct,copies) instead of building a series.
    #[arg(long, value_name = "CSV")]
    pub standards: Option<PathBuf>,

    /// Unknown sample as NAME:CT[:DILUTION] (repeatable).
    #[arg(short = 'u', long = "unknown", value_name = "NAME:CT[:DILUTION]")]
    pub unknowns: Vec<String>,

    /// Read unknown samples from CSV (name,ct[,dilution_factor]).
    #[arg(long, value_name = "CSV")]
    pub unknowns_csv: Option<PathBuf>,

    #[command(flatten)]
    pub qc: QcArgs,

    #[command(flatten)]
    pub bootstrap: BootstrapArgs,

    #[command(flatten)]
    pub plot: PlotArgs,

    /// Export standards to CSV.
    #[arg(long, value_name = "CSV")]
    pub export_standards: Option<PathBuf>,

    /// Export quantified unknowns to CSV.
    #[arg(long, value_name = "CSV")]
    pub export_unknowns: Option<PathBuf>,

    /// Save the session (inputs, settings, audit log) to JSON.
    #[arg(long, value_name = "JSON")]
    pub save_session: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct SessionArgs {
    /// Session JSON written by `qpcr fit --save-session`.
    #[arg(value_name = "JSON")]
    pub path: PathBuf,

    /// Print the audit log.
    #[arg(long)]
    pub audit: bool,

    #[command(flatten)]
    pub plot: PlotArgs,
}
