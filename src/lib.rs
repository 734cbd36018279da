//! `qpcr-quant` library crate.
//!
//! The binary (`qpcr`) is a thin wrapper around this library so that:
//!
//! - the quantification math is testable without spawning processes
//! - modules are reusable from other front-ends
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod chem;
pub mod cli;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod plot;
pub mod qc;
pub mod quantify;
pub mod report;
pub mod standards;
