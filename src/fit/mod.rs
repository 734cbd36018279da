//! Standard curve fitting and its uncertainty.
//!
//! Responsibilities:
//!
//! - fit the log-linear standard curve and derive efficiency / R² / LOD (`fitter`)
//! - percentile bootstrap intervals for slope and intercept (`bootstrap`)

pub mod bootstrap;
pub mod fitter;

pub use bootstrap::*;
pub use fitter::*;
