//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the quantification value types (`StandardPoint`, `StandardCurve`, `UnknownSample`, ...)
//! - quality-control configuration (`QcThresholds`, `QcFlag`)
//! - run configuration (`RunConfig`) assembled by the front-end

pub mod types;

pub use types::*;
