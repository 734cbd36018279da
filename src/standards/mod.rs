//! Standard dilution series.

pub mod dilution;

pub use dilution::*;
