//! Reporting utilities: formatted tables and summaries for the terminal.

pub mod format;

pub use format::*;
