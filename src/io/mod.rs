//! Input/output helpers.
//!
//! - CSV ingest + validation (`ingest`)
//! - CSV exports of standards and unknowns (`export`)
//! - session JSON read/write (`session`)

pub mod export;
pub mod ingest;
pub mod session;

pub use export::*;
pub use ingest::*;
pub use session::*;
