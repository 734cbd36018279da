//! Stock description → molecule count.
//!
//! - `molar_mass`: g/mol from a length or a sequence
//! - `copies`: ng + g/mol → absolute copy number

pub mod copies;
pub mod molar_mass;

pub use copies::*;
pub use molar_mass::*;
