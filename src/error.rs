//! Error types.
//!
//! - [`QuantError`] is returned by every core computation. It has exactly two
//!   kinds: a caller broke a documented precondition, or the inputs are valid
//!   individually but cannot support the requested computation.
//! - [`AppError`] is what the binary reports; it carries a process exit code.

use thiserror::Error;

/// Errors raised by the quantification core.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QuantError {
    /// A caller-supplied value violates a documented precondition.
    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },

    /// Inputs are valid but mathematically unfit for the computation
    /// (zero-variance x-values, zero slope, too few points).
    #[error("Degenerate input: {reason}")]
    DegenerateInput { reason: String },
}

impl QuantError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        QuantError::InvalidInput {
            reason: reason.into(),
        }
    }

    pub fn degenerate(reason: impl Into<String>) -> Self {
        QuantError::DegenerateInput {
            reason: reason.into(),
        }
    }

    pub fn is_invalid_input(&self) -> bool {
        matches!(self, QuantError::InvalidInput { .. })
    }

    pub fn is_degenerate(&self) -> bool {
        matches!(self, QuantError::DegenerateInput { .. })
    }
}

/// Exit code for bad arguments, unreadable files and malformed input.
pub const EXIT_INVALID: u8 = 2;
/// Exit code for data that cannot be fit.
pub const EXIT_DEGENERATE: u8 = 3;
/// Exit code for anything else.
pub const EXIT_INTERNAL: u8 = 4;

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<QuantError> for AppError {
    fn from(err: QuantError) -> Self {
        let code = match err {
            QuantError::InvalidInput { .. } => EXIT_INVALID,
            QuantError::DegenerateInput { .. } => EXIT_DEGENERATE,
        };
        AppError::new(code, err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quant_errors_map_to_exit_codes() {
        let invalid: AppError = QuantError::invalid("negative mass").into();
        assert_eq!(invalid.exit_code(), EXIT_INVALID);
        assert!(invalid.message().contains("negative mass"));

        let degenerate: AppError = QuantError::degenerate("flat curve").into();
        assert_eq!(degenerate.exit_code(), EXIT_DEGENERATE);
    }
}
