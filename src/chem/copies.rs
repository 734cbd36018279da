//! Mass concentration to absolute copy number.

use crate::error::QuantError;

/// Molecules per mole.
pub const AVOGADRO: f64 = 6.022e23;

/// `copies = conc_ng · 1e-9 / molar_mass · AVOGADRO`.
///
/// `molar_mass` is in g/mol. No rounding is applied.
pub fn compute_copies(conc_ng: f64, molar_mass: f64) -> Result<f64, QuantError> {
    if !conc_ng.is_finite() || conc_ng < 0.0 {
        return Err(QuantError::invalid(format!(
            "concentration must be a non-negative number of ng, got {conc_ng}"
        )));
    }
    if !molar_mass.is_finite() || molar_mass <= 0.0 {
        return Err(QuantError::invalid(format!(
            "molar mass must be positive, got {molar_mass}"
        )));
    }
    let grams = conc_ng * 1e-9;
    let moles = grams / molar_mass;
    Ok(moles * AVOGADRO)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reproduces_closed_form() {
        for &(conc, len) in &[(100.0, 1000u64), (0.5, 1), (0.0, 250), (12.3, 4567)] {
            let mm = len as f64 * 650.0;
            let copies = compute_copies(conc, mm).unwrap();
            assert_eq!(copies, conc * 1e-9 / mm * 6.022e23);
        }
    }

    #[test]
    fn hundred_ng_of_one_kb() {
        // 100 ng of a 1000 bp template ≈ 9.26e10 copies.
        let copies = compute_copies(100.0, 650_000.0).unwrap();
        assert!((copies / 9.264615384615385e10 - 1.0).abs() < 1e-12);
    }

    #[test]
    fn rejects_invalid_arguments() {
        assert!(compute_copies(-1.0, 650.0).unwrap_err().is_invalid_input());
        assert!(compute_copies(1.0, 0.0).unwrap_err().is_invalid_input());
        assert!(compute_copies(1.0, -650.0).unwrap_err().is_invalid_input());
        assert!(compute_copies(f64::NAN, 650.0).unwrap_err().is_invalid_input());
    }
}
