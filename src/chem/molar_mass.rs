//! Molar mass of the standard's template molecule.
//!
//! Two modes:
//!
//! - length-based: `length_bp × 650 g/mol`, the usual average for a base pair
//! - sequence-based: the molecule is weighed as single-stranded RNA. Each
//!   residue contributes its nucleoside monophosphate weight and every
//!   phosphodiester bond releases one water:
//!
//! ```text
//! M = Σ w(base_i) - (n - 1) · w(H2O)
//! ```
//!
//! DNA input is accepted; `T` is read as `U` before weighing.

use crate::domain::{MassKind, MolarMassMode};
use crate::error::QuantError;

/// Average weight of one base pair, g/mol.
pub const AVERAGE_BP_WEIGHT: f64 = 650.0;

const AVERAGE_WATER: f64 = 18.0153;
const MONOISOTOPIC_WATER: f64 = 18.010565;

/// Nucleoside monophosphate weights (A, C, G, U), g/mol.
const AVERAGE_RNA: [f64; 4] = [347.2212, 323.1965, 363.2206, 324.1813];
const MONOISOTOPIC_RNA: [f64; 4] = [347.063084, 323.051851, 363.057999, 324.035867];

/// A molar mass in g/mol. Always finite and > 0.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct MolarMass(f64);

impl MolarMass {
    pub fn new(grams_per_mol: f64) -> Result<Self, QuantError> {
        if !(grams_per_mol.is_finite() && grams_per_mol > 0.0) {
            return Err(QuantError::invalid(format!(
                "molar mass must be a positive number, got {grams_per_mol}"
            )));
        }
        Ok(Self(grams_per_mol))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

/// Estimate a molar mass from either a length or a sequence.
pub fn estimate_molar_mass(mode: &MolarMassMode) -> Result<MolarMass, QuantError> {
    match mode {
        MolarMassMode::Length { length_bp } => molar_mass_from_length(*length_bp),
        MolarMassMode::Sequence {
            sequence,
            mass_kind,
        } => molar_mass_from_sequence(sequence, *mass_kind),
    }
}

pub fn molar_mass_from_length(length_bp: u64) -> Result<MolarMass, QuantError> {
    if length_bp < 1 {
        return Err(QuantError::invalid("length_bp must be at least 1"));
    }
    MolarMass::new(length_bp as f64 * AVERAGE_BP_WEIGHT)
}

pub fn molar_mass_from_sequence(sequence: &str, kind: MassKind) -> Result<MolarMass, QuantError> {
    let rna = normalize_sequence(sequence)?;

    let (table, water) = match kind {
        MassKind::Average => (&AVERAGE_RNA, AVERAGE_WATER),
        MassKind::Monoisotopic => (&MONOISOTOPIC_RNA, MONOISOTOPIC_WATER),
    };

    let mut total = 0.0;
    for (pos, symbol) in rna.chars().enumerate() {
        let bases = expand_symbol(symbol).ok_or_else(|| {
            QuantError::invalid(format!(
                "unsupported nucleotide symbol '{symbol}' at position {}",
                pos + 1
            ))
        })?;
        let sum: f64 = bases.iter().map(|&b| table[b]).sum();
        total += sum / bases.len() as f64;
    }
    total -= (rna.len() as f64 - 1.0) * water;

    MolarMass::new(total)
}

/// Strip whitespace, upper-case and rewrite `T` as `U`.
///
/// Fails if nothing is left.
pub fn normalize_sequence(sequence: &str) -> Result<String, QuantError> {
    let rna: String = sequence
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| match c.to_ascii_uppercase() {
            'T' => 'U',
            other => other,
        })
        .collect();

    if rna.is_empty() {
        return Err(QuantError::invalid("sequence is empty"));
    }
    Ok(rna)
}

// Indices into the weight tables.
const A: usize = 0;
const C: usize = 1;
const G: usize = 2;
const U: usize = 3;

/// Bases an IUPAC symbol stands for.
fn expand_symbol(symbol: char) -> Option<&'static [usize]> {
    let bases: &'static [usize] = match symbol {
        'A' => &[A],
        'C' => &[C],
        'G' => &[G],
        'U' => &[U],
        'R' => &[A, G],
        'Y' => &[C, U],
        'S' => &[C, G],
        'W' => &[A, U],
        'K' => &[G, U],
        'M' => &[A, C],
        'B' => &[C, G, U],
        'D' => &[A, G, U],
        'H' => &[A, C, U],
        'V' => &[A, C, G],
        'N' => &[A, C, G, U],
        _ => return None,
    };
    Some(bases)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_mode_uses_average_bp_weight() {
        let mm = molar_mass_from_length(1000).unwrap();
        assert_eq!(mm.value(), 650_000.0);
        assert!(molar_mass_from_length(0).unwrap_err().is_invalid_input());
    }

    #[test]
    fn single_residue_has_no_water_loss() {
        let mm = molar_mass_from_sequence("a", MassKind::Average).unwrap();
        assert!((mm.value() - 347.2212).abs() < 1e-9);
    }

    #[test]
    fn sequence_mode_subtracts_water_per_bond() {
        let expected = 347.2212 + 323.1965 + 363.2206 + 324.1813 - 3.0 * 18.0153;
        let mm = molar_mass_from_sequence("ACGU", MassKind::Average).unwrap();
        assert!((mm.value() - expected).abs() < 1e-9);
    }

    #[test]
    fn dna_and_whitespace_normalize_to_rna() {
        let dna = molar_mass_from_sequence(" ac\ngt\t", MassKind::Average).unwrap();
        let rna = molar_mass_from_sequence("ACGU", MassKind::Average).unwrap();
        assert_eq!(dna, rna);
    }

    #[test]
    fn monoisotopic_weights_are_lighter() {
        let avg = molar_mass_from_sequence("ACGUACGU", MassKind::Average).unwrap();
        let mono = molar_mass_from_sequence("ACGUACGU", MassKind::Monoisotopic).unwrap();
        assert!(mono < avg);
    }

    #[test]
    fn n_is_mean_of_four_bases() {
        let n = molar_mass_from_sequence("N", MassKind::Average).unwrap();
        let mean = (347.2212 + 323.1965 + 363.2206 + 324.1813) / 4.0;
        assert!((n.value() - mean).abs() < 1e-9);
    }

    #[test]
    fn rejects_empty_and_foreign_symbols() {
        assert!(molar_mass_from_sequence(" \n ", MassKind::Average)
            .unwrap_err()
            .is_invalid_input());
        let err = molar_mass_from_sequence("ACGX", MassKind::Average).unwrap_err();
        assert!(err.to_string().contains("position 4"));
    }

    #[test]
    fn estimate_dispatches_on_mode() {
        let by_len = estimate_molar_mass(&MolarMassMode::Length { length_bp: 2 }).unwrap();
        assert_eq!(by_len.value(), 1300.0);
        let by_seq = estimate_molar_mass(&MolarMassMode::Sequence {
            sequence: "U".to_string(),
            mass_kind: MassKind::Average,
        })
        .unwrap();
        assert!((by_seq.value() - 324.1813).abs() < 1e-9);
    }
}
