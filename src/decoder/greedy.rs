//! Best-path decoding.
//!
//! Takes the most probable class at every timestep, collapses runs of the same
//! class and drops blanks. Much cheaper than beam search and a useful baseline.

use super::labeling::Labeling;
use super::matrix::{EmissionMatrix, SymbolTable};
use crate::error::Result;
use crate::types::SymbolIndex;

/// Most probable labeling along the single best alignment.
pub fn best_path_labeling(matrix: &EmissionMatrix, symbols: &SymbolTable) -> Result<Labeling> {
    matrix.check_symbols(symbols)?;
    let blank = symbols.blank_index();

    let mut indices = Vec::new();
    let mut previous: Option<SymbolIndex> = None;
    for t in 0..matrix.timesteps() {
        // First maximum wins on ties.
        let best = matrix
            .row(t)
            .iter()
            .enumerate()
            .fold((0, f64::NEG_INFINITY), |(idx_max, val_max), (idx, &val)| {
                if val > val_max {
                    (idx, val)
                } else {
                    (idx_max, val_max)
                }
            })
            .0;

        if best != blank && previous != Some(best) {
            indices.push(best);
        }
        previous = Some(best);
    }

    Ok(Labeling::from(indices))
}

/// Best-path decoding mapped to text.
pub fn best_path(matrix: &EmissionMatrix, symbols: &SymbolTable) -> Result<String> {
    Ok(symbols.decode(&best_path_labeling(matrix, symbols)?))
}
