//! Probability of growing a labeling by one symbol.

use super::beam::BeamState;
use super::labeling::Labeling;
use super::matrix::{EmissionMatrix, SymbolTable};
use crate::lm::LanguageModel;
use crate::types::{Probability, SymbolIndex};

/// Language model settings applied during extension.
#[derive(Clone, Copy)]
pub struct LmBias<'a> {
    /// Bigram source.
    pub model: &'a dyn LanguageModel,
    /// Exponent applied to the bigram probability.
    pub damping: f64,
    /// First symbol of the bigram when extending the empty labeling.
    pub context: char,
}

impl LmBias<'_> {
    /// Damped bigram factor for appending `k` to `labeling`.
    pub fn factor(&self, labeling: &Labeling, k: SymbolIndex, symbols: &SymbolTable) -> Probability {
        let first = labeling
            .last()
            .and_then(|last| symbols.symbol(last))
            .unwrap_or(self.context);
        let Some(second) = symbols.symbol(k) else {
            return 0.0;
        };
        self.model
            .bigram_probability(first, second)
            .powf(self.damping)
    }
}

/// Mass contributed at timestep `t` by extending `labeling` with symbol `k`.
///
/// Appending the labeling's own last symbol must pass through a blank, so the
/// previous `pr_blank` is used in that case; otherwise the previous `pr_total`.
/// The caller guarantees `labeling` has an entry in `last`; a missing entry
/// contributes nothing.
pub fn extension_probability(
    k: SymbolIndex,
    labeling: &Labeling,
    t: usize,
    matrix: &EmissionMatrix,
    last: &BeamState,
    symbols: &SymbolTable,
    lm: Option<&LmBias<'_>>,
) -> Probability {
    let bigram = lm.map_or(1.0, |bias| bias.factor(labeling, k, symbols));

    let Some(previous) = last.get(labeling) else {
        return 0.0;
    };
    let path = if labeling.last() == Some(k) {
        previous.pr_blank
    } else {
        previous.pr_total
    };

    matrix.get(t, k) * bigram * path
}
