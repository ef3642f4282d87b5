//! Character-level language models used to bias beam extension.
//!
//! The decoder only needs a bigram lookup between two symbols, exposed through
//! the [`LanguageModel`] trait. [`CharBigramModel`] is a count-based model built
//! from a plain text corpus.

use crate::decoder::SymbolTable;
use crate::error::Result;
use crate::types::Probability;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Bigram probability source consulted when a labeling grows by one symbol.
pub trait LanguageModel: Send + Sync {
    /// Probability in `[0, 1]` that `second` follows `first`.
    fn bigram_probability(&self, first: char, second: char) -> Probability;
}

impl<L: LanguageModel + ?Sized> LanguageModel for &L {
    fn bigram_probability(&self, first: char, second: char) -> Probability {
        (**self).bigram_probability(first, second)
    }
}

impl<L: LanguageModel + ?Sized> LanguageModel for std::sync::Arc<L> {
    fn bigram_probability(&self, first: char, second: char) -> Probability {
        (**self).bigram_probability(first, second)
    }
}

/// Count-based character bigram model.
///
/// `P(b | a)` is the number of times `b` directly follows `a` in the corpus,
/// divided by the number of bigrams starting with `a`. Characters outside the
/// model's alphabet break the chain. Unseen first characters yield 0.
#[derive(Debug, Clone, Default)]
pub struct CharBigramModel {
    counts: HashMap<char, HashMap<char, u64>>,
    totals: HashMap<char, u64>,
}

impl CharBigramModel {
    /// Build a model from `corpus`, counting only characters in `symbols`
    /// plus `context`, the character that stands in for "start of text".
    pub fn from_corpus(corpus: &str, symbols: &SymbolTable, context: char) -> Self {
        let mut model = Self::default();
        let mut previous: Option<char> = None;
        for ch in corpus.chars() {
            let known = symbols.contains(ch) || ch == context;
            if let (Some(first), true) = (previous, known) {
                model.observe(first, ch);
            }
            previous = known.then_some(ch);
        }
        debug!(
            first_symbols = model.totals.len(),
            bigrams = model.totals.values().sum::<u64>(),
            "Built character bigram model"
        );
        model
    }

    /// Build a model from the corpus file at `path`.
    pub fn from_file<P: AsRef<Path>>(path: P, symbols: &SymbolTable, context: char) -> Result<Self> {
        let corpus = fs::read_to_string(path)?;
        Ok(Self::from_corpus(&corpus, symbols, context))
    }

    fn observe(&mut self, first: char, second: char) {
        *self
            .counts
            .entry(first)
            .or_default()
            .entry(second)
            .or_default() += 1;
        *self.totals.entry(first).or_default() += 1;
    }

    /// Number of observed bigrams starting with `first`.
    pub fn total_from(&self, first: char) -> u64 {
        self.totals.get(&first).copied().unwrap_or(0)
    }
}

impl LanguageModel for CharBigramModel {
    fn bigram_probability(&self, first: char, second: char) -> Probability {
        let total = self.total_from(first);
        if total == 0 {
            return 0.0;
        }
        let count = self
            .counts
            .get(&first)
            .and_then(|row| row.get(&second))
            .copied()
            .unwrap_or(0);
        count as f64 / total as f64
    }
}
