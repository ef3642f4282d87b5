//! Candidate label sequences.

use crate::types::SymbolIndex;
use std::fmt;
use std::sync::Arc;

/// An immutable sequence of symbol indices with blanks removed.
///
/// Labelings are the keys of a [`BeamState`](super::BeamState). Equality and
/// hashing are structural over the index sequence. The indices live behind an
/// `Arc`, so cloning a labeling into a ranking or a new state is cheap;
/// growing one always allocates a new sequence.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Labeling(Arc<[SymbolIndex]>);

impl Labeling {
    /// The empty labeling: nothing emitted yet.
    pub fn empty() -> Self {
        Self(Arc::from(Vec::new()))
    }

    /// Return a new labeling with `symbol` appended.
    pub fn extended(&self, symbol: SymbolIndex) -> Self {
        let mut indices = Vec::with_capacity(self.0.len() + 1);
        indices.extend_from_slice(&self.0);
        indices.push(symbol);
        Self(indices.into())
    }

    /// Last symbol, if any.
    pub fn last(&self) -> Option<SymbolIndex> {
        self.0.last().copied()
    }

    /// Number of symbols.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no symbol has been emitted.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The underlying indices.
    pub fn as_slice(&self) -> &[SymbolIndex] {
        &self.0
    }
}

impl Default for Labeling {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<Vec<SymbolIndex>> for Labeling {
    fn from(indices: Vec<SymbolIndex>) -> Self {
        Self(indices.into())
    }
}

impl From<&[SymbolIndex]> for Labeling {
    fn from(indices: &[SymbolIndex]) -> Self {
        Self(indices.into())
    }
}

impl fmt::Debug for Labeling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.iter()).finish()
    }
}
