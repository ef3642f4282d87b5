//! Per-timestep beam bookkeeping.
//!
//! A [`BeamState`] maps each candidate [`Labeling`] to a [`BeamEntry`] holding
//! the probability mass of all alignments that collapse to it, split by whether
//! the alignment ends in blank or in the labeling's last symbol.

use super::labeling::Labeling;
use crate::constants::beam::MIN_NORMALIZATION_LENGTH;
use crate::types::Probability;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Probability bookkeeping for one labeling at one timestep.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BeamEntry {
    /// Mass of all paths, blank-ending and non-blank-ending.
    pub pr_total: Probability,
    /// Mass of paths ending in the labeling's last symbol.
    pub pr_non_blank: Probability,
    /// Mass of paths ending in blank.
    pub pr_blank: Probability,
}

impl BeamEntry {
    /// Entry for the empty labeling before timestep 0.
    pub fn initial() -> Self {
        Self {
            pr_total: 1.0,
            pr_non_blank: 0.0,
            pr_blank: 1.0,
        }
    }

    /// Accumulate the mass of keeping the labeling unchanged for one timestep.
    pub fn add_stay(&mut self, pr_non_blank: Probability, pr_blank: Probability) {
        self.pr_non_blank += pr_non_blank;
        self.pr_blank += pr_blank;
        self.pr_total += pr_blank + pr_non_blank;
    }

    /// Accumulate the mass of reaching the labeling by appending its last symbol.
    pub fn add_extension(&mut self, pr: Probability) {
        self.pr_non_blank += pr;
        self.pr_total += pr;
    }

    fn absorb(&mut self, other: &BeamEntry) {
        self.pr_non_blank += other.pr_non_blank;
        self.pr_blank += other.pr_blank;
        self.pr_total += other.pr_total;
    }
}

/// All active beams at one timestep, keyed by labeling.
///
/// Entries keep their insertion order. Ranking is a stable sort on
/// `pr_total`, so among equal scores the labeling inserted first wins.
#[derive(Debug, Clone, Default)]
pub struct BeamState {
    entries: Vec<(Labeling, BeamEntry)>,
    index: HashMap<Labeling, usize>,
}

impl BeamState {
    /// Create an empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty state with room for `capacity` labelings.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
        }
    }

    /// The state before timestep 0: only the empty labeling, with certainty.
    pub fn initial() -> Self {
        let mut state = Self::with_capacity(1);
        *state.add_labeling(&Labeling::empty()) = BeamEntry::initial();
        state
    }

    /// Ensure `labeling` has an entry, inserting a zeroed one if absent.
    ///
    /// Existing entries are returned untouched, so mass accumulated earlier in
    /// the timestep is never reset.
    pub fn add_labeling(&mut self, labeling: &Labeling) -> &mut BeamEntry {
        let slot = match self.index.get(labeling).copied() {
            Some(slot) => slot,
            None => {
                let slot = self.entries.len();
                self.entries.push((labeling.clone(), BeamEntry::default()));
                self.index.insert(labeling.clone(), slot);
                slot
            }
        };
        &mut self.entries[slot].1
    }

    /// Look up the entry for `labeling`.
    pub fn get(&self, labeling: &Labeling) -> Option<&BeamEntry> {
        self.index.get(labeling).map(|&slot| &self.entries[slot].1)
    }

    /// Number of labelings.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the state holds no labelings.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&Labeling, &BeamEntry)> {
        self.entries.iter().map(|(labeling, entry)| (labeling, entry))
    }

    /// Replace each `pr_total` with its geometric mean per symbol,
    /// `pr_total ^ (1 / max(len, 1))`.
    ///
    /// Only meaningful after the last timestep; `pr_total` no longer equals
    /// `pr_blank + pr_non_blank` afterwards.
    pub fn normalize(&mut self) {
        for (labeling, entry) in &mut self.entries {
            let length = labeling.len().max(MIN_NORMALIZATION_LENGTH);
            entry.pr_total = entry.pr_total.powf(1.0 / length as f64);
        }
    }

    /// Entries sorted by descending `pr_total`, ties in insertion order.
    pub fn ranked(&self) -> Vec<(&Labeling, &BeamEntry)> {
        let mut ranked: Vec<_> = self.iter().collect();
        ranked.sort_by(|a, b| descending(a.1.pr_total, b.1.pr_total));
        ranked
    }

    /// Labelings sorted by descending `pr_total`, ties in insertion order.
    pub fn ranked_labelings(&self) -> Vec<Labeling> {
        self.ranked()
            .into_iter()
            .map(|(labeling, _)| labeling.clone())
            .collect()
    }

    /// The `width` best labelings.
    pub fn pruned(&self, width: usize) -> Vec<Labeling> {
        let mut best = self.ranked_labelings();
        best.truncate(width);
        best
    }

    /// The top-ranked labeling and its entry.
    pub fn best(&self) -> Option<(&Labeling, &BeamEntry)> {
        self.ranked().into_iter().next()
    }

    /// Add every entry of `partial` into this state, in `partial`'s order.
    pub fn merge(&mut self, partial: BeamState) {
        for (labeling, entry) in partial.entries {
            self.add_labeling(&labeling).absorb(&entry);
        }
    }
}

/// Descending order on probabilities with NaN sorted last.
fn descending(a: Probability, b: Probability) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
    }
}
