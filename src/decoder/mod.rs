//! CTC decoding.
//!
//! This module contains the beam search decoder and the data structures it
//! threads through the timesteps, plus a best-path baseline.

mod beam;
mod extension;
mod greedy;
mod labeling;
mod matrix;
mod search;

pub use beam::{BeamEntry, BeamState};
pub use extension::{extension_probability, LmBias};
pub use greedy::{best_path, best_path_labeling};
pub use labeling::Labeling;
pub use matrix::{EmissionMatrix, SymbolTable};
pub use search::{ctc_beam_search, BeamSearchDecoder, Hypothesis};
