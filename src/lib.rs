//! The `ctc_beam_decoder` core library.
//!
//! This crate decodes the per-timestep class probabilities of a CTC-trained
//! sequence model into the most likely label sequence using beam search,
//! optionally biased by a character bigram language model.
//!
//! ```
//! use ctc_beam_decoder::decoder::{BeamSearchDecoder, EmissionMatrix, SymbolTable};
//!
//! let symbols = SymbolTable::from_chars("ab").unwrap();
//! let matrix = EmissionMatrix::from_rows(&[vec![0.4, 0.0, 0.6], vec![0.4, 0.0, 0.6]]).unwrap();
//! let text = BeamSearchDecoder::default().decode(&matrix, &symbols).unwrap();
//! assert_eq!(text, "a");
//! ```

pub mod config;
pub mod constants;
pub mod decoder;
pub mod error;
pub mod input;
pub mod lm;
pub mod observability;
pub mod types;
