//! End-to-end decoding properties.

use ctc_beam_decoder::config::DecoderConfig;
use ctc_beam_decoder::decoder::{
    best_path, ctc_beam_search, BeamSearchDecoder, BeamState, EmissionMatrix, Labeling,
    SymbolTable,
};
use ctc_beam_decoder::error::AppError;
use ctc_beam_decoder::lm::{CharBigramModel, LanguageModel};
use std::sync::Arc;

struct UnitModel;

impl LanguageModel for UnitModel {
    fn bigram_probability(&self, _first: char, _second: char) -> f64 {
        1.0
    }
}

fn decoder(width: usize) -> BeamSearchDecoder {
    BeamSearchDecoder::new(&DecoderConfig {
        beam_width: width,
        ..Default::default()
    })
    .unwrap()
}

/// Deterministic pseudo-random matrix with normalized rows.
fn synthetic_matrix(timesteps: usize, classes: usize, seed: u64) -> EmissionMatrix {
    let mut state = seed;
    let rows: Vec<Vec<f64>> = (0..timesteps)
        .map(|_| {
            let raw: Vec<f64> = (0..classes)
                .map(|_| {
                    state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                    ((state >> 33) % 1000 + 1) as f64
                })
                .collect();
            let sum: f64 = raw.iter().sum();
            raw.into_iter().map(|v| v / sum).collect()
        })
        .collect();
    EmissionMatrix::from_rows(&rows).unwrap()
}

#[test]
fn test_regression_scenario() {
    let symbols = SymbolTable::from_chars("ab").unwrap();
    let matrix = EmissionMatrix::from_rows(&[vec![0.4, 0.0, 0.6], vec![0.4, 0.0, 0.6]]).unwrap();
    assert_eq!(ctc_beam_search(&matrix, &symbols, None).unwrap(), "a");
}

#[test]
fn test_determinism() {
    let symbols = SymbolTable::from_chars("abc").unwrap();
    let matrix = synthetic_matrix(20, 4, 7);
    let decoder = decoder(10);

    let first = decoder.decode_nbest(&matrix, &symbols, 5).unwrap();
    for _ in 0..3 {
        assert_eq!(decoder.decode_nbest(&matrix, &symbols, 5).unwrap(), first);
    }
}

#[test]
fn test_wider_beam_does_not_lose_score() {
    let symbols = SymbolTable::from_chars("ab").unwrap();
    let matrix = EmissionMatrix::from_rows(&[vec![0.4, 0.0, 0.6], vec![0.4, 0.0, 0.6]]).unwrap();

    let narrow = decoder(1).decode_nbest(&matrix, &symbols, 1).unwrap();
    let wide = decoder(25).decode_nbest(&matrix, &symbols, 1).unwrap();
    assert!(wide[0].score >= narrow[0].score);
    assert_eq!(wide[0].text, "a");
}

#[test]
fn test_exhaustive_width_matches_wider_width() {
    // With 2 symbols and 3 timesteps no state exceeds 15 labelings, so both
    // widths keep every candidate.
    let symbols = SymbolTable::from_chars("ab").unwrap();
    let matrix = synthetic_matrix(3, 3, 11);
    assert_eq!(
        decoder(25).decode_nbest(&matrix, &symbols, 3).unwrap(),
        decoder(100).decode_nbest(&matrix, &symbols, 3).unwrap()
    );
}

#[test]
fn test_normalization_on_singleton_state() {
    let mut state = BeamState::new();
    let y = Labeling::from(vec![1, 0]);
    state.add_labeling(&y).add_extension(0.09);

    let before = state.ranked_labelings();
    state.normalize();
    assert_eq!(before, vec![y.clone()]);
    assert_eq!(state.ranked_labelings(), vec![y]);
}

#[test]
fn test_unit_language_model_matches_no_model() {
    let symbols = SymbolTable::from_chars("abc").unwrap();
    let matrix = synthetic_matrix(15, 4, 3);

    let plain = decoder(8).decode_nbest(&matrix, &symbols, 5).unwrap();
    let biased = decoder(8)
        .with_language_model(Arc::new(UnitModel))
        .decode_nbest(&matrix, &symbols, 5)
        .unwrap();
    assert_eq!(plain, biased);
}

#[test]
fn test_blank_absorption() {
    let symbols = SymbolTable::from_chars("abc").unwrap();
    let matrix = EmissionMatrix::from_rows(&vec![vec![0.0, 0.0, 0.0, 1.0]; 6]).unwrap();
    assert_eq!(decoder(25).decode(&matrix, &symbols).unwrap(), "");
}

#[test]
fn test_repeat_collapses_without_blank() {
    let symbols = SymbolTable::from_chars("ab").unwrap();
    let matrix = EmissionMatrix::from_rows(&[vec![0.0, 0.95, 0.05], vec![0.0, 0.95, 0.05]]).unwrap();
    assert_eq!(decoder(25).decode(&matrix, &symbols).unwrap(), "b");
}

#[test]
fn test_language_model_steers_ambiguous_frame() {
    // The middle frame is a coin flip between 'a' and 'b'; the corpus only
    // ever follows 'a' with 'b'.
    let symbols = SymbolTable::from_chars("ab").unwrap();
    let matrix = EmissionMatrix::from_rows(&[
        vec![0.9, 0.0, 0.1],
        vec![0.0, 0.0, 1.0],
        vec![0.45, 0.45, 0.1],
    ])
    .unwrap();
    let model = CharBigramModel::from_corpus("ab ab ab", &symbols, ' ');
    let config = DecoderConfig {
        lm_damping: 1.0,
        ..Default::default()
    };

    let text = BeamSearchDecoder::new(&config)
        .unwrap()
        .with_language_model(Arc::new(model))
        .decode(&matrix, &symbols)
        .unwrap();
    assert_eq!(text, "ab");
}

#[test]
fn test_contract_violations() {
    let symbols = SymbolTable::from_chars("ab").unwrap();
    let matrix = EmissionMatrix::from_rows(&[vec![0.5, 0.5]]).unwrap();
    assert!(matches!(
        decoder(25).decode(&matrix, &symbols),
        Err(AppError::ShapeMismatch { .. })
    ));
    assert!(matches!(SymbolTable::from_chars(""), Err(AppError::EmptySymbolTable)));
    assert!(matches!(
        BeamSearchDecoder::new(&DecoderConfig {
            beam_width: 0,
            ..Default::default()
        }),
        Err(AppError::InvalidBeamWidth(0))
    ));
}

#[test]
fn test_very_wide_beam_is_accepted() {
    let symbols = SymbolTable::from_chars("ab").unwrap();
    let matrix = EmissionMatrix::from_rows(&[vec![0.4, 0.0, 0.6], vec![0.4, 0.0, 0.6]]).unwrap();
    let decoder = decoder(20_000);
    assert_eq!(decoder.beam_width().value(), 20_000);
    assert_eq!(decoder.decode(&matrix, &symbols).unwrap(), "a");
}

#[test]
fn test_beam_search_agrees_with_best_path_on_peaked_input() {
    let symbols = SymbolTable::from_chars("abc").unwrap();
    let matrix = EmissionMatrix::from_rows(&[
        vec![0.97, 0.01, 0.01, 0.01],
        vec![0.01, 0.01, 0.01, 0.97],
        vec![0.01, 0.97, 0.01, 0.01],
        vec![0.01, 0.01, 0.97, 0.01],
    ])
    .unwrap();
    assert_eq!(best_path(&matrix, &symbols).unwrap(), "abc");
    assert_eq!(decoder(25).decode(&matrix, &symbols).unwrap(), "abc");
}

#[test]
fn test_parallel_expansion_matches_sequential() {
    let symbols = SymbolTable::from_chars("abcdefgh").unwrap();
    let matrix = synthetic_matrix(25, 9, 42);

    let sequential = decoder(30).decode_nbest(&matrix, &symbols, 10).unwrap();
    let parallel = BeamSearchDecoder::new(&DecoderConfig {
        beam_width: 30,
        worker_threads: 4,
        parallel_min_beams: 8,
        ..Default::default()
    })
    .unwrap()
    .decode_nbest(&matrix, &symbols, 10)
    .unwrap();
    assert_eq!(sequential, parallel);
}
