//! CTC beam search.
//!
//! Each timestep keeps the `beam_width` most probable labelings of the previous
//! [`BeamState`] and expands every one of them twice: once by staying (the
//! labeling is unchanged, the frame is blank or repeats the last symbol) and
//! once per symbol by appending it. Contributions reaching the same labeling
//! are summed. After the last timestep the state is length-normalized and
//! ranked.

use super::beam::BeamState;
use super::extension::{extension_probability, LmBias};
use super::labeling::Labeling;
use super::matrix::{EmissionMatrix, SymbolTable};
use crate::config::DecoderConfig;
use crate::constants::beam::DEFAULT_BEAM_WIDTH;
use crate::constants::language_model::{DEFAULT_CONTEXT_SYMBOL, DEFAULT_LM_DAMPING};
use crate::constants::parallel::{DEFAULT_PARALLEL_MIN_BEAMS, DEFAULT_WORKER_THREADS};
use crate::error::{AppError, Result};
use crate::lm::LanguageModel;
use crate::observability::DecoderMetrics;
use crate::types::{BeamWidth, Probability};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, instrument, trace};

/// A ranked decoding result.
#[derive(Debug, Clone, PartialEq)]
pub struct Hypothesis {
    /// Winning symbol indices.
    pub labeling: Labeling,
    /// The labeling mapped through the symbol table.
    pub text: String,
    /// Length-normalized probability.
    pub score: Probability,
}

/// Beam search decoder over CTC emission matrices.
///
/// The decoder holds only configuration and an optional language model; every
/// call owns its own chain of beam states, so one decoder can serve many
/// threads.
#[derive(Clone)]
pub struct BeamSearchDecoder {
    beam_width: BeamWidth,
    lm_damping: f64,
    lm_context: char,
    worker_threads: usize,
    parallel_min_beams: usize,
    language_model: Option<Arc<dyn LanguageModel>>,
}

impl BeamSearchDecoder {
    /// Create a decoder from a configuration, validating it first.
    pub fn new(config: &DecoderConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            beam_width: config.beam_width()?,
            lm_damping: config.lm_damping,
            lm_context: config.lm_context,
            worker_threads: config.worker_threads,
            parallel_min_beams: config.parallel_min_beams,
            language_model: None,
        })
    }

    /// Bias extensions with a character bigram model.
    pub fn with_language_model(mut self, model: Arc<dyn LanguageModel>) -> Self {
        self.language_model = Some(model);
        self
    }

    /// Override the beam width.
    pub fn with_beam_width(mut self, beam_width: BeamWidth) -> Self {
        self.beam_width = beam_width;
        self
    }

    /// Configured beam width.
    pub fn beam_width(&self) -> BeamWidth {
        self.beam_width
    }

    /// Whether a language model is attached.
    pub fn has_language_model(&self) -> bool {
        self.language_model.is_some()
    }

    /// Decode the most probable text.
    pub fn decode(&self, matrix: &EmissionMatrix, symbols: &SymbolTable) -> Result<String> {
        Ok(self.decode_labeling(matrix, symbols)?.map_or_else(String::new, |y| symbols.decode(&y)))
    }

    /// Decode the most probable labeling. `None` only if the final state is
    /// empty, which cannot happen for validated input.
    pub fn decode_labeling(
        &self,
        matrix: &EmissionMatrix,
        symbols: &SymbolTable,
    ) -> Result<Option<Labeling>> {
        let state = self.search(matrix, symbols)?;
        Ok(state.best().map(|(labeling, _)| labeling.clone()))
    }

    /// Decode up to `n` hypotheses, best first.
    pub fn decode_nbest(
        &self,
        matrix: &EmissionMatrix,
        symbols: &SymbolTable,
        n: usize,
    ) -> Result<Vec<Hypothesis>> {
        let state = self.search(matrix, symbols)?;
        Ok(state
            .ranked()
            .into_iter()
            .take(n)
            .map(|(labeling, entry)| Hypothesis {
                labeling: labeling.clone(),
                text: symbols.decode(labeling),
                score: entry.pr_total,
            })
            .collect())
    }

    /// Run the search and return the final, length-normalized beam state.
    #[instrument(
        skip_all,
        fields(
            timesteps = matrix.timesteps(),
            symbols = symbols.len(),
            beam_width = %self.beam_width,
        )
    )]
    pub fn search(&self, matrix: &EmissionMatrix, symbols: &SymbolTable) -> Result<BeamState> {
        if let Err(e) = matrix.check_symbols(symbols) {
            DecoderMetrics::record_failure(e.metric_label());
            return Err(e);
        }

        debug!("Beam search started");
        let started = Instant::now();
        let bias = self.language_model.as_deref().map(|model| LmBias {
            model,
            damping: self.lm_damping,
            context: self.lm_context,
        });

        let mut last = BeamState::initial();
        for t in 0..matrix.timesteps() {
            last = self.step(t, matrix, symbols, &last, bias.as_ref())?;
            DecoderMetrics::record_candidates(last.len());
        }

        last.normalize();

        if let Some((labeling, entry)) = last.best() {
            debug!(
                winner = ?labeling,
                score = entry.pr_total,
                candidates = last.len(),
                "Beam search complete"
            );
        }
        DecoderMetrics::record_decode(started.elapsed(), matrix.timesteps());
        Ok(last)
    }

    /// Build the state for timestep `t` from the previous one.
    fn step(
        &self,
        t: usize,
        matrix: &EmissionMatrix,
        symbols: &SymbolTable,
        last: &BeamState,
        bias: Option<&LmBias<'_>>,
    ) -> Result<BeamState> {
        let beams = last.pruned(self.beam_width.value());
        trace!(t, previous = last.len(), kept = beams.len(), "Pruned beam");

        if self.worker_threads > 1 && beams.len() >= self.parallel_min_beams {
            return self.expand_parallel(&beams, t, matrix, symbols, last, bias);
        }

        let mut curr = BeamState::with_capacity(beams.len() * (symbols.len() + 1));
        expand(&mut curr, &beams, t, matrix, symbols, last, bias);
        Ok(curr)
    }

    /// Expand contiguous chunks of the beam on scoped threads and merge the
    /// partial states in chunk order.
    ///
    /// Each labeling receives at most one stay and one append contribution per
    /// timestep, so the merged sums and insertion order equal a sequential pass.
    fn expand_parallel(
        &self,
        beams: &[Labeling],
        t: usize,
        matrix: &EmissionMatrix,
        symbols: &SymbolTable,
        last: &BeamState,
        bias: Option<&LmBias<'_>>,
    ) -> Result<BeamState> {
        let chunk_size = beams.len().div_ceil(self.worker_threads);
        let per_chunk = chunk_size * (symbols.len() + 1);

        let partials = crossbeam::scope(|scope| {
            let handles: Vec<_> = beams
                .chunks(chunk_size)
                .map(|chunk| {
                    scope.spawn(move |_| {
                        let mut partial = BeamState::with_capacity(per_chunk);
                        expand(&mut partial, chunk, t, matrix, symbols, last, bias);
                        partial
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join())
                .collect::<std::thread::Result<Vec<_>>>()
        })
        .and_then(|joined| joined)
        .map_err(|_| AppError::Worker(format!("expansion worker panicked at timestep {}", t)))?;

        let mut curr = BeamState::with_capacity(beams.len() * (symbols.len() + 1));
        for partial in partials {
            curr.merge(partial);
        }
        Ok(curr)
    }
}

impl Default for BeamSearchDecoder {
    fn default() -> Self {
        Self {
            beam_width: DEFAULT_BEAM_WIDTH,
            lm_damping: DEFAULT_LM_DAMPING,
            lm_context: DEFAULT_CONTEXT_SYMBOL,
            worker_threads: DEFAULT_WORKER_THREADS,
            parallel_min_beams: DEFAULT_PARALLEL_MIN_BEAMS,
            language_model: None,
        }
    }
}

impl std::fmt::Debug for BeamSearchDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BeamSearchDecoder")
            .field("beam_width", &self.beam_width)
            .field("lm_damping", &self.lm_damping)
            .field("lm_context", &self.lm_context)
            .field("worker_threads", &self.worker_threads)
            .field("parallel_min_beams", &self.parallel_min_beams)
            .field("language_model", &self.language_model.is_some())
            .finish()
    }
}

/// Accumulate the stay and append expansions of `beams` into `curr`.
fn expand(
    curr: &mut BeamState,
    beams: &[Labeling],
    t: usize,
    matrix: &EmissionMatrix,
    symbols: &SymbolTable,
    last: &BeamState,
    bias: Option<&LmBias<'_>>,
) {
    let blank = symbols.blank_index();

    for labeling in beams {
        let Some(previous) = last.get(labeling) else {
            continue;
        };

        // Stay: repeat the last symbol without a blank, or emit blank.
        let pr_non_blank = labeling
            .last()
            .map_or(0.0, |symbol| previous.pr_non_blank * matrix.get(t, symbol));
        let pr_blank = previous.pr_total * matrix.get(t, blank);
        curr.add_labeling(labeling).add_stay(pr_non_blank, pr_blank);

        // Append every non-blank symbol.
        for k in 0..symbols.len() {
            let pr = extension_probability(k, labeling, t, matrix, last, symbols, bias);
            curr.add_labeling(&labeling.extended(k)).add_extension(pr);
        }
    }
}

/// Decode with default settings and an optional language model.
pub fn ctc_beam_search(
    matrix: &EmissionMatrix,
    symbols: &SymbolTable,
    language_model: Option<Arc<dyn LanguageModel>>,
) -> Result<String> {
    let decoder = BeamSearchDecoder::default();
    match language_model {
        Some(model) => decoder.with_language_model(model).decode(matrix, symbols),
        None => decoder.decode(matrix, symbols),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::test::{TEST_EPSILON, TEST_SYMBOLS};

    fn symbols() -> SymbolTable {
        SymbolTable::from_chars(TEST_SYMBOLS).unwrap()
    }

    fn decoder_with_width(width: usize) -> BeamSearchDecoder {
        BeamSearchDecoder::new(&DecoderConfig {
            beam_width: width,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_regression_scenario_decodes_a() {
        let matrix =
            EmissionMatrix::from_rows(&[vec![0.4, 0.0, 0.6], vec![0.4, 0.0, 0.6]]).unwrap();
        let text = BeamSearchDecoder::default().decode(&matrix, &symbols()).unwrap();
        assert_eq!(text, "a");
    }

    #[test]
    fn test_regression_scenario_scores() {
        let matrix =
            EmissionMatrix::from_rows(&[vec![0.4, 0.0, 0.6], vec![0.4, 0.0, 0.6]]).unwrap();
        let state = BeamSearchDecoder::default().search(&matrix, &symbols()).unwrap();

        // "a": 0.16 (a a) + 0.24 (a -) + 0.24 (- a)
        let a = state.get(&Labeling::from(vec![0])).unwrap();
        assert!((a.pr_total - 0.64).abs() < TEST_EPSILON);
        let empty = state.get(&Labeling::empty()).unwrap();
        assert!((empty.pr_total - 0.36).abs() < TEST_EPSILON);
        let aa = state.get(&Labeling::from(vec![0, 0])).unwrap();
        assert_eq!(aa.pr_total, 0.0);
    }

    #[test]
    fn test_width_one_keeps_only_best_prefix() {
        let matrix =
            EmissionMatrix::from_rows(&[vec![0.4, 0.0, 0.6], vec![0.4, 0.0, 0.6]]).unwrap();
        let best = decoder_with_width(1)
            .decode_nbest(&matrix, &symbols(), 1)
            .unwrap();
        assert_eq!(best[0].text, "");
        assert!((best[0].score - 0.36).abs() < TEST_EPSILON);
    }

    #[test]
    fn test_repeat_without_blank_collapses() {
        let matrix =
            EmissionMatrix::from_rows(&[vec![0.9, 0.0, 0.1], vec![0.9, 0.0, 0.1]]).unwrap();
        let text = BeamSearchDecoder::default().decode(&matrix, &symbols()).unwrap();
        assert_eq!(text, "a");
    }

    #[test]
    fn test_repeat_with_blank_between_emits_twice() {
        let matrix = EmissionMatrix::from_rows(&[
            vec![0.9, 0.0, 0.1],
            vec![0.0, 0.0, 1.0],
            vec![0.9, 0.0, 0.1],
        ])
        .unwrap();
        let text = BeamSearchDecoder::default().decode(&matrix, &symbols()).unwrap();
        assert_eq!(text, "aa");
    }

    #[test]
    fn test_no_timesteps_yields_empty() {
        let matrix = EmissionMatrix::new(Vec::new(), 0, 3).unwrap();
        let text = BeamSearchDecoder::default().decode(&matrix, &symbols()).unwrap();
        assert_eq!(text, "");
    }

    #[test]
    fn test_shape_mismatch_is_rejected() {
        let matrix = EmissionMatrix::from_rows(&[vec![0.5, 0.25, 0.125, 0.125]]).unwrap();
        let err = BeamSearchDecoder::default()
            .decode(&matrix, &symbols())
            .unwrap_err();
        assert!(matches!(err, AppError::ShapeMismatch { expected: 3, actual: 4 }));
    }

    #[test]
    fn test_all_zero_rows_still_terminate() {
        let matrix = EmissionMatrix::from_rows(&[vec![0.0; 3], vec![0.0; 3]]).unwrap();
        let text = BeamSearchDecoder::default().decode(&matrix, &symbols()).unwrap();
        assert_eq!(text, "");
    }

    #[test]
    fn test_nbest_is_sorted() {
        let matrix = EmissionMatrix::from_rows(&[
            vec![0.5, 0.3, 0.2],
            vec![0.2, 0.5, 0.3],
            vec![0.3, 0.3, 0.4],
        ])
        .unwrap();
        let hypotheses = BeamSearchDecoder::default()
            .decode_nbest(&matrix, &symbols(), 5)
            .unwrap();
        assert_eq!(hypotheses.len(), 5);
        for pair in hypotheses.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let symbols = SymbolTable::from_chars("abcd").unwrap();
        let rows: Vec<Vec<f64>> = (0..12)
            .map(|t| {
                let raw: Vec<f64> = (0..5).map(|k| ((t * 7 + k * 3) % 11 + 1) as f64).collect();
                let sum: f64 = raw.iter().sum();
                raw.into_iter().map(|v| v / sum).collect()
            })
            .collect();
        let matrix = EmissionMatrix::from_rows(&rows).unwrap();

        let sequential = BeamSearchDecoder::new(&DecoderConfig {
            beam_width: 16,
            ..Default::default()
        })
        .unwrap();
        let parallel = BeamSearchDecoder::new(&DecoderConfig {
            beam_width: 16,
            worker_threads: 3,
            parallel_min_beams: 2,
            ..Default::default()
        })
        .unwrap();

        let expected = sequential.decode_nbest(&matrix, &symbols, 10).unwrap();
        let actual = parallel.decode_nbest(&matrix, &symbols, 10).unwrap();
        assert_eq!(expected, actual);
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_search_logs_start_and_end_inside_span() {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        let matrix = EmissionMatrix::from_rows(&[vec![0.4, 0.0, 0.6], vec![0.4, 0.0, 0.6]]).unwrap();
        tracing::subscriber::with_default(subscriber, || {
            decoder_with_width(25).decode(&matrix, &symbols()).unwrap();
        });

        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("Beam search started"));
        assert!(output.contains("Beam search complete"));
        assert!(output.contains("search{timesteps=2 symbols=2 beam_width=25}"));
    }
}
