//! Domain constants for the CTC beam decoder.
//!
//! This module contains compile-time constants used throughout the crate.
//! These are separated from runtime configuration to provide clear distinction
//! between values that never change and the defaults that can be configured.

/// Beam search constants.
pub mod beam {
    use crate::types::BeamWidth;

    /// Default number of labelings kept after each timestep's pruning.
    pub const DEFAULT_BEAM_WIDTH: BeamWidth = BeamWidth::DEFAULT;

    /// Normalization exponent floor: the empty labeling is treated as length 1.
    pub const MIN_NORMALIZATION_LENGTH: usize = 1;
}

/// Language model constants.
pub mod language_model {
    /// Exponent applied to bigram probabilities to damp the model's influence.
    pub const DEFAULT_LM_DAMPING: f64 = 0.01;

    /// First symbol of the bigram queried when extending the empty labeling.
    pub const DEFAULT_CONTEXT_SYMBOL: char = ' ';
}

/// Parallel expansion constants.
pub mod parallel {
    /// Default worker thread count; 1 keeps expansion on the calling thread.
    pub const DEFAULT_WORKER_THREADS: usize = 1;

    /// Smallest pruned beam worth splitting across worker threads.
    pub const DEFAULT_PARALLEL_MIN_BEAMS: usize = 64;

    /// Maximum worker threads accepted by configuration validation.
    pub const MAX_WORKER_THREADS: usize = 256;
}

/// Configuration file names searched by `DecoderConfig::load`.
pub mod files {
    /// TOML configuration file.
    pub const CONFIG_TOML: &str = "ctc_decoder.toml";

    /// YAML configuration file.
    pub const CONFIG_YAML: &str = "ctc_decoder.yaml";

    /// Prefix for environment variable overrides.
    pub const ENV_PREFIX: &str = "CTC_DECODER_";
}
