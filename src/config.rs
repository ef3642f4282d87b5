//! Decoder configuration.
//!
//! The tunables of the beam search (beam width, language model damping and
//! context symbol, parallel expansion) are loaded from layered sources with
//! `figment`, validated once, and handed to the decoder.

use figment::{
    providers::{Env, Format, Serialized, Toml, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::constants::files::{CONFIG_TOML, CONFIG_YAML, ENV_PREFIX};
use crate::constants::language_model::{DEFAULT_CONTEXT_SYMBOL, DEFAULT_LM_DAMPING};
use crate::constants::parallel::{
    DEFAULT_PARALLEL_MIN_BEAMS, DEFAULT_WORKER_THREADS, MAX_WORKER_THREADS,
};
use crate::error::{AppError, Result};
use crate::types::BeamWidth;

// Default value functions for serde defaults
fn default_beam_width() -> usize { BeamWidth::DEFAULT.value() }
fn default_lm_damping() -> f64 { DEFAULT_LM_DAMPING }
fn default_lm_context() -> char { DEFAULT_CONTEXT_SYMBOL }
fn default_worker_threads() -> usize { DEFAULT_WORKER_THREADS }
fn default_parallel_min_beams() -> usize { DEFAULT_PARALLEL_MIN_BEAMS }

/// Beam search configuration loaded from multiple sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecoderConfig {
    /// Labelings kept after each timestep's pruning
    #[serde(default = "default_beam_width")]
    pub beam_width: usize,

    /// Exponent applied to language model bigram probabilities
    #[serde(default = "default_lm_damping")]
    pub lm_damping: f64,

    /// Symbol used as the bigram's first element when extending the empty labeling
    #[serde(default = "default_lm_context")]
    pub lm_context: char,

    /// Threads used to expand one timestep's beams; 1 disables parallelism
    #[serde(default = "default_worker_threads")]
    pub worker_threads: usize,

    /// Minimum pruned beam size before expansion is split across threads
    #[serde(default = "default_parallel_min_beams")]
    pub parallel_min_beams: usize,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            beam_width: default_beam_width(),
            lm_damping: default_lm_damping(),
            lm_context: default_lm_context(),
            worker_threads: default_worker_threads(),
            parallel_min_beams: default_parallel_min_beams(),
        }
    }
}

impl DecoderConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Environment variables prefixed `CTC_DECODER_` (highest priority)
    /// 2. ctc_decoder.yaml (if exists)
    /// 3. ctc_decoder.toml (if exists)
    /// 4. Built-in defaults (lowest priority)
    pub fn load() -> Result<Self> {
        Self::extract(
            Self::default_figment()
                .merge(Toml::file(CONFIG_TOML))
                .merge(Yaml::file(CONFIG_YAML))
                .merge(Env::prefixed(ENV_PREFIX)),
        )
    }

    /// Load configuration from an explicit TOML or YAML file, chosen by
    /// extension, layered over defaults and under environment variables.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(AppError::Configuration(format!(
                "Configuration file not found: {}",
                path.display()
            )));
        }
        let figment = match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::default_figment().merge(Toml::file(path)),
            Some("yaml") | Some("yml") => Self::default_figment().merge(Yaml::file(path)),
            _ => {
                return Err(AppError::Configuration(format!(
                    "Unsupported configuration format: {}",
                    path.display()
                )))
            }
        };
        Self::extract(figment.merge(Env::prefixed(ENV_PREFIX)))
    }

    fn default_figment() -> Figment {
        Figment::from(Serialized::defaults(Self::default()))
    }

    fn extract(figment: Figment) -> Result<Self> {
        let config: Self = figment
            .extract()
            .map_err(|e| AppError::Configuration(format!("Failed to load configuration: {}", e)))?;
        config.validate()?;
        debug!(?config, "Loaded decoder configuration");
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.beam_width == 0 {
            return Err(AppError::InvalidBeamWidth(self.beam_width));
        }

        if !self.lm_damping.is_finite() || self.lm_damping < 0.0 {
            return Err(AppError::Configuration(format!(
                "lm_damping must be a finite non-negative number, got {}",
                self.lm_damping
            )));
        }

        if self.worker_threads == 0 || self.worker_threads > MAX_WORKER_THREADS {
            return Err(AppError::Configuration(format!(
                "worker_threads must be between 1 and {}, got {}",
                MAX_WORKER_THREADS, self.worker_threads
            )));
        }

        if self.parallel_min_beams == 0 {
            return Err(AppError::Configuration(
                "parallel_min_beams must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Validated beam width.
    pub fn beam_width(&self) -> Result<BeamWidth> {
        BeamWidth::new(self.beam_width)
    }

    /// Export configuration to TOML format
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| AppError::Configuration(format!("Failed to serialize to TOML: {}", e)))
    }

    /// Export configuration to YAML format
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self)
            .map_err(|e| AppError::Configuration(format!("Failed to serialize to YAML: {}", e)))
    }
}
