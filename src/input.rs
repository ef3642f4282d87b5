//! Decode request files for the `ctc-decode` binary.
//!
//! A request is a JSON object holding the symbol table as a string and the
//! emission matrix as an array of rows:
//!
//! ```json
//! { "symbols": "ab", "matrix": [[0.4, 0.0, 0.6], [0.4, 0.0, 0.6]] }
//! ```
//!
//! Set `"logits": true` when rows hold unnormalized scores; a row-wise softmax
//! is applied on load.

use crate::decoder::{EmissionMatrix, SymbolTable};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;
use tracing::debug;

/// Raw decode request as stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecodeRequest {
    /// Symbols in column order, excluding blank.
    pub symbols: String,
    /// One row per timestep, blank in the last column.
    pub matrix: Vec<Vec<f64>>,
    /// Rows are unnormalized scores rather than probabilities.
    #[serde(default)]
    pub logits: bool,
}

/// Validated decoder inputs.
#[derive(Debug, Clone)]
pub struct DecodeInput {
    /// Symbol table.
    pub symbols: SymbolTable,
    /// Emission probabilities.
    pub matrix: EmissionMatrix,
}

impl DecodeRequest {
    /// Load a request from a JSON file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            io::Error::new(
                e.kind(),
                format!("Failed to read decode request {}: {}", path.display(), e),
            )
        })?;
        Self::from_json(&content)
    }

    /// Parse a request from JSON text.
    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Validate into decoder inputs.
    pub fn into_input(self) -> Result<DecodeInput> {
        let symbols = SymbolTable::from_chars(&self.symbols)?;
        let matrix = if self.logits {
            EmissionMatrix::from_logits(&self.matrix)?
        } else {
            EmissionMatrix::from_rows(&self.matrix)?
        };
        matrix.check_symbols(&symbols)?;
        debug!(
            timesteps = matrix.timesteps(),
            symbols = symbols.len(),
            "Loaded decode request"
        );
        Ok(DecodeInput { symbols, matrix })
    }
}
