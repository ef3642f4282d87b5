//! Custom error types for the CTC beam decoder.
//!
//! This module provides a centralized error handling system using the `thiserror` crate
//! to define structured, typed errors with clear messages and proper error conversion.
//!
//! Every variant except `Io` and `Json` describes a contract violation that is
//! detected once, at decode entry, before any timestep is processed.

use std::io;
use thiserror::Error;

/// Primary error type for the crate, covering all possible error cases.
#[derive(Debug, Error)]
pub enum AppError {
    /// The emission matrix does not have one column per symbol plus blank.
    #[error("Shape mismatch: expected {expected} matrix columns (symbols + blank), got {actual}")]
    ShapeMismatch {
        /// Column count implied by the symbol table.
        expected: usize,
        /// Column count of the matrix.
        actual: usize,
    },

    /// A matrix row has a different length than the first row.
    #[error("Ragged matrix: row {row} has {actual} columns, expected {expected}")]
    RaggedMatrix {
        /// Offending row index.
        row: usize,
        /// Column count of the first row.
        expected: usize,
        /// Column count of the offending row.
        actual: usize,
    },

    /// A matrix cell is not a probability.
    #[error("Invalid probability {value} at row {row}, column {column}")]
    InvalidProbability {
        /// Row (timestep) index.
        row: usize,
        /// Column (symbol) index.
        column: usize,
        /// The rejected value.
        value: f64,
    },

    /// The symbol table has no symbols.
    #[error("Symbol table is empty")]
    EmptySymbolTable,

    /// The symbol table lists a symbol twice.
    #[error("Duplicate symbol in symbol table: {0:?}")]
    DuplicateSymbol(char),

    /// Beam width must be at least one.
    #[error("Invalid beam width: {0} (must be >= 1)")]
    InvalidBeamWidth(usize),

    /// Errors from invalid input data or parameters.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Errors from invalid configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A parallel expansion worker panicked.
    #[error("Expansion worker failed: {0}")]
    Worker(String),

    /// Errors from the underlying IO system.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AppError {
    /// Short, stable label for metrics.
    pub fn metric_label(&self) -> &'static str {
        match self {
            AppError::ShapeMismatch { .. } => "shape_mismatch",
            AppError::RaggedMatrix { .. } => "ragged_matrix",
            AppError::InvalidProbability { .. } => "invalid_probability",
            AppError::EmptySymbolTable => "empty_symbol_table",
            AppError::DuplicateSymbol(_) => "duplicate_symbol",
            AppError::InvalidBeamWidth(_) => "invalid_beam_width",
            AppError::InvalidInput(_) => "invalid_input",
            AppError::Configuration(_) => "configuration",
            AppError::Worker(_) => "worker",
            AppError::Io(_) => "io",
            AppError::Json(_) => "json",
        }
    }
}

/// Convenience type alias for Results with AppError.
pub type Result<T> = std::result::Result<T, AppError>;
