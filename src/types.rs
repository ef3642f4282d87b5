//! Strong typing with newtypes for domain concepts.
//!
//! This module provides type-safe wrappers around primitive types to prevent
//! common errors and provide better API design through the type system.

use crate::error::AppError;
use serde::{Deserialize, Serialize};

/// Index of a symbol in the symbol table. The blank index equals the table length.
pub type SymbolIndex = usize;

/// Probability mass. Kept in `f64` so long products underflow late.
pub type Probability = f64;

/// Maximum number of labelings retained after each timestep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub struct BeamWidth(usize);

impl BeamWidth {
    /// Default beam width.
    pub const DEFAULT: Self = Self(25);

    /// Create a new beam width with validation.
    pub fn new(width: usize) -> Result<Self, AppError> {
        if width == 0 {
            return Err(AppError::InvalidBeamWidth(width));
        }
        Ok(Self(width))
    }

    /// Get the beam width value.
    pub fn value(self) -> usize {
        self.0
    }
}

impl Default for BeamWidth {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<usize> for BeamWidth {
    type Error = AppError;

    fn try_from(width: usize) -> Result<Self, Self::Error> {
        Self::new(width)
    }
}

impl From<BeamWidth> for usize {
    fn from(width: BeamWidth) -> Self {
        width.0
    }
}

impl std::fmt::Display for BeamWidth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
