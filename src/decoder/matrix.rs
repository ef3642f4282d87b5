//! Decoder inputs: the emission matrix and the symbol table.

use super::labeling::Labeling;
use crate::error::{AppError, Result};
use crate::types::{Probability, SymbolIndex};
use std::collections::HashSet;

/// Ordered set of output symbols, excluding blank.
///
/// Symbol `i` labels matrix column `i`; the blank column is `len()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolTable {
    symbols: Vec<char>,
}

impl SymbolTable {
    /// Create a table, rejecting empty or duplicated symbol lists.
    pub fn new(symbols: Vec<char>) -> Result<Self> {
        if symbols.is_empty() {
            return Err(AppError::EmptySymbolTable);
        }
        let mut seen = HashSet::with_capacity(symbols.len());
        for &symbol in &symbols {
            if !seen.insert(symbol) {
                return Err(AppError::DuplicateSymbol(symbol));
            }
        }
        Ok(Self { symbols })
    }

    /// Create a table from the characters of `symbols`, in order.
    pub fn from_chars(symbols: &str) -> Result<Self> {
        Self::new(symbols.chars().collect())
    }

    /// Number of symbols, excluding blank.
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Always false for a constructed table.
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Column index of the blank symbol.
    pub fn blank_index(&self) -> SymbolIndex {
        self.symbols.len()
    }

    /// Symbol at `index`.
    pub fn symbol(&self, index: SymbolIndex) -> Option<char> {
        self.symbols.get(index).copied()
    }

    /// Index of `symbol`, if present.
    pub fn index_of(&self, symbol: char) -> Option<SymbolIndex> {
        self.symbols.iter().position(|&s| s == symbol)
    }

    /// Whether `symbol` is in the table.
    pub fn contains(&self, symbol: char) -> bool {
        self.symbols.contains(&symbol)
    }

    /// Map a labeling to text. Indices outside the table are skipped.
    pub fn decode(&self, labeling: &Labeling) -> String {
        labeling
            .as_slice()
            .iter()
            .filter_map(|&index| self.symbol(index))
            .collect()
    }

    /// The symbols in order.
    pub fn as_slice(&self) -> &[char] {
        &self.symbols
    }
}

/// Per-timestep class probabilities, shape `[T, C + 1]`, row-major.
///
/// The last column is blank. Values are validated to be finite and within
/// `[0, 1]`; rows are not required to sum to one.
#[derive(Debug, Clone, PartialEq)]
pub struct EmissionMatrix {
    data: Vec<Probability>,
    timesteps: usize,
    classes: usize,
}

impl EmissionMatrix {
    /// Create a matrix from flat row-major data.
    pub fn new(data: Vec<Probability>, timesteps: usize, classes: usize) -> Result<Self> {
        if classes == 0 {
            return Err(AppError::InvalidInput(
                "Emission matrix must have at least one column".to_string(),
            ));
        }
        let expected = timesteps.checked_mul(classes).ok_or_else(|| {
            AppError::InvalidInput(format!(
                "Emission matrix shape {} x {} overflows",
                timesteps, classes
            ))
        })?;
        if data.len() != expected {
            return Err(AppError::InvalidInput(format!(
                "Emission matrix data has {} values, expected {} x {} = {}",
                data.len(),
                timesteps,
                classes,
                expected
            )));
        }
        for (i, &value) in data.iter().enumerate() {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(AppError::InvalidProbability {
                    row: i / classes,
                    column: i % classes,
                    value,
                });
            }
        }
        Ok(Self {
            data,
            timesteps,
            classes,
        })
    }

    /// Create a matrix from rows of probabilities. All rows must have equal length.
    pub fn from_rows(rows: &[Vec<Probability>]) -> Result<Self> {
        let (timesteps, classes) = Self::row_shape(rows)?;
        Self::new(rows.concat(), timesteps, classes)
    }

    /// Create a matrix from rows of unnormalized scores by applying a row-wise softmax.
    pub fn from_logits(rows: &[Vec<f64>]) -> Result<Self> {
        let (timesteps, classes) = Self::row_shape(rows)?;
        let mut data = Vec::with_capacity(timesteps * classes);
        for (t, row) in rows.iter().enumerate() {
            if let Some(column) = row.iter().position(|v| !v.is_finite()) {
                return Err(AppError::InvalidProbability {
                    row: t,
                    column,
                    value: row[column],
                });
            }
            let max = row.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let start = data.len();
            data.extend(row.iter().map(|&v| (v - max).exp()));
            let sum: f64 = data[start..].iter().sum();
            for value in &mut data[start..] {
                *value /= sum;
            }
        }
        Self::new(data, timesteps, classes)
    }

    fn row_shape<T>(rows: &[Vec<T>]) -> Result<(usize, usize)> {
        let classes = rows.first().map_or(0, Vec::len);
        if let Some((row, bad)) = rows.iter().enumerate().find(|(_, r)| r.len() != classes) {
            return Err(AppError::RaggedMatrix {
                row,
                expected: classes,
                actual: bad.len(),
            });
        }
        if rows.is_empty() {
            return Err(AppError::InvalidInput(
                "Emission matrix has no rows; use EmissionMatrix::new with explicit columns"
                    .to_string(),
            ));
        }
        Ok((rows.len(), classes))
    }

    /// Number of timesteps (rows).
    pub fn timesteps(&self) -> usize {
        self.timesteps
    }

    /// Number of classes including blank (columns).
    pub fn classes(&self) -> usize {
        self.classes
    }

    /// Probability of class `k` at timestep `t`.
    ///
    /// # Panics
    /// Panics if `t` or `k` is out of range; callers validate shapes at entry.
    pub fn get(&self, t: usize, k: SymbolIndex) -> Probability {
        assert!(k < self.classes, "class index {k} out of range");
        self.data[t * self.classes + k]
    }

    /// Row of probabilities at timestep `t`.
    pub fn row(&self, t: usize) -> &[Probability] {
        &self.data[t * self.classes..(t + 1) * self.classes]
    }

    /// Check that this matrix has one column per symbol plus blank.
    pub fn check_symbols(&self, symbols: &SymbolTable) -> Result<()> {
        let expected = symbols.len() + 1;
        if self.classes != expected {
            return Err(AppError::ShapeMismatch {
                expected,
                actual: self.classes,
            });
        }
        Ok(())
    }
}
