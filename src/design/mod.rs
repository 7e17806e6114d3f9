//! Design matrix types and operations.
//!
//! This module provides the data structures that hold a test matrix while it
//! is being built and after it is returned.
//!
//! ## Overview
//!
//! - [`Design`]: a run matrix of level indices
//! - [`DesignParams`]: run count, per-factor level counts and strength
//!
//! ## Notation
//!
//! A design D(N; s_1 ... s_k; t) has:
//! - N rows (runs/test cases)
//! - k columns (factors/parameters), column j taking values 0..s_j
//! - strength t: every t columns jointly contain every level combination
//!
//! Unlike an orthogonal array, a design only promises *coverage* of every
//! t-tuple, not that all tuples occur equally often.

mod stats;
mod verify;

pub use stats::BalanceReport;
pub use verify::{coverage_strength, verify_coverage, CoverageReport, MissingTuple};

use ndarray::{Array2, ArrayView1};
use std::collections::BTreeMap;
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::utils::product;

/// Parameters describing a design.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DesignParams {
    /// Number of runs (rows).
    pub runs: usize,
    /// Number of levels for each factor.
    pub levels: Vec<u32>,
    /// Coverage strength.
    pub strength: u32,
}

impl DesignParams {
    /// Create design parameters, validating factor and strength bounds.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - there are no factors or no runs
    /// - a factor has zero levels
    /// - strength is 0 or exceeds the number of factors
    pub fn new(runs: usize, levels: Vec<u32>, strength: u32) -> Result<Self> {
        if levels.is_empty() {
            return Err(Error::invalid_params("at least one factor is required"));
        }
        if let Some(factor) = levels.iter().position(|&s| s == 0) {
            return Err(Error::DegenerateFactor { factor });
        }
        if runs == 0 {
            return Err(Error::invalid_params("run size must be at least 1"));
        }
        if strength == 0 {
            return Err(Error::invalid_params("strength must be at least 1"));
        }
        if strength as usize > levels.len() {
            return Err(Error::invalid_params(format!(
                "strength {} cannot exceed factors {}",
                strength,
                levels.len()
            )));
        }

        Ok(Self {
            runs,
            levels,
            strength,
        })
    }

    /// Number of factors (columns).
    #[must_use]
    pub fn factors(&self) -> usize {
        self.levels.len()
    }

    /// Number of parameters in the main-effects model: `1 + Σ(s_i - 1)`.
    #[must_use]
    pub fn model_parameters(&self) -> usize {
        1 + self
            .levels
            .iter()
            .map(|&s| s.saturating_sub(1) as usize)
            .sum::<usize>()
    }

    /// Runs needed to cover the worst `strength`-subset of factors.
    ///
    /// This is the product of the `strength` largest level counts. Returns
    /// `None` on overflow.
    #[must_use]
    pub fn coverage_bound(&self) -> Option<usize> {
        let mut sorted = self.levels.clone();
        sorted.sort_unstable_by(|a, b| b.cmp(a));
        product(&sorted[..self.strength as usize])
    }

    /// Check the static feasibility bounds on the run count.
    ///
    /// A design is only searched for when the run count covers the largest
    /// `strength`-subset and leaves the main-effects model estimable.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InsufficientRuns`] naming the violated bound.
    pub fn check_feasible(&self) -> Result<()> {
        let coverage = self.coverage_bound().unwrap_or(usize::MAX);
        if self.runs < coverage {
            return Err(Error::InsufficientRuns {
                runs: self.runs,
                required: coverage,
                reason: "every strength-subset of factors must be fully covered",
            });
        }

        let parameters = self.model_parameters();
        if self.runs < parameters {
            return Err(Error::InsufficientRuns {
                runs: self.runs,
                required: parameters,
                reason: "the main-effects model must be estimable",
            });
        }

        Ok(())
    }
}

impl fmt::Display for DesignParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut levels_map: BTreeMap<u32, usize> = BTreeMap::new();
        for &s in &self.levels {
            *levels_map.entry(s).or_insert(0) += 1;
        }

        let levels_str: Vec<String> = levels_map
            .into_iter()
            .map(|(s, k)| {
                if k == 1 {
                    s.to_string()
                } else {
                    format!("{}^{}", s, k)
                }
            })
            .collect();

        write!(
            f,
            "D({}; {}; {})",
            self.runs,
            levels_str.join(" "),
            self.strength
        )
    }
}

/// A design matrix.
///
/// The data is stored as a 2D matrix of level indices where each column j
/// has elements in the range [0, levels[j]).
#[derive(Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Design {
    /// The run data, shape (runs, factors).
    data: Array2<u32>,
    /// Design parameters.
    params: DesignParams,
}

impl Design {
    /// Create a new design from data and parameters.
    ///
    /// # Panics
    ///
    /// Panics if the data dimensions don't match the parameters.
    #[must_use]
    pub fn new(data: Array2<u32>, params: DesignParams) -> Self {
        assert_eq!(
            data.nrows(),
            params.runs,
            "data rows {} must match params.runs {}",
            data.nrows(),
            params.runs
        );
        assert_eq!(
            data.ncols(),
            params.factors(),
            "data cols {} must match factors {}",
            data.ncols(),
            params.factors()
        );

        Self { data, params }
    }

    /// Create a new design, validating dimensions and level values.
    ///
    /// # Errors
    ///
    /// Returns an error if the data dimensions don't match the parameters,
    /// or [`Error::IndexOutOfBounds`] if a value is not a level of its factor.
    pub fn try_new(data: Array2<u32>, params: DesignParams) -> Result<Self> {
        if data.nrows() != params.runs {
            return Err(Error::DimensionMismatch {
                expected: format!("{} rows", params.runs),
                actual: format!("{} rows", data.nrows()),
            });
        }
        if data.ncols() != params.factors() {
            return Err(Error::DimensionMismatch {
                expected: format!("{} columns", params.factors()),
                actual: format!("{} columns", data.ncols()),
            });
        }

        let out_of_range = data
            .columns()
            .into_iter()
            .zip(&params.levels)
            .find_map(|(column, &s)| column.iter().find(|&&v| v >= s).map(|&v| (v, s)));
        if let Some((value, levels)) = out_of_range {
            return Err(Error::IndexOutOfBounds {
                index: value as usize,
                size: levels as usize,
            });
        }

        Ok(Self { data, params })
    }

    /// Get the number of runs (rows).
    #[must_use]
    pub fn runs(&self) -> usize {
        self.params.runs
    }

    /// Get the number of factors (columns).
    #[must_use]
    pub fn factors(&self) -> usize {
        self.params.factors()
    }

    /// Get the level counts of all factors.
    #[must_use]
    pub fn levels(&self) -> &[u32] {
        &self.params.levels
    }

    /// Get the number of levels for a specific factor.
    #[must_use]
    pub fn levels_for(&self, factor: usize) -> u32 {
        self.params.levels[factor]
    }

    /// Get the coverage strength.
    #[must_use]
    pub fn strength(&self) -> u32 {
        self.params.strength
    }

    /// Get the parameters.
    #[must_use]
    pub fn params(&self) -> &DesignParams {
        &self.params
    }

    /// Get a reference to the underlying data.
    #[must_use]
    pub fn data(&self) -> &Array2<u32> {
        &self.data
    }

    /// Consume the design and return the underlying data.
    #[must_use]
    pub fn into_data(self) -> Array2<u32> {
        self.data
    }

    /// Get the level index at a specific position.
    ///
    /// # Panics
    ///
    /// Panics if the indices are out of bounds.
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> u32 {
        self.data[[row, col]]
    }

    /// Get a row of the design.
    #[must_use]
    pub fn row(&self, idx: usize) -> ArrayView1<'_, u32> {
        self.data.row(idx)
    }

    /// Get a column of the design.
    #[must_use]
    pub fn column(&self, idx: usize) -> ArrayView1<'_, u32> {
        self.data.column(idx)
    }

    /// Iterate over rows.
    pub fn rows(&self) -> impl Iterator<Item = ArrayView1<'_, u32>> {
        self.data.rows().into_iter()
    }

    /// Copy the runs out as plain vectors.
    #[must_use]
    pub fn to_runs(&self) -> Vec<Vec<u32>> {
        self.rows().map(|row| row.to_vec()).collect()
    }

    /// Select a subset of columns, returning a new design.
    ///
    /// The strength is capped at the number of selected columns.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexOutOfBounds`] if a column index is invalid, or
    /// [`Error::InvalidParams`] if `cols` is empty.
    pub fn select_columns(&self, cols: &[usize]) -> Result<Self> {
        if let Some(&bad) = cols.iter().find(|&&c| c >= self.factors()) {
            return Err(Error::IndexOutOfBounds {
                index: bad,
                size: self.factors(),
            });
        }

        let new_levels: Vec<u32> = cols.iter().map(|&c| self.params.levels[c]).collect();
        let strength = self.strength().min(cols.len() as u32).max(1);
        let params = DesignParams::new(self.runs(), new_levels, strength)?;

        let mut new_data = Array2::zeros((self.runs(), cols.len()));
        for (new_col, &old_col) in cols.iter().enumerate() {
            new_data.column_mut(new_col).assign(&self.data.column(old_col));
        }

        Ok(Self::new(new_data, params))
    }

    /// Check if all values are in the valid range [0, levels).
    #[must_use]
    pub fn values_in_range(&self) -> bool {
        self.data
            .columns()
            .into_iter()
            .zip(&self.params.levels)
            .all(|(column, &s)| column.iter().all(|&v| v < s))
    }

    /// Append a column for a factor with `levels` levels.
    ///
    /// The strength is kept; `column` must have one entry per run.
    pub(crate) fn with_column(&self, column: &[u32], levels: u32) -> Self {
        debug_assert_eq!(column.len(), self.runs());

        let runs = self.runs();
        let factors = self.factors();
        let mut data = Array2::zeros((runs, factors + 1));
        data.slice_mut(ndarray::s![.., ..factors]).assign(&self.data);
        for (row, &v) in column.iter().enumerate() {
            data[[row, factors]] = v;
        }

        let mut params = self.params.clone();
        params.levels.push(levels);
        Self { data, params }
    }

    /// Reorder rows lexicographically.
    pub(crate) fn sort_rows(&mut self) {
        let mut rows = self.to_runs();
        rows.sort();
        for (r, row) in rows.into_iter().enumerate() {
            for (c, v) in row.into_iter().enumerate() {
                self.data[[r, c]] = v;
            }
        }
    }
}

impl fmt::Debug for Design {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} with data {:?}", self.params, self.data)
    }
}

impl fmt::Display for Design {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.params)?;
        for row in self.data.rows() {
            let row_str: Vec<String> = row.iter().map(ToString::to_string).collect();
            writeln!(f, "  {}", row_str.join(" "))?;
        }
        Ok(())
    }
}
