//! Builder pattern for generating designs.
//!
//! The builder collects the factor level counts, run size, strength and
//! search width, validates them, and runs the column-extension search.
//!
//! # Example
//!
//! ```
//! use doe_sampler::DesignBuilder;
//!
//! let design = DesignBuilder::new()
//!     .levels(vec![2, 2, 3])
//!     .run_size(6)
//!     .strength(2)
//!     .keep(10)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(design.runs(), 6);
//! assert_eq!(design.factors(), 3);
//! ```
//!
//! # Defaults
//!
//! - strength: 2 (pairwise coverage)
//! - keep: 100 candidates per extension step
//! - extension: [`ExtendConfig::default`]

use crate::design::{Design, DesignParams};
use crate::error::{Error, Result};
use crate::extend::{search, ExtendConfig, Strategy};

/// Default number of candidates retained per extension step.
pub const DEFAULT_KEEP: usize = 100;

/// Default coverage strength.
pub const DEFAULT_STRENGTH: u32 = 2;

/// Builder for generating designs.
#[derive(Debug, Clone, Default)]
pub struct DesignBuilder {
    levels: Option<Vec<u32>>,
    run_size: Option<usize>,
    strength: Option<u32>,
    keep: Option<usize>,
    config: ExtendConfig,
}

impl DesignBuilder {
    /// Create a new builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of levels of each factor, in column order.
    #[must_use]
    pub fn levels(mut self, levels: Vec<u32>) -> Self {
        self.levels = Some(levels);
        self
    }

    /// Set the exact number of runs of the generated design.
    #[must_use]
    pub fn run_size(mut self, run_size: usize) -> Self {
        self.run_size = Some(run_size);
        self
    }

    /// Set the coverage strength. Default is 2.
    #[must_use]
    pub fn strength(mut self, strength: u32) -> Self {
        self.strength = Some(strength);
        self
    }

    /// Set how many candidates survive each extension step. Default is 100.
    ///
    /// A value of 1 makes the search greedy.
    #[must_use]
    pub fn keep(mut self, keep: usize) -> Self {
        self.keep = Some(keep);
        self
    }

    /// Set the column generation strategy.
    #[must_use]
    pub fn strategy(mut self, strategy: Strategy) -> Self {
        self.config.strategy = strategy;
        self
    }

    /// Set the per-parent search node budget.
    #[must_use]
    pub fn node_budget(mut self, node_budget: usize) -> Self {
        self.config.node_budget = node_budget;
        self
    }

    /// Set how many extensions per step are held back for backtracking.
    #[must_use]
    pub fn reserve(mut self, reserve: usize) -> Self {
        self.config.reserve = reserve;
        self
    }

    /// Set how many times a dead end may fall back on reserved candidates.
    #[must_use]
    pub fn max_retries(mut self, max_retries: usize) -> Self {
        self.config.max_retries = max_retries;
        self
    }

    /// Replace the whole extension configuration.
    #[must_use]
    pub fn config(mut self, config: ExtendConfig) -> Self {
        self.config = config;
        self
    }

    /// Validate the settings into design parameters without searching.
    ///
    /// # Errors
    ///
    /// Returns an error if levels or run size are missing, a factor has zero
    /// levels, or strength is out of range.
    pub fn params(&self) -> Result<DesignParams> {
        let levels = self
            .levels
            .clone()
            .ok_or_else(|| Error::invalid_params("levels must be specified"))?;
        let run_size = self
            .run_size
            .ok_or_else(|| Error::invalid_params("run size must be specified"))?;

        DesignParams::new(
            run_size,
            levels,
            self.strength.unwrap_or(DEFAULT_STRENGTH),
        )
    }

    /// Generate the design.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - required settings are missing or invalid
    /// - the run size violates a feasibility bound
    /// - some factor has no admissible extension
    pub fn build(self) -> Result<Design> {
        let params = self.params()?;
        let keep = self.keep.unwrap_or(DEFAULT_KEEP);

        let best = search(&params, keep, &self.config)?
            .into_iter()
            .next()
            .ok_or_else(|| Error::no_feasible_design(0, params.runs, params.strength))?;

        log::info!("selected {} with D-efficiency {:.4}", params, best.score);
        Ok(best.design)
    }
}

/// Convenience function to generate a design.
///
/// This is a shorthand for using the builder with the default extension
/// configuration.
///
/// # Errors
///
/// See [`DesignBuilder::build`].
///
/// # Example
///
/// ```
/// use doe_sampler::generate;
///
/// let design = generate(&[4, 2, 2, 2], 8, 20, 2).unwrap();
/// assert_eq!(design.runs(), 8);
/// assert_eq!(design.levels(), &[4, 2, 2, 2]);
/// ```
pub fn generate(levels: &[u32], run_size: usize, keep: usize, strength: u32) -> Result<Design> {
    DesignBuilder::new()
        .levels(levels.to_vec())
        .run_size(run_size)
        .keep(keep)
        .strength(strength)
        .build()
}
