//! Error types for the doe-sampler library.
//!
//! All fallible operations return [`Result`], built on a single [`Error`]
//! enum derived with `thiserror`. Input validation errors are raised before
//! any search work starts; [`Error::NoFeasibleDesign`] is the only error the
//! search itself produces.

use thiserror::Error;

/// The main error type for the doe-sampler library.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // ============ Parameter Validation Errors ============
    /// Invalid design parameters.
    #[error("invalid design parameters: {message}")]
    InvalidParams {
        /// Description of what is invalid.
        message: String,
    },

    /// A factor was given with no admissible levels.
    #[error("factor {factor} has zero levels")]
    DegenerateFactor {
        /// Index of the offending factor.
        factor: usize,
    },

    /// The run count is below a static lower bound for the request.
    #[error("run size {runs} is too small: at least {required} runs are needed ({reason})")]
    InsufficientRuns {
        /// Requested number of runs.
        runs: usize,
        /// Minimum number of runs for the request to be feasible.
        required: usize,
        /// Which bound was violated.
        reason: &'static str,
    },

    // ============ Search Errors ============
    /// No admissible extension column exists for a factor.
    #[error(
        "no feasible design: factor {factor} cannot be added with {runs} runs at strength {strength}"
    )]
    NoFeasibleDesign {
        /// Index of the factor that could not be added.
        factor: usize,
        /// Requested number of runs.
        runs: usize,
        /// Requested strength.
        strength: u32,
    },

    // ============ Dimension Errors ============
    /// Array dimensions are inconsistent.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension description.
        expected: String,
        /// Actual dimension description.
        actual: String,
    },

    /// Index is out of bounds.
    #[error("index {index} is out of bounds for size {size}")]
    IndexOutOfBounds {
        /// The invalid index.
        index: usize,
        /// The maximum valid size.
        size: usize,
    },
}

/// A specialized `Result` type for doe-sampler operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    /// Create a new `InvalidParams` error.
    #[must_use]
    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::InvalidParams {
            message: message.into(),
        }
    }

    /// Create a new `NoFeasibleDesign` error.
    #[must_use]
    pub fn no_feasible_design(factor: usize, runs: usize, strength: u32) -> Self {
        Self::NoFeasibleDesign {
            factor,
            runs,
            strength,
        }
    }

    /// Whether the caller can recover by asking for more runs or a lower strength.
    #[must_use]
    pub fn is_infeasible(&self) -> bool {
        matches!(
            self,
            Self::InsufficientRuns { .. } | Self::NoFeasibleDesign { .. }
        )
    }
}
