//! # doe-sampler
//!
//! Design-of-experiments test matrices for combinatorial testing.
//!
//! ## Overview
//!
//! Given a list of factors, each with a number of levels, a fixed run count
//! and a coverage strength `t`, the library builds a design matrix in which:
//! - every combination of levels of any `t` factors appears in some run;
//! - each factor's levels are as evenly used as the run count allows;
//! - the main-effects model is estimated with high D-efficiency.
//!
//! Designs are grown one factor at a time. A root design covers the first
//! `t` factors with their full factorial; each further factor is added by
//! enumerating admissible columns for every retained candidate, scoring the
//! extensions by D-efficiency and keeping the best `nkeep` (a beam search that
//! backs up to reserved candidates when a step dead-ends).
//!
//! ## Quick Start
//!
//! ```rust
//! use doe_sampler::DesignBuilder;
//!
//! let design = DesignBuilder::new()
//!     .levels(vec![2, 2, 2])
//!     .run_size(4)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(design.runs(), 4);
//! assert!((design.d_efficiency() - 1.0).abs() < 1e-9);
//! ```
//!
//! Or sample directly over the values under test:
//!
//! ```rust
//! use doe_sampler::{sample_by_list, Factor};
//!
//! let factors = vec![
//!     Factor::new("num", vec!["f32", "f64", "c32", "c64"]),
//!     Factor::new("layout", vec!["R", "C"]),
//!     Factor::new("trans", vec!["N", "T"]),
//! ];
//!
//! let runs = sample_by_list(&factors, 8, 100, 2).unwrap();
//! assert_eq!(runs.len(), 8);
//! ```
//!
//! ## Notation
//!
//! A design is written `D(N; s1 s2 ...; t)` where:
//! - **N**: number of runs (rows)
//! - **s_i**: number of levels of factor `i` (symbols 0, 1, ..., s_i - 1)
//! - **t**: strength (every `t`-column subarray contains every level tuple)
//!
//! ## Features
//!
//! - `serde`: Enable serialization/deserialization of designs and settings
//! - `parallel`: Extend the candidates of each step on a rayon thread pool
//! - `python`: Enable Python bindings via PyO3

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod builder;
pub mod design;
pub mod efficiency;
pub mod emit;
pub mod error;
pub mod extend;
pub mod mapping;
#[cfg(feature = "python")]
pub mod python;
pub mod utils;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::builder::{generate, DesignBuilder, DEFAULT_KEEP, DEFAULT_STRENGTH};
    pub use crate::design::{
        coverage_strength, verify_coverage, BalanceReport, CoverageReport, Design, DesignParams,
    };
    pub use crate::efficiency::{a_efficiency, d_efficiency, Efficiencies};
    pub use crate::emit::{case_name, CaseEmitter};
    pub use crate::error::{Error, Result};
    pub use crate::extend::{create_root, extend_design, search, Balance, ExtendConfig, Strategy};
    pub use crate::mapping::{map_design, sample_by_list, Factor};
}

// Re-export commonly used items at crate root
pub use builder::{generate, DesignBuilder};
pub use design::{verify_coverage, Design, DesignParams};
pub use error::{Error, Result};
pub use mapping::{sample_by_list, Factor};
