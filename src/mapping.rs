//! Mapping of index designs back to caller-supplied factor values.
//!
//! A [`Factor`] is an ordered list of the values one dimension of a test
//! space can take. The search only sees level counts; this module turns the
//! resulting level indices back into the caller's values.
//!
//! # Example
//!
//! ```
//! use doe_sampler::mapping::{sample_by_list, Factor};
//!
//! let factors = vec![
//!     Factor::new("dtype", vec!["f32", "f64"]),
//!     Factor::new("layout", vec!["R", "C"]),
//!     Factor::new("stride", vec!["1", "3"]),
//! ];
//!
//! let runs = sample_by_list(&factors, 4, 10, 2).unwrap();
//! assert_eq!(runs.len(), 4);
//! assert!(runs.iter().all(|run| run.len() == 3));
//! ```

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::builder::generate;
use crate::design::Design;
use crate::error::{Error, Result};

/// A named factor and its admissible values, in level order.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Factor<T> {
    /// Display name of the factor.
    pub name: String,
    /// Values the factor can take; index `i` is level `i`.
    pub values: Vec<T>,
}

impl<T> Factor<T> {
    /// Create a factor from its name and values.
    pub fn new(name: impl Into<String>, values: Vec<T>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Number of levels of this factor.
    #[must_use]
    pub fn levels(&self) -> u32 {
        u32::try_from(self.values.len()).unwrap_or(u32::MAX)
    }

    /// Value at a level index.
    #[must_use]
    pub fn value(&self, level: u32) -> Option<&T> {
        self.values.get(level as usize)
    }
}

/// Level counts of a list of factors.
#[must_use]
pub fn factor_levels<T>(factors: &[Factor<T>]) -> Vec<u32> {
    factors.iter().map(Factor::levels).collect()
}

/// Replace every level index of `design` with the matching factor value.
///
/// # Errors
///
/// Returns [`Error::DimensionMismatch`] if the number of factors differs
/// from the number of design columns, and [`Error::IndexOutOfBounds`] if a
/// level index has no value in its factor.
pub fn map_design<T: Clone>(design: &Design, factors: &[Factor<T>]) -> Result<Vec<Vec<T>>> {
    if factors.len() != design.factors() {
        return Err(Error::DimensionMismatch {
            expected: format!("{} factors", design.factors()),
            actual: format!("{} factors", factors.len()),
        });
    }

    design
        .rows()
        .map(|row| {
            row.iter()
                .zip(factors)
                .map(|(&level, factor)| {
                    factor
                        .value(level)
                        .cloned()
                        .ok_or(Error::IndexOutOfBounds {
                            index: level as usize,
                            size: factor.values.len(),
                        })
                })
                .collect()
        })
        .collect()
}

/// Generate a design for `factors` and map it to their values.
///
/// Each returned run holds one value per factor, in factor order.
///
/// # Errors
///
/// See [`crate::DesignBuilder::build`].
pub fn sample_by_list<T: Clone>(
    factors: &[Factor<T>],
    run_size: usize,
    nkeep: usize,
    strength: u32,
) -> Result<Vec<Vec<T>>> {
    let design = generate(&factor_levels(factors), run_size, nkeep, strength)?;
    log::debug!(
        "mapping {} runs over factors {:?}",
        design.runs(),
        factors.iter().map(|f| f.name.as_str()).collect::<Vec<_>>()
    );
    map_design(&design, factors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::design::DesignParams;
    use ndarray::Array2;

    #[test]
    fn test_map_design() {
        let params = DesignParams::new(2, vec![2, 3], 1).unwrap();
        let data = Array2::from_shape_vec((2, 2), vec![0, 2, 1, 0]).unwrap();
        let design = Design::new(data, params);

        let factors = vec![
            Factor::new("num", vec!["f32", "f64"]),
            Factor::new("stride", vec!["1", "2", "3"]),
        ];

        let runs = map_design(&design, &factors).unwrap();
        assert_eq!(runs, vec![vec!["f32", "3"], vec!["f64", "1"]]);
    }

    #[test]
    fn test_map_design_factor_count_mismatch() {
        let params = DesignParams::new(2, vec![2], 1).unwrap();
        let data = Array2::from_shape_vec((2, 1), vec![0, 1]).unwrap();
        let design = Design::new(data, params);

        let factors = vec![Factor::new("a", vec![1, 2]), Factor::new("b", vec![1, 2])];
        assert!(matches!(
            map_design(&design, &factors),
            Err(Error::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_map_design_short_factor() {
        let params = DesignParams::new(3, vec![3], 1).unwrap();
        let data = Array2::from_shape_vec((3, 1), vec![0, 1, 2]).unwrap();
        let design = Design::new(data, params);

        let factors = vec![Factor::new("a", vec!['x', 'y'])];
        assert_eq!(
            map_design(&design, &factors),
            Err(Error::IndexOutOfBounds { index: 2, size: 2 })
        );
    }

    #[test]
    fn test_sample_by_list_covers_pairs() {
        let factors = vec![
            Factor::new("num", vec!["f32", "f64"]),
            Factor::new("trans", vec!["N", "T"]),
            Factor::new("shape", vec!["7x8", "8x7", "8x8"]),
        ];

        let runs = sample_by_list(&factors, 6, 100, 2).unwrap();
        assert_eq!(runs.len(), 6);

        for (a, b) in [(0, 1), (0, 2), (1, 2)] {
            for va in &factors[a].values {
                for vb in &factors[b].values {
                    assert!(
                        runs.iter().any(|run| run[a] == *va && run[b] == *vb),
                        "{va} with {vb} missing"
                    );
                }
            }
        }
    }

    #[test]
    fn test_sample_by_list_tuple_values() {
        let factors = vec![
            Factor::new("a", vec![(7, 8, 'N'), (8, 7, 'T')]),
            Factor::new("b", vec![(8, 9, 'N'), (9, 8, 'T')]),
        ];
        let runs = sample_by_list(&factors, 4, 10, 2).unwrap();
        assert_eq!(runs.len(), 4);
        assert!(runs.contains(&vec![(8, 7, 'T'), (8, 9, 'N')]));
    }

    #[test]
    fn test_empty_factor_is_rejected() {
        let factors: Vec<Factor<u8>> = vec![Factor::new("a", vec![0, 1]), Factor::new("b", vec![])];
        assert_eq!(
            sample_by_list(&factors, 4, 10, 1),
            Err(Error::DegenerateFactor { factor: 1 })
        );
    }
}
