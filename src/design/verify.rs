//! Coverage verification.
//!
//! This module checks by brute force that a design jointly covers every
//! level combination of every `t`-subset of its factors.

use std::collections::HashSet;

use crate::utils::{combinations, mixed_radix, product};

use super::Design;

/// Result of verifying the coverage of a design.
#[derive(Debug, Clone)]
pub struct CoverageReport {
    /// Whether every `strength`-tuple is covered.
    pub is_covered: bool,
    /// The strength that was checked.
    pub strength: u32,
    /// Every level tuple that never occurs.
    pub missing: Vec<MissingTuple>,
}

/// A level combination absent from a design.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingTuple {
    /// The factor columns involved.
    pub columns: Vec<usize>,
    /// The level index for each column.
    pub levels: Vec<u32>,
}

/// Verify that a design covers every `strength`-tuple of level combinations.
///
/// # Algorithm
///
/// For strength t:
/// 1. For each combination of t columns
/// 2. Collect the set of t-tuples seen in the runs
/// 3. Report every tuple of the full factorial that was not seen
///
/// Time complexity: O(C(k, t) * (N * t + Π s)).
///
/// # Example
///
/// ```
/// use doe_sampler::design::verify_coverage;
/// use doe_sampler::generate;
///
/// let design = generate(&[2, 2, 3], 6, 10, 2).unwrap();
/// assert!(verify_coverage(&design, 2).is_covered);
/// ```
#[must_use]
pub fn verify_coverage(design: &Design, strength: u32) -> CoverageReport {
    let levels = design.levels();
    let t = strength as usize;
    let mut missing = Vec::new();

    if t <= design.factors() {
        for columns in combinations(design.factors(), t) {
            let sub_levels: Vec<u32> = columns.iter().map(|&c| levels[c]).collect();

            let seen: HashSet<Vec<u32>> = design
                .rows()
                .map(|row| columns.iter().map(|&c| row[c]).collect())
                .collect();

            let total = product(&sub_levels).unwrap_or(usize::MAX);
            if seen.len() == total {
                continue;
            }

            for index in 0..total {
                let tuple = mixed_radix(index, &sub_levels);
                if !seen.contains(&tuple) {
                    missing.push(MissingTuple {
                        columns: columns.clone(),
                        levels: tuple,
                    });
                }
            }
        }
    }

    CoverageReport {
        is_covered: missing.is_empty() && t <= design.factors(),
        strength,
        missing,
    }
}

/// Compute the highest strength `t <= max_check` the design covers.
///
/// Returns 0 if not even every single level appears.
#[must_use]
pub fn coverage_strength(design: &Design, max_check: u32) -> u32 {
    let max_t = max_check.min(design.factors() as u32);

    // Coverage at t implies coverage at every lower t.
    (1..=max_t)
        .take_while(|&t| verify_coverage(design, t).is_covered)
        .last()
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::design::DesignParams;
    use ndarray::Array2;

    fn make_design(levels: Vec<u32>, strength: u32, rows: &[&[u32]]) -> Design {
        let k = levels.len();
        let params = DesignParams::new(rows.len(), levels, strength).unwrap();
        let flat: Vec<u32> = rows.iter().flat_map(|r| r.iter().copied()).collect();
        Design::new(Array2::from_shape_vec((rows.len(), k), flat).unwrap(), params)
    }

    #[test]
    #[rustfmt::skip]
    fn test_verify_l4() {
        let design = make_design(vec![2, 2, 2], 2, &[
            &[0, 0, 0],
            &[0, 1, 1],
            &[1, 0, 1],
            &[1, 1, 0],
        ]);

        let report = verify_coverage(&design, 2);
        assert!(report.is_covered);
        assert!(report.missing.is_empty());

        let report = verify_coverage(&design, 3);
        assert!(!report.is_covered);
        assert_eq!(report.missing.len(), 4);
    }

    #[test]
    #[rustfmt::skip]
    fn test_verify_reports_missing_pair() {
        let design = make_design(vec![2, 2], 2, &[
            &[0, 0],
            &[0, 1],
            &[1, 0],
            &[1, 0],
        ]);

        let report = verify_coverage(&design, 2);
        assert!(!report.is_covered);
        assert_eq!(
            report.missing,
            vec![MissingTuple { columns: vec![0, 1], levels: vec![1, 1] }]
        );
    }

    #[test]
    fn test_strength_above_factors_is_not_covered() {
        let design = make_design(vec![2], 1, &[&[0], &[1]]);
        assert!(verify_coverage(&design, 1).is_covered);
        assert!(!verify_coverage(&design, 2).is_covered);
    }

    #[test]
    #[rustfmt::skip]
    fn test_coverage_strength() {
        let design = make_design(vec![2, 2, 2], 2, &[
            &[0, 0, 0],
            &[0, 1, 1],
            &[1, 0, 1],
            &[1, 1, 0],
        ]);
        assert_eq!(coverage_strength(&design, 10), 2);

        let design = make_design(vec![3], 1, &[&[0], &[1], &[1]]);
        assert_eq!(coverage_strength(&design, 1), 0);
    }
}
