//! Design quality metrics.
//!
//! Designs are scored under the main-effects model: an intercept plus
//! `s - 1` contrast columns per factor. Contrasts are normalised Helmert
//! contrasts, so a balanced design in which every pair of factors is
//! balanced has information matrix `X'X / N = I`.
//!
//! - **D-efficiency**: `det(X'X / N)^(1/p)`
//! - **A-efficiency**: `p / trace((X'X / N)^-1)`
//!
//! Both lie in `[0, 1]`; 1 means the design is orthogonal for the model
//! and 0 means some effect cannot be estimated.
//!
//! ```
//! use doe_sampler::generate;
//!
//! let design = generate(&[3], 3, 1, 1).unwrap();
//! assert!((design.d_efficiency() - 1.0).abs() < 1e-12);
//! ```

pub mod linalg;

use ndarray::Array2;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::design::Design;

/// Efficiency scores of a design.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Efficiencies {
    /// D-efficiency in `[0, 1]`.
    pub d: f64,
    /// A-efficiency in `[0, 1]`.
    pub a: f64,
    /// Number of model parameters `p`.
    pub parameters: usize,
}

/// Value of the `j`-th normalised Helmert contrast (1-based) at `level`.
///
/// Over the `s` levels each contrast sums to zero and squares to `s`.
#[must_use]
pub fn helmert(levels: u32, j: u32, level: u32) -> f64 {
    let raw = match level.cmp(&j) {
        std::cmp::Ordering::Less => -1.0,
        std::cmp::Ordering::Equal => f64::from(j),
        std::cmp::Ordering::Greater => 0.0,
    };
    let norm = (f64::from(levels) / f64::from(j * (j + 1))).sqrt();
    raw * norm
}

/// Build the main-effects model matrix, shape `(runs, p)`.
#[must_use]
pub fn model_matrix(design: &Design) -> Array2<f64> {
    let p = design.params().model_parameters();
    let mut x = Array2::zeros((design.runs(), p));
    x.column_mut(0).fill(1.0);

    let mut offset = 1;
    for (col, &s) in design.levels().iter().enumerate() {
        for j in 1..s {
            let target = offset + (j as usize - 1);
            for (row, &level) in design.column(col).iter().enumerate() {
                x[[row, target]] = helmert(s, j, level);
            }
        }
        offset += s.saturating_sub(1) as usize;
    }

    x
}

/// Information matrix `X'X / N` of the main-effects model.
#[must_use]
pub fn information_matrix(design: &Design) -> Array2<f64> {
    let x = model_matrix(design);
    x.t().dot(&x) / design.runs() as f64
}

/// D-efficiency of a design, 0 if the model is not estimable.
#[must_use]
pub fn d_efficiency(design: &Design) -> f64 {
    let info = information_matrix(design);
    let p = info.nrows() as f64;
    linalg::cholesky(&info).map_or(0.0, |l| (linalg::log_det(&l) / p).exp().min(1.0))
}

/// A-efficiency of a design, 0 if the model is not estimable.
#[must_use]
pub fn a_efficiency(design: &Design) -> f64 {
    let info = information_matrix(design);
    let p = info.nrows() as f64;
    linalg::cholesky(&info).map_or(0.0, |l| (p / linalg::inverse_trace(&l)).min(1.0))
}

/// Compute both efficiencies with a single factorisation.
#[must_use]
pub fn efficiencies(design: &Design) -> Efficiencies {
    let info = information_matrix(design);
    let parameters = info.nrows();
    let p = parameters as f64;

    match linalg::cholesky(&info) {
        Some(l) => Efficiencies {
            d: (linalg::log_det(&l) / p).exp().min(1.0),
            a: (p / linalg::inverse_trace(&l)).min(1.0),
            parameters,
        },
        None => Efficiencies {
            d: 0.0,
            a: 0.0,
            parameters,
        },
    }
}

impl Design {
    /// D-efficiency under the main-effects model.
    #[must_use]
    pub fn d_efficiency(&self) -> f64 {
        d_efficiency(self)
    }

    /// D- and A-efficiency under the main-effects model.
    #[must_use]
    pub fn efficiencies(&self) -> Efficiencies {
        efficiencies(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::design::DesignParams;

    fn design(levels: Vec<u32>, rows: &[&[u32]]) -> Design {
        let k = levels.len();
        let params = DesignParams::new(rows.len(), levels, 1).unwrap();
        let flat: Vec<u32> = rows.iter().flat_map(|r| r.iter().copied()).collect();
        Design::new(Array2::from_shape_vec((rows.len(), k), flat).unwrap(), params)
    }

    #[test]
    fn test_helmert_contrasts_are_orthonormal() {
        for s in 2..=6u32 {
            for j in 1..s {
                let sum: f64 = (0..s).map(|l| helmert(s, j, l)).sum();
                let sq: f64 = (0..s).map(|l| helmert(s, j, l).powi(2)).sum();
                assert!(sum.abs() < 1e-12);
                assert!((sq - f64::from(s)).abs() < 1e-12);

                for i in 1..j {
                    let dot: f64 = (0..s).map(|l| helmert(s, i, l) * helmert(s, j, l)).sum();
                    assert!(dot.abs() < 1e-12);
                }
            }
        }
    }

    #[test]
    fn test_saturated_single_factor() {
        for s in 1..=5u32 {
            let rows: Vec<Vec<u32>> = (0..s).map(|l| vec![l]).collect();
            let refs: Vec<&[u32]> = rows.iter().map(Vec::as_slice).collect();
            let d = design(vec![s], &refs);

            let eff = d.efficiencies();
            assert_eq!(eff.parameters, s as usize);
            assert!((eff.d - 1.0).abs() < 1e-12, "s = {s}: {}", eff.d);
            assert!((eff.a - 1.0).abs() < 1e-12, "s = {s}: {}", eff.a);
        }
    }

    #[test]
    fn test_orthogonal_array_is_fully_efficient() {
        let d = design(
            vec![2, 2, 2],
            &[&[0, 0, 0], &[0, 1, 1], &[1, 0, 1], &[1, 1, 0]],
        );
        assert!((d.d_efficiency() - 1.0).abs() < 1e-12);
        assert!((a_efficiency(&d) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_confounded_design_scores_zero() {
        // Columns 0 and 1 are identical: their effects are aliased.
        let d = design(vec![2, 2], &[&[0, 0], &[0, 0], &[1, 1], &[1, 1]]);
        assert_eq!(d.d_efficiency(), 0.0);
        assert_eq!(d.efficiencies().a, 0.0);
    }

    #[test]
    fn test_unbalanced_design_is_less_efficient() {
        let d = design(vec![2], &[&[0], &[0], &[0], &[1]]);
        let eff = d.d_efficiency();
        assert!(eff > 0.0 && eff < 1.0);
        // det = 4 * (3/4) * (1/4) for one binary factor
        assert!((eff - 0.75_f64.sqrt()).abs() < 1e-12);
    }
}
