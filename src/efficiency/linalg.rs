//! Dense symmetric positive-definite helpers.
//!
//! Information matrices are small (one row per model parameter), so a plain
//! Cholesky factorisation is all the linear algebra the scoring needs.

use ndarray::Array2;

/// Pivots at or below this value are treated as rank deficiency.
pub const PIVOT_TOLERANCE: f64 = 1e-10;

/// Cholesky factorisation `m = L L'` of a symmetric matrix.
///
/// Returns the lower-triangular `L`, or `None` if `m` is not square or not
/// positive definite within [`PIVOT_TOLERANCE`].
#[must_use]
pub fn cholesky(m: &Array2<f64>) -> Option<Array2<f64>> {
    let n = m.nrows();
    if m.ncols() != n {
        return None;
    }

    let mut l = Array2::<f64>::zeros((n, n));
    for j in 0..n {
        let mut pivot = m[[j, j]];
        for k in 0..j {
            pivot -= l[[j, k]] * l[[j, k]];
        }
        if pivot <= PIVOT_TOLERANCE {
            return None;
        }
        let diag = pivot.sqrt();
        l[[j, j]] = diag;

        for i in (j + 1)..n {
            let mut sum = m[[i, j]];
            for k in 0..j {
                sum -= l[[i, k]] * l[[j, k]];
            }
            l[[i, j]] = sum / diag;
        }
    }

    Some(l)
}

/// `ln det(m)` from the Cholesky factor of `m`.
#[must_use]
pub fn log_det(l: &Array2<f64>) -> f64 {
    2.0 * l.diag().iter().map(|d| d.ln()).sum::<f64>()
}

/// `trace(m^-1)` from the Cholesky factor of `m`.
///
/// Uses `trace(m^-1) = ||L^-1||_F^2`, inverting `L` column by column with
/// forward substitution.
#[must_use]
pub fn inverse_trace(l: &Array2<f64>) -> f64 {
    let n = l.nrows();
    let mut total = 0.0;
    let mut x = vec![0.0; n];

    for col in 0..n {
        // Solve L x = e_col; x[i] = 0 for i < col.
        for i in col..n {
            let mut sum = if i == col { 1.0 } else { 0.0 };
            for k in col..i {
                sum -= l[[i, k]] * x[k];
            }
            x[i] = sum / l[[i, i]];
            total += x[i] * x[i];
        }
    }

    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_cholesky_identity() {
        let l = cholesky(&Array2::eye(3)).unwrap();
        assert_eq!(l, Array2::eye(3));
        assert!(log_det(&l).abs() < 1e-12);
        assert!((inverse_trace(&l) - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_cholesky_known_matrix() {
        let m = array![[4.0, 2.0], [2.0, 3.0]];
        let l = cholesky(&m).unwrap();

        assert!((l[[0, 0]] - 2.0).abs() < 1e-12);
        assert!((l[[1, 0]] - 1.0).abs() < 1e-12);
        assert!((l[[1, 1]] - 2.0_f64.sqrt()).abs() < 1e-12);

        // det = 8, inverse = [[3, -2], [-2, 4]] / 8
        assert!((log_det(&l) - 8.0_f64.ln()).abs() < 1e-12);
        assert!((inverse_trace(&l) - 7.0 / 8.0).abs() < 1e-12);
    }

    #[test]
    fn test_cholesky_singular() {
        let m = array![[1.0, 1.0], [1.0, 1.0]];
        assert!(cholesky(&m).is_none());
        assert!(cholesky(&Array2::zeros((2, 3))).is_none());
    }
}
