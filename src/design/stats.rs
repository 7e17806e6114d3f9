//! Diagnostic statistics for designs.
//!
//! Level balance and pairwise factor correlation, useful for eyeballing
//! how far a generated matrix is from an orthogonal array.

use ndarray::Array2;

use super::Design;

/// A report on the level balance of a design.
#[derive(Debug, Clone)]
pub struct BalanceReport {
    /// Whether each factor is perfectly balanced (each level appears N/s times).
    pub factor_balance: Vec<bool>,
    /// Whether each factor is nearly balanced (level counts differ by at most one).
    pub near_balance: Vec<bool>,
    /// The count of each level, indexed by factor then level.
    pub level_counts: Vec<Vec<usize>>,
}

impl BalanceReport {
    /// Whether every factor is nearly balanced.
    #[must_use]
    pub fn is_near_balanced(&self) -> bool {
        self.near_balance.iter().all(|&b| b)
    }
}

impl Design {
    /// Count level occurrences for every factor.
    #[must_use]
    pub fn balance_report(&self) -> BalanceReport {
        let n = self.runs();
        let k = self.factors();

        let mut factor_balance = Vec::with_capacity(k);
        let mut near_balance = Vec::with_capacity(k);
        let mut level_counts = Vec::with_capacity(k);

        for col in 0..k {
            let s = self.levels_for(col) as usize;
            let mut counts = vec![0usize; s];
            for &v in self.column(col) {
                counts[v as usize] += 1;
            }

            let min = counts.iter().copied().min().unwrap_or(0);
            let max = counts.iter().copied().max().unwrap_or(0);
            factor_balance.push(n % s == 0 && min == max);
            near_balance.push(max - min <= 1);
            level_counts.push(counts);
        }

        BalanceReport {
            factor_balance,
            near_balance,
            level_counts,
        }
    }

    /// Compute the correlation matrix between factors.
    ///
    /// Levels are treated as numeric values. Constant columns have zero
    /// correlation with everything but themselves.
    #[must_use]
    pub fn correlation_matrix(&self) -> Array2<f64> {
        let k = self.factors();
        let n = self.runs() as f64;
        let mut corr = Array2::zeros((k, k));

        let mut centered = Array2::zeros((self.runs(), k));
        for col in 0..k {
            let column = self.column(col);
            let mean = column.iter().map(|&v| f64::from(v)).sum::<f64>() / n;
            for (row, &v) in column.iter().enumerate() {
                centered[[row, col]] = f64::from(v) - mean;
            }
        }

        for i in 0..k {
            for j in 0..k {
                if i == j {
                    corr[[i, j]] = 1.0;
                    continue;
                }

                let ci = centered.column(i);
                let cj = centered.column(j);
                let dot = ci.dot(&cj);
                let norm_i = ci.dot(&ci);
                let norm_j = cj.dot(&cj);

                if norm_i > 0.0 && norm_j > 0.0 {
                    corr[[i, j]] = dot / (norm_i.sqrt() * norm_j.sqrt());
                }
            }
        }

        corr
    }
}
