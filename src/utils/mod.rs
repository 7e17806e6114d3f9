//! Combinatorial helpers shared by the search and verification code.
//!
//! Subset enumeration drives both the coverage constraints applied while
//! extending a design and the brute-force coverage check in
//! [`crate::design::verify_coverage`].

/// Compute binomial coefficient C(n, k) = n! / (k! * (n-k)!)
///
/// Returns `None` if the result would overflow `u64`.
///
/// # Examples
///
/// ```
/// use doe_sampler::utils::binomial;
///
/// assert_eq!(binomial(5, 2), Some(10));
/// assert_eq!(binomial(10, 5), Some(252));
/// assert_eq!(binomial(5, 0), Some(1));
/// assert_eq!(binomial(3, 5), Some(0)); // k > n
/// ```
#[must_use]
pub fn binomial(n: u64, k: u64) -> Option<u64> {
    if k > n {
        return Some(0);
    }

    let k = k.min(n - k);
    if k == 0 {
        return Some(1);
    }

    let mut result: u64 = 1;
    for i in 0..k {
        // Exact at every step: result is C(n, i+1) after the division.
        result = result.checked_mul(n - i)?;
        result /= i + 1;
    }

    Some(result)
}

/// Generate all k-combinations of indices 0..n in lexicographic order.
///
/// `combinations(n, 0)` yields a single empty combination.
///
/// # Examples
///
/// ```
/// use doe_sampler::utils::combinations;
///
/// let combos: Vec<Vec<usize>> = combinations(4, 2).collect();
/// assert_eq!(combos.len(), 6); // C(4,2) = 6
/// assert_eq!(combos[0], vec![0, 1]);
/// assert_eq!(combos[5], vec![2, 3]);
/// ```
pub fn combinations(n: usize, k: usize) -> impl Iterator<Item = Vec<usize>> {
    CombinationIterator::new(n, k)
}

/// Iterator over k-combinations of 0..n.
struct CombinationIterator {
    n: usize,
    k: usize,
    indices: Vec<usize>,
    finished: bool,
}

impl CombinationIterator {
    fn new(n: usize, k: usize) -> Self {
        Self {
            n,
            k,
            indices: (0..k.min(n)).collect(),
            finished: k > n,
        }
    }
}

impl Iterator for CombinationIterator {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        if self.k == 0 {
            self.finished = true;
            return Some(Vec::new());
        }

        let result = self.indices.clone();

        // Find rightmost index that can be incremented
        let mut i = self.k;
        while i > 0 {
            i -= 1;
            if self.indices[i] < self.n - self.k + i {
                self.indices[i] += 1;
                for j in (i + 1)..self.k {
                    self.indices[j] = self.indices[j - 1] + 1;
                }
                return Some(result);
            }
        }

        self.finished = true;
        Some(result)
    }
}

/// Number of level tuples in the full factorial over `levels`.
///
/// Returns `None` on overflow. The empty product is 1.
#[must_use]
pub fn product(levels: &[u32]) -> Option<usize> {
    levels
        .iter()
        .try_fold(1usize, |acc, &s| acc.checked_mul(s as usize))
}

/// Decode `index` as a mixed-radix number over `levels`, last digit fastest.
///
/// This is the row order of a full factorial: index 0 is all zeros and the
/// last factor cycles first.
///
/// # Examples
///
/// ```
/// use doe_sampler::utils::mixed_radix;
///
/// assert_eq!(mixed_radix(0, &[2, 3]), vec![0, 0]);
/// assert_eq!(mixed_radix(4, &[2, 3]), vec![1, 1]);
/// ```
#[must_use]
pub fn mixed_radix(mut index: usize, levels: &[u32]) -> Vec<u32> {
    let mut digits = vec![0u32; levels.len()];
    for (digit, &s) in digits.iter_mut().zip(levels).rev() {
        let s = s as usize;
        // s >= 1 for every factor that reaches the search
        *digit = (index % s) as u32;
        index /= s;
    }
    digits
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binomial() {
        assert_eq!(binomial(0, 0), Some(1));
        assert_eq!(binomial(5, 5), Some(1));
        assert_eq!(binomial(10, 3), Some(120));
        assert_eq!(binomial(20, 10), Some(184_756));
        assert_eq!(binomial(3, 5), Some(0));
    }

    #[test]
    fn test_combinations() {
        let c: Vec<_> = combinations(4, 2).collect();
        assert_eq!(
            c,
            vec![
                vec![0, 1],
                vec![0, 2],
                vec![0, 3],
                vec![1, 2],
                vec![1, 3],
                vec![2, 3]
            ]
        );

        assert_eq!(combinations(5, 3).count(), 10);

        let c: Vec<_> = combinations(3, 0).collect();
        assert_eq!(c, vec![Vec::<usize>::new()]);

        assert_eq!(combinations(3, 4).count(), 0);
        assert_eq!(combinations(0, 0).count(), 1);
    }

    #[test]
    fn test_product() {
        assert_eq!(product(&[]), Some(1));
        assert_eq!(product(&[2, 3, 4]), Some(24));
        assert_eq!(product(&[u32::MAX, u32::MAX, u32::MAX]), None);
    }

    #[test]
    fn test_mixed_radix_full_factorial_order() {
        let rows: Vec<_> = (0..6).map(|i| mixed_radix(i, &[2, 3])).collect();
        assert_eq!(
            rows,
            vec![
                vec![0, 0],
                vec![0, 1],
                vec![0, 2],
                vec![1, 0],
                vec![1, 1],
                vec![1, 2]
            ]
        );
    }
}
