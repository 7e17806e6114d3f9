//! Enumeration of admissible extension columns.
//!
//! A column for a new factor with `s` levels is admissible for a design of
//! strength `t` when, for every `(t-1)`-subset of existing columns, each
//! group of runs sharing a level tuple on that subset satisfies the
//! [`Balance`] rule, and each level occurs `floor(N/s)` or `ceil(N/s)` times
//! overall.
//!
//! - [`Balance::Proportional`]: every level occurs `floor(g/s)` or
//!   `ceil(g/s)` times in a group of `g` runs, and at least once. When every
//!   group size is divisible by `s` this is the orthogonal array extension
//!   rule, and a design built only from such columns has D-efficiency 1.
//! - [`Balance::Covering`]: every level occurs at least once per group.
//!
//! Two symmetries are factored out without losing any design: levels are
//! only introduced in increasing order (relabelling levels changes neither
//! coverage nor efficiency), and within a block of identical parent rows the
//! new values are non-decreasing (permuting identical rows changes nothing).
//!
//! The search is a depth-first walk over rows. An unbounded search tries
//! values in ascending order. A bounded search splits its limit and node
//! budget over [`SAMPLE_WALKS`] walks; walk 0 is ascending and the others
//! start each row at a rotation derived from the walk number, so the sample
//! spreads over the whole tree instead of one lexicographic corner. Results
//! come out in a fixed order either way.

use std::collections::{HashMap, HashSet};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::design::Design;
use crate::utils::{binomial, combinations};

/// Number of walks a bounded search is split into.
pub const SAMPLE_WALKS: usize = 8;

/// Per-group level count rule of a column search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Balance {
    /// Levels spread as evenly as possible inside every group.
    Proportional,
    /// Every level present in every group.
    Covering,
}

/// Outcome of one column enumeration.
#[derive(Debug, Clone, Default)]
pub struct ColumnSet {
    /// Admissible columns in enumeration order.
    pub columns: Vec<Vec<u32>>,
    /// Search nodes visited.
    pub nodes: usize,
    /// Whether the node budget cut the enumeration short.
    pub budget_exhausted: bool,
}

/// Enumerate up to `limit` distinct admissible columns with `levels` levels.
///
/// At most `node_budget` partial assignments are visited. A `limit` of
/// `usize::MAX` walks the tree once in ascending order.
///
/// # Example
///
/// ```
/// use doe_sampler::design::DesignParams;
/// use doe_sampler::extend::{admissible_columns, create_root, Balance};
///
/// let params = DesignParams::new(4, vec![2, 2, 2], 2).unwrap();
/// let root = create_root(&params).unwrap();
///
/// let set = admissible_columns(&root, 2, Balance::Proportional, usize::MAX, 1_000);
/// assert_eq!(set.columns, vec![vec![0, 1, 1, 0]]);
/// ```
#[must_use]
pub fn admissible_columns(
    design: &Design,
    levels: u32,
    balance: Balance,
    limit: usize,
    node_budget: usize,
) -> ColumnSet {
    let mut search = ColumnSearch::new(design, levels, balance, limit);

    if search.initially_feasible() {
        if limit == usize::MAX {
            search.walk(0, usize::MAX, node_budget);
        } else {
            let walks = limit.min(SAMPLE_WALKS);
            let quota = limit.div_ceil(walks);
            let share = (node_budget / walks).max(1);
            for walk_id in 0..walks {
                if search.found.len() >= limit {
                    break;
                }
                search.walk(walk_id as u64, quota, share);
            }
        }
    }

    ColumnSet {
        columns: search.found,
        nodes: search.total_nodes,
        budget_exhausted: search.budget_exhausted,
    }
}

/// SplitMix64 finaliser.
fn mix(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    x = (x ^ (x >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    x ^ (x >> 31)
}

struct ColumnSearch {
    runs: usize,
    levels: usize,
    min_count: usize,
    max_count: usize,
    /// Global group ids each row belongs to, one per `(t-1)`-subset.
    row_groups: Vec<Vec<usize>>,
    /// Whether row r equals row r-1 in the parent.
    same_as_prev: Vec<bool>,
    group_min: Vec<usize>,
    group_max: Vec<usize>,
    /// Unassigned rows per group.
    remaining: Vec<usize>,
    /// Level occurrences still needed to reach `group_min`, per group.
    deficit: Vec<usize>,
    /// Level occurrence counts per group, flattened `group * levels + level`.
    group_counts: Vec<usize>,
    counts: Vec<usize>,
    column: Vec<u32>,
    used_levels: usize,
    limit: usize,
    seen: HashSet<Vec<u32>>,
    found: Vec<Vec<u32>>,
    total_nodes: usize,
    budget_exhausted: bool,

    // State of the current walk.
    walk_id: u64,
    quota: usize,
    walk_found: usize,
    node_budget: usize,
    nodes: usize,
    walk_exhausted: bool,
}

impl ColumnSearch {
    fn new(design: &Design, levels: u32, balance: Balance, limit: usize) -> Self {
        let runs = design.runs();
        let s = levels as usize;
        let k = design.factors();
        let subset_size = (design.strength() as usize).saturating_sub(1);

        let subsets = binomial(k as u64, subset_size as u64)
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(0);
        let mut row_groups: Vec<Vec<usize>> =
            (0..runs).map(|_| Vec::with_capacity(subsets)).collect();
        let mut group_sizes = Vec::new();

        for subset in combinations(k, subset_size) {
            let mut ids: HashMap<Vec<u32>, usize> = HashMap::new();
            for (r, row) in design.rows().enumerate() {
                let key: Vec<u32> = subset.iter().map(|&c| row[c]).collect();
                let next = group_sizes.len();
                let id = *ids.entry(key).or_insert(next);
                if id == next {
                    group_sizes.push(0);
                }
                group_sizes[id] += 1;
                row_groups[r].push(id);
            }
        }

        let (group_min, group_max): (Vec<usize>, Vec<usize>) = group_sizes
            .iter()
            .map(|&size| match balance {
                Balance::Proportional => {
                    let min = (size / s.max(1)).max(1);
                    (min, size.div_ceil(s.max(1)).max(min))
                }
                Balance::Covering => (1, size),
            })
            .unzip();
        let deficit = group_min.iter().map(|&min| min * s).collect();

        let same_as_prev = (0..runs)
            .map(|r| r > 0 && design.row(r) == design.row(r - 1))
            .collect();

        let groups = group_sizes.len();
        Self {
            runs,
            levels: s,
            min_count: runs / s.max(1),
            max_count: runs.div_ceil(s.max(1)),
            row_groups,
            same_as_prev,
            group_min,
            group_max,
            remaining: group_sizes,
            deficit,
            group_counts: vec![0; groups * s],
            counts: vec![0; s],
            column: vec![0; runs],
            used_levels: 0,
            limit,
            seen: HashSet::new(),
            found: Vec::new(),
            total_nodes: 0,
            budget_exhausted: false,
            walk_id: 0,
            quota: 0,
            walk_found: 0,
            node_budget: 0,
            nodes: 0,
            walk_exhausted: false,
        }
    }

    /// Every group must be large enough to meet its minimum counts.
    fn initially_feasible(&self) -> bool {
        self.levels > 0
            && self.limit > 0
            && self
                .deficit
                .iter()
                .zip(&self.remaining)
                .all(|(&d, &r)| d <= r)
    }

    fn walk(&mut self, walk_id: u64, quota: usize, node_budget: usize) {
        self.walk_id = walk_id;
        self.quota = quota;
        self.walk_found = 0;
        self.node_budget = node_budget;
        self.nodes = 0;
        self.walk_exhausted = false;
        self.used_levels = 0;

        self.descend(0);

        self.total_nodes += self.nodes;
        self.budget_exhausted |= self.walk_exhausted;
    }

    fn done(&self) -> bool {
        self.found.len() >= self.limit || self.walk_found >= self.quota || self.walk_exhausted
    }

    /// Offset of the first value tried at `row`.
    fn rotation(&self, row: usize, width: usize) -> usize {
        if self.walk_id == 0 {
            return 0;
        }
        let key =
            self.walk_id.wrapping_mul(0x1_0000_0001) ^ ((row as u64) << 32) ^ self.nodes as u64;
        (mix(key) % width as u64) as usize
    }

    fn descend(&mut self, row: usize) {
        if row == self.runs {
            if self.seen.insert(self.column.clone()) {
                self.found.push(self.column.clone());
                self.walk_found += 1;
            }
            return;
        }

        let lowest = if self.same_as_prev[row] {
            self.column[row - 1] as usize
        } else {
            0
        };
        let highest = (self.used_levels + 1).min(self.levels);
        if highest <= lowest {
            return;
        }
        let width = highest - lowest;
        let rotation = self.rotation(row, width);

        for i in 0..width {
            let v = lowest + (i + rotation) % width;
            if self.done() {
                return;
            }
            if self.counts[v] >= self.max_count || self.group_full(row, v) {
                continue;
            }

            self.nodes += 1;
            if self.nodes > self.node_budget {
                self.walk_exhausted = true;
                log::trace!(
                    "column walk {} stopped after {} nodes",
                    self.walk_id,
                    self.node_budget
                );
                return;
            }

            let previous_used = self.used_levels;
            self.assign(row, v);
            if self.feasible_after(row) {
                self.descend(row + 1);
            }
            self.unassign(row, v);
            self.used_levels = previous_used;
        }
    }

    fn group_full(&self, row: usize, v: usize) -> bool {
        self.row_groups[row]
            .iter()
            .any(|&g| self.group_counts[g * self.levels + v] >= self.group_max[g])
    }

    fn assign(&mut self, row: usize, v: usize) {
        self.column[row] = v as u32;
        self.counts[v] += 1;
        if v == self.used_levels {
            self.used_levels += 1;
        }
        for &g in &self.row_groups[row] {
            self.remaining[g] -= 1;
            let slot = g * self.levels + v;
            if self.group_counts[slot] < self.group_min[g] {
                self.deficit[g] -= 1;
            }
            self.group_counts[slot] += 1;
        }
    }

    fn unassign(&mut self, row: usize, v: usize) {
        self.counts[v] -= 1;
        for &g in &self.row_groups[row] {
            self.remaining[g] += 1;
            let slot = g * self.levels + v;
            self.group_counts[slot] -= 1;
            if self.group_counts[slot] < self.group_min[g] {
                self.deficit[g] += 1;
            }
        }
    }

    fn feasible_after(&self, row: usize) -> bool {
        let satisfiable = self.row_groups[row]
            .iter()
            .all(|&g| self.deficit[g] <= self.remaining[g]);
        if !satisfiable {
            return false;
        }

        let rows_left = self.runs - row - 1;
        let deficit: usize = self
            .counts
            .iter()
            .map(|&c| self.min_count.saturating_sub(c))
            .sum();
        deficit <= rows_left
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::design::DesignParams;
    use ndarray::Array2;

    fn design(levels: Vec<u32>, strength: u32, rows: &[&[u32]]) -> Design {
        let k = levels.len();
        let params = DesignParams::new(rows.len(), levels, strength).unwrap();
        let flat: Vec<u32> = rows.iter().flat_map(|r| r.iter().copied()).collect();
        Design::new(Array2::from_shape_vec((rows.len(), k), flat).unwrap(), params)
    }

    fn all(d: &Design, levels: u32, balance: Balance) -> ColumnSet {
        admissible_columns(d, levels, balance, usize::MAX, usize::MAX)
    }

    #[test]
    fn test_strength_one_balanced_columns() {
        // Four distinct rows, two levels: canonical balanced columns start with 0.
        let d = design(vec![4], 1, &[&[0], &[1], &[2], &[3]]);
        let set = all(&d, 2, Balance::Proportional);

        assert_eq!(
            set.columns,
            vec![
                vec![0, 0, 1, 1],
                vec![0, 1, 0, 1],
                vec![0, 1, 1, 0]
            ]
        );
        assert!(!set.budget_exhausted);
    }

    #[test]
    fn test_identical_rows_are_not_permuted() {
        let d = design(vec![1], 1, &[&[0], &[0], &[0], &[0]]);
        let set = all(&d, 2, Balance::Covering);
        assert_eq!(set.columns, vec![vec![0, 0, 1, 1]]);
    }

    #[test]
    fn test_pairwise_coverage_constraint() {
        let d = design(
            vec![2, 2],
            2,
            &[&[0, 0], &[0, 0], &[0, 1], &[1, 0], &[1, 1], &[1, 1]],
        );

        for balance in [Balance::Proportional, Balance::Covering] {
            let set = all(&d, 3, balance);
            assert!(!set.columns.is_empty());
            for column in &set.columns {
                let extended = d.with_column(column, 3);
                assert!(crate::design::verify_coverage(&extended, 2).is_covered);
                assert_eq!(extended.balance_report().level_counts[2], vec![2, 2, 2]);
            }
        }
    }

    #[test]
    fn test_proportional_columns_are_orthogonal() {
        // Full factorial 2 x 2, doubled: every proportional binary column
        // splits each level of each factor evenly.
        let d = design(
            vec![2, 2],
            2,
            &[
                &[0, 0],
                &[0, 0],
                &[0, 1],
                &[0, 1],
                &[1, 0],
                &[1, 0],
                &[1, 1],
                &[1, 1],
            ],
        );

        let proportional = all(&d, 2, Balance::Proportional);
        let covering = all(&d, 2, Balance::Covering);
        assert!(!proportional.columns.is_empty());
        assert!(proportional.columns.len() < covering.columns.len());

        for column in &proportional.columns {
            let extended = d.with_column(column, 2);
            assert!((extended.d_efficiency() - 1.0).abs() < 1e-9);
            assert!(covering.columns.contains(column));
        }
    }

    #[test]
    fn test_too_few_rows_per_group() {
        // Each level of either factor has two rows, which cannot hold three levels.
        let d = design(vec![2, 2], 2, &[&[0, 0], &[0, 1], &[1, 0], &[1, 1]]);
        for balance in [Balance::Proportional, Balance::Covering] {
            let set = all(&d, 3, balance);
            assert!(set.columns.is_empty());
            assert_eq!(set.nodes, 0);
        }
    }

    #[test]
    fn test_limit_and_budget() {
        let d = design(vec![8], 1, &[&[0], &[1], &[2], &[3], &[4], &[5], &[6], &[7]]);

        let limited = admissible_columns(&d, 2, Balance::Proportional, 3, usize::MAX);
        assert_eq!(limited.columns.len(), 3);

        let starved = admissible_columns(&d, 2, Balance::Proportional, usize::MAX, 4);
        assert!(starved.budget_exhausted);
        assert!(starved.columns.is_empty());
    }

    #[test]
    fn test_sampled_columns_are_distinct_and_spread() {
        let rows: Vec<Vec<u32>> = (0..16).map(|r| vec![r]).collect();
        let refs: Vec<&[u32]> = rows.iter().map(Vec::as_slice).collect();
        let d = design(vec![16], 1, &refs);

        let sampled = admissible_columns(&d, 2, Balance::Proportional, 32, 1_000_000);
        assert_eq!(sampled.columns.len(), 32);

        let unique: HashSet<&Vec<u32>> = sampled.columns.iter().collect();
        assert_eq!(unique.len(), 32);

        // The ascending walk alone would fix the first half of every column.
        let prefixes: HashSet<&[u32]> = sampled.columns.iter().map(|c| &c[..8]).collect();
        assert!(prefixes.len() >= 3);
    }

    #[test]
    fn test_sampling_is_deterministic() {
        let rows: Vec<Vec<u32>> = (0..12).map(|r| vec![r % 6]).collect();
        let mut sorted = rows.clone();
        sorted.sort();
        let refs: Vec<&[u32]> = sorted.iter().map(Vec::as_slice).collect();
        let d = design(vec![6], 1, &refs);

        let first = admissible_columns(&d, 3, Balance::Proportional, 20, 50_000);
        let second = admissible_columns(&d, 3, Balance::Proportional, 20, 50_000);
        assert_eq!(first.columns, second.columns);
    }
}
