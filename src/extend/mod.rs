//! Design construction by incremental column extension.
//!
//! Designs are grown one factor at a time:
//!
//! 1. [`create_root`] builds a design over the first `strength` factors:
//!    their full factorial, padded to the run size with level-balancing rows.
//! 2. Every candidate in the beam is extended by each admissible column for
//!    the next factor (see [`column`]).
//! 3. Extensions are scored by D-efficiency; the best `nkeep` form the next
//!    beam and up to [`ExtendConfig::reserve`] more are held back in a
//!    [`CandidatePool`].
//! 4. After the last factor the best surviving design is returned.
//!
//! If a step produces no extension, the previous step's window moves on to
//! its reserved candidates, backing up further when a reserve is spent, for
//! at most [`ExtendConfig::max_retries`] moves. A search restricted to
//! [`Balance::Proportional`] columns that still fails is rerun with
//! [`Balance::Covering`] columns as a per-parent fallback.
//!
//! The search is deterministic but does not guarantee a globally optimal
//! design.
//!
//! ## Tie-breaking
//!
//! Equal scores keep their order of first occurrence: parents in pool order,
//! then columns in enumeration order.

pub mod column;
mod pool;

pub use column::{admissible_columns, Balance, ColumnSet};
pub use pool::{Candidate, CandidatePool};

use ndarray::Array2;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::design::{Design, DesignParams};
use crate::error::{Error, Result};
use crate::utils::{mixed_radix, product};

/// Columns kept per parent when [`Strategy::Auto`] bounds the search.
pub const DEFAULT_EXTENSION_LIMIT: usize = 256;

/// Search nodes visited per parent before enumeration stops.
pub const DEFAULT_NODE_BUDGET: usize = 200_000;

/// Extensions held back per step beyond the `nkeep` extended.
pub const DEFAULT_RESERVE: usize = 256;

/// Window moves allowed before a search gives up.
pub const DEFAULT_MAX_RETRIES: usize = 64;

/// Raw column spaces up to `2^EXHAUSTIVE_BITS` are enumerated exhaustively
/// under [`Strategy::Auto`].
pub const EXHAUSTIVE_BITS: f64 = 16.0;

/// How many admissible columns to generate per parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Strategy {
    /// Exhaustive for small column spaces, bounded otherwise.
    #[default]
    Auto,
    /// Every admissible column, subject only to the node budget.
    Exhaustive,
    /// At most this many columns per parent.
    Bounded(usize),
}

/// Configuration of the extension search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ExtendConfig {
    /// Column generation strategy.
    pub strategy: Strategy,
    /// Search nodes visited per parent and column balance rule.
    pub node_budget: usize,
    /// Extensions retained per step beyond `nkeep`, for backtracking.
    pub reserve: usize,
    /// Window moves allowed over the whole search.
    pub max_retries: usize,
}

impl Default for ExtendConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::Auto,
            node_budget: DEFAULT_NODE_BUDGET,
            reserve: DEFAULT_RESERVE,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

impl ExtendConfig {
    /// Maximum number of columns to generate for a factor with `levels`
    /// levels in a design of `runs` runs.
    #[must_use]
    pub fn extension_limit(&self, runs: usize, levels: u32) -> usize {
        match self.strategy {
            Strategy::Exhaustive => usize::MAX,
            Strategy::Bounded(limit) => limit,
            Strategy::Auto => {
                let bits = runs as f64 * f64::from(levels.max(1)).log2();
                if bits <= EXHAUSTIVE_BITS {
                    usize::MAX
                } else {
                    DEFAULT_EXTENSION_LIMIT
                }
            }
        }
    }
}

/// Build the root design over the first `strength` factors of `params`.
///
/// Rows are the full factorial of those factors followed by padding rows.
/// Each padding row is the full-factorial tuple used least often so far,
/// preferring the tuple whose levels have the smallest summed column counts
/// and then the first tuple. Rows are then sorted.
///
/// # Errors
///
/// Returns [`Error::InsufficientRuns`] if the full factorial does not fit in
/// the run size.
///
/// # Example
///
/// ```
/// use doe_sampler::design::DesignParams;
/// use doe_sampler::extend::create_root;
///
/// let params = DesignParams::new(6, vec![2, 2, 3], 2).unwrap();
/// let root = create_root(&params).unwrap();
/// assert_eq!(root.factors(), 2);
/// assert_eq!(root.runs(), 6);
/// ```
pub fn create_root(params: &DesignParams) -> Result<Design> {
    let t = params.strength as usize;
    let levels = &params.levels[..t];
    let runs = params.runs;

    let full = product(levels).unwrap_or(usize::MAX);
    if full > runs {
        return Err(Error::InsufficientRuns {
            runs,
            required: full,
            reason: "the root must hold the full factorial of the first strength factors",
        });
    }

    let factorial: Vec<Vec<u32>> = (0..full).map(|index| mixed_radix(index, levels)).collect();
    let mut uses = vec![1usize; full];
    let mut counts: Vec<Vec<usize>> = levels
        .iter()
        .map(|&s| vec![full / s as usize; s as usize])
        .collect();
    let mut rows = factorial.clone();

    // Least-used tuple first, then the one whose levels are rarest.
    for _ in full..runs {
        let best = (0..full)
            .min_by_key(|&index| {
                let marginal: usize = factorial[index]
                    .iter()
                    .enumerate()
                    .map(|(c, &v)| counts[c][v as usize])
                    .sum();
                (uses[index], marginal)
            })
            .unwrap_or(0);

        uses[best] += 1;
        for (c, &v) in factorial[best].iter().enumerate() {
            counts[c][v as usize] += 1;
        }
        rows.push(factorial[best].clone());
    }

    rows.sort();
    let flat: Vec<u32> = rows.into_iter().flatten().collect();
    let data = Array2::from_shape_vec((runs, t), flat).map_err(|e| Error::DimensionMismatch {
        expected: format!("{} x {} root", runs, t),
        actual: e.to_string(),
    })?;

    let root_params = DesignParams::new(runs, levels.to_vec(), params.strength)?;
    Design::try_new(data, root_params)
}

/// Every admissible single-column extension of `design` under `balance`,
/// rows re-sorted.
#[must_use]
pub fn extend_design(
    design: &Design,
    levels: u32,
    balance: Balance,
    config: &ExtendConfig,
) -> Vec<Design> {
    let limit = config.extension_limit(design.runs(), levels);
    let set = admissible_columns(design, levels, balance, limit, config.node_budget);

    log::debug!(
        "{} {:?} columns from {} nodes{}",
        set.columns.len(),
        balance,
        set.nodes,
        if set.budget_exhausted {
            " (budget exhausted)"
        } else {
            ""
        }
    );

    set.columns
        .iter()
        .map(|column| {
            let mut extended = design.with_column(column, levels);
            extended.sort_rows();
            extended
        })
        .collect()
}

/// Extensions of one parent that can estimate the main-effects model.
///
/// Proportional columns are tried first. With `covering` set, a parent that
/// has no estimable proportional extension falls back to covering columns.
fn scored_extensions(
    design: &Design,
    levels: u32,
    config: &ExtendConfig,
    covering: bool,
) -> Vec<(Design, f64)> {
    let tiers: &[Balance] = if covering {
        &[Balance::Proportional, Balance::Covering]
    } else {
        &[Balance::Proportional]
    };

    for &balance in tiers {
        let scored: Vec<(Design, f64)> = extend_design(design, levels, balance, config)
            .into_iter()
            .filter_map(|d| {
                let score = d.d_efficiency();
                (score > 0.0).then_some((d, score))
            })
            .collect();
        if !scored.is_empty() {
            return scored;
        }
    }
    Vec::new()
}

/// Offers the extensions of every parent to a pool.
type Extender = fn(&[Candidate], u32, &ExtendConfig, bool, &mut CandidatePool);

#[cfg_attr(all(feature = "parallel", not(test)), allow(dead_code))]
fn extend_sequential(
    parents: &[Candidate],
    levels: u32,
    config: &ExtendConfig,
    covering: bool,
    pool: &mut CandidatePool,
) {
    for parent in parents {
        for (design, score) in scored_extensions(&parent.design, levels, config, covering) {
            pool.offer(design, score);
        }
    }
}

#[cfg(feature = "parallel")]
fn extend_parallel(
    parents: &[Candidate],
    levels: u32,
    config: &ExtendConfig,
    covering: bool,
    pool: &mut CandidatePool,
) {
    let batches: Vec<Vec<(Design, f64)>> = parents
        .par_iter()
        .map(|parent| scored_extensions(&parent.design, levels, config, covering))
        .collect();

    // Offer in parent order so ties resolve as in the sequential path.
    for (design, score) in batches.into_iter().flatten() {
        pool.offer(design, score);
    }
}

#[cfg(not(feature = "parallel"))]
const EXTEND: Extender = extend_sequential;

#[cfg(feature = "parallel")]
const EXTEND: Extender = extend_parallel;

/// Candidates of one completed step and the window of them being extended.
struct Layer {
    candidates: Vec<Candidate>,
    offset: usize,
}

impl Layer {
    fn window(&self, nkeep: usize) -> &[Candidate] {
        let start = self.offset.min(self.candidates.len());
        let end = self.offset.saturating_add(nkeep).min(self.candidates.len());
        &self.candidates[start..end]
    }
}

/// Beam search with backtracking over the reserve of each step.
///
/// Each step keeps `nkeep + reserve` extensions ranked best first and
/// extends the best `nkeep`. When a step yields nothing, the window of the
/// previous step slides to its next `nkeep` reserved candidates; once a
/// step's reserve is used up the search backs up one more step.
fn beam(
    params: &DesignParams,
    root: Candidate,
    nkeep: usize,
    config: &ExtendConfig,
    covering: bool,
    extend: Extender,
) -> Result<Vec<Candidate>> {
    let t = params.strength as usize;
    let steps = params.factors() - t + 1;
    let infeasible = |factor| Error::no_feasible_design(factor, params.runs, params.strength);

    let mut layers = vec![Layer {
        candidates: vec![root],
        offset: 0,
    }];
    let mut retries = 0;
    let mut deepest = t;

    while layers.len() < steps {
        let factor = t + layers.len() - 1;
        let levels = params.levels[factor];
        let parents = layers.last().map_or(&[][..], |layer| layer.window(nkeep));

        log::info!(
            "extend {} designs with {} columns by a single column",
            parents.len(),
            factor
        );

        let mut pool = CandidatePool::new(nkeep.saturating_add(config.reserve));
        extend(parents, levels, config, covering, &mut pool);

        if !pool.is_empty() {
            let generated = pool.offered();
            let candidates = pool.into_sorted();

            let selected = candidates.len().min(nkeep);
            let best = candidates.first().map_or(0.0, |c| c.score);
            let worst = candidates[..selected].last().map_or(0.0, |c| c.score);
            log::info!(
                "  generated {} designs, selected {} designs with D-efficiency {:.4} to {:.4}",
                generated,
                selected,
                worst,
                best
            );

            layers.push(Layer {
                candidates,
                offset: 0,
            });
            continue;
        }

        deepest = deepest.max(factor);
        loop {
            if retries >= config.max_retries {
                return Err(infeasible(deepest));
            }
            let Some(layer) = layers.last_mut() else {
                return Err(infeasible(deepest));
            };
            layer.offset = layer.offset.saturating_add(nkeep);
            if layer.offset < layer.candidates.len() {
                retries += 1;
                log::debug!(
                    "no extension by column {}, retrying from reserved candidate {}",
                    factor,
                    layer.offset
                );
                break;
            }
            if layers.len() == 1 {
                return Err(infeasible(deepest));
            }
            layers.pop();
        }
    }

    let mut best = layers.pop().map(|layer| layer.candidates).unwrap_or_default();
    best.truncate(nkeep);
    Ok(best)
}

/// Run the full beam search and return the best surviving candidates.
///
/// Candidates are returned best first; at most `nkeep` are kept. The search
/// first admits only proportional columns; if that dead-ends it is repeated
/// with covering columns allowed for parents without a proportional
/// extension.
///
/// # Errors
///
/// Returns an error if the parameters fail [`DesignParams::check_feasible`],
/// `nkeep` is 0, or some factor has no admissible, estimable extension even
/// after backtracking.
pub fn search(params: &DesignParams, nkeep: usize, config: &ExtendConfig) -> Result<Vec<Candidate>> {
    search_with(params, nkeep, config, EXTEND)
}

fn search_with(
    params: &DesignParams,
    nkeep: usize,
    config: &ExtendConfig,
    extend: Extender,
) -> Result<Vec<Candidate>> {
    if nkeep == 0 {
        return Err(Error::invalid_params("nkeep must be at least 1"));
    }
    params.check_feasible()?;

    let t = params.strength as usize;
    let root = create_root(params)?;
    let root_score = root.d_efficiency();
    if root_score <= 0.0 {
        return Err(Error::no_feasible_design(t - 1, params.runs, params.strength));
    }

    let mut pool = CandidatePool::new(1);
    pool.offer(root, root_score);
    let Some(root) = pool.into_sorted().pop() else {
        return Err(Error::no_feasible_design(t - 1, params.runs, params.strength));
    };

    match beam(params, root.clone(), nkeep, config, false, extend) {
        Err(Error::NoFeasibleDesign { factor, .. }) => {
            log::info!(
                "no proportional extension by column {}, admitting covering columns",
                factor
            );
            beam(params, root, nkeep, config, true, extend)
        }
        result => result,
    }
}
