//! Selection of a threshold-sized subset of key shares.
//!
//! The full space of C(n, m) index subsets is enumerated in lexicographic
//! order (`[0, 1, 2]`, `[0, 1, 3]`, ... for n = 5, m = 3). A random rank in
//! that space is drawn from an [`IndexSource`] and unranked into the subset,
//! so every subset is equally likely and no fixed group of shareholders is
//! favoured across repeated unseals.

use crate::error::{CryptoError, CryptoResult};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Indices into the configured share list, ascending.
pub type Combination = Vec<usize>;

/// How the subset of shares presented to the vault is chosen.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionStrategy {
    /// Uniformly random subset, drawn fresh on every attempt.
    #[default]
    Random,
    /// Always the first `threshold` shares.
    FirstThreshold,
}

/// Source of random ranks for combination selection.
pub trait IndexSource {
    /// Returns a value in `0..upper`. Callers never pass zero.
    fn pick(&mut self, upper: u64) -> u64;
}

/// [`IndexSource`] backed by any `rand` RNG.
pub struct RngSource<R>(R);

impl RngSource<StdRng> {
    /// OS-seeded source for production use.
    pub fn from_entropy() -> Self {
        Self(StdRng::from_entropy())
    }

    /// Reproducible source.
    pub fn seeded(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> RngSource<R> {
    pub fn new(rng: R) -> Self {
        Self(rng)
    }
}

impl<R: Rng> IndexSource for RngSource<R> {
    fn pick(&mut self, upper: u64) -> u64 {
        self.0.gen_range(0..upper)
    }
}

/// [`IndexSource`] that replays a fixed list of ranks, cycling when exhausted.
#[derive(Clone, Debug, Default)]
pub struct FixedIndices {
    picks: Vec<u64>,
    next: usize,
}

impl FixedIndices {
    pub fn new(picks: impl Into<Vec<u64>>) -> Self {
        Self {
            picks: picks.into(),
            next: 0,
        }
    }
}

impl IndexSource for FixedIndices {
    fn pick(&mut self, upper: u64) -> u64 {
        if self.picks.is_empty() {
            return 0;
        }
        let value = self.picks[self.next % self.picks.len()];
        self.next += 1;
        value % upper
    }
}

/// Returns C(n, m), or `None` if it does not fit in a `u64`.
pub fn combination_count(n: usize, m: usize) -> Option<u64> {
    if m > n {
        return Some(0);
    }
    let k = m.min(n - m) as u128;
    let n = n as u128;
    let mut count: u128 = 1;
    for i in 0..k {
        // Exact at every step: count is C(n, i) here.
        count = count * (n - i) / (i + 1);
        if count > u64::MAX as u128 {
            return None;
        }
    }
    Some(count as u64)
}

/// Lexicographic enumeration of all m-element subsets of `0..n`.
#[derive(Clone, Debug)]
pub struct Combinations {
    n: usize,
    current: Option<Vec<usize>>,
}

impl Combinations {
    pub fn new(n: usize, m: usize) -> Self {
        let current = (m <= n).then(|| (0..m).collect());
        Self { n, current }
    }
}

impl Iterator for Combinations {
    type Item = Combination;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.current.take()?;
        let m = current.len();

        let mut advanced = current.clone();
        if let Some(pivot) = (0..m).rev().find(|&i| advanced[i] < self.n - m + i) {
            advanced[pivot] += 1;
            for j in pivot + 1..m {
                advanced[j] = advanced[j - 1] + 1;
            }
            self.current = Some(advanced);
        }

        Some(current)
    }
}

/// Maps a rank in `0..C(n, m)` to the subset at that lexicographic position.
fn unrank(n: usize, m: usize, mut rank: u64) -> Combination {
    let mut out = Vec::with_capacity(m);
    let mut candidate = 0;
    for slot in 0..m {
        loop {
            let starting_here =
                combination_count(n - candidate - 1, m - slot - 1).unwrap_or(u64::MAX);
            if rank < starting_here {
                break;
            }
            rank -= starting_here;
            candidate += 1;
        }
        out.push(candidate);
        candidate += 1;
    }
    out
}

/// Picks which `threshold` of `shares` key shares to present to the vault.
///
/// Fails before any I/O if `threshold` is zero or exceeds `shares`.
pub fn select_combination(
    shares: usize,
    threshold: usize,
    strategy: SelectionStrategy,
    source: &mut dyn IndexSource,
) -> CryptoResult<Combination> {
    if threshold == 0 || threshold > shares {
        return Err(CryptoError::InvalidThreshold { shares, threshold });
    }

    let combination = match strategy {
        SelectionStrategy::FirstThreshold => (0..threshold).collect(),
        SelectionStrategy::Random => {
            let space = combination_count(shares, threshold)
                .ok_or(CryptoError::CombinationOverflow { shares, threshold })?;
            let rank = source.pick(space);
            unrank(shares, threshold, rank)
        }
    };

    debug!(
        shares,
        threshold,
        ?strategy,
        ?combination,
        "selected share combination"
    );
    Ok(combination)
}
