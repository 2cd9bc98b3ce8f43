//! Fitness functions used to score variables and signature tuples.
//!
//! Every score lies in `[0, 1]`; 0 marks a degenerate candidate that never
//! separates two vectors and must not enter a Metropolis chain.

use crate::regvect::RegVect;
use crate::variable::Variable;
use serde::{Deserialize, Serialize};

/// Split fitness of a single variable, computed from the class sizes
/// `n0` (evaluates to 0) and `n1` (evaluates to 1).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Fitness {
    /// `n0 · n1 / (k² / 4)`: separated pairs over the balanced maximum.
    #[default]
    Product,
    /// `min(n0, n1) / max(n0, n1)`.
    Ratio,
    /// `1 - |n0 - n1| / k`.
    Imbalance,
}

impl Fitness {
    /// Score for the class sizes `(n0, n1)`.
    ///
    /// # Examples
    ///
    /// ```
    /// use xorphf::Fitness;
    ///
    /// assert_eq!(Fitness::Product.score(1, 3), 0.75);
    /// assert_eq!(Fitness::Product.score(2, 2), 1.0);
    /// assert_eq!(Fitness::Ratio.score(1, 3), 1.0 / 3.0);
    /// assert_eq!(Fitness::Imbalance.score(1, 3), 0.5);
    /// ```
    pub fn score(self, n0: u64, n1: u64) -> f64 {
        let nv = n0 + n1;
        match self {
            Fitness::Product => {
                let ideal = (nv * nv) / 4;
                if ideal == 0 {
                    return 0.0;
                }
                (n0 * n1) as f64 / ideal as f64
            }
            Fitness::Ratio => {
                let (lo, hi) = if n0 > n1 { (n1, n0) } else { (n0, n1) };
                if hi == 0 {
                    return 0.0;
                }
                lo as f64 / hi as f64
            }
            Fitness::Imbalance => {
                if nv < 2 {
                    return 0.0;
                }
                1.0 - n0.abs_diff(n1) as f64 / nv as f64
            }
        }
    }

    /// Score `var` over `vectors`.
    pub fn evaluate(self, var: &Variable, vectors: &[RegVect]) -> f64 {
        let (n0, n1) = split_counts(var, vectors);
        self.score(n0, n1)
    }
}

/// Class sizes `(n0, n1)` of `vectors` under `var`.
pub fn split_counts(var: &Variable, vectors: &[RegVect]) -> (u64, u64) {
    let n1 = vectors.iter().filter(|rv| rv.classify(var) == 1).count() as u64;
    (vectors.len() as u64 - n1, n1)
}

/// Joint discrimination of two variables: pairs of vectors falling in different
/// `(b0, b1)` classes, over the four-way balanced maximum `k² · 6 / 16`.
pub fn pair_value(var1: &Variable, var2: &Variable, vectors: &[RegVect]) -> f64 {
    let mut counts = [0u64; 4];
    for rv in vectors {
        let code = rv.classify(var1) | (rv.classify(var2) << 1);
        counts[code as usize] += 1;
    }
    let nv = vectors.len() as u64;
    let ideal = (nv * nv * 6) / 16;
    if ideal == 0 {
        return 0.0;
    }
    let [n00, n10, n01, n11] = counts;
    let separated = n00 * (n01 + n10 + n11) + n01 * (n10 + n11) + n10 * n11;
    separated as f64 / ideal as f64
}

/// Balance of the `2^w` signature codes produced by a tuple of `w` variables.
///
/// With average bucket load `a = k / 2^w`, the score is
/// `exp(-Σ_{c > a} (c - a) / k)`: 1.0 when no code is over-full.
pub fn balance_value(vars: &[Variable], vectors: &[RegVect]) -> f64 {
    let nv = vectors.len();
    if nv == 0 {
        return 0.0;
    }
    assert!(vars.len() < 32, "signature too wide");
    let mut counts = vec![0usize; 1 << vars.len()];
    for rv in vectors {
        let mut code = 0usize;
        for (bit, var) in vars.iter().enumerate() {
            code |= (rv.classify(var) as usize) << bit;
        }
        counts[code] += 1;
    }
    let ave = nv as f64 / counts.len() as f64;
    let excess: f64 = counts
        .iter()
        .map(|&c| c as f64)
        .filter(|&c| c > ave)
        .map(|c| c - ave)
        .sum();
    (-excess / nv as f64).exp()
}

// ============================================================================
// TESTS
// ============================================================================
