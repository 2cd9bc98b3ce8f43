//! Stochastic search over variables and signature functions.
//!
//! The engine is a Metropolis-Hastings sampler written once against the
//! [`MhState`] contract. A state owns its move policy (how a neighbour is
//! proposed) and its fitness; the sampler only decides acceptance:
//!
//! ```text
//! next ≥ cur          → accept
//! u < next / cur      → accept        (u uniform in [0, 1))
//! otherwise           → reset_move()
//! ```
//!
//! The ratio form is only meaningful because every fitness in this crate is
//! bounded in `[0, 1]`, and a chain must never start from a zero-valued state.
//!
//! States shipped here:
//! - [`ComposeState`]: one evolving [`Variable`](crate::Variable), composition moves
//! - [`SigFuncState`]: one fixed-width tuple, slot-replacement moves
//! - [`MultiSigState`]: `m` tuples, one slot-replacement per step

mod basis;
mod compose;
mod generators;
mod tuple;

pub use basis::{primary_variables, BasisGen, BasisMethod};
pub use compose::ComposeState;
pub use generators::{random_hash_func, random_sig_funcs, SigFuncGen};
pub use tuple::{MultiSigState, SigFuncState};

use rand::Rng;
use std::fmt;

/// Errors raised by the search layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    /// The chain would start from a state of value 0.
    DegenerateState,
    /// No candidate variable separates any two vectors.
    NoCandidates,
    /// A tuple of `needed` distinct variables cannot be drawn from `available`.
    TooFewCandidates { needed: usize, available: usize },
}

impl fmt::Display for SearchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchError::DegenerateState => {
                write!(f, "search state has zero fitness; acceptance ratio undefined")
            }
            SearchError::NoCandidates => write!(f, "no candidate variable discriminates the vectors"),
            SearchError::TooFewCandidates { needed, available } => write!(
                f,
                "need {} distinct candidate variables, only {} available",
                needed, available
            ),
        }
    }
}

impl std::error::Error for SearchError {}

/// A point in a search space that can propose and undo moves.
pub trait MhState {
    /// Pick a random starting state and compute its value.
    fn init<R: Rng + ?Sized>(&mut self, rng: &mut R);

    /// Move to a random neighbour, remembering how to undo it.
    fn random_move<R: Rng + ?Sized>(&mut self, rng: &mut R);

    /// Undo the last `random_move`.
    fn reset_move(&mut self);

    /// Fitness of the current state.
    fn value(&self) -> f64;

    /// Hand the current state to the result collector.
    fn record(&mut self);
}

/// Acceptance statistics of one `sampling` run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SamplingStats {
    pub accepted: usize,
    pub rejected: usize,
    pub recorded: usize,
}

/// Metropolis-Hastings driver.
#[derive(Debug, Default)]
pub struct MhSampler {
    cur_val: f64,
    stats: SamplingStats,
}

impl MhSampler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run one chain.
    ///
    /// 1. `state.init()`
    /// 2. `warmup` transitions, nothing recorded
    /// 3. `sample_count` times: record, then `1 + interval` transitions
    ///
    /// Fails with [`SearchError::DegenerateState`] if the initial state has
    /// value 0.
    pub fn sampling<S, R>(
        &mut self,
        state: &mut S,
        warmup: usize,
        interval: usize,
        sample_count: usize,
        rng: &mut R,
    ) -> Result<SamplingStats, SearchError>
    where
        S: MhState,
        R: Rng + ?Sized,
    {
        self.stats = SamplingStats::default();
        state.init(rng);
        self.cur_val = state.value();
        if !(self.cur_val > 0.0) {
            return Err(SearchError::DegenerateState);
        }

        for _ in 0..warmup {
            self.one_step(state, rng);
        }

        for _ in 0..sample_count {
            state.record();
            self.stats.recorded += 1;
            self.one_step(state, rng);
            for _ in 0..interval {
                self.one_step(state, rng);
            }
        }

        tracing::debug!(
            accepted = self.stats.accepted,
            rejected = self.stats.rejected,
            recorded = self.stats.recorded,
            final_value = self.cur_val,
            "mh sampling finished"
        );
        Ok(self.stats)
    }

    /// Value of the chain's current state.
    pub fn current_value(&self) -> f64 {
        self.cur_val
    }

    fn one_step<S, R>(&mut self, state: &mut S, rng: &mut R)
    where
        S: MhState,
        R: Rng + ?Sized,
    {
        state.random_move(rng);
        let next_val = state.value();
        if next_val < self.cur_val {
            let ratio = next_val / self.cur_val;
            let r: f64 = rng.gen();
            if r >= ratio {
                state.reset_move();
                self.stats.rejected += 1;
                return;
            }
        }
        self.cur_val = next_val;
        self.stats.accepted += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// Walks an integer line; value is a fixed table lookup.
    struct LineState {
        pos: i64,
        prev: i64,
        value_of: fn(i64) -> f64,
        moves: usize,
        resets: usize,
        records: Vec<i64>,
    }

    impl LineState {
        fn new(value_of: fn(i64) -> f64) -> Self {
            Self {
                pos: 0,
                prev: 0,
                value_of,
                moves: 0,
                resets: 0,
                records: Vec::new(),
            }
        }
    }

    impl MhState for LineState {
        fn init<R: Rng + ?Sized>(&mut self, _rng: &mut R) {
            self.pos = 0;
            self.prev = 0;
        }

        fn random_move<R: Rng + ?Sized>(&mut self, rng: &mut R) {
            self.prev = self.pos;
            self.pos += if rng.gen::<bool>() { 1 } else { -1 };
            self.moves += 1;
        }

        fn reset_move(&mut self) {
            self.pos = self.prev;
            self.resets += 1;
        }

        fn value(&self) -> f64 {
            (self.value_of)(self.pos)
        }

        fn record(&mut self) {
            self.records.push(self.pos);
        }
    }

    #[test]
    fn test_constant_value_accepts_everything() {
        let mut state = LineState::new(|_| 0.5);
        let mut rng = StdRng::seed_from_u64(3);
        let stats = MhSampler::new()
            .sampling(&mut state, 0, 0, 200, &mut rng)
            .unwrap();
        assert_eq!(stats.accepted, 200);
        assert_eq!(stats.rejected, 0);
        assert_eq!(state.resets, 0);
        assert_eq!(state.records.len(), 200);
    }

    #[test]
    fn test_step_counts() {
        let mut state = LineState::new(|_| 1.0);
        let mut rng = StdRng::seed_from_u64(5);
        let stats = MhSampler::new()
            .sampling(&mut state, 7, 3, 10, &mut rng)
            .unwrap();
        assert_eq!(state.moves, 7 + 10 * 4);
        assert_eq!(stats.recorded, 10);
    }

    #[test]
    fn test_zero_valued_neighbours_always_rejected() {
        let mut state = LineState::new(|p| if p == 0 { 1.0 } else { 0.0 });
        let mut rng = StdRng::seed_from_u64(11);
        let stats = MhSampler::new()
            .sampling(&mut state, 10, 0, 50, &mut rng)
            .unwrap();
        assert_eq!(stats.accepted, 0);
        assert!(state.records.iter().all(|&p| p == 0));
    }

    #[test]
    fn test_degenerate_start_is_an_error() {
        let mut state = LineState::new(|_| 0.0);
        let mut rng = StdRng::seed_from_u64(0);
        let err = MhSampler::new()
            .sampling(&mut state, 0, 0, 10, &mut rng)
            .unwrap_err();
        assert_eq!(err, SearchError::DegenerateState);
        assert!(state.records.is_empty());
    }
}
