//! Variable-basis generators.
//!
//! One driver, four move policies. Every policy starts from the primary
//! variables with non-zero fitness and funnels what it finds into a
//! [`VarPool`], so the result is always the best distinct variables seen.

use super::{ComposeState, MhSampler, SearchError};
use crate::config::SearchConfig;
use crate::fitness::{pair_value, Fitness};
use crate::pool::VarPool;
use crate::regvect::{RegVect, VectorStore};
use crate::variable::Variable;
use rand::seq::{index, SliceRandom};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Below this many primaries, `Simple` enumerates the power set exactly.
const POWER_SET_LIMIT: usize = 20;

/// How candidate variables are explored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BasisMethod {
    /// Metropolis-Hastings chain with composition moves
    Mcmc,
    /// Restarted hill-climbs over random composition orders
    Greedy,
    /// Random subsets of primaries, composed together
    Simple,
    /// Deterministic climb replacing the weakest held variable by a composite
    Shift,
}

/// Single-bit variables that split `store` with non-zero fitness.
pub fn primary_variables<S: VectorStore + ?Sized>(store: &S, fitness: Fitness) -> Vec<Variable> {
    let width = store.vector_width();
    (0..width)
        .map(|vid| Variable::primary(width, vid))
        .filter(|var| fitness.evaluate(var, store.vectors()) > 0.0)
        .collect()
}

/// Generic basis search.
///
/// # Examples
///
/// ```
/// use rand::SeedableRng;
/// use xorphf::{BasisGen, BasisMethod, Fitness, RvMgr, SearchConfig};
///
/// let store = RvMgr::from_rows(4, &["1000", "0100", "0010", "0001"]).unwrap();
/// let mut rng = rand::rngs::StdRng::seed_from_u64(1);
/// let gen = BasisGen::new(BasisMethod::Greedy, Fitness::Product, SearchConfig::quick());
/// let best = gen.generate(&store, 2, &mut rng).unwrap();
/// assert_eq!(best[0].1, 1.0);
/// ```
#[derive(Clone, Debug)]
pub struct BasisGen {
    pub method: BasisMethod,
    pub fitness: Fitness,
    pub search: SearchConfig,
}

impl BasisGen {
    pub fn new(method: BasisMethod, fitness: Fitness, search: SearchConfig) -> Self {
        Self {
            method,
            fitness,
            search,
        }
    }

    /// Up to `req_num` distinct variables with their values, best first.
    pub fn generate<S, R>(
        &self,
        store: &S,
        req_num: usize,
        rng: &mut R,
    ) -> Result<Vec<(Variable, f64)>, SearchError>
    where
        S: VectorStore + ?Sized,
        R: Rng + ?Sized,
    {
        let primaries = primary_variables(store, self.fitness);
        if primaries.is_empty() {
            return Err(SearchError::NoCandidates);
        }
        let mut pool = VarPool::new(req_num);
        match self.method {
            BasisMethod::Mcmc => self.run_mcmc(store, &primaries, &mut pool, req_num, rng)?,
            BasisMethod::Greedy => self.run_greedy(store, &primaries, &mut pool, req_num, rng),
            BasisMethod::Simple => self.run_simple(store, &primaries, &mut pool, req_num, rng),
            BasisMethod::Shift => self.run_shift(store, &primaries, &mut pool),
        }
        tracing::debug!(
            method = ?self.method,
            primaries = primaries.len(),
            found = pool.len(),
            "basis search finished"
        );
        Ok(pool.into_sorted_vec())
    }

    fn run_mcmc<S, R>(
        &self,
        store: &S,
        primaries: &[Variable],
        pool: &mut VarPool<Variable>,
        req_num: usize,
        rng: &mut R,
    ) -> Result<(), SearchError>
    where
        S: VectorStore + ?Sized,
        R: Rng + ?Sized,
    {
        let mut state = ComposeState::new(primaries, store.vectors(), self.fitness, pool);
        MhSampler::new().sampling(
            &mut state,
            self.search.warmup,
            self.search.interval,
            self.search.samples_for(req_num),
            rng,
        )?;
        Ok(())
    }

    /// Each restart composes every primary in a fresh random order and keeps
    /// the best prefix.
    fn run_greedy<S, R>(
        &self,
        store: &S,
        primaries: &[Variable],
        pool: &mut VarPool<Variable>,
        req_num: usize,
        rng: &mut R,
    ) where
        S: VectorStore + ?Sized,
        R: Rng + ?Sized,
    {
        let mut order: Vec<&Variable> = primaries.iter().collect();
        for _ in 0..req_num * 4 {
            if pool.len() == req_num {
                break;
            }
            order.shuffle(rng);
            let mut cur = Variable::identity(store.vector_width());
            let mut best: Option<(Variable, f64)> = None;
            for &var in &order {
                cur *= var;
                let val = self.fitness.evaluate(&cur, store.vectors());
                if best.as_ref().map_or(true, |(_, b)| val > *b) {
                    best = Some((cur.clone(), val));
                }
            }
            if let Some((var, val)) = best {
                if val > 0.0 {
                    pool.put(var, val);
                }
            }
        }
    }

    fn run_simple<S, R>(
        &self,
        store: &S,
        primaries: &[Variable],
        pool: &mut VarPool<Variable>,
        req_num: usize,
        rng: &mut R,
    ) where
        S: VectorStore + ?Sized,
        R: Rng + ?Sized,
    {
        let nv = primaries.len();
        let samples = self.search.samples_for(req_num);
        let offer = |pool: &mut VarPool<Variable>, var: Variable| {
            let val = self.fitness.evaluate(&var, store.vectors());
            if val > 0.0 {
                pool.put(var, val);
            }
        };

        if nv < POWER_SET_LIMIT {
            // non-empty subsets are the codes 1..2^nv
            let total = (1usize << nv) - 1;
            for code in index::sample(rng, total, samples.min(total)).into_iter() {
                let mut var = Variable::identity(store.vector_width());
                for (i, p) in primaries.iter().enumerate() {
                    if ((code + 1) >> i) & 1 == 1 {
                        var *= p;
                    }
                }
                offer(pool, var);
            }
        } else {
            for _ in 0..samples {
                let mut var = Variable::identity(store.vector_width());
                for p in primaries {
                    if rng.gen::<bool>() {
                        var *= p;
                    }
                }
                if !var.is_identity() {
                    offer(pool, var);
                }
            }
        }
    }

    /// Hold every primary, then repeatedly swap the weakest held variable for
    /// its best composite with another held one, while that strictly improves.
    fn run_shift<S>(&self, store: &S, primaries: &[Variable], pool: &mut VarPool<Variable>)
    where
        S: VectorStore + ?Sized,
    {
        let vectors = store.vectors();
        let mut held = VarPool::new(primaries.len());
        for var in primaries {
            held.put(var.clone(), self.fitness.evaluate(var, vectors));
        }

        let mut rounds = 0usize;
        while held.len() > 1 {
            let weakest = held.get(0).clone();
            let others: Vec<Variable> = (1..held.len()).map(|pos| held.get(pos).clone()).collect();
            let mut best_val = held.value(0);
            let mut best: Vec<Variable> = Vec::new();
            for var in &others {
                let composite = &weakest * var;
                if held.contains(&composite) {
                    continue;
                }
                let val = self.fitness.evaluate(&composite, vectors);
                if val > best_val {
                    best_val = val;
                    best.clear();
                    best.push(composite);
                } else if val == best_val && !best.is_empty() {
                    best.push(composite);
                }
            }
            let winner = match break_tie(best, &others, vectors) {
                Some(var) => var,
                None => break,
            };
            held.pop_min();
            held.put(winner, best_val);
            rounds += 1;
        }
        tracing::trace!(rounds, "shift climb converged");

        for (var, val) in held.into_sorted_vec() {
            pool.put(var, val);
        }
    }
}

/// Among equally valued candidates, the one whose worst `pair_value` against
/// `held` is largest. Earlier candidates win exact ties.
fn break_tie(candidates: Vec<Variable>, held: &[Variable], vectors: &[RegVect]) -> Option<Variable> {
    if candidates.len() < 2 {
        return candidates.into_iter().next();
    }
    let worst_pair = |cand: &Variable| {
        held.iter()
            .map(|other| pair_value(cand, other, vectors))
            .fold(f64::INFINITY, f64::min)
    };
    let mut winner: Option<(Variable, f64)> = None;
    for cand in candidates {
        let score = worst_pair(&cand);
        if winner.as_ref().map_or(true, |(_, best)| score > *best) {
            winner = Some((cand, score));
        }
    }
    winner.map(|(var, _)| var)
}

// ============================================================================
// TESTS
// ============================================================================
