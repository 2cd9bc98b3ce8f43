//! Slot-replacement states over fixed-width variable tuples.
//!
//! Each tuple keeps a candidate list holding exactly the variables it does not
//! currently use. A move swaps one tuple slot for a candidate drawn without
//! replacement:
//!
//! ```text
//! propose:  new ← cand.swap_remove(rand)     old ← tuple[pos]     tuple[pos] ← new
//! reject:   tuple[pos] ← old                 cand.push(new)
//! accept:   cand.push(old)                   (settled lazily before the next move)
//! ```

use super::{MhState, SearchError};
use crate::fitness::balance_value;
use crate::pool::VarPool;
use crate::regvect::RegVect;
use crate::sigfunc::SigFunc;
use crate::variable::Variable;
use rand::Rng;

struct PendingMove {
    pos: usize,
    old: Variable,
}

/// Core tuple bookkeeping shared by the single and multi-function states.
struct TupleState {
    width: usize,
    all: Vec<Variable>,
    cand: Vec<Variable>,
    cur: Vec<Variable>,
    cur_val: f64,
    prev_val: f64,
    pending: Option<PendingMove>,
}

impl TupleState {
    fn new(vars: &[Variable], width: usize) -> Result<Self, SearchError> {
        if vars.len() < width {
            return Err(SearchError::TooFewCandidates {
                needed: width,
                available: vars.len(),
            });
        }
        Ok(Self {
            width,
            all: vars.to_vec(),
            cand: Vec::new(),
            cur: Vec::with_capacity(width),
            cur_val: 0.0,
            prev_val: 0.0,
            pending: None,
        })
    }

    fn choose_var<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Variable {
        let pos = rng.gen_range(0..self.cand.len());
        self.cand.swap_remove(pos)
    }

    fn init<R: Rng + ?Sized>(&mut self, vectors: &[RegVect], rng: &mut R) {
        self.cand = self.all.clone();
        self.cur.clear();
        self.pending = None;
        for _ in 0..self.width {
            let var = self.choose_var(rng);
            self.cur.push(var);
        }
        self.cur_val = balance_value(&self.cur, vectors);
        self.prev_val = self.cur_val;
    }

    /// Return the replaced variable of an accepted move to the candidates.
    fn settle(&mut self) {
        if let Some(mv) = self.pending.take() {
            self.cand.push(mv.old);
        }
    }

    fn propose<R: Rng + ?Sized>(&mut self, vectors: &[RegVect], rng: &mut R) {
        self.settle();
        self.prev_val = self.cur_val;
        if self.width == 0 || self.cand.is_empty() {
            return;
        }
        let pos = rng.gen_range(0..self.width);
        let new = self.choose_var(rng);
        let old = std::mem::replace(&mut self.cur[pos], new);
        self.pending = Some(PendingMove { pos, old });
        self.cur_val = balance_value(&self.cur, vectors);
    }

    fn undo(&mut self) {
        if let Some(mv) = self.pending.take() {
            let new = std::mem::replace(&mut self.cur[mv.pos], mv.old);
            self.cand.push(new);
        }
        self.cur_val = self.prev_val;
    }

    fn func(&self) -> SigFunc {
        SigFunc::new(self.cur.clone())
    }
}

// ============================================================================
// SINGLE FUNCTION
// ============================================================================

/// One `width`-variable signature function, scored by code balance.
pub struct SigFuncState<'a> {
    vectors: &'a [RegVect],
    tuple: TupleState,
    pool: &'a mut VarPool<SigFunc>,
}

impl<'a> SigFuncState<'a> {
    pub fn new(
        vars: &[Variable],
        width: usize,
        vectors: &'a [RegVect],
        pool: &'a mut VarPool<SigFunc>,
    ) -> Result<Self, SearchError> {
        Ok(Self {
            vectors,
            tuple: TupleState::new(vars, width)?,
            pool,
        })
    }

    /// Current function.
    pub fn current(&self) -> SigFunc {
        self.tuple.func()
    }

    /// Candidates not used by the current tuple (after settling the last move).
    pub fn unused(&mut self) -> &[Variable] {
        self.tuple.settle();
        &self.tuple.cand
    }
}

impl MhState for SigFuncState<'_> {
    fn init<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.tuple.init(self.vectors, rng);
    }

    fn random_move<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.tuple.propose(self.vectors, rng);
    }

    fn reset_move(&mut self) {
        self.tuple.undo();
    }

    fn value(&self) -> f64 {
        self.tuple.cur_val
    }

    fn record(&mut self) {
        self.pool.put(self.tuple.func(), self.tuple.cur_val);
    }
}

// ============================================================================
// MULTIPLE FUNCTIONS
// ============================================================================

/// `m` independent tuples moved one at a time.
///
/// The joint value is the product of the tuple values, so the acceptance ratio
/// of a step equals the ratio of the one tuple that moved.
pub struct MultiSigState<'a> {
    vectors: &'a [RegVect],
    tuples: Vec<TupleState>,
    last: usize,
    pool: &'a mut VarPool<Vec<SigFunc>>,
}

impl<'a> MultiSigState<'a> {
    pub fn new(
        vars: &[Variable],
        width: usize,
        multiplicity: usize,
        vectors: &'a [RegVect],
        pool: &'a mut VarPool<Vec<SigFunc>>,
    ) -> Result<Self, SearchError> {
        assert!(multiplicity > 0);
        let tuples = (0..multiplicity)
            .map(|_| TupleState::new(vars, width))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            vectors,
            tuples,
            last: 0,
            pool,
        })
    }

    pub fn current(&self) -> Vec<SigFunc> {
        self.tuples.iter().map(TupleState::func).collect()
    }
}

impl MhState for MultiSigState<'_> {
    fn init<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for tuple in &mut self.tuples {
            tuple.init(self.vectors, rng);
        }
    }

    fn random_move<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.last = rng.gen_range(0..self.tuples.len());
        self.tuples[self.last].propose(self.vectors, rng);
    }

    fn reset_move(&mut self) {
        self.tuples[self.last].undo();
    }

    fn value(&self) -> f64 {
        self.tuples.iter().map(|t| t.cur_val).product()
    }

    fn record(&mut self) {
        let value = self.value();
        self.pool.put(self.current(), value);
    }
}
