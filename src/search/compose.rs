//! Composition-move state: a single evolving variable.

use super::MhState;
use crate::fitness::Fitness;
use crate::pool::VarPool;
use crate::regvect::RegVect;
use crate::variable::Variable;
use rand::Rng;

/// One variable that moves by composing in a random primary candidate.
///
/// `primaries` must be non-empty and free of zero-valued variables; use
/// [`primary_variables`](super::primary_variables) to build it.
pub struct ComposeState<'a> {
    primaries: &'a [Variable],
    vectors: &'a [RegVect],
    fitness: Fitness,
    pool: &'a mut VarPool<Variable>,
    cur: Variable,
    cur_val: f64,
    prev: Variable,
    prev_val: f64,
}

impl<'a> ComposeState<'a> {
    pub fn new(
        primaries: &'a [Variable],
        vectors: &'a [RegVect],
        fitness: Fitness,
        pool: &'a mut VarPool<Variable>,
    ) -> Self {
        assert!(!primaries.is_empty(), "no primary variables to compose");
        let width = primaries[0].width();
        Self {
            primaries,
            vectors,
            fitness,
            pool,
            cur: Variable::identity(width),
            cur_val: 0.0,
            prev: Variable::identity(width),
            prev_val: 0.0,
        }
    }

    /// Current variable.
    pub fn current(&self) -> &Variable {
        &self.cur
    }

    fn random_select<R: Rng + ?Sized>(&self, rng: &mut R) -> &'a Variable {
        &self.primaries[rng.gen_range(0..self.primaries.len())]
    }
}

impl MhState for ComposeState<'_> {
    fn init<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.cur = self.random_select(rng).clone();
        self.cur_val = self.fitness.evaluate(&self.cur, self.vectors);
        self.prev.clone_from(&self.cur);
        self.prev_val = self.cur_val;
    }

    fn random_move<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let var = self.random_select(rng);
        self.prev.clone_from(&self.cur);
        self.prev_val = self.cur_val;
        self.cur *= var;
        self.cur_val = self.fitness.evaluate(&self.cur, self.vectors);
    }

    fn reset_move(&mut self) {
        std::mem::swap(&mut self.cur, &mut self.prev);
        self.cur_val = self.prev_val;
    }

    fn value(&self) -> f64 {
        self.cur_val
    }

    fn record(&mut self) {
        self.pool.put(self.cur.clone(), self.cur_val);
    }
}
