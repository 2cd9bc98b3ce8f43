//! Signature functions and their evaluated form.
//!
//! A [`SigFunc`] is an ordered tuple of `w` variables; variable `i` supplies bit
//! `i` of the `w`-bit code. A [`FuncVect`] is the same function evaluated once
//! over every registered vector, which is all the realization layer needs.

use crate::regvect::RegVect;
use crate::variable::Variable;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Widest signature the realization tables can address.
pub const MAX_OUTPUT_WIDTH: usize = 31;

/// Ordered tuple of variables producing a `w`-bit code per vector.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SigFunc {
    vars: Vec<Variable>,
}

impl SigFunc {
    pub fn new(vars: Vec<Variable>) -> Self {
        assert!(vars.len() <= MAX_OUTPUT_WIDTH, "signature too wide");
        if let Some(first) = vars.first() {
            assert!(vars.iter().all(|v| v.width() == first.width()));
        }
        Self { vars }
    }

    /// Output width `w`.
    #[inline]
    pub fn output_width(&self) -> usize {
        self.vars.len()
    }

    /// Number of distinct codes, `2^w`.
    #[inline]
    pub fn range(&self) -> usize {
        1usize << self.vars.len()
    }

    pub fn vars(&self) -> &[Variable] {
        &self.vars
    }

    /// Code of `rv`: bit `i` is `vars[i]` evaluated on `rv`.
    pub fn eval(&self, rv: &RegVect) -> u32 {
        self.vars
            .iter()
            .enumerate()
            .fold(0u32, |acc, (i, var)| acc | (rv.classify(var) << i))
    }

    /// Evaluate over `vectors`; entry `i` belongs to `vectors[i]`.
    pub fn func_vect(&self, vectors: &[RegVect]) -> FuncVect {
        FuncVect::from_values(self.range(), vectors.iter().map(|rv| self.eval(rv)).collect())
    }
}

impl fmt::Display for SigFunc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, var) in self.vars.iter().enumerate() {
            writeln!(f, "#{}: {}", i, var)?;
        }
        Ok(())
    }
}

/// Precomputed function values, one per vector index, each `< max_val`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FuncVect {
    max_val: usize,
    values: Vec<u32>,
}

impl FuncVect {
    /// All-zero function over `input_size` vectors.
    pub fn new(max_val: usize, input_size: usize) -> Self {
        assert!(max_val > 0);
        Self {
            max_val,
            values: vec![0; input_size],
        }
    }

    /// Wrap precomputed values.
    ///
    /// # Examples
    ///
    /// ```
    /// use xorphf::FuncVect;
    ///
    /// let f = FuncVect::from_values(4, vec![3, 0, 2]);
    /// assert_eq!(f.input_size(), 3);
    /// assert_eq!(f.val(0), 3);
    /// ```
    pub fn from_values(max_val: usize, values: Vec<u32>) -> Self {
        assert!(max_val > 0);
        assert!(
            values.iter().all(|&v| (v as usize) < max_val),
            "function value out of range"
        );
        Self { max_val, values }
    }

    /// One past the largest admissible value.
    #[inline]
    pub fn max_val(&self) -> usize {
        self.max_val
    }

    /// Number of vectors the function was evaluated on.
    #[inline]
    pub fn input_size(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn val(&self, id: usize) -> u32 {
        self.values[id]
    }

    pub fn set_val(&mut self, id: usize, val: u32) {
        assert!((val as usize) < self.max_val, "function value out of range");
        self.values[id] = val;
    }

    pub fn values(&self) -> &[u32] {
        &self.values
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regvect::{RvMgr, VectorStore};

    #[test]
    fn test_eval_bit_order() {
        let store = RvMgr::from_rows(4, &["1000", "0100", "0010", "0001"]).unwrap();
        let f = SigFunc::new(vec![Variable::primary(4, 0), Variable::primary(4, 2)]);
        assert_eq!(f.output_width(), 2);
        assert_eq!(f.range(), 4);
        let fv = store.func_vect(&f);
        assert_eq!(fv.values(), &[1, 0, 2, 0]);
        assert_eq!(fv.max_val(), 4);
        assert_eq!(fv.input_size(), store.len());
    }

    #[test]
    fn test_empty_signature_is_constant() {
        let store = RvMgr::from_rows(2, &["10", "01"]).unwrap();
        let f = SigFunc::new(Vec::new());
        assert_eq!(f.range(), 1);
        assert_eq!(store.func_vect(&f).values(), &[0, 0]);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_set_val_checks_range() {
        let mut fv = FuncVect::new(2, 3);
        fv.set_val(0, 2);
    }
}
