//! GF(2) Variable Algebra
//!
//! A [`Variable`] is a linear function over the `n` input bits of a registered
//! vector: `f(x) = x[i0] ^ x[i1] ^ ...` for the bit ids in its index set.
//!
//! # Representation
//!
//! ```text
//! Variable (width = n):
//!   bits: Vec<u64>  ──→  [b₀b₁b₂...b₆₃|b₆₄b₆₅...b₁₂₇|...]   (⌈n/64⌉ words)
//!
//!   bit i set  ⇔  input i participates in the XOR
//! ```
//!
//! Composition (`*`) is word-wise XOR, so variables over the same width form a
//! group: associative, commutative, and every element is its own inverse
//! (`a * a` is the identity, the empty index set).

use crate::fitness::Fitness;
use crate::regvect::RegVect;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Mul, MulAssign};

/// Linear (XOR) combination of input bits.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Variable {
    /// Number of input bits this variable ranges over
    width: usize,
    /// Bit i = 1 iff input i is part of the combination
    bits: Vec<u64>,
}

impl Variable {
    // ========================================================================
    // CONSTRUCTION
    // ========================================================================

    /// The identity element: no input participates, evaluates to 0 everywhere.
    pub fn identity(width: usize) -> Self {
        Self {
            width,
            bits: vec![0u64; Self::word_count(width)],
        }
    }

    /// Primary variable: exactly one input bit.
    ///
    /// # Examples
    ///
    /// ```
    /// use xorphf::Variable;
    ///
    /// let x3 = Variable::primary(8, 3);
    /// assert_eq!(x3.vids(), vec![3]);
    /// ```
    pub fn primary(width: usize, vid: usize) -> Self {
        assert!(vid < width, "bit id {} out of range for width {}", vid, width);
        let mut var = Self::identity(width);
        var.bits[vid / 64] |= 1u64 << (vid % 64);
        var
    }

    /// Product of the primary variables for `vids`.
    ///
    /// Repeated ids cancel, as they would under repeated composition.
    pub fn from_vids(width: usize, vids: &[usize]) -> Self {
        let mut var = Self::identity(width);
        for &vid in vids {
            assert!(vid < width, "bit id {} out of range for width {}", vid, width);
            var.bits[vid / 64] ^= 1u64 << (vid % 64);
        }
        var
    }

    /// Number of u64 words needed for `width` bits.
    #[inline(always)]
    pub const fn word_count(width: usize) -> usize {
        (width + 63) / 64
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    /// Input width the variable was built over.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Raw bit words (read-only).
    #[inline]
    pub fn words(&self) -> &[u64] {
        &self.bits
    }

    /// Raw word `blk` of the bitset.
    #[inline]
    pub fn raw_word(&self, blk: usize) -> u64 {
        self.bits[blk]
    }

    /// True for the identity (empty) variable.
    pub fn is_identity(&self) -> bool {
        self.bits.iter().all(|&w| w == 0)
    }

    /// Whether input `vid` participates.
    pub fn contains(&self, vid: usize) -> bool {
        assert!(vid < self.width);
        (self.bits[vid / 64] >> (vid % 64)) & 1 == 1
    }

    /// Number of participating inputs.
    pub fn degree(&self) -> usize {
        self.bits.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Participating input ids in ascending order.
    pub fn vids(&self) -> Vec<usize> {
        let mut out = Vec::with_capacity(self.degree());
        for (blk, &word) in self.bits.iter().enumerate() {
            let mut w = word;
            while w != 0 {
                let tz = w.trailing_zeros() as usize;
                out.push(blk * 64 + tz);
                w &= w - 1;
            }
        }
        out
    }

    // ========================================================================
    // ALGEBRA
    // ========================================================================

    /// In-place composition (`self *= other`).
    #[inline]
    pub fn compose_assign(&mut self, other: &Variable) {
        assert_eq!(
            self.width, other.width,
            "cannot compose variables of different widths"
        );
        for (a, b) in self.bits.iter_mut().zip(&other.bits) {
            *a ^= *b;
        }
    }

    /// Composition returning a new variable.
    pub fn compose(&self, other: &Variable) -> Variable {
        let mut out = self.clone();
        out.compose_assign(other);
        out
    }

    /// True if the two variables have at least one input in common.
    pub fn shares_bit(&self, other: &Variable) -> bool {
        assert_eq!(self.width, other.width);
        self.bits
            .iter()
            .zip(&other.bits)
            .any(|(a, b)| a & b != 0)
    }

    // ========================================================================
    // EVALUATION
    // ========================================================================

    /// Discrimination value over `vectors` under the default split fitness:
    /// `(n0 · n1) / (k² / 4)`.
    ///
    /// 1.0 means a perfectly balanced split; 0.0 means the variable does not
    /// tell any pair of vectors apart.
    pub fn value(&self, vectors: &[RegVect]) -> f64 {
        Fitness::Product.evaluate(self, vectors)
    }
}

impl MulAssign<&Variable> for Variable {
    fn mul_assign(&mut self, rhs: &Variable) {
        self.compose_assign(rhs);
    }
}

impl Mul<&Variable> for &Variable {
    type Output = Variable;

    fn mul(self, rhs: &Variable) -> Variable {
        self.compose(rhs)
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let vids = self.vids();
        if vids.len() == 1 {
            return write!(f, "{}", vids[0]);
        }
        write!(f, "(")?;
        for (i, vid) in vids.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", vid)?;
        }
        write!(f, ")")
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_sets_single_bit() {
        let v = Variable::primary(130, 129);
        assert_eq!(v.words().len(), 3);
        assert_eq!(v.vids(), vec![129]);
        assert!(v.contains(129));
        assert!(!v.contains(0));
        assert_eq!(v.degree(), 1);
    }

    #[test]
    fn test_compose_is_xor() {
        let a = Variable::from_vids(70, &[1, 65]);
        let b = Variable::from_vids(70, &[65, 3]);
        let c = &a * &b;
        assert_eq!(c.vids(), vec![1, 3]);
    }

    #[test]
    fn test_self_inverse() {
        let a = Variable::from_vids(10, &[2, 4, 9]);
        assert!((&a * &a).is_identity());
    }

    #[test]
    fn test_shares_bit() {
        let a = Variable::from_vids(100, &[5, 80]);
        let b = Variable::from_vids(100, &[80]);
        let c = Variable::from_vids(100, &[6]);
        assert!(a.shares_bit(&b));
        assert!(!a.shares_bit(&c));
    }

    #[test]
    fn test_display() {
        assert_eq!(Variable::primary(8, 5).to_string(), "5");
        assert_eq!(Variable::from_vids(8, &[1, 6]).to_string(), "(1 6)");
        assert_eq!(Variable::identity(8).to_string(), "()");
    }

    #[test]
    #[should_panic(expected = "different widths")]
    fn test_width_mismatch_panics() {
        let mut a = Variable::primary(8, 0);
        a *= &Variable::primary(9, 0);
    }
}
