//! Registered vectors and the in-memory vector store.
//!
//! The dataset format is plain text:
//!
//! ```text
//! <n> <k>
//! 0110...   (k lines of exactly n characters from {0,1})
//! ```
//!
//! Character `j` of a line is input bit `j`. Repeated vectors are dropped on
//! load, so indices stay dense in `0..k'`.

use crate::fitness::{self, Fitness};
use crate::sigfunc::{FuncVect, SigFunc};
use crate::variable::Variable;
use rand::Rng;
use std::collections::HashSet;
use std::fmt;
use std::io::{self, BufRead, Write};

/// Errors from reading a vector dataset.
#[derive(Debug)]
pub enum DatasetError {
    Io(io::Error),
    MissingHeader,
    BadHeader { line: String },
    Truncated { expected: usize, got: usize },
    Length { line: usize, expected: usize, got: usize },
    IllegalChar { line: usize, column: usize, ch: char },
}

impl fmt::Display for DatasetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatasetError::Io(e) => write!(f, "read error: {}", e),
            DatasetError::MissingHeader => write!(f, "missing \"<n> <k>\" header line"),
            DatasetError::BadHeader { line } => write!(f, "malformed header line: {:?}", line),
            DatasetError::Truncated { expected, got } => {
                write!(f, "expected {} vectors, found {}", expected, got)
            }
            DatasetError::Length { line, expected, got } => write!(
                f,
                "data length error at line {}: expected {} bits, got {}",
                line, expected, got
            ),
            DatasetError::IllegalChar { line, column, ch } => write!(
                f,
                "illegal character {:?} at line {}, column {}",
                ch, line, column
            ),
        }
    }
}

impl std::error::Error for DatasetError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DatasetError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for DatasetError {
    fn from(e: io::Error) -> Self {
        DatasetError::Io(e)
    }
}

// ============================================================================
// REGISTERED VECTOR
// ============================================================================

/// One fixed-width input bit-vector, immutable once registered.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RegVect {
    index: usize,
    width: usize,
    body: Vec<u64>,
}

impl RegVect {
    /// Build from raw words. Bits beyond `width` must be clear.
    pub fn from_words(index: usize, width: usize, body: Vec<u64>) -> Self {
        assert_eq!(body.len(), Variable::word_count(width));
        if width % 64 != 0 {
            let mask = !((1u64 << (width % 64)) - 1);
            assert_eq!(body[body.len() - 1] & mask, 0, "bits set beyond width");
        }
        Self { index, width, body }
    }

    /// Parse a `{0,1}` string; character `j` is bit `j`.
    ///
    /// `line` is only used for diagnostics (1-based).
    pub fn parse(index: usize, width: usize, text: &str, line: usize) -> Result<Self, DatasetError> {
        let got = text.chars().count();
        if got != width {
            return Err(DatasetError::Length { line, expected: width, got });
        }
        let mut body = vec![0u64; Variable::word_count(width)];
        for (j, ch) in text.chars().enumerate() {
            match ch {
                '0' => {}
                '1' => body[j / 64] |= 1u64 << (j % 64),
                _ => {
                    return Err(DatasetError::IllegalChar {
                        line,
                        column: j + 1,
                        ch,
                    })
                }
            }
        }
        Ok(Self { index, width, body })
    }

    /// Position in the owning store.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Raw word `blk` of the vector body.
    #[inline]
    pub fn raw_word(&self, blk: usize) -> u64 {
        self.body[blk]
    }

    /// Bit `pos` of the vector.
    pub fn get(&self, pos: usize) -> bool {
        assert!(pos < self.width);
        (self.body[pos / 64] >> (pos % 64)) & 1 == 1
    }

    /// Evaluate `var` on this vector: parity of `var AND self`.
    #[inline]
    pub fn classify(&self, var: &Variable) -> u32 {
        assert_eq!(
            var.width(),
            self.width,
            "variable width does not match vector width"
        );
        let mut acc = 0u64;
        for (blk, &word) in self.body.iter().enumerate() {
            acc ^= word & var.raw_word(blk);
        }
        acc.count_ones() & 1
    }

    /// Vector as a `{0,1}` string, bit 0 first.
    pub fn to_bit_string(&self) -> String {
        (0..self.width)
            .map(|i| if self.get(i) { '1' } else { '0' })
            .collect()
    }
}

// ============================================================================
// VECTOR STORE
// ============================================================================

/// Read-only source of registered vectors shared by search and realization.
pub trait VectorStore {
    /// Registered vectors, with `vectors()[i].index() == i`.
    fn vectors(&self) -> &[RegVect];

    /// Bit width `n` of every vector.
    fn vector_width(&self) -> usize;

    fn len(&self) -> usize {
        self.vectors().len()
    }

    fn is_empty(&self) -> bool {
        self.vectors().is_empty()
    }

    /// Bits needed to number `k` vectors plus one spare code: ⌈log2(k + 1)⌉.
    fn index_size(&self) -> usize {
        let k = self.len() + 1;
        let mut bits = 0;
        while (1usize << bits) < k {
            bits += 1;
        }
        bits
    }
}

/// In-memory vector store with duplicate elimination.
#[derive(Clone, Debug, Default)]
pub struct RvMgr {
    width: usize,
    vectors: Vec<RegVect>,
    seen: HashSet<Vec<u64>>,
}

impl RvMgr {
    /// Empty store for `width`-bit vectors.
    pub fn new(width: usize) -> Self {
        Self {
            width,
            vectors: Vec::new(),
            seen: HashSet::new(),
        }
    }

    /// Register a vector from raw words. Returns false if it was already present.
    pub fn insert_words(&mut self, body: Vec<u64>) -> bool {
        if self.seen.contains(&body) {
            return false;
        }
        let index = self.vectors.len();
        let rv = RegVect::from_words(index, self.width, body);
        self.seen.insert(rv.body.clone());
        self.vectors.push(rv);
        true
    }

    /// Build a store from `{0,1}` rows.
    ///
    /// # Examples
    ///
    /// ```
    /// use xorphf::{RvMgr, VectorStore};
    ///
    /// let store = RvMgr::from_rows(4, &["0001", "0010", "0001"]).unwrap();
    /// assert_eq!(store.len(), 2); // duplicate dropped
    /// ```
    pub fn from_rows<S: AsRef<str>>(width: usize, rows: &[S]) -> Result<Self, DatasetError> {
        let mut mgr = Self::new(width);
        for (i, row) in rows.iter().enumerate() {
            let rv = RegVect::parse(mgr.vectors.len(), width, row.as_ref(), i + 1)?;
            mgr.insert_words(rv.body);
        }
        Ok(mgr)
    }

    /// Read the `"<n> <k>"` text format.
    pub fn read_data<R: BufRead>(reader: R) -> Result<Self, DatasetError> {
        let mut lines = reader.lines();
        let header = match lines.next() {
            Some(line) => line?,
            None => return Err(DatasetError::MissingHeader),
        };
        let mut fields = header.split_whitespace().map(str::parse::<usize>);
        let (width, count) = match (fields.next(), fields.next()) {
            (Some(Ok(n)), Some(Ok(k))) => (n, k),
            _ => return Err(DatasetError::BadHeader { line: header }),
        };

        let mut mgr = Self::new(width);
        for i in 0..count {
            let line = match lines.next() {
                Some(line) => line?,
                None => return Err(DatasetError::Truncated { expected: count, got: i }),
            };
            let rv = RegVect::parse(mgr.vectors.len(), width, line.trim_end(), i + 2)?;
            mgr.insert_words(rv.body);
        }
        let dropped = count - mgr.vectors.len();
        if dropped > 0 {
            tracing::debug!(dropped, "duplicate vectors removed");
        }
        Ok(mgr)
    }

    /// Write the store back out in the text format.
    pub fn write_data<W: Write>(&self, mut out: W) -> io::Result<()> {
        writeln!(out, "{} {}", self.width, self.vectors.len())?;
        for rv in &self.vectors {
            writeln!(out, "{}", rv.to_bit_string())?;
        }
        Ok(())
    }

    /// `count` distinct uniformly random vectors.
    ///
    /// Panics if `count` exceeds the number of distinct `width`-bit vectors.
    pub fn random<R: Rng + ?Sized>(width: usize, count: usize, rng: &mut R) -> Self {
        if width < usize::BITS as usize {
            assert!(count <= 1usize << width, "not enough distinct vectors");
        }
        let mut mgr = Self::new(width);
        let words = Variable::word_count(width);
        while mgr.vectors.len() < count {
            let mut body: Vec<u64> = (0..words).map(|_| rng.gen::<u64>()).collect();
            if width % 64 != 0 {
                body[words - 1] &= (1u64 << (width % 64)) - 1;
            }
            mgr.insert_words(body);
        }
        mgr
    }

    /// Split fitness of `var` over the whole store.
    pub fn value(&self, var: &Variable) -> f64 {
        Fitness::Product.evaluate(var, &self.vectors)
    }

    /// Joint discrimination of two variables over the whole store.
    pub fn pair_value(&self, var1: &Variable, var2: &Variable) -> f64 {
        fitness::pair_value(var1, var2, &self.vectors)
    }

    /// Evaluate a signature function on every vector.
    pub fn func_vect(&self, func: &SigFunc) -> FuncVect {
        func.func_vect(&self.vectors)
    }
}

impl VectorStore for RvMgr {
    fn vectors(&self) -> &[RegVect] {
        &self.vectors
    }

    fn vector_width(&self) -> usize {
        self.width
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::io::Cursor;

    #[test]
    fn test_classify_parity() {
        let rv = RegVect::parse(0, 70, &format!("1{}1{}", "0".repeat(65), "000"), 1).unwrap();
        assert!(rv.get(0));
        assert!(rv.get(66));
        assert_eq!(rv.classify(&Variable::primary(70, 0)), 1);
        assert_eq!(rv.classify(&Variable::primary(70, 1)), 0);
        assert_eq!(rv.classify(&Variable::from_vids(70, &[0, 66])), 0);
        assert_eq!(rv.classify(&Variable::from_vids(70, &[0, 66, 5])), 0);
        assert_eq!(rv.classify(&Variable::from_vids(70, &[66, 5])), 1);
    }

    #[test]
    fn test_read_data() {
        let text = "4 3\n0001\n0110\n1111\n";
        let mgr = RvMgr::read_data(Cursor::new(text)).unwrap();
        assert_eq!(mgr.vector_width(), 4);
        assert_eq!(mgr.len(), 3);
        assert_eq!(mgr.vectors()[1].to_bit_string(), "0110");
        assert_eq!(mgr.vectors()[2].index(), 2);
    }

    #[test]
    fn test_read_data_drops_duplicates() {
        let text = "3 4\n001\n010\n001\n100\n";
        let mgr = RvMgr::read_data(Cursor::new(text)).unwrap();
        assert_eq!(mgr.len(), 3);
        assert_eq!(mgr.vectors()[2].to_bit_string(), "100");
        assert_eq!(mgr.vectors()[2].index(), 2);
    }

    #[test]
    fn test_read_data_errors() {
        let err = RvMgr::read_data(Cursor::new("")).unwrap_err();
        assert!(matches!(err, DatasetError::MissingHeader));

        let err = RvMgr::read_data(Cursor::new("x y\n")).unwrap_err();
        assert!(matches!(err, DatasetError::BadHeader { .. }));

        let err = RvMgr::read_data(Cursor::new("3 2\n001\n")).unwrap_err();
        assert!(matches!(err, DatasetError::Truncated { expected: 2, got: 1 }));

        let err = RvMgr::read_data(Cursor::new("3 1\n0011\n")).unwrap_err();
        assert!(err.to_string().contains("line 2"));

        let err = RvMgr::read_data(Cursor::new("3 1\n0a1\n")).unwrap_err();
        match err {
            DatasetError::IllegalChar { line, column, ch } => {
                assert_eq!((line, column, ch), (2, 2, 'a'));
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_write_read_roundtrip() {
        let mut rng = StdRng::seed_from_u64(7);
        let mgr = RvMgr::random(77, 40, &mut rng);
        let mut buf = Vec::new();
        mgr.write_data(&mut buf).unwrap();
        let back = RvMgr::read_data(Cursor::new(buf)).unwrap();
        assert_eq!(back.vectors(), mgr.vectors());
    }

    #[test]
    fn test_index_size() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(RvMgr::random(8, 3, &mut rng).index_size(), 2);
        assert_eq!(RvMgr::random(8, 4, &mut rng).index_size(), 3);
        assert_eq!(RvMgr::random(8, 7, &mut rng).index_size(), 3);
        assert_eq!(RvMgr::random(8, 8, &mut rng).index_size(), 4);
    }
}
