//! Collision-free partitioning with eviction chains.
//!
//! Each vector may sit in one slot `(j, f_j(v))` of any of the `m` functions.
//! Vectors are inserted in index order; when all candidate slots are taken a
//! breadth-first search over occupants looks for a chain ending at a free slot
//! and shifts every vector on it one step:
//!
//! ```text
//!   v ──wants──▶ [slot a: u] ──u can move──▶ [slot b: w] ──w can move──▶ [free]
//!   after:       [slot a: v]                 [slot b: u]                  [w]
//! ```
//!
//! Vectors and slots are plain index arenas; `source` links form the chain.

use crate::error::RealizeError;
use crate::sigfunc::FuncVect;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

#[derive(Clone, Copy, Debug, Default)]
struct VectInfo {
    /// Flat slot id currently held.
    cur: Option<usize>,
    /// Vector that will take over `cur` when this one moves.
    source: Option<usize>,
    mark: bool,
}

/// Injective assignment of vectors to `(function, value)` slots.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partition {
    mapping: Vec<usize>,
    values: Vec<u32>,
}

impl Partition {
    /// Function index chosen for each vector.
    pub fn mapping(&self) -> &[usize] {
        &self.mapping
    }

    /// `(function, value)` slot held by vector `v`.
    #[inline]
    pub fn slot_of(&self, v: usize) -> (usize, u32) {
        (self.mapping[v], self.values[v])
    }

    pub fn len(&self) -> usize {
        self.mapping.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mapping.is_empty()
    }
}

/// Reusable partitioner; every call starts from empty slots.
#[derive(Debug, Default)]
pub struct Partitioner {
    offsets: Vec<usize>,
    slots: Vec<Option<usize>>,
    vects: Vec<VectInfo>,
}

impl Partitioner {
    pub fn new() -> Self {
        Self::default()
    }

    fn reset(&mut self, funcs: &[FuncVect]) {
        assert!(!funcs.is_empty(), "at least one signature function required");
        let k = funcs[0].input_size();
        assert!(
            funcs.iter().all(|f| f.input_size() == k),
            "signature functions disagree on the number of vectors"
        );
        self.offsets.clear();
        let mut total = 0;
        for f in funcs {
            self.offsets.push(total);
            total += f.max_val();
        }
        self.offsets.push(total);
        self.slots.clear();
        self.slots.resize(total, None);
        self.vects.clear();
        self.vects.resize(k, VectInfo::default());
    }

    #[inline]
    fn slot_id(&self, funcs: &[FuncVect], j: usize, v: usize) -> usize {
        self.offsets[j] + funcs[j].val(v) as usize
    }

    /// Place every vector, displacing earlier ones along augmenting paths.
    ///
    /// # Examples
    ///
    /// ```
    /// use xorphf::{FuncVect, Partitioner};
    ///
    /// // both vectors prefer slot (0, 0); the second is pushed to function 1
    /// let f0 = FuncVect::from_values(2, vec![0, 0]);
    /// let f1 = FuncVect::from_values(2, vec![1, 0]);
    /// let part = Partitioner::new().cf_partition(&[f0, f1]).unwrap();
    /// assert_ne!(part.slot_of(0), part.slot_of(1));
    /// ```
    pub fn cf_partition(&mut self, funcs: &[FuncVect]) -> Result<Partition, RealizeError> {
        self.reset(funcs);
        let k = self.vects.len();
        let mut queue = VecDeque::new();
        let mut visited = Vec::new();

        for v in 0..k {
            queue.clear();
            visited.clear();
            self.vects[v].mark = true;
            self.vects[v].source = None;
            queue.push_back(v);
            visited.push(v);

            let mut placed = false;
            'search: while let Some(v1) = queue.pop_front() {
                let mut occupants = Vec::new();
                for j in 0..funcs.len() {
                    let slot = self.slot_id(funcs, j, v1);
                    let occupant = self.slots[slot];
                    match occupant {
                        None => {
                            self.shift_chain(v1, slot);
                            placed = true;
                            break 'search;
                        }
                        Some(v2) if !self.vects[v2].mark => occupants.push(v2),
                        Some(_) => {}
                    }
                }
                for v2 in occupants {
                    // an occupant reachable through two slots is queued once
                    if !self.vects[v2].mark {
                        self.vects[v2].mark = true;
                        self.vects[v2].source = Some(v1);
                        queue.push_back(v2);
                        visited.push(v2);
                    }
                }
            }

            for &u in &visited {
                self.vects[u].mark = false;
                self.vects[u].source = None;
            }
            if !placed {
                tracing::trace!(vector = v, searched = visited.len(), "no augmenting path");
                return Err(RealizeError::PartitionExhausted { vector: v });
            }
        }

        let part = self.collect(funcs);
        tracing::debug!(vectors = k, functions = funcs.len(), "partition succeeded");
        Ok(part)
    }

    /// Move `v1` into the free `slot`, then hand each vacated slot back
    /// along the `source` chain.
    fn shift_chain(&mut self, mut v1: usize, mut slot: usize) {
        loop {
            let old = self.vects[v1].cur.replace(slot);
            self.slots[slot] = Some(v1);
            match (self.vects[v1].source, old) {
                (Some(next), Some(vacated)) => {
                    v1 = next;
                    slot = vacated;
                }
                _ => break,
            }
        }
    }

    fn collect(&self, funcs: &[FuncVect]) -> Partition {
        let mut mapping = Vec::with_capacity(self.vects.len());
        let mut values = Vec::with_capacity(self.vects.len());
        for info in &self.vects {
            // every vector holds a slot once the loop above succeeds
            let slot = info.cur.unwrap_or_default();
            let j = self.offsets.partition_point(|&o| o <= slot) - 1;
            mapping.push(j);
            values.push((slot - self.offsets[j]) as u32);
        }
        debug_assert!(mapping
            .iter()
            .enumerate()
            .all(|(v, &j)| funcs[j].val(v) == values[v]));
        Partition { mapping, values }
    }
}

/// First-fit placement without displacement.
pub fn naive_partition(funcs: &[FuncVect]) -> Result<Partition, RealizeError> {
    assert!(!funcs.is_empty(), "at least one signature function required");
    let k = funcs[0].input_size();
    let mut used: Vec<Vec<bool>> = funcs.iter().map(|f| vec![false; f.max_val()]).collect();
    let mut mapping = Vec::with_capacity(k);
    let mut values = Vec::with_capacity(k);
    for v in 0..k {
        let free = (0..funcs.len()).find(|&j| !used[j][funcs[j].val(v) as usize]);
        match free {
            Some(j) => {
                let val = funcs[j].val(v);
                used[j][val as usize] = true;
                mapping.push(j);
                values.push(val);
            }
            None => return Err(RealizeError::PartitionExhausted { vector: v }),
        }
    }
    Ok(Partition { mapping, values })
}

// ============================================================================
// TESTS
// ============================================================================
