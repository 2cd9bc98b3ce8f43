//! Hypergraph peeling - XOR perfect-hash table construction
//!
//! `d` signature functions turn every registered vector into a hyperedge over
//! `d` nodes, one node per (function, value) pair:
//!
//! ```text
//!   function 0      function 1      function 2
//!  ┌─┬─┬─┬─┐       ┌─┬─┬─┬─┐       ┌─┬─┬─┬─┐
//!  │0│1│2│3│       │0│1│2│3│       │0│1│2│3│        node = offsets[j] + f_j(v)
//!  └─┴─┴▲┴─┘       └▲┴─┴─┴─┘       └─┴─┴─┴▲┘
//!       └───────────┴─── vector v ────────┘          g0[2] ^ g1[0] ^ g2[3] == payload(v)
//! ```
//!
//! Construction is the classic three-step peel:
//!
//! 1. `simple_check`: no two edges may share their whole node tuple.
//! 2. `acyclic_check`: repeatedly remove an edge owning a degree-1 node; the
//!    removal order covers every edge iff the hypergraph is acyclic.
//! 3. `mapping`: walk the order backwards, fixing one still-free node per edge
//!    so the edge's XOR equals its payload.
//!
//! Degree bookkeeping keeps, per node, the degree and the XOR of the incident
//! edge ids, so the last remaining edge of a degree-1 node is read directly.

use crate::error::RealizeError;
use crate::sigfunc::FuncVect;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::Entry;
use std::collections::HashMap;

/// Index-addressed `d`-partite hypergraph built from signature functions.
#[derive(Clone, Debug)]
pub struct PhfGraph {
    degree: usize,
    /// First node id of each function; `offsets[d]` is the node count.
    offsets: Vec<usize>,
    /// `edges[e * degree + j]` is the node edge `e` touches in function `j`.
    edges: Vec<usize>,
    payloads: Vec<u32>,
}

impl PhfGraph {
    /// Graph whose payloads are the vector indices.
    pub fn new(funcs: &[FuncVect]) -> Self {
        let k = funcs.first().map_or(0, FuncVect::input_size);
        Self::with_payloads(funcs, (0..k as u32).collect())
    }

    /// Graph with an explicit payload per vector.
    pub fn with_payloads(funcs: &[FuncVect], payloads: Vec<u32>) -> Self {
        assert!(!funcs.is_empty(), "at least one signature function required");
        let k = funcs[0].input_size();
        assert!(
            funcs.iter().all(|f| f.input_size() == k),
            "signature functions disagree on the number of vectors"
        );
        assert_eq!(payloads.len(), k, "one payload per vector");

        let degree = funcs.len();
        let mut offsets = Vec::with_capacity(degree + 1);
        let mut total = 0;
        for f in funcs {
            offsets.push(total);
            total += f.max_val();
        }
        offsets.push(total);

        let mut edges = Vec::with_capacity(k * degree);
        for e in 0..k {
            for (j, f) in funcs.iter().enumerate() {
                edges.push(offsets[j] + f.val(e) as usize);
            }
        }

        Self {
            degree,
            offsets,
            edges,
            payloads,
        }
    }

    /// Number of signature functions `d`.
    #[inline]
    pub fn degree(&self) -> usize {
        self.degree
    }

    #[inline]
    pub fn edge_count(&self) -> usize {
        self.payloads.len()
    }

    #[inline]
    pub fn node_count(&self) -> usize {
        self.offsets[self.degree]
    }

    /// Node ids touched by edge `e`, one per function.
    #[inline]
    pub fn edge_nodes(&self, e: usize) -> &[usize] {
        &self.edges[e * self.degree..(e + 1) * self.degree]
    }

    /// Reject repeated hyperedges.
    pub fn simple_check(&self) -> Result<(), RealizeError> {
        let mut seen: HashMap<&[usize], usize> = HashMap::with_capacity(self.edge_count());
        for e in 0..self.edge_count() {
            match seen.entry(self.edge_nodes(e)) {
                Entry::Occupied(first) => {
                    return Err(RealizeError::DuplicateHyperedge {
                        first: *first.get(),
                        second: e,
                    })
                }
                Entry::Vacant(slot) => {
                    slot.insert(e);
                }
            }
        }
        Ok(())
    }

    /// Peel the hypergraph. Returns edge ids in removal order.
    pub fn acyclic_check(&self) -> Result<Vec<usize>, RealizeError> {
        let n = self.node_count();
        let k = self.edge_count();
        let mut degrees = vec![0u32; n];
        let mut edge_xor = vec![0usize; n];
        for e in 0..k {
            for &v in self.edge_nodes(e) {
                degrees[v] += 1;
                edge_xor[v] ^= e;
            }
        }

        let mut stack: Vec<usize> = (0..n).filter(|&v| degrees[v] == 1).collect();
        let mut order = Vec::with_capacity(k);
        while let Some(v) = stack.pop() {
            if degrees[v] != 1 {
                continue;
            }
            let e = edge_xor[v];
            for &u in self.edge_nodes(e) {
                degrees[u] -= 1;
                edge_xor[u] ^= e;
                if degrees[u] == 1 {
                    stack.push(u);
                }
            }
            order.push(e);
        }

        if order.len() < k {
            return Err(RealizeError::CyclicHypergraph {
                remaining: k - order.len(),
            });
        }
        Ok(order)
    }

    /// Build the per-function tables.
    ///
    /// # Examples
    ///
    /// ```
    /// use xorphf::{FuncVect, PhfGraph};
    ///
    /// let f0 = FuncVect::from_values(2, vec![0, 0, 1]);
    /// let f1 = FuncVect::from_values(2, vec![0, 1, 1]);
    /// let tables = PhfGraph::new(&[f0, f1]).mapping().unwrap();
    /// assert_eq!(tables.lookup(&[0, 1]), 1);
    /// assert_eq!(tables.lookup(&[1, 1]), 2);
    /// ```
    pub fn mapping(&self) -> Result<PhfTables, RealizeError> {
        self.simple_check()?;
        let order = self.acyclic_check()?;

        let mut values = vec![0u32; self.node_count()];
        let mut assigned = vec![false; self.node_count()];
        for &e in order.iter().rev() {
            let nodes = self.edge_nodes(e);
            let free = match nodes.iter().rposition(|&v| !assigned[v]) {
                Some(pos) => nodes[pos],
                None => unreachable!("peel order leaves every edge a free node"),
            };
            let mut acc = self.payloads[e];
            for &v in nodes {
                if v != free {
                    assigned[v] = true;
                    acc ^= values[v];
                }
            }
            values[free] = acc;
            assigned[free] = true;
        }

        let tables = self
            .offsets
            .windows(2)
            .map(|w| values[w[0]..w[1]].to_vec())
            .collect();
        tracing::debug!(
            edges = self.edge_count(),
            nodes = self.node_count(),
            degree = self.degree,
            "peeling succeeded"
        );
        Ok(PhfTables { tables })
    }
}

/// Output tables `g[j][value]` of a successful peel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhfTables {
    tables: Vec<Vec<u32>>,
}

impl PhfTables {
    pub fn tables(&self) -> &[Vec<u32>] {
        &self.tables
    }

    /// XOR of `g[j][values[j]]` over all functions.
    pub fn lookup(&self, values: &[u32]) -> u32 {
        assert_eq!(values.len(), self.tables.len(), "one value per function");
        self.tables
            .iter()
            .zip(values)
            .fold(0, |acc, (table, &v)| acc ^ table[v as usize])
    }
}

// ============================================================================
// TWO-FUNCTION DISPLACEMENT
// ============================================================================

/// How a bucket's displacement combines with the second function's value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplaceMode {
    /// `slot = f2 ^ d`
    #[default]
    Xor,
    /// `slot = (f2 + d) mod range`
    Add,
}

impl DisplaceMode {
    #[inline]
    fn apply(self, value: u32, disp: u32, range: usize) -> usize {
        match self {
            DisplaceMode::Xor => (value ^ disp) as usize,
            DisplaceMode::Add => (value as usize + disp as usize) % range,
        }
    }
}

/// Per-bucket displacements: vector `v` lands in
/// `slot(f1(v), f2(v))`, distinct for every vector.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Displacement {
    mode: DisplaceMode,
    range: usize,
    disp: Vec<u32>,
}

impl Displacement {
    pub fn mode(&self) -> DisplaceMode {
        self.mode
    }

    /// Number of slots.
    pub fn range(&self) -> usize {
        self.range
    }

    /// Displacement of each first-function bucket.
    pub fn displacements(&self) -> &[u32] {
        &self.disp
    }

    #[inline]
    pub fn slot(&self, v1: u32, v2: u32) -> usize {
        self.mode.apply(v2, self.disp[v1 as usize], self.range)
    }
}

/// Hash-and-displace over two functions.
///
/// No hypergraph is built or peeled here. Vectors are bucketed by `f1`;
/// buckets are placed largest first, each with the smallest displacement whose
/// slots are in range and still free. The displacement is combined with `f2`
/// by XOR or by modular addition, never by overwriting a table entry.
pub fn displace_decomposition(
    f1: &FuncVect,
    f2: &FuncVect,
    mode: DisplaceMode,
) -> Result<Displacement, RealizeError> {
    assert_eq!(
        f1.input_size(),
        f2.input_size(),
        "signature functions disagree on the number of vectors"
    );
    let range = f2.max_val();

    let mut buckets: Vec<Vec<usize>> = vec![Vec::new(); f1.max_val()];
    let mut seen: HashMap<(u32, u32), usize> = HashMap::with_capacity(f1.input_size());
    for v in 0..f1.input_size() {
        let key = (f1.val(v), f2.val(v));
        if let Some(&first) = seen.get(&key) {
            return Err(RealizeError::DuplicateHyperedge { first, second: v });
        }
        seen.insert(key, v);
        buckets[key.0 as usize].push(v);
    }

    let mut order: Vec<usize> = (0..buckets.len()).filter(|&b| !buckets[b].is_empty()).collect();
    order.sort_by(|&a, &b| buckets[b].len().cmp(&buckets[a].len()).then(a.cmp(&b)));

    let mut used = vec![false; range];
    let mut disp = vec![0u32; f1.max_val()];
    for &b in &order {
        let members = &buckets[b];
        let found = (0..range as u32).find(|&d| {
            members.iter().all(|&v| {
                let slot = mode.apply(f2.val(v), d, range);
                slot < range && !used[slot]
            })
        });
        let d = match found {
            Some(d) => d,
            None => return Err(RealizeError::DisplacementExhausted { bucket: b as u32 }),
        };
        for &v in members {
            used[mode.apply(f2.val(v), d, range)] = true;
        }
        disp[b] = d;
    }

    tracing::debug!(buckets = order.len(), range, ?mode, "displacement succeeded");
    Ok(Displacement { mode, range, disp })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regvect::{RvMgr, VectorStore};
    use crate::search::random_hash_func;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn fv(max_val: usize, values: &[u32]) -> FuncVect {
        FuncVect::from_values(max_val, values.to_vec())
    }

    fn lookup_all(tables: &PhfTables, funcs: &[FuncVect], v: usize) -> u32 {
        let values: Vec<u32> = funcs.iter().map(|f| f.val(v)).collect();
        tables.lookup(&values)
    }

    #[test]
    fn test_path_graph_peels() {
        let funcs = [fv(2, &[0, 0, 1]), fv(2, &[0, 1, 1])];
        let graph = PhfGraph::new(&funcs);
        assert_eq!(graph.node_count(), 4);
        let order = graph.acyclic_check().unwrap();
        assert_eq!(order.len(), 3);
        let tables = graph.mapping().unwrap();
        for v in 0..3 {
            assert_eq!(lookup_all(&tables, &funcs, v), v as u32);
        }
    }

    #[test]
    fn test_duplicate_hyperedge() {
        let funcs = [fv(2, &[0, 1, 0]), fv(4, &[3, 0, 3])];
        let graph = PhfGraph::new(&funcs);
        assert_eq!(
            graph.simple_check(),
            Err(RealizeError::DuplicateHyperedge { first: 0, second: 2 })
        );
        assert!(matches!(
            graph.mapping(),
            Err(RealizeError::DuplicateHyperedge { .. })
        ));
    }

    #[test]
    fn test_cycle_detected() {
        // a 4-cycle: every node has degree 2
        let funcs = [fv(2, &[0, 0, 1, 1]), fv(2, &[0, 1, 0, 1])];
        let graph = PhfGraph::new(&funcs);
        assert!(graph.simple_check().is_ok());
        assert_eq!(
            graph.acyclic_check(),
            Err(RealizeError::CyclicHypergraph { remaining: 4 })
        );
    }

    #[test]
    fn test_tail_peels_off_cycle() {
        // 4-cycle plus a pendant edge: only the pendant is removable
        let funcs = [fv(4, &[0, 0, 1, 1, 2]), fv(4, &[0, 1, 0, 1, 1])];
        let err = PhfGraph::new(&funcs).acyclic_check().unwrap_err();
        assert_eq!(err, RealizeError::CyclicHypergraph { remaining: 4 });
    }

    #[test]
    fn test_explicit_payloads() {
        let funcs = [fv(4, &[0, 1, 2]), fv(4, &[1, 1, 3]), fv(2, &[0, 1, 0])];
        let payloads = vec![0xdead, 7, 0xffff_ffff];
        let graph = PhfGraph::with_payloads(&funcs, payloads.clone());
        let tables = graph.mapping().unwrap();
        assert_eq!(tables.tables().len(), 3);
        assert_eq!(tables.tables()[0].len(), 4);
        assert_eq!(tables.tables()[2].len(), 2);
        for (v, &p) in payloads.iter().enumerate() {
            assert_eq!(lookup_all(&tables, &funcs, v), p);
        }
    }

    #[test]
    fn test_random_hash_functions_realize() {
        let mut rng = StdRng::seed_from_u64(77);
        let store = RvMgr::random(32, 300, &mut rng);
        let p = store.index_size();
        let mut realized = None;
        for _ in 0..50 {
            let funcs: Vec<FuncVect> = (0..3)
                .map(|_| store.func_vect(&random_hash_func(32, p, 2, &mut rng)))
                .collect();
            if let Ok(tables) = PhfGraph::new(&funcs).mapping() {
                realized = Some((funcs, tables));
                break;
            }
        }
        let (funcs, tables) = realized.expect("no acyclic configuration in 50 attempts");
        for v in 0..store.len() {
            assert_eq!(lookup_all(&tables, &funcs, v), v as u32);
        }
    }

    #[test]
    fn test_empty_graph() {
        let graph = PhfGraph::new(&[fv(4, &[]), fv(4, &[])]);
        assert_eq!(graph.acyclic_check().unwrap(), Vec::<usize>::new());
        let tables = graph.mapping().unwrap();
        assert!(tables.tables().iter().all(|t| t.iter().all(|&x| x == 0)));
    }

    #[test]
    fn test_displace_xor() {
        let f1 = fv(2, &[0, 0, 1, 1]);
        let f2 = fv(4, &[0, 1, 0, 1]);
        let d = displace_decomposition(&f1, &f2, DisplaceMode::Xor).unwrap();
        let slots: HashSet<usize> = (0..4).map(|v| d.slot(f1.val(v), f2.val(v))).collect();
        assert_eq!(slots.len(), 4);
        assert!(slots.iter().all(|&s| s < d.range()));
    }

    #[test]
    fn test_displace_add() {
        let f1 = fv(4, &[0, 0, 0, 1, 2, 2]);
        let f2 = fv(8, &[5, 6, 7, 5, 5, 6]);
        let d = displace_decomposition(&f1, &f2, DisplaceMode::Add).unwrap();
        assert_eq!(d.mode(), DisplaceMode::Add);
        let slots: HashSet<usize> = (0..6).map(|v| d.slot(f1.val(v), f2.val(v))).collect();
        assert_eq!(slots.len(), 6);
        // the largest bucket goes first and keeps displacement 0
        assert_eq!(d.displacements()[0], 0);
    }

    #[test]
    fn test_displace_failures() {
        let dup = displace_decomposition(&fv(2, &[1, 1]), &fv(2, &[0, 0]), DisplaceMode::Xor);
        assert_eq!(dup, Err(RealizeError::DuplicateHyperedge { first: 0, second: 1 }));

        // bucket 0 fills both slots, bucket 1 has nowhere to go
        let full = displace_decomposition(&fv(2, &[0, 0, 1]), &fv(2, &[0, 1, 0]), DisplaceMode::Xor);
        assert_eq!(full, Err(RealizeError::DisplacementExhausted { bucket: 1 }));
    }
}
