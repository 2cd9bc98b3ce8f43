//! xorphf - XOR-signature perfect hashing for fixed bit-vector sets
//!
//! Copyright (c) 2025 xorphf Contributors
//! Licensed under MIT License
//!
//! Builds collision-free index functions for a known set of `k` distinct
//! `n`-bit vectors. Signatures are tuples of GF(2) linear functions of the
//! input bits; a stochastic search proposes them and one of two realization
//! algorithms turns them into a lookup structure:
//!
//! ```text
//!  RvMgr ──▶ search (MH / greedy / simple) ──▶ SigFunc × d ──┬─▶ PhfGraph::mapping   (XOR tables)
//!                                                            └─▶ Partitioner::cf_partition (slots)
//! ```
//!
//! [`build_phf`] and [`build_partition`] wrap both with the retry-and-widen
//! policy of [`BuildConfig`].

pub mod cli;
pub mod config;
pub mod driver;
pub mod error;
pub mod fitness;
pub mod partition;
pub mod phf;
pub mod pool;
pub mod regvect;
pub mod search;
pub mod sigfunc;
pub mod variable;

// Re-export main types for convenience
pub use config::{BuildConfig, FuncSource, SearchConfig};
pub use driver::{build_partition, build_phf, PartitionIndex, PhfIndex};
pub use error::{BuildError, RealizeError};
pub use fitness::{balance_value, pair_value, Fitness};
pub use partition::{naive_partition, Partition, Partitioner};
pub use phf::{displace_decomposition, DisplaceMode, Displacement, PhfGraph, PhfTables};
pub use pool::VarPool;
pub use regvect::{DatasetError, RegVect, RvMgr, VectorStore};
pub use search::{
    primary_variables, random_hash_func, random_sig_funcs, BasisGen, BasisMethod, ComposeState,
    MhSampler, MhState, MultiSigState, SamplingStats, SearchError, SigFuncGen, SigFuncState,
};
pub use sigfunc::{FuncVect, SigFunc, MAX_OUTPUT_WIDTH};
pub use variable::Variable;
