//! Retry-and-widen build drivers.
//!
//! Realization failures are expected; the drivers draw fresh signature
//! functions up to `count_limit` times per output width, then widen by one
//! bit, up to `extra_width` times:
//!
//! ```text
//! for p in p0 ..= p0 + extra_width:
//!     for attempt in 0 .. count_limit:
//!         funcs ← candidates(p)
//!         realize(funcs)?  → done
//! Infeasible
//! ```

use crate::config::{BuildConfig, FuncSource};
use crate::error::BuildError;
use crate::partition::{Partition, Partitioner};
use crate::phf::{PhfGraph, PhfTables};
use crate::regvect::{RegVect, VectorStore};
use crate::search::{random_hash_func, random_sig_funcs, BasisGen, SearchError, SigFuncGen};
use crate::sigfunc::{FuncVect, SigFunc, MAX_OUTPUT_WIDTH};
use crate::variable::Variable;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Signature functions plus peeled XOR tables.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhfIndex {
    pub funcs: Vec<SigFunc>,
    pub tables: PhfTables,
}

impl PhfIndex {
    /// Row index of a registered vector.
    ///
    /// Vectors outside the registered set map to an arbitrary value.
    pub fn lookup(&self, rv: &RegVect) -> u32 {
        let values: Vec<u32> = self.funcs.iter().map(|f| f.eval(rv)).collect();
        self.tables.lookup(&values)
    }

    /// Output width of the signature functions.
    pub fn width(&self) -> usize {
        self.funcs.first().map_or(0, SigFunc::output_width)
    }

    /// Total number of table entries.
    pub fn table_entries(&self) -> usize {
        self.tables.tables().iter().map(Vec::len).sum()
    }
}

/// Signature functions plus the chosen function of every vector.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionIndex {
    pub funcs: Vec<SigFunc>,
    pub partition: Partition,
}

impl PartitionIndex {
    /// Function index of each registered vector.
    pub fn mapping(&self) -> &[usize] {
        self.partition.mapping()
    }

    pub fn width(&self) -> usize {
        self.funcs.first().map_or(0, SigFunc::output_width)
    }

    /// Slot `(function, value)` held by registered vector `rv`.
    pub fn slot_of(&self, rv: &RegVect) -> (usize, u32) {
        let j = self.partition.mapping()[rv.index()];
        (j, self.funcs[j].eval(rv))
    }
}

/// Where candidate function sets come from, prepared once per build.
enum Source {
    Random,
    Basis(Vec<Variable>),
    Mcmc(Vec<Variable>),
}

impl Source {
    fn prepare<S, R>(store: &S, config: &BuildConfig, rng: &mut R) -> Result<Self, BuildError>
    where
        S: VectorStore + ?Sized,
        R: Rng + ?Sized,
    {
        if config.source == FuncSource::Random {
            return Ok(Source::Random);
        }
        let gen = BasisGen::new(config.method, config.fitness, config.search.clone());
        let vars: Vec<Variable> = gen
            .generate(store, config.basis_size, rng)?
            .into_iter()
            .map(|(var, _)| var)
            .collect();
        tracing::debug!(basis = vars.len(), "variable basis ready");
        Ok(match config.source {
            FuncSource::Basis => Source::Basis(vars),
            _ => Source::Mcmc(vars),
        })
    }

    /// Widest signature this source can produce for `store`.
    fn max_width<S: VectorStore + ?Sized>(&self, store: &S) -> usize {
        let limit = match self {
            Source::Random => store.vector_width(),
            Source::Basis(vars) | Source::Mcmc(vars) => vars.len(),
        };
        limit.min(MAX_OUTPUT_WIDTH)
    }

    /// Up to `count` candidate sets of `m` functions of width `p`.
    fn candidates<S, R>(
        &self,
        store: &S,
        config: &BuildConfig,
        p: usize,
        m: usize,
        count: usize,
        rng: &mut R,
    ) -> Result<Vec<Vec<SigFunc>>, BuildError>
    where
        S: VectorStore + ?Sized,
        R: Rng + ?Sized,
    {
        let n = store.vector_width();
        Ok(match self {
            Source::Random => (0..count)
                .map(|_| {
                    (0..m)
                        .map(|_| random_hash_func(n, p, config.xor_degree, rng))
                        .collect::<Vec<SigFunc>>()
                })
                .collect(),
            Source::Basis(vars) => (0..count)
                .map(|_| random_sig_funcs(vars, p, m, rng))
                .collect::<Result<Vec<_>, SearchError>>()?,
            Source::Mcmc(vars) => SigFuncGen::new(p, m, config.search.clone())
                .generate(store, vars, count, rng)?
                .into_iter()
                .map(|(funcs, _)| funcs)
                .collect(),
        })
    }
}

fn evaluate<S: VectorStore + ?Sized>(store: &S, funcs: &[SigFunc]) -> Vec<FuncVect> {
    funcs.iter().map(|f| f.func_vect(store.vectors())).collect()
}

/// Run the retry-and-widen loop from width `p0`, realizing with `realize`.
fn search_widths<S, R, T, F>(
    store: &S,
    config: &BuildConfig,
    p0: usize,
    m: usize,
    rng: &mut R,
    mut realize: F,
) -> Result<T, BuildError>
where
    S: VectorStore + ?Sized,
    R: Rng + ?Sized,
    F: FnMut(Vec<SigFunc>, &[FuncVect]) -> Option<T>,
{
    let source = Source::prepare(store, config, rng)?;
    let max_width = (p0 + config.extra_width).min(source.max_width(store));
    let mut attempts = 0;
    for p in p0..=max_width {
        let sets = source.candidates(store, config, p, m, config.count_limit, rng)?;
        for funcs in sets {
            attempts += 1;
            let fvs = evaluate(store, &funcs);
            if let Some(done) = realize(funcs, &fvs) {
                tracing::debug!(width = p, attempts, "realization found");
                return Ok(done);
            }
        }
        tracing::debug!(width = p, attempts, "widening signature");
    }
    Err(BuildError::Infeasible {
        attempts,
        max_width,
    })
}

/// XOR perfect-hash index of every registered vector.
///
/// # Examples
///
/// ```
/// use rand::SeedableRng;
/// use xorphf::{build_phf, BuildConfig, RvMgr, VectorStore};
///
/// let mut rng = rand::rngs::StdRng::seed_from_u64(3);
/// let store = RvMgr::random(20, 50, &mut rng);
/// let index = build_phf(&store, &BuildConfig::quick(), &mut rng).unwrap();
/// for rv in store.vectors() {
///     assert_eq!(index.lookup(rv) as usize, rv.index());
/// }
/// ```
pub fn build_phf<S, R>(store: &S, config: &BuildConfig, rng: &mut R) -> Result<PhfIndex, BuildError>
where
    S: VectorStore + ?Sized,
    R: Rng + ?Sized,
{
    assert!(config.degree > 0, "degree must be positive");
    let p0 = store.index_size();
    search_widths(store, config, p0, config.degree, rng, |funcs, fvs| {
        match PhfGraph::new(fvs).mapping() {
            Ok(tables) => Some(PhfIndex { funcs, tables }),
            Err(e) => {
                tracing::trace!(error = %e, "peeling failed");
                None
            }
        }
    })
}

/// Collision-free partition of every registered vector over
/// `config.multiplicity` functions.
pub fn build_partition<S, R>(
    store: &S,
    config: &BuildConfig,
    rng: &mut R,
) -> Result<PartitionIndex, BuildError>
where
    S: VectorStore + ?Sized,
    R: Rng + ?Sized,
{
    let m = config.multiplicity;
    assert!(m > 0, "multiplicity must be positive");
    let mut p0 = 0;
    while (m << p0) < store.len() {
        p0 += 1;
    }
    let mut partitioner = Partitioner::new();
    search_widths(store, config, p0, m, rng, |funcs, fvs| {
        match partitioner.cf_partition(fvs) {
            Ok(partition) => Some(PartitionIndex { funcs, partition }),
            Err(e) => {
                tracing::trace!(error = %e, "partition failed");
                None
            }
        }
    })
}

// ============================================================================
// TESTS
// ============================================================================
