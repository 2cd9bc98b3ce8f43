//! Signature-function generators.

use super::{MhSampler, MultiSigState, SearchError};
use crate::config::SearchConfig;
use crate::pool::VarPool;
use crate::regvect::VectorStore;
use crate::sigfunc::{SigFunc, MAX_OUTPUT_WIDTH};
use crate::variable::Variable;
use rand::seq::index;
use rand::Rng;

/// Metropolis search for `multiplicity` balanced `width`-variable functions.
#[derive(Clone, Debug)]
pub struct SigFuncGen {
    pub width: usize,
    pub multiplicity: usize,
    pub search: SearchConfig,
}

impl SigFuncGen {
    pub fn new(width: usize, multiplicity: usize, search: SearchConfig) -> Self {
        Self {
            width,
            multiplicity,
            search,
        }
    }

    /// Up to `req_num` distinct function sets drawn from `vars`, best first.
    pub fn generate<S, R>(
        &self,
        store: &S,
        vars: &[Variable],
        req_num: usize,
        rng: &mut R,
    ) -> Result<Vec<(Vec<SigFunc>, f64)>, SearchError>
    where
        S: VectorStore + ?Sized,
        R: Rng + ?Sized,
    {
        let mut pool = VarPool::new(req_num);
        let mut state = MultiSigState::new(
            vars,
            self.width,
            self.multiplicity,
            store.vectors(),
            &mut pool,
        )?;
        let stats = MhSampler::new().sampling(
            &mut state,
            self.search.warmup,
            self.search.interval,
            self.search.samples_for(req_num),
            rng,
        )?;
        tracing::debug!(
            width = self.width,
            multiplicity = self.multiplicity,
            accepted = stats.accepted,
            found = pool.len(),
            "signature search finished"
        );
        Ok(pool.into_sorted_vec())
    }
}

/// `m` functions, each an independent random `width`-subset of `vars`.
pub fn random_sig_funcs<R: Rng + ?Sized>(
    vars: &[Variable],
    width: usize,
    m: usize,
    rng: &mut R,
) -> Result<Vec<SigFunc>, SearchError> {
    if vars.len() < width {
        return Err(SearchError::TooFewCandidates {
            needed: width,
            available: vars.len(),
        });
    }
    Ok((0..m)
        .map(|_| {
            let picked = index::sample(rng, vars.len(), width)
                .into_iter()
                .map(|i| vars[i].clone())
                .collect();
            SigFunc::new(picked)
        })
        .collect())
}

/// Random XOR hash function with `output_width` outputs over `input_width` bits.
///
/// Output `i` owns a distinct pivot input bit and XORs in up to
/// `xor_degree - 1` further non-pivot bits, so the outputs are linearly
/// independent.
///
/// # Examples
///
/// ```
/// use xorphf::random_hash_func;
///
/// let mut rng = rand::thread_rng();
/// let f = random_hash_func(16, 4, 3, &mut rng);
/// assert_eq!(f.output_width(), 4);
/// assert!(f.vars().iter().all(|v| (1..=3).contains(&v.degree())));
/// ```
pub fn random_hash_func<R: Rng + ?Sized>(
    input_width: usize,
    output_width: usize,
    xor_degree: usize,
    rng: &mut R,
) -> SigFunc {
    assert!(output_width <= input_width, "more outputs than input bits");
    assert!(output_width <= MAX_OUTPUT_WIDTH, "signature too wide");

    let pivots = index::sample(rng, input_width, output_width).into_vec();
    let mut is_pivot = vec![false; input_width];
    for &p in &pivots {
        is_pivot[p] = true;
    }
    let free: Vec<usize> = (0..input_width).filter(|&b| !is_pivot[b]).collect();

    let vars = pivots
        .iter()
        .map(|&pivot| {
            let mut var = Variable::primary(input_width, pivot);
            let extra = if xor_degree > 1 {
                rng.gen_range(0..xor_degree).min(free.len())
            } else {
                0
            };
            for i in index::sample(rng, free.len(), extra).into_iter() {
                var *= &Variable::primary(input_width, free[i]);
            }
            var
        })
        .collect();
    SigFunc::new(vars)
}
