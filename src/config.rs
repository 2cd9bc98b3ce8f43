//! Search and build configuration.
//!
//! Both structs round-trip through JSON so a run can be reproduced from a
//! config file plus a seed.

use crate::fitness::Fitness;
use crate::search::BasisMethod;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;

/// Metropolis-Hastings chain parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Burn-in transitions before the first recorded sample
    pub warmup: usize,
    /// Extra transitions between recorded samples (0 = record every step)
    pub interval: usize,
    /// Minimum number of recorded samples
    pub sample_count: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            warmup: 100,
            interval: 2,
            sample_count: 500,
        }
    }
}

impl SearchConfig {
    /// Short chains for small datasets and tests
    pub fn quick() -> Self {
        SearchConfig {
            warmup: 10,
            interval: 0,
            sample_count: 100,
        }
    }

    /// Long, well-thinned chains
    pub fn thorough() -> Self {
        SearchConfig {
            warmup: 1_000,
            interval: 10,
            sample_count: 5_000,
        }
    }

    /// Samples to record when `req_num` results are wanted.
    pub fn samples_for(&self, req_num: usize) -> usize {
        self.sample_count.max(req_num * 5)
    }
}

/// Where the build driver takes its signature functions from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FuncSource {
    /// Random XOR hash functions of bounded degree
    Random,
    /// Random subsets of a searched variable basis
    Basis,
    /// Metropolis-sampled balanced tuples over a searched basis
    Mcmc,
}

/// Retry/widening policy and generator choices of the build driver.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Number of signature functions per hyperedge (peeling)
    pub degree: usize,
    /// Number of signature functions a vector may be placed through (partition)
    pub multiplicity: usize,
    /// Maximum number of inputs XOR-ed into one random hash output
    pub xor_degree: usize,
    /// Attempts per signature width before widening
    pub count_limit: usize,
    /// How many times the width may grow past its starting value
    pub extra_width: usize,
    /// Size of the searched variable basis
    pub basis_size: usize,
    pub source: FuncSource,
    pub method: BasisMethod,
    pub fitness: Fitness,
    pub search: SearchConfig,
}

impl Default for BuildConfig {
    fn default() -> Self {
        BuildConfig {
            degree: 3,
            multiplicity: 2,
            xor_degree: 2,
            count_limit: 1_000,
            extra_width: 4,
            basis_size: 64,
            source: FuncSource::Random,
            method: BasisMethod::Mcmc,
            fitness: Fitness::Product,
            search: SearchConfig::default(),
        }
    }
}

impl BuildConfig {
    pub fn quick() -> Self {
        BuildConfig {
            count_limit: 100,
            basis_size: 32,
            search: SearchConfig::quick(),
            ..Self::default()
        }
    }

    pub fn thorough() -> Self {
        BuildConfig {
            count_limit: 10_000,
            extra_width: 8,
            basis_size: 256,
            search: SearchConfig::thorough(),
            ..Self::default()
        }
    }

    /// Load from a JSON file; missing fields take their defaults.
    pub fn load_json<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let file = File::open(path)?;
        serde_json::from_reader(BufReader::new(file))
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}
