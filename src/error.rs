//! Realization and build failures.
//!
//! Every variant here is an expected outcome of a heuristic attempt: the
//! caller discards the signature functions that produced it and resamples.

use crate::search::SearchError;
use std::fmt;

/// Why a set of signature functions could not be realized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RealizeError {
    /// Vectors `first` and `second` map to the same tuple of node values.
    DuplicateHyperedge { first: usize, second: usize },
    /// Peeling stalled with `remaining` edges left on a cycle.
    CyclicHypergraph { remaining: usize },
    /// No displacement value places every vector of bucket `bucket`.
    DisplacementExhausted { bucket: u32 },
    /// No augmenting path frees a slot for vector `vector`.
    PartitionExhausted { vector: usize },
}

impl fmt::Display for RealizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RealizeError::DuplicateHyperedge { first, second } => write!(
                f,
                "vectors {} and {} share every signature value",
                first, second
            ),
            RealizeError::CyclicHypergraph { remaining } => {
                write!(f, "hypergraph is cyclic ({} edges left unpeeled)", remaining)
            }
            RealizeError::DisplacementExhausted { bucket } => {
                write!(f, "no displacement fits bucket {}", bucket)
            }
            RealizeError::PartitionExhausted { vector } => {
                write!(f, "no free slot reachable for vector {}", vector)
            }
        }
    }
}

impl std::error::Error for RealizeError {}

/// Failure of a bounded retry-and-widen build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// Candidate generation failed before any realization was tried.
    Search(SearchError),
    /// Every attempt up to `max_width` output bits failed.
    Infeasible { attempts: usize, max_width: usize },
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildError::Search(e) => write!(f, "search failed: {}", e),
            BuildError::Infeasible { attempts, max_width } => write!(
                f,
                "no collision-free realization after {} attempts (widths up to {})",
                attempts, max_width
            ),
        }
    }
}

impl std::error::Error for BuildError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BuildError::Search(e) => Some(e),
            BuildError::Infeasible { .. } => None,
        }
    }
}

impl From<SearchError> for BuildError {
    fn from(e: SearchError) -> Self {
        BuildError::Search(e)
    }
}
