use burnup_core::{CacheError, CompositionError};
use thiserror::Error;

use crate::{NegativeDensity, OdeError, PolicyError};

/// Errors that can occur while configuring or running the coordinator.
#[derive(Debug, Error)]
pub enum Error {
    #[error(
        "got {compositions} material compositions, {rates} reaction-rate vectors and {yields} fission-yield sets"
    )]
    MismatchedLengths {
        compositions: usize,
        rates: usize,
        yields: usize,
    },

    #[error("initial compositions cover {found} materials, expected {expected}")]
    MaterialCount { expected: usize, found: usize },

    #[error("negative densities reach {percent}% of the positive density, limit is {threshold}%")]
    NegativeDensity { percent: f64, threshold: f64 },

    #[error("depletion solve failed for material {material}: {source}")]
    Solver {
        material: usize,
        #[source]
        source: OdeError,
    },

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Composition(#[from] CompositionError),

    #[error(transparent)]
    Policy(#[from] PolicyError),
}

impl From<NegativeDensity> for Error {
    fn from(err: NegativeDensity) -> Self {
        Self::NegativeDensity {
            percent: err.percent,
            threshold: err.threshold,
        }
    }
}
