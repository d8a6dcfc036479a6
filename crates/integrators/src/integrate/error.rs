use std::error::Error as StdError;

use burnup_core::{Cursor, IncompatibilityError, RatesError};
use burnup_solvers::DepletionError;

/// Errors that can occur during a coupled depletion run.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Incompatible(#[from] IncompatibilityError),

    #[error("high-fidelity solver error: {0}")]
    HighFidelity(#[source] Box<dyn StdError + Send + Sync>),

    #[error("reduced-order solver error: {0}")]
    ReducedOrder(#[source] Box<dyn StdError + Send + Sync>),

    #[error("store error: {0}")]
    Store(#[source] Box<dyn StdError + Send + Sync>),

    #[error(transparent)]
    Depletion(#[from] DepletionError),

    #[error(transparent)]
    Rates(#[from] RatesError),

    #[error("negative fluxes obtained at {cursor}")]
    NegativeFlux { cursor: Cursor },

    #[error("transport result at {cursor} is missing {what}")]
    MissingData { what: &'static str, cursor: Cursor },

    #[error("reduced-order result at {cursor} holds {found} fission yield sets, expected {expected}")]
    YieldCount {
        expected: usize,
        found: usize,
        cursor: Cursor,
    },
}

impl Error {
    pub(crate) fn high_fidelity<E: StdError + Send + Sync + 'static>(err: E) -> Self {
        Self::HighFidelity(Box::new(err))
    }

    pub(crate) fn reduced_order<E: StdError + Send + Sync + 'static>(err: E) -> Self {
        Self::ReducedOrder(Box::new(err))
    }

    pub(crate) fn store<E: StdError + Send + Sync + 'static>(err: E) -> Self {
        Self::Store(Box::new(err))
    }
}
