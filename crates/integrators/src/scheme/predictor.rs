use burnup_core::{CompBundle, Cursor, FissionYields, ReducedOrderSolver, TimeIncrement};

use super::{Coupling, Scheme};
use crate::Error;

/// Depletes across the interval with beginning-of-step reaction rates.
///
/// One depletion, no intermediate transport evaluations.
#[derive(Debug, Clone, Copy, Default)]
pub struct Predictor;

impl Scheme for Predictor {
    fn name(&self) -> &'static str {
        "predictor"
    }

    fn step<R: ReducedOrderSolver>(
        &self,
        coupling: &mut Coupling<'_, R>,
        cursor: &Cursor,
        dt: TimeIncrement,
        compositions: &CompBundle,
        flux: &[f64],
        yields: &[FissionYields],
    ) -> Result<CompBundle, Error> {
        let rates = coupling.rates_at(cursor.seconds(), flux)?;
        coupling.deplete(dt, compositions, &rates, yields)
    }
}
