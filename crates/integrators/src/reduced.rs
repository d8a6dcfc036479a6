use burnup_core::{CompBundle, Cursor, ReactionRates, ReducedOrderSolver, TransportResult};
use thiserror::Error;
use uom::si::f64::Power;

/// The reduced-order solver was asked for a flux before any
/// beginning-of-step result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("no beginning-of-step result to hold constant")]
pub struct NoBeginningOfStep;

/// Reduced-order solver that holds the last beginning-of-step flux
/// constant across the coarse step.
///
/// It needs nothing beyond what depletion already consumes, so it pairs
/// with any high-fidelity solver.
#[derive(Debug, Clone, Default)]
pub struct ConstantFluxSolver {
    flux: Option<Vec<f64>>,
}

impl ConstantFluxSolver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Flux held from the latest beginning-of-step result.
    #[must_use]
    pub fn flux(&self) -> Option<&[f64]> {
        self.flux.as_deref()
    }
}

impl ReducedOrderSolver for ConstantFluxSolver {
    type Error = NoBeginningOfStep;

    fn process_bos(
        &mut self,
        result: &TransportResult,
        _cursor: &Cursor,
        _power: Power,
    ) -> Result<(), Self::Error> {
        self.flux = Some(result.flux.clone());
        Ok(())
    }

    fn substep_solve(
        &mut self,
        _cursor: &Cursor,
        _compositions: &CompBundle,
        _micro_xs: &[ReactionRates],
    ) -> Result<TransportResult, Self::Error> {
        self.flux
            .clone()
            .map(TransportResult::new)
            .ok_or(NoBeginningOfStep)
    }

    fn finalize(&mut self, _success: bool) {
        self.flux = None;
    }
}
