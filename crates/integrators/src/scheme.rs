//! Stepping schemes that advance compositions across one depletion interval.
//!
//! Every scheme starts from the beginning-of-interval compositions and ends
//! with one depletion over the full interval using some combination of
//! reaction rates. Intermediate compositions only drive intermediate
//! transport evaluations; they are never persisted.

mod celi;
mod predictor;
mod rk4;

pub use celi::Celi;
pub use predictor::Predictor;
pub use rk4::Rk4;

use burnup_core::{
    CompBundle, Cursor, FissionYields, ReactionRates, ReducedOrderSolver, TimeIncrement,
};
use burnup_solvers::Coordinator;

use crate::Error;

/// A strategy for producing end-of-interval compositions.
pub trait Scheme {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    /// Advances `compositions` from the cursor's time through `dt`.
    ///
    /// `flux` and `yields` come from the most recent transport evaluation.
    ///
    /// # Errors
    ///
    /// Propagates cache, depletion, and reduced-order solver failures.
    fn step<R: ReducedOrderSolver>(
        &self,
        coupling: &mut Coupling<'_, R>,
        cursor: &Cursor,
        dt: TimeIncrement,
        compositions: &CompBundle,
        flux: &[f64],
        yields: &[FissionYields],
    ) -> Result<CompBundle, Error>;
}

/// Access to the depletion coordinator and reduced-order solver during a
/// scheme step.
pub struct Coupling<'a, R> {
    coordinator: &'a mut Coordinator,
    reduced: &'a mut R,
    intermediate_solves: usize,
    depletions: usize,
}

impl<'a, R: ReducedOrderSolver> Coupling<'a, R> {
    pub(crate) fn new(coordinator: &'a mut Coordinator, reduced: &'a mut R) -> Self {
        Self {
            coordinator,
            reduced,
            intermediate_solves: 0,
            depletions: 0,
        }
    }

    /// Reaction rates at `time` seconds for the given fluxes.
    ///
    /// # Errors
    ///
    /// Fails if the cross-section cache cannot be evaluated.
    pub fn rates_at(&mut self, time: f64, flux: &[f64]) -> Result<Vec<ReactionRates>, Error> {
        Ok(self.coordinator.reaction_rates_at(time, flux)?)
    }

    /// Depletes `compositions` through `dt` at constant `rates`.
    ///
    /// # Errors
    ///
    /// Propagates [`Coordinator::deplete`] failures.
    pub fn deplete(
        &mut self,
        dt: TimeIncrement,
        compositions: &CompBundle,
        rates: &[ReactionRates],
        yields: &[FissionYields],
    ) -> Result<CompBundle, Error> {
        self.depletions += 1;
        Ok(self.coordinator.deplete(dt, compositions, rates, yields)?)
    }

    /// Flux from a reduced-order evaluation of `compositions` at `time`
    /// seconds, using cross sections extrapolated to that time.
    ///
    /// # Errors
    ///
    /// Fails if the solver fails or returns a negative flux.
    pub fn intermediate_flux(
        &mut self,
        cursor: &Cursor,
        time: f64,
        compositions: &CompBundle,
    ) -> Result<Vec<f64>, Error> {
        let micro_xs = self.coordinator.micro_xs_at(time)?;
        let result = self
            .reduced
            .intermediate_solve(cursor, compositions, &micro_xs)
            .map_err(Error::reduced_order)?;
        self.intermediate_solves += 1;

        if result.flux.iter().any(|&phi| phi < 0.0) {
            return Err(Error::NegativeFlux { cursor: *cursor });
        }
        Ok(result.flux)
    }

    pub(crate) fn counts(&self) -> (usize, usize) {
        (self.intermediate_solves, self.depletions)
    }
}

/// Weighted sum of per-material reaction rates.
///
/// Each term pairs a weight with one vector per material.
///
/// # Errors
///
/// Fails if the vectors of one material use different reaction indices.
pub fn combine(terms: &[(f64, &[ReactionRates])]) -> Result<Vec<ReactionRates>, Error> {
    let materials = terms.first().map_or(0, |(_, rates)| rates.len());
    (0..materials)
        .map(|m| {
            let weighted: Vec<(f64, &ReactionRates)> =
                terms.iter().map(|&(w, rates)| (w, &rates[m])).collect();
            Ok(ReactionRates::linear_combination(&weighted)?)
        })
        .collect()
}
