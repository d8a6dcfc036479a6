//! Collaborator contracts consumed by the time-integration orchestrator.
//!
//! Transport solvers and result storage live outside the engine. Each trait
//! has an associated error type so implementations keep their own error
//! enums; the orchestrator boxes them on the way out.

use std::error::Error as StdError;

use uom::si::f64::Power;

use crate::{
    BurnableMaterial, Capabilities, CompBundle, Cursor, IntermediateFlux, ReactionRates,
    TransportResult, Zai,
};

/// Shape of a run, handed to every collaborator before the main sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct RunLayout {
    /// High-fidelity evaluations, one per coarse step plus the terminal one.
    pub high_fidelity_solves: usize,

    /// All transport evaluations, `sum(substeps) + 1`.
    pub transport_solves: usize,

    /// Energy groups in reported fluxes.
    pub groups: usize,

    pub isotopes: Vec<Zai>,
    pub materials: Vec<BurnableMaterial>,
}

/// Expensive transport solver run at the start of every coarse step.
pub trait HighFidelitySolver {
    type Error: StdError + Send + Sync + 'static;

    /// Capabilities this solver can provide.
    fn features(&self) -> Capabilities;

    /// Told which capabilities the run will consume, before any solve.
    ///
    /// # Errors
    ///
    /// Implementations may reject needs they cannot configure.
    fn set_hooks(&mut self, _needs: &Capabilities) -> Result<(), Self::Error> {
        Ok(())
    }

    /// # Errors
    ///
    /// Implementations report setup failures.
    fn before_main(&mut self, _layout: &RunLayout) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Beginning-of-step evaluation.
    ///
    /// # Errors
    ///
    /// Any failure of the underlying solve.
    fn bos_solve(
        &mut self,
        compositions: &CompBundle,
        cursor: &Cursor,
        power: Power,
    ) -> Result<TransportResult, Self::Error>;

    /// Terminal evaluation after the last coarse step.
    ///
    /// Defaults to [`HighFidelitySolver::bos_solve`].
    ///
    /// # Errors
    ///
    /// Any failure of the underlying solve.
    fn eol_solve(
        &mut self,
        compositions: &CompBundle,
        cursor: &Cursor,
        power: Power,
    ) -> Result<TransportResult, Self::Error> {
        self.bos_solve(compositions, cursor, power)
    }

    /// Releases resources. Always called once the run ends.
    fn finalize(&mut self, _success: bool) {}
}

/// Cheap transport approximation run between high-fidelity evaluations.
pub trait ReducedOrderSolver {
    type Error: StdError + Send + Sync + 'static;

    /// Capabilities the high-fidelity solver must provide.
    fn needs(&self) -> Capabilities {
        Capabilities::new()
    }

    /// # Errors
    ///
    /// Implementations report setup failures.
    fn before_main(&mut self, _layout: &RunLayout) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Receives each beginning-of-step high-fidelity result.
    ///
    /// # Errors
    ///
    /// Implementations report processing failures.
    fn process_bos(
        &mut self,
        result: &TransportResult,
        cursor: &Cursor,
        power: Power,
    ) -> Result<(), Self::Error>;

    /// Evaluation at a sub-step, with cross sections extrapolated to the
    /// cursor's time.
    ///
    /// Fission yields in the result, one set per material, replace the
    /// high-fidelity ones for the rest of the coarse step.
    ///
    /// # Errors
    ///
    /// Any failure of the underlying solve.
    fn substep_solve(
        &mut self,
        cursor: &Cursor,
        compositions: &CompBundle,
        micro_xs: &[ReactionRates],
    ) -> Result<TransportResult, Self::Error>;

    /// Evaluation inside a stepping scheme, at a time the cursor has not
    /// reached yet.
    ///
    /// Defaults to [`ReducedOrderSolver::substep_solve`].
    ///
    /// # Errors
    ///
    /// Any failure of the underlying solve.
    fn intermediate_solve(
        &mut self,
        cursor: &Cursor,
        compositions: &CompBundle,
        micro_xs: &[ReactionRates],
    ) -> Result<IntermediateFlux, Self::Error> {
        self.substep_solve(cursor, compositions, micro_xs)
            .map(IntermediateFlux::from)
    }

    /// Releases resources. Always called once the run ends.
    fn finalize(&mut self, _success: bool) {}
}

/// Receives compositions and transport results as the run progresses.
pub trait Store {
    type Error: StdError + Send + Sync + 'static;

    /// # Errors
    ///
    /// Implementations report setup failures.
    fn before_main(&mut self, layout: &RunLayout) -> Result<(), Self::Error>;

    /// # Errors
    ///
    /// Implementations report write failures.
    fn post_transport(&mut self, cursor: &Cursor, result: &TransportResult)
    -> Result<(), Self::Error>;

    /// # Errors
    ///
    /// Implementations report write failures.
    fn write_compositions(
        &mut self,
        cursor: &Cursor,
        compositions: &CompBundle,
    ) -> Result<(), Self::Error>;
}
