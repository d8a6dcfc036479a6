//! Time-integration orchestrator.
//!
//! The [`Integrator`] marches a [`Schedule`](burnup_core::Schedule) of coarse steps, alternating
//! between an expensive high-fidelity transport solver at every coarse
//! boundary and a cheap reduced-order solver at the sub-steps in between.
//! Compositions are advanced by a pluggable [`Scheme`] and depleted by the
//! [`Coordinator`].
//!
//! # Example
//!
//! ```ignore
//! use burnup_integrators::{ConstantFluxSolver, Integrator, MemoryStore, Rk4};
//!
//! let mut integrator =
//!     Integrator::new(transport, ConstantFluxSolver::new(), coordinator, MemoryStore::new(), Rk4)?;
//! let summary = integrator.run(Time::new::<day>(0.0))?;
//!
//! println!("{} transport solves", summary.transport_solves());
//! ```

mod error;

pub use error::Error;

use std::fmt;

use burnup_core::{
    Advance, CompBundle, Cursor, FissionYields, HighFidelitySolver, ReducedOrderSolver, RunLayout,
    Store, TimeIncrement, TransportResult,
};
use burnup_solvers::Coordinator;
use uom::si::f64::Time;

use crate::scheme::{Coupling, Predictor, Scheme};

/// Which part of the main sequence a coarse step runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// High-fidelity only; depleted with a single predictor call.
    Preliminary,

    /// High-fidelity at the boundary, reduced-order at the sub-steps.
    Coupled,

    /// The last high-fidelity evaluation, after every coarse step.
    Terminal,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Preliminary => "preliminary",
            Self::Coupled => "coupled",
            Self::Terminal => "terminal",
        };
        f.write_str(name)
    }
}

/// Counts gathered over a completed run.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    /// Cursor after the terminal evaluation.
    pub cursor: Cursor,

    /// Beginning-of-step and terminal high-fidelity evaluations.
    pub high_fidelity_solves: usize,

    /// Reduced-order evaluations at sub-step boundaries.
    pub reduced_order_solves: usize,

    /// Reduced-order evaluations inside stepping schemes.
    pub intermediate_solves: usize,

    /// Calls into the depletion coordinator.
    pub depletions: usize,
}

impl Summary {
    fn new(cursor: Cursor) -> Self {
        Self {
            cursor,
            high_fidelity_solves: 0,
            reduced_order_solves: 0,
            intermediate_solves: 0,
            depletions: 0,
        }
    }

    /// Transport evaluations at calendar points, `sum(substeps) + 1`.
    #[must_use]
    pub fn transport_solves(&self) -> usize {
        self.high_fidelity_solves + self.reduced_order_solves
    }
}

/// Couples a high-fidelity and a reduced-order transport solver to the
/// depletion coordinator.
#[derive(Debug)]
pub struct Integrator<H, R, St, Sc> {
    high: H,
    reduced: R,
    coordinator: Coordinator,
    store: St,
    scheme: Sc,
}

/// Flux and fission yields carried from one transport evaluation to the
/// next scheme step.
struct Feed {
    flux: Vec<f64>,
    yields: Vec<FissionYields>,
}

/// Stepping scheme used by [`Integrator::advance`].
#[derive(Debug, Clone, Copy)]
enum Stepper {
    Predictor,
    Configured,
}

impl<H, R, St, Sc> Integrator<H, R, St, Sc>
where
    H: HighFidelitySolver,
    R: ReducedOrderSolver,
    St: Store,
    Sc: Scheme,
{
    /// Pairs the collaborators for a run.
    ///
    /// # Errors
    ///
    /// Fails if the high-fidelity solver lacks a capability needed by the
    /// coordinator or the reduced-order solver.
    pub fn new(
        high: H,
        reduced: R,
        coordinator: Coordinator,
        store: St,
        scheme: Sc,
    ) -> Result<Self, Error> {
        let needs = coordinator.needs().union(&reduced.needs());
        high.features().require(&needs)?;

        Ok(Self {
            high,
            reduced,
            coordinator,
            store,
            scheme,
        })
    }

    #[must_use]
    pub fn coordinator(&self) -> &Coordinator {
        &self.coordinator
    }

    #[must_use]
    pub fn store(&self) -> &St {
        &self.store
    }

    #[must_use]
    pub fn scheme(&self) -> &Sc {
        &self.scheme
    }

    /// Releases the collaborators.
    pub fn into_parts(self) -> (H, R, Coordinator, St) {
        (self.high, self.reduced, self.coordinator, self.store)
    }

    /// Runs the whole schedule starting at `start`.
    ///
    /// The `finalize` hooks of both solvers and the coordinator run whether
    /// or not the main sequence succeeds.
    ///
    /// # Errors
    ///
    /// Any collaborator failure, negative flux, or fatal negative density
    /// aborts the run.
    pub fn run(&mut self, start: Time) -> Result<Summary, Error> {
        let outcome = self.main_sequence(start);
        let success = outcome.is_ok();

        self.high.finalize(success);
        self.reduced.finalize(success);
        self.coordinator.finalize(success);

        if let Err(err) = &outcome {
            log::debug!("run aborted: {err}");
        }
        outcome
    }

    /// # Algorithm
    ///
    /// 1. Configure the collaborators and persist the initial compositions.
    /// 2. For each coarse step:
    ///    - Evaluate the high-fidelity solver and feed the cross-section cache.
    ///    - Preliminary steps deplete across the whole step with the
    ///      predictor and never touch the reduced-order solver.
    ///    - Coupled steps take `substeps - 1` scheme steps, each followed by
    ///      a reduced-order evaluation, then one final scheme step onto the
    ///      coarse boundary. Reduced-order fission yields, when present,
    ///      replace the high-fidelity ones for the later scheme steps.
    /// 3. Evaluate the high-fidelity solver once more at the end.
    fn main_sequence(&mut self, start: Time) -> Result<Summary, Error> {
        let needs = self.coordinator.needs().union(&self.reduced.needs());
        self.high.set_hooks(&needs).map_err(Error::high_fidelity)?;
        self.coordinator.before_main();

        let schedule = self.coordinator.schedule().clone();
        let layout = RunLayout {
            high_fidelity_solves: schedule.high_fidelity_solves(),
            transport_solves: schedule.transport_solves(),
            groups: 1,
            isotopes: self.coordinator.initial_compositions().isotopes().to_vec(),
            materials: self.coordinator.materials().to_vec(),
        };
        self.high
            .before_main(&layout)
            .map_err(Error::high_fidelity)?;
        self.reduced
            .before_main(&layout)
            .map_err(Error::reduced_order)?;
        self.store.before_main(&layout).map_err(Error::store)?;

        log::info!(
            "starting {} run: {} coarse steps ({} preliminary), {} transport solves",
            self.scheme.name(),
            schedule.len(),
            schedule.preliminary(),
            layout.transport_solves,
        );

        let mut cursor = Cursor::new(start);
        let mut summary = Summary::new(cursor);
        let mut compositions = self.coordinator.initial_compositions().clone();
        self.store
            .write_compositions(&cursor, &compositions)
            .map_err(Error::store)?;

        for (index, step) in schedule.steps().iter().enumerate() {
            let phase = if schedule.is_preliminary(index) {
                Phase::Preliminary
            } else {
                Phase::Coupled
            };

            // Beginning-of-step evaluation.
            let result = self
                .high
                .bos_solve(&compositions, &cursor, step.power())
                .map_err(Error::high_fidelity)?;
            summary.high_fidelity_solves += 1;
            self.record(&cursor, &result, phase)?;

            if phase == Phase::Coupled {
                self.reduced
                    .process_bos(&result, &cursor, step.power())
                    .map_err(Error::reduced_order)?;
            }
            let mut feed = self.absorb(&cursor, result)?;

            if phase == Phase::Preliminary {
                compositions = self.advance(
                    Stepper::Predictor,
                    &mut summary,
                    &mut cursor,
                    step.length(),
                    &compositions,
                    &feed,
                    Advance::Coarse,
                )?;
                continue;
            }

            let dt = step.substep_length();
            for _ in 1..step.substeps() {
                compositions = self.advance(
                    Stepper::Configured,
                    &mut summary,
                    &mut cursor,
                    dt,
                    &compositions,
                    &feed,
                    Advance::Substep,
                )?;

                // Reduced-order evaluation at the new sub-step.
                let micro_xs = self.coordinator.micro_xs_at(cursor.seconds())?;
                let result = self
                    .reduced
                    .substep_solve(&cursor, &compositions, &micro_xs)
                    .map_err(Error::reduced_order)?;
                summary.reduced_order_solves += 1;
                self.record(&cursor, &result, phase)?;

                feed.flux = result.flux;
                if let Some(yields) = result.fission_yields {
                    let expected = self.coordinator.materials().len();
                    if yields.len() != expected {
                        return Err(Error::YieldCount {
                            expected,
                            found: yields.len(),
                            cursor,
                        });
                    }
                    feed.yields = yields;
                }
            }

            compositions = self.advance(
                Stepper::Configured,
                &mut summary,
                &mut cursor,
                dt,
                &compositions,
                &feed,
                Advance::Coarse,
            )?;
        }

        // Terminal evaluation; nothing is integrated past it.
        let result = self
            .high
            .eol_solve(&compositions, &cursor, schedule.final_power())
            .map_err(Error::high_fidelity)?;
        summary.high_fidelity_solves += 1;
        self.record(&cursor, &result, Phase::Terminal)?;

        summary.cursor = cursor;
        log::info!(
            "finished at {:.4} d after {} transport solves",
            cursor.days(),
            summary.transport_solves(),
        );
        Ok(summary)
    }

    /// Logs and persists a transport result, then rejects negative fluxes.
    fn record(
        &mut self,
        cursor: &Cursor,
        result: &TransportResult,
        phase: Phase,
    ) -> Result<(), Error> {
        match result.keff {
            Some((keff, sigma)) => log::info!(
                "{phase} transport at {:.4} d: k = {keff:.6} +/- {sigma:.6}",
                cursor.days(),
            ),
            None => log::info!("{phase} transport at {:.4} d", cursor.days()),
        }

        self.store
            .post_transport(cursor, result)
            .map_err(Error::store)?;

        if result.has_negative_flux() {
            return Err(Error::NegativeFlux { cursor: *cursor });
        }
        Ok(())
    }

    /// Pushes a high-fidelity result's cross sections into the cache and
    /// keeps what the next scheme steps need.
    fn absorb(&mut self, cursor: &Cursor, result: TransportResult) -> Result<Feed, Error> {
        let micro_xs = result.micro_xs.ok_or(Error::MissingData {
            what: "microscopic cross sections",
            cursor: *cursor,
        })?;
        let yields = result.fission_yields.ok_or(Error::MissingData {
            what: "fission yields",
            cursor: *cursor,
        })?;

        self.coordinator.push_xs(cursor.seconds(), micro_xs)?;
        Ok(Feed {
            flux: result.flux,
            yields,
        })
    }

    /// Runs one scheme step, moves the cursor, and persists the result.
    #[allow(clippy::too_many_arguments)]
    fn advance(
        &mut self,
        stepper: Stepper,
        summary: &mut Summary,
        cursor: &mut Cursor,
        dt: TimeIncrement,
        compositions: &CompBundle,
        feed: &Feed,
        kind: Advance,
    ) -> Result<CompBundle, Error> {
        let mut coupling = Coupling::new(&mut self.coordinator, &mut self.reduced);
        let next = match stepper {
            Stepper::Predictor => Predictor.step(
                &mut coupling,
                cursor,
                dt,
                compositions,
                &feed.flux,
                &feed.yields,
            ),
            Stepper::Configured => self.scheme.step(
                &mut coupling,
                cursor,
                dt,
                compositions,
                &feed.flux,
                &feed.yields,
            ),
        }?;
        let (intermediate, depletions) = coupling.counts();
        summary.intermediate_solves += intermediate;
        summary.depletions += depletions;

        cursor.advance(dt, kind);
        self.store
            .write_compositions(cursor, &next)
            .map_err(Error::store)?;
        Ok(next)
    }
}
