//! Depletion coordinator.
//!
//! The [`Coordinator`] owns everything the depletion side of a run needs:
//! the isotope network, the coarse-step schedule, the initial compositions,
//! the per-material cross-section history, and the matrix-exponential
//! back-end. Its central operation advances every material through one
//! interval:
//!
//! ```text
//! N_m(t + dt) = exp(A_m·dt)·N_m(t)
//! ```
//!
//! where `A_m` is the transmutation matrix assembled from material `m`'s
//! reaction rates and fission yields. Materials are solved in parallel and
//! the joined result is policed for negative densities.

mod error;

pub use error::Error;

use std::sync::Arc;

use burnup_core::{
    BurnableMaterial, Capabilities, CompBundle, Feature, FissionYields, Network, ReactionIndex,
    ReactionRates, Schedule, Settings, TimeIncrement, XsBank,
};
use ndarray::{Array2, ArrayView1};
use rayon::prelude::*;

use crate::{DensityPolicy, DepletionSolver, Policed, ode};

/// Drives the depletion side of a coupled run.
pub struct Coordinator {
    network: Network,
    reaction_index: Arc<ReactionIndex>,
    schedule: Schedule,
    materials: Vec<BurnableMaterial>,
    initial: CompBundle,
    solver: Box<dyn DepletionSolver>,
    policy: DensityPolicy,
    bank: XsBank,
}

impl Coordinator {
    /// Creates a coordinator configured from `settings`.
    ///
    /// `initial` holds one row of densities per entry of `materials`.
    ///
    /// # Errors
    ///
    /// Fails if `initial` does not cover every material, or the settings
    /// hold invalid density thresholds or fitting parameters.
    pub fn new(
        network: Network,
        schedule: Schedule,
        materials: Vec<BurnableMaterial>,
        initial: CompBundle,
        settings: &Settings,
    ) -> Result<Self, Error> {
        if initial.materials() != materials.len() {
            return Err(Error::MaterialCount {
                expected: materials.len(),
                found: initial.materials(),
            });
        }

        let policy = DensityPolicy::new(
            settings.negative_density_warn_percent,
            settings.negative_density_error_percent,
        )?;
        let bank = XsBank::new(
            materials.len(),
            settings.fitting_points,
            settings.fitting_order,
        )?;
        let reaction_index = Arc::new(network.reaction_index());

        log::debug!(
            "coordinator: {} isotopes, {} materials, {} coarse steps, {} solver",
            network.len(),
            materials.len(),
            schedule.len(),
            settings.depletion_solver,
        );

        Ok(Self {
            network,
            reaction_index,
            schedule,
            materials,
            initial,
            solver: ode::from_kind(settings.depletion_solver),
            policy,
            bank,
        })
    }

    /// Replaces the matrix-exponential back-end.
    #[must_use]
    pub fn with_solver(mut self, solver: Box<dyn DepletionSolver>) -> Self {
        self.solver = solver;
        self
    }

    /// Capabilities the high-fidelity solver must provide to feed depletion.
    #[must_use]
    pub fn needs(&self) -> Capabilities {
        Capabilities::from_features([Feature::MicroReactionXs, Feature::FissionYields])
    }

    #[must_use]
    pub fn network(&self) -> &Network {
        &self.network
    }

    /// Layout shared by every cross-section vector of this run.
    #[must_use]
    pub fn reaction_index(&self) -> &Arc<ReactionIndex> {
        &self.reaction_index
    }

    #[must_use]
    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    #[must_use]
    pub fn materials(&self) -> &[BurnableMaterial] {
        &self.materials
    }

    #[must_use]
    pub fn initial_compositions(&self) -> &CompBundle {
        &self.initial
    }

    #[must_use]
    pub fn solver(&self) -> &dyn DepletionSolver {
        self.solver.as_ref()
    }

    #[must_use]
    pub fn policy(&self) -> DensityPolicy {
        self.policy
    }

    /// Clears cross-section history left from a previous run.
    pub fn before_main(&mut self) {
        self.bank.clear();
    }

    /// Records microscopic cross sections from a transport evaluation.
    ///
    /// # Errors
    ///
    /// Fails if `time` does not follow the previous push or the vectors do
    /// not match the materials.
    pub fn push_xs(&mut self, time: f64, micro_xs: Vec<ReactionRates>) -> Result<(), Error> {
        Ok(self.bank.push(time, micro_xs)?)
    }

    /// Microscopic cross sections at `time`, extrapolated when needed.
    ///
    /// # Errors
    ///
    /// Fails if no cross sections have been pushed yet.
    pub fn micro_xs_at(&mut self, time: f64) -> Result<Vec<ReactionRates>, Error> {
        Ok(self.bank.at(time)?)
    }

    /// Reaction rates at `time` for the given one-group fluxes.
    ///
    /// # Errors
    ///
    /// Fails if no cross sections have been pushed yet or `flux` does not
    /// match the materials.
    pub fn reaction_rates_at(
        &mut self,
        time: f64,
        flux: &[f64],
    ) -> Result<Vec<ReactionRates>, Error> {
        Ok(self.bank.reaction_rates_at(time, flux)?)
    }

    /// Advances every material through `dt` at constant reaction rates.
    ///
    /// # Errors
    ///
    /// Fails if the inputs disagree on the material count, a solve fails,
    /// or negative densities reach the error threshold.
    pub fn deplete(
        &self,
        dt: TimeIncrement,
        compositions: &CompBundle,
        rates: &[ReactionRates],
        yields: &[FissionYields],
    ) -> Result<CompBundle, Error> {
        let materials = compositions.materials();
        if rates.len() != materials || yields.len() != materials {
            return Err(Error::MismatchedLengths {
                compositions: materials,
                rates: rates.len(),
                yields: yields.len(),
            });
        }

        let ordering = compositions.ordering();
        let seconds = dt.seconds();
        let network = &self.network;
        let solver = self.solver.as_ref();

        let solved: Vec<Vec<f64>> = (0..materials)
            .into_par_iter()
            .map(|m| {
                let matrix = network.form_matrix(&rates[m], &yields[m], &ordering);
                let n0 = compositions.material(m).to_vec();
                solver
                    .solve(&matrix, &n0, seconds)
                    .map_err(|source| Error::Solver {
                        material: m,
                        source,
                    })
            })
            .collect::<Result<_, _>>()?;

        let mut densities = Array2::zeros(compositions.densities().raw_dim());
        for (mut row, values) in densities.rows_mut().into_iter().zip(&solved) {
            row.assign(&ArrayView1::from(values.as_slice()));
        }

        match self.policy.apply(&mut densities)? {
            Policed::Clean | Policed::Warned { .. } => {}
            Policed::Clamped { percent } => {
                log::debug!("clamped negative densities at {percent:.4E}%");
            }
        }

        Ok(compositions.with_densities(densities)?)
    }

    /// Releases the cross-section history once the run ends.
    pub fn finalize(&mut self, success: bool) {
        log::debug!("coordinator finalized (success: {success})");
        self.bank.clear();
    }
}

impl std::fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("isotopes", &self.network.len())
            .field("materials", &self.materials.len())
            .field("coarse_steps", &self.schedule.len())
            .field("solver", &self.solver.name())
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
