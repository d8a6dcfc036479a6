//! End-to-end runs of the orchestrator on a two-isotope capture chain.
//!
//! U235 captures into Xe135, which captures into nothing tracked. The
//! one-group flux depends on the compositions,
//! `phi = cos(pi * N_U235 / 4) + sin(pi * N_Xe135)`, so each stepping
//! scheme lands on its own end-of-interval densities.

use std::{collections::BTreeMap, convert::Infallible, f64::consts::PI, sync::Arc};

use approx::assert_relative_eq;
use burnup_core::{
    BurnableMaterial, Capabilities, CompBundle, Cursor, Feature, FissionYield, FissionYields,
    HighFidelitySolver, IntermediateFlux, Network, NetworkBuilder, Reaction, ReactionIndex,
    ReactionRates, ReactionType, ReducedOrderSolver, RunLayout, Schedule, Settings,
    TimeIncrement, TransportResult, Zai,
};
use burnup_integrators::{
    Celi, ConstantFluxSolver, Error, Integrator, MemoryStore, Predictor, Rk4, Scheme, Summary,
};
use burnup_solvers::Coordinator;
use thiserror::Error as ThisError;
use uom::si::{
    f64::{Power, Time},
    power::watt,
    time::{day, second},
};

// --- Test fixtures ---

/// End-of-interval `[Xe135, U235]` from an adaptive high-order integrator.
const REFERENCE: [f64; 2] = [0.4873257599455337, 0.0105478107949492];

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn zai(name: &str) -> Zai {
    name.parse().unwrap()
}

fn flux_of(comps: &CompBundle) -> Vec<f64> {
    let position = |name: &str| {
        comps
            .isotopes()
            .iter()
            .position(|&z| z == zai(name))
            .unwrap()
    };
    let (u, xe) = (position("U235"), position("Xe135"));
    (0..comps.materials())
        .map(|m| {
            let row = comps.material(m);
            (PI * row[u] / 4.0).cos() + (PI * row[xe]).sin()
        })
        .collect()
}

fn micro_xs(index: &Arc<ReactionIndex>) -> ReactionRates {
    let mut xs = ReactionRates::zeros(Arc::clone(index));
    xs.set(zai("U235"), ReactionType::N_GAMMA, 0.5);
    xs.set(zai("Xe135"), ReactionType::N_GAMMA, 0.1);
    xs
}

#[derive(Debug, ThisError)]
#[error("transport diverged")]
struct Diverged;

/// U235 fission yielding only `product`.
fn yields_into(product: &str) -> FissionYields {
    [(zai("U235"), FissionYield::new([(zai(product), 1.0)]))].into()
}

/// High-fidelity double evaluating the analytic flux.
#[derive(Debug)]
struct Transport {
    features: Capabilities,
    index: Arc<ReactionIndex>,
    fission: f64,
    yields: FissionYields,
    negate: bool,
    hooks: Option<Capabilities>,
    layout: Option<RunLayout>,
    solves: Vec<Cursor>,
    finalized: Option<bool>,
}

impl Transport {
    fn new(index: &Arc<ReactionIndex>) -> Self {
        Self {
            features: Capabilities::from_features([
                Feature::MicroReactionXs,
                Feature::FissionYields,
                Feature::FissionMatrix,
            ]),
            index: Arc::clone(index),
            fission: 0.0,
            yields: FissionYields::new(),
            negate: false,
            hooks: None,
            layout: None,
            solves: Vec::new(),
            finalized: None,
        }
    }
}

impl HighFidelitySolver for Transport {
    type Error = Infallible;

    fn features(&self) -> Capabilities {
        self.features.clone()
    }

    fn set_hooks(&mut self, needs: &Capabilities) -> Result<(), Self::Error> {
        self.hooks = Some(needs.clone());
        Ok(())
    }

    fn before_main(&mut self, layout: &RunLayout) -> Result<(), Self::Error> {
        self.layout = Some(layout.clone());
        Ok(())
    }

    fn bos_solve(
        &mut self,
        compositions: &CompBundle,
        cursor: &Cursor,
        _power: Power,
    ) -> Result<TransportResult, Self::Error> {
        self.solves.push(*cursor);
        let sign = if self.negate { -1.0 } else { 1.0 };
        let flux = flux_of(compositions).into_iter().map(|f| sign * f).collect();
        let materials = compositions.materials();
        let mut xs = micro_xs(&self.index);
        xs.set(zai("U235"), ReactionType::FISSION, self.fission);
        Ok(TransportResult::new(flux)
            .with_keff(1.0, 1e-4)
            .with_micro_xs(vec![xs; materials])
            .with_fission_yields(vec![self.yields.clone(); materials]))
    }

    fn finalize(&mut self, success: bool) {
        self.finalized = Some(success);
    }
}

/// Reduced-order double evaluating the same analytic flux.
#[derive(Debug, Default)]
struct Surrogate {
    needs: Capabilities,
    fail: bool,
    yields: Option<Vec<FissionYields>>,
    bos: Vec<Cursor>,
    substeps: Vec<Cursor>,
    intermediates: Vec<Cursor>,
    finalized: Option<bool>,
}

impl ReducedOrderSolver for Surrogate {
    type Error = Diverged;

    fn needs(&self) -> Capabilities {
        self.needs.clone()
    }

    fn process_bos(
        &mut self,
        _result: &TransportResult,
        cursor: &Cursor,
        _power: Power,
    ) -> Result<(), Self::Error> {
        self.bos.push(*cursor);
        Ok(())
    }

    fn substep_solve(
        &mut self,
        cursor: &Cursor,
        compositions: &CompBundle,
        micro_xs: &[ReactionRates],
    ) -> Result<TransportResult, Self::Error> {
        if self.fail {
            return Err(Diverged);
        }
        assert_eq!(micro_xs.len(), compositions.materials());
        self.substeps.push(*cursor);
        let result = TransportResult::new(flux_of(compositions));
        Ok(match &self.yields {
            Some(yields) => result.with_fission_yields(yields.clone()),
            None => result,
        })
    }

    fn intermediate_solve(
        &mut self,
        cursor: &Cursor,
        compositions: &CompBundle,
        _micro_xs: &[ReactionRates],
    ) -> Result<IntermediateFlux, Self::Error> {
        if self.fail {
            return Err(Diverged);
        }
        self.intermediates.push(*cursor);
        Ok(IntermediateFlux {
            flux: flux_of(compositions),
            runtime: None,
        })
    }

    fn finalize(&mut self, success: bool) {
        self.finalized = Some(success);
    }
}

fn seconds(value: f64) -> TimeIncrement {
    TimeIncrement::new::<second>(value).unwrap()
}

/// Coordinator over `[Xe135, U235]` with `U235 = 1` in every material.
fn coordinator(schedule: Schedule, materials: usize, settings: &Settings) -> Coordinator {
    let mut builder = NetworkBuilder::new();
    builder
        .add_reaction(
            zai("U235"),
            Reaction::new(ReactionType::N_GAMMA, Some(zai("Xe135"))),
        )
        .add_reaction(zai("Xe135"), Reaction::new(ReactionType::N_GAMMA, None));
    with_network(builder.build().unwrap(), schedule, materials, settings)
}

/// Coordinator over `[Xe135, Cs135, U235]` where U235 also fissions.
fn fissile_coordinator(schedule: Schedule) -> Coordinator {
    let mut builder = NetworkBuilder::new();
    builder
        .add_reaction(
            zai("U235"),
            Reaction::new(ReactionType::N_GAMMA, Some(zai("Xe135"))),
        )
        .add_reaction(zai("U235"), Reaction::new(ReactionType::FISSION, None))
        .add_reaction(zai("Xe135"), Reaction::new(ReactionType::N_GAMMA, None))
        .insert(zai("Cs135"));
    with_network(builder.build().unwrap(), schedule, 1, &Settings::default())
}

fn with_network(
    network: Network,
    schedule: Schedule,
    materials: usize,
    settings: &Settings,
) -> Coordinator {
    let fuel: BTreeMap<Zai, f64> = [(zai("U235"), 1.0)].into();
    let initial = CompBundle::from_materials(network.zais(), &vec![fuel; materials]).unwrap();
    let materials = (0..materials)
        .map(|i| BurnableMaterial::new(i, format!("fuel {i}"), 1.0))
        .collect();

    Coordinator::new(network, schedule, materials, initial, settings).unwrap()
}

fn single_interval() -> Schedule {
    Schedule::new([(seconds(5.0), Power::new::<watt>(1.0), 1)], 0).unwrap()
}

fn run_scheme<Sc: Scheme + std::fmt::Debug>(scheme: Sc) -> (Summary, MemoryStore) {
    init_logging();
    let coordinator = coordinator(single_interval(), 1, &Settings::default());
    let transport = Transport::new(coordinator.reaction_index());

    let mut integrator = Integrator::new(
        transport,
        Surrogate::default(),
        coordinator,
        MemoryStore::new(),
        scheme,
    )
    .unwrap();
    let summary = integrator.run(Time::new::<second>(0.0)).unwrap();
    let (_, _, _, store) = integrator.into_parts();
    (summary, store)
}

fn end_of_interval(store: &MemoryStore) -> [f64; 2] {
    let comps = store.last_compositions().unwrap();
    assert_eq!(comps.isotopes(), [zai("Xe135"), zai("U235")]);
    let row = comps.material(0);
    [row[0], row[1]]
}

fn distance(values: [f64; 2]) -> f64 {
    values
        .iter()
        .zip(REFERENCE)
        .map(|(v, r)| (v - r).powi(2))
        .sum::<f64>()
        .sqrt()
}

// --- Tests ---

#[test]
fn predictor_matches_regression_fixture() {
    let (summary, store) = run_scheme(Predictor);
    let [xe, u] = end_of_interval(&store);

    assert_relative_eq!(xe, 0.6643434074084894, max_relative = 1e-9);
    assert_relative_eq!(u, 0.170713775399768, max_relative = 1e-9);
    assert_eq!(summary.intermediate_solves, 0);
    assert_eq!(summary.depletions, 1);
}

#[test]
fn celi_matches_regression_fixture() {
    let (summary, store) = run_scheme(Celi);
    let [xe, u] = end_of_interval(&store);

    assert_relative_eq!(xe, 0.6073748087895677, max_relative = 1e-9);
    assert_relative_eq!(u, 0.0403675404653474, max_relative = 1e-9);
    assert_eq!(summary.intermediate_solves, 1);
    assert_eq!(summary.depletions, 2);
}

#[test]
fn rk4_matches_regression_fixture() {
    let (summary, store) = run_scheme(Rk4);
    let [xe, u] = end_of_interval(&store);

    assert_relative_eq!(xe, 0.5111748628262343, max_relative = 1e-9);
    assert_relative_eq!(u, 0.0134443028193424, max_relative = 1e-9);
    assert_eq!(summary.intermediate_solves, 3);
    assert_eq!(summary.depletions, 4);
}

#[test]
fn rk4_lands_closest_to_reference() {
    let predictor = distance(end_of_interval(&run_scheme(Predictor).1));
    let celi = distance(end_of_interval(&run_scheme(Celi).1));
    let rk4 = distance(end_of_interval(&run_scheme(Rk4).1));

    assert!(rk4 < celi, "rk4 {rk4} vs ce/li {celi}");
    assert!(celi < predictor, "ce/li {celi} vs predictor {predictor}");
}

#[test]
fn single_interval_persists_initial_final_and_two_transports() {
    let (summary, store) = run_scheme(Celi);

    assert_eq!(store.compositions().len(), 2);
    assert_eq!(store.results().len(), 2);
    assert_eq!(summary.high_fidelity_solves, 2);
    assert_eq!(summary.reduced_order_solves, 0);
    assert_eq!(summary.cursor.total(), 1);
    assert_relative_eq!(summary.cursor.seconds(), 5.0);

    let initial = store.compositions()[0].1.material(0).to_vec();
    assert_eq!(initial, [0.0, 1.0]);
}

#[test]
fn missing_micro_xs_is_incompatible() {
    init_logging();
    let coordinator = coordinator(single_interval(), 1, &Settings::default());
    let mut transport = Transport::new(coordinator.reaction_index());
    transport.features = Capabilities::from_features([Feature::FissionMatrix]);
    let surrogate = Surrogate {
        needs: Capabilities::from_features([Feature::FissionMatrix, Feature::MicroReactionXs]),
        ..Surrogate::default()
    };

    let Err(err) = Integrator::new(transport, surrogate, coordinator, MemoryStore::new(), Celi)
    else {
        panic!("pairing should be rejected");
    };
    let Error::Incompatible(missing) = &err else {
        panic!("unexpected error: {err}");
    };
    assert!(missing.missing_features.contains(&Feature::MicroReactionXs));
    assert!(err.to_string().contains("microscopic cross sections"));
}

#[test]
fn cursor_total_counts_every_transport_solve() {
    init_logging();
    let steps = [(1.0, 1), (2.0, 3), (1.5, 2)];
    let schedule = Schedule::new(
        steps.map(|(length, n)| (seconds(length), Power::new::<watt>(1.0), n)),
        1,
    )
    .unwrap();
    let expected_solves = schedule.transport_solves();
    assert_eq!(expected_solves, 7);

    let coordinator = coordinator(schedule, 2, &Settings::default());
    let transport = Transport::new(coordinator.reaction_index());
    let mut integrator = Integrator::new(
        transport,
        Surrogate::default(),
        coordinator,
        MemoryStore::new(),
        Celi,
    )
    .unwrap();

    let summary = integrator.run(Time::new::<day>(0.0)).unwrap();
    let (transport, surrogate, _, store) = integrator.into_parts();

    assert_eq!(summary.cursor.total() + 1, expected_solves);
    assert_eq!(summary.cursor.coarse(), 3);
    assert_eq!(summary.cursor.substep(), None);
    assert_relative_eq!(summary.cursor.seconds(), 4.5, max_relative = 1e-12);
    assert_eq!(summary.transport_solves(), expected_solves);
    assert_eq!(store.results().len(), expected_solves);
    assert_eq!(store.compositions().len(), expected_solves);

    // One preliminary predictor step, then five CE/LI steps.
    assert_eq!(summary.high_fidelity_solves, 4);
    assert_eq!(summary.reduced_order_solves, 3);
    assert_eq!(summary.intermediate_solves, 5);
    assert_eq!(summary.depletions, 11);

    let layout = transport.layout.unwrap();
    assert_eq!(layout.transport_solves, expected_solves);
    assert_eq!(layout.high_fidelity_solves, 4);
    assert_eq!(layout.materials.len(), 2);

    let hooks = transport.hooks.unwrap();
    assert!(hooks.contains(Feature::MicroReactionXs));
    assert!(hooks.contains(Feature::FissionYields));

    let totals: Vec<usize> = transport.solves.iter().map(Cursor::total).collect();
    assert_eq!(totals, [0, 1, 4, 6]);
    let substeps: Vec<usize> = surrogate.substeps.iter().map(Cursor::total).collect();
    assert_eq!(substeps, [2, 3, 5]);
    // Intermediate evaluations see the cursor at the start of their step.
    let intermediates: Vec<usize> = surrogate.intermediates.iter().map(Cursor::total).collect();
    assert_eq!(intermediates, [1, 2, 3, 4, 5]);

    assert_eq!(transport.finalized, Some(true));
    assert_eq!(surrogate.finalized, Some(true));
}

#[test]
fn preliminary_steps_never_touch_reduced_order_solver() {
    init_logging();
    let schedule = Schedule::new(
        [(1.0, 1), (1.0, 1), (1.0, 2)]
            .map(|(length, n)| (seconds(length), Power::new::<watt>(1.0), n)),
        2,
    )
    .unwrap();
    let coordinator = coordinator(schedule, 1, &Settings::default());
    let transport = Transport::new(coordinator.reaction_index());
    let mut integrator = Integrator::new(
        transport,
        Surrogate::default(),
        coordinator,
        MemoryStore::new(),
        Rk4,
    )
    .unwrap();

    let summary = integrator.run(Time::new::<day>(0.0)).unwrap();
    let (_, surrogate, _, _) = integrator.into_parts();

    let coarse: Vec<usize> = surrogate.bos.iter().map(Cursor::coarse).collect();
    assert_eq!(coarse, [2]);
    assert!(surrogate.substeps.iter().all(|c| c.coarse() == 2));
    assert_eq!(summary.reduced_order_solves, 1);
    // Two RK4 steps with three intermediate solves each.
    assert_eq!(surrogate.intermediates.len(), 6);
    assert!(surrogate.intermediates.iter().all(|c| c.coarse() == 2));
    assert_eq!(summary.intermediate_solves, 6);
    assert_eq!(summary.depletions, 2 + 8);
}

/// Final `[Xe135, Cs135, U235]` after one 4 s step with two predictor
/// sub-steps, the high-fidelity solver yielding Xe135 from fission.
fn run_fissile(surrogate: Surrogate) -> Result<(Vec<f64>, Surrogate), Error> {
    init_logging();
    let schedule = Schedule::new([(seconds(4.0), Power::new::<watt>(1.0), 2)], 0).unwrap();
    let coordinator = fissile_coordinator(schedule);
    let mut transport = Transport::new(coordinator.reaction_index());
    transport.fission = 0.2;
    transport.yields = yields_into("Xe135");

    let mut integrator =
        Integrator::new(transport, surrogate, coordinator, MemoryStore::new(), Predictor)
            .unwrap();
    let outcome = integrator.run(Time::new::<second>(0.0));
    let (_, surrogate, _, store) = integrator.into_parts();
    outcome?;

    let comps = store.last_compositions().unwrap();
    assert_eq!(comps.isotopes(), [zai("Xe135"), zai("Cs135"), zai("U235")]);
    Ok((comps.material(0).to_vec(), surrogate))
}

#[test]
fn reduced_order_fission_yields_drive_later_substeps() {
    let (carried, _) = run_fissile(Surrogate::default()).unwrap();
    let (switched, surrogate) = run_fissile(Surrogate {
        yields: Some(vec![yields_into("Cs135")]),
        ..Surrogate::default()
    })
    .unwrap();
    assert_eq!(surrogate.substeps.len(), 1);

    // Only the step after the reduced-order evaluation fissions into Cs135.
    assert_eq!(carried[1], 0.0);
    assert!(switched[1] > 0.0, "cs135 {}", switched[1]);
    assert!(switched[0] < carried[0], "xe135 {} vs {}", switched[0], carried[0]);

    // Fluxes and rates are unchanged, so uranium burns identically.
    assert_relative_eq!(switched[2], carried[2], max_relative = 1e-9);
}

#[test]
fn reduced_order_yields_must_cover_every_material() {
    let surrogate = Surrogate {
        yields: Some(vec![yields_into("Cs135"); 2]),
        ..Surrogate::default()
    };
    let Err(err) = run_fissile(surrogate) else {
        panic!("two yield sets for one material should be rejected");
    };
    assert!(matches!(
        err,
        Error::YieldCount { expected: 1, found: 2, cursor } if cursor.total() == 1
    ));
}

#[test]
fn negative_flux_is_persisted_then_fatal() {
    init_logging();
    let coordinator = coordinator(single_interval(), 1, &Settings::default());
    let mut transport = Transport::new(coordinator.reaction_index());
    transport.negate = true;
    let mut integrator = Integrator::new(
        transport,
        Surrogate::default(),
        coordinator,
        MemoryStore::new(),
        Predictor,
    )
    .unwrap();

    let err = integrator.run(Time::new::<second>(0.0)).unwrap_err();
    assert!(matches!(err, Error::NegativeFlux { cursor } if cursor.total() == 0));

    let (transport, surrogate, _, store) = integrator.into_parts();
    assert_eq!(store.results().len(), 1);
    assert!(store.results()[0].1.has_negative_flux());
    assert_eq!(transport.finalized, Some(false));
    assert_eq!(surrogate.finalized, Some(false));
}

#[test]
fn reduced_order_failure_finalizes_and_propagates() {
    init_logging();
    let schedule = Schedule::new([(seconds(10.0), Power::new::<watt>(1.0), 2)], 0).unwrap();
    let coordinator = coordinator(schedule, 1, &Settings::default());
    let transport = Transport::new(coordinator.reaction_index());
    let surrogate = Surrogate {
        fail: true,
        ..Surrogate::default()
    };
    let mut integrator =
        Integrator::new(transport, surrogate, coordinator, MemoryStore::new(), Predictor).unwrap();

    let err = integrator.run(Time::new::<second>(0.0)).unwrap_err();
    assert!(matches!(err, Error::ReducedOrder(_)));
    assert_eq!(err.to_string(), "reduced-order solver error: transport diverged");

    let (transport, surrogate, _, store) = integrator.into_parts();
    assert_eq!(transport.finalized, Some(false));
    assert_eq!(surrogate.finalized, Some(false));
    // Initial compositions and the first sub-step were written.
    assert_eq!(store.compositions().len(), 2);
}

#[test]
fn runs_from_toml_with_builtin_collaborators() {
    init_logging();
    let settings = Settings::from_toml_str(
        r#"
        [burnup]
        depletion-solver = "pade13"
        fitting-order = 1
        fitting-points = 3

        [burnup.schedule]
        days = [1.0e-5, 2.0e-5]
        power = 1.0e3
        substeps = [1, 4]
        preliminary-steps = 1
        "#,
    )
    .unwrap();
    let schedule = settings.schedule().unwrap().unwrap();
    let coordinator = coordinator(schedule, 1, &settings);
    assert_eq!(coordinator.solver().name(), "pade13");

    let transport = Transport::new(coordinator.reaction_index());
    let mut integrator = Integrator::new(
        transport,
        ConstantFluxSolver::new(),
        coordinator,
        MemoryStore::new(),
        Celi,
    )
    .unwrap();

    let summary = integrator.run(Time::new::<day>(0.0)).unwrap();
    assert_eq!(summary.transport_solves(), 6);
    assert_eq!(summary.cursor.total(), 5);
    assert_relative_eq!(summary.cursor.days(), 3.0e-5, max_relative = 1e-12);

    let store = integrator.store();
    let last = store.last_compositions().unwrap().material(0).to_vec();
    assert!(last.iter().all(|&n| n >= 0.0));
    assert!(last[0] > 0.0, "xenon builds in");
    assert!(last[1] < 1.0, "uranium burns out");
}
