//! Core types for the burnup depletion engine.
//!
//! This crate defines the data and contracts that the depletion solvers and
//! time integrators build on:
//!
//! - [`Cursor`] and [`TimeIncrement`] track progress through calendar time
//! - [`Network`] holds isotopes and assembles transmutation matrices
//! - [`TimeCache`] and [`XsBank`] extrapolate cross sections between
//!   transport evaluations
//! - [`Capabilities`] checks that a pair of solvers can work together
//! - [`HighFidelitySolver`], [`ReducedOrderSolver`], and [`Store`] are the
//!   collaborator traits a run is assembled from
//! - [`Schedule`] and [`Settings`] configure a run

mod cache;
mod calendar;
mod capability;
mod composition;
mod fission_yield;
mod isotope;
mod matrix;
mod network;
mod rates;
mod result;
mod schedule;
mod settings;
mod solver;
mod time;

pub use cache::{CacheError, TIME_ATOL, TimeCache, XsBank};
pub use calendar::{Advance, Cursor};
pub use capability::{Capabilities, Feature, IncompatibilityError};
pub use composition::{BurnableMaterial, CompBundle, CompositionError};
pub use fission_yield::{FissionYield, FissionYieldError, FissionYieldTable, FissionYields};
pub use isotope::{DecayMode, Isotope, Reaction, ReactionType, Zai, ZaiError};
pub use matrix::SparseMatrix;
pub use network::{IsotopeIndex, Network, NetworkBuilder, NetworkError};
pub use rates::{RatesError, ReactionIndex, ReactionRates};
pub use result::{IntermediateFlux, TransportResult};
pub use schedule::{CoarseStep, Schedule, ScheduleError};
pub use settings::{DepletionSolverKind, PerStep, ScheduleSettings, Settings, SettingsError};
pub use solver::{HighFidelitySolver, ReducedOrderSolver, RunLayout, Store};
pub use time::{SECONDS_PER_DAY, TimeIncrement, TimeIncrementError};
