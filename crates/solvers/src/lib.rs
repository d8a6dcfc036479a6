//! Depletion solvers for the burnup engine.
//!
//! - [`ode`] holds the matrix-exponential back-ends behind
//!   [`DepletionSolver`]
//! - [`DensityPolicy`] decides what happens to negative densities
//! - [`Coordinator`] advances every burnable material through one interval

pub mod deplete;
pub mod ode;

mod policy;

pub use deplete::{Coordinator, Error as DepletionError};
pub use ode::{DepletionSolver, OdeError};
pub use policy::{DensityPolicy, NegativeDensity, Policed, PolicyError};
