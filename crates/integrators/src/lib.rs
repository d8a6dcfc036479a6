//! Time integration for coupled transport-depletion runs.
//!
//! An [`Integrator`] pairs a high-fidelity transport solver with a
//! reduced-order one, checks that their capabilities line up, and marches a
//! coarse-step schedule. Each depletion interval is advanced by a stepping
//! [`Scheme`]: [`Predictor`], [`Celi`], or [`Rk4`].

mod integrate;
mod reduced;
pub mod scheme;
mod store;

pub use integrate::{Error, Integrator, Phase, Summary};
pub use reduced::{ConstantFluxSolver, NoBeginningOfStep};
pub use scheme::{Celi, Coupling, Predictor, Rk4, Scheme};
pub use store::MemoryStore;
