//! Matrix-exponential solvers for the transmutation equations.
//!
//! Each back-end solves the constant-coefficient system
//!
//! ```text
//! dN/dt = A·N,   N(0) = N0
//! ```
//!
//! over one interval and returns `N(dt) = exp(A·dt)·N0`.
//!
//! # Example
//!
//! ```
//! use burnup_core::{DepletionSolverKind, SparseMatrix};
//! use burnup_solvers::ode;
//!
//! let mut decay = SparseMatrix::zeros(1);
//! decay.add(0, 0, -0.5);
//!
//! let solver = ode::from_kind(DepletionSolverKind::Cram16);
//! let n = solver.solve(&decay, &[1.0], 2.0).unwrap();
//! assert!((n[0] - (-1.0f64).exp()).abs() < 1e-12);
//! ```

mod cram;
mod pade;

pub use cram::Cram16;
pub use pade::Pade13;

use burnup_core::{DepletionSolverKind, SparseMatrix};
use thiserror::Error;

/// Errors that can occur while solving a transmutation system.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum OdeError {
    #[error("matrix is {matrix}x{matrix} but the initial vector has {vector} entries")]
    Dimension { matrix: usize, vector: usize },

    #[error("interval must be finite and non-negative, got {0} s")]
    Interval(f64),

    #[error("linear system in the {0} solve is singular")]
    Singular(&'static str),

    #[error("solution contains non-finite values")]
    NonFinite,

    #[error("unknown depletion solver `{0}`")]
    Unknown(String),
}

/// A pluggable solver for `N(dt) = exp(A·dt)·N0`.
///
/// Implementations are shared across the worker threads that deplete
/// materials in parallel.
pub trait DepletionSolver: Send + Sync {
    /// Name used in settings and logs.
    fn name(&self) -> &'static str;

    /// Advances `n0` through `dt` seconds.
    ///
    /// # Errors
    ///
    /// Fails on mismatched dimensions, an invalid interval, a singular
    /// linear system, or a non-finite result.
    fn solve(&self, matrix: &SparseMatrix, n0: &[f64], dt: f64) -> Result<Vec<f64>, OdeError>;
}

/// Boxed solver for a configured back-end.
#[must_use]
pub fn from_kind(kind: DepletionSolverKind) -> Box<dyn DepletionSolver> {
    match kind {
        DepletionSolverKind::Cram16 => Box::new(Cram16),
        DepletionSolverKind::Pade13 => Box::new(Pade13),
    }
}

/// Boxed solver by name, `"cram16"` or `"pade13"`.
///
/// # Errors
///
/// Returns [`OdeError::Unknown`] for any other name.
pub fn by_name(name: &str) -> Result<Box<dyn DepletionSolver>, OdeError> {
    match name.to_ascii_lowercase().as_str() {
        "cram16" => Ok(from_kind(DepletionSolverKind::Cram16)),
        "pade13" => Ok(from_kind(DepletionSolverKind::Pade13)),
        _ => Err(OdeError::Unknown(name.to_owned())),
    }
}

/// Checks the shared preconditions of every back-end.
fn check_inputs(matrix: &SparseMatrix, n0: &[f64], dt: f64) -> Result<(), OdeError> {
    if matrix.dim() != n0.len() {
        return Err(OdeError::Dimension {
            matrix: matrix.dim(),
            vector: n0.len(),
        });
    }
    if !dt.is_finite() || dt < 0.0 {
        return Err(OdeError::Interval(dt));
    }
    Ok(())
}

fn check_finite(n: Vec<f64>) -> Result<Vec<f64>, OdeError> {
    if n.iter().all(|x| x.is_finite()) {
        Ok(n)
    } else {
        Err(OdeError::NonFinite)
    }
}
