use burnup_core::SparseMatrix;
use nalgebra::{DMatrix, DVector};

use super::{DepletionSolver, OdeError, check_finite, check_inputs};

/// Largest 1-norm for which the degree-13 approximant is accurate to unit
/// roundoff without scaling.
const THETA_13: f64 = 5.371_920_351_148_152;

/// Coefficients of the degree-13 Padé approximant to `exp`.
const B: [f64; 14] = [
    64_764_752_532_480_000.0,
    32_382_376_266_240_000.0,
    7_771_770_303_897_600.0,
    1_187_353_796_428_800.0,
    129_060_195_264_000.0,
    10_559_470_521_600.0,
    670_442_572_800.0,
    33_522_128_640.0,
    1_323_241_920.0,
    40_840_800.0,
    960_960.0,
    16_380.0,
    182.0,
    1.0,
];

/// Degree-13 Padé approximant with scaling and squaring.
///
/// The matrix is scaled by `2^-s` until its 1-norm is below
/// [`THETA_13`], the approximant is evaluated, and the result is squared
/// `s` times.
#[derive(Debug, Clone, Copy, Default)]
pub struct Pade13;

impl DepletionSolver for Pade13 {
    fn name(&self) -> &'static str {
        "pade13"
    }

    fn solve(&self, matrix: &SparseMatrix, n0: &[f64], dt: f64) -> Result<Vec<f64>, OdeError> {
        check_inputs(matrix, n0, dt)?;
        let dim = matrix.dim();

        let norm = matrix.norm_one() * dt;
        let squarings = squarings(norm);
        let scale = dt * 0.5f64.powi(squarings);

        let mut a = DMatrix::<f64>::zeros(dim, dim);
        for (r, c, v) in matrix.iter() {
            a[(r, c)] = v * scale;
        }

        let mut exp = approximant(&a)?;
        for _ in 0..squarings {
            exp = &exp * &exp;
        }

        let n = exp * DVector::from_column_slice(n0);
        check_finite(n.iter().copied().collect())
    }
}

/// Number of squarings needed to bring `norm` below [`THETA_13`].
#[allow(clippy::cast_possible_truncation)]
fn squarings(norm: f64) -> i32 {
    if norm <= THETA_13 {
        0
    } else {
        (norm / THETA_13).log2().ceil() as i32
    }
}

/// Evaluates `r13(A) = (V - U)⁻¹ (V + U)`.
fn approximant(a: &DMatrix<f64>) -> Result<DMatrix<f64>, OdeError> {
    let dim = a.nrows();
    let identity = DMatrix::<f64>::identity(dim, dim);
    let a2 = a * a;
    let a4 = &a2 * &a2;
    let a6 = &a4 * &a2;

    let u_inner = &a6 * (&a6 * B[13] + &a4 * B[11] + &a2 * B[9])
        + &a6 * B[7]
        + &a4 * B[5]
        + &a2 * B[3]
        + &identity * B[1];
    let u = a * u_inner;
    let v = &a6 * (&a6 * B[12] + &a4 * B[10] + &a2 * B[8])
        + &a6 * B[6]
        + &a4 * B[4]
        + &a2 * B[2]
        + &identity * B[0];

    let lhs = &v - &u;
    let rhs = v + u;
    lhs.lu().solve(&rhs).ok_or(OdeError::Singular("pade13"))
}
