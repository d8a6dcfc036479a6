use nalgebra::{DMatrix, RowDVector};

/// Singular values below this fraction of the largest are discarded.
const SVD_EPS: f64 = 1e-14;

/// Least-squares polynomial fitted to every channel at once.
///
/// Times are shifted to the newest sample and scaled by the widest spread,
/// keeping the Vandermonde system well conditioned for times in seconds.
#[derive(Debug, Clone)]
pub(super) struct Polynomial {
    origin: f64,
    scale: f64,
    /// `(degree + 1) × channels`, lowest power first.
    coeffs: DMatrix<f64>,
}

impl Polynomial {
    /// Fits `rows[k]` observed at `times[k]` with the given degree.
    ///
    /// Returns `None` when the least-squares solve fails.
    pub(super) fn fit(times: &[f64], rows: &[&[f64]], degree: usize) -> Option<Self> {
        let origin = *times.last()?;
        let spread = times.iter().map(|t| (t - origin).abs()).fold(0.0, f64::max);
        let scale = if spread > 0.0 { spread } else { 1.0 };

        let channels = rows.first()?.len();
        let vandermonde = DMatrix::from_fn(times.len(), degree + 1, |r, c| {
            powi((times[r] - origin) / scale, c)
        });
        let observed = DMatrix::from_fn(times.len(), channels, |r, c| rows[r][c]);

        let coeffs = vandermonde.svd(true, true).solve(&observed, SVD_EPS).ok()?;
        Some(Self {
            origin,
            scale,
            coeffs,
        })
    }

    pub(super) fn evaluate(&self, time: f64) -> Vec<f64> {
        let tau = (time - self.origin) / self.scale;
        let powers = RowDVector::from_fn(self.coeffs.nrows(), |_, c| powi(tau, c));
        (powers * &self.coeffs).iter().copied().collect()
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
fn powi(x: f64, n: usize) -> f64 {
    x.powi(n as i32)
}
