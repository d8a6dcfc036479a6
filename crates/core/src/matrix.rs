use std::collections::BTreeMap;

use nalgebra::DMatrix;

/// Square sparse matrix in dictionary-of-keys form.
///
/// Entries are keyed by `(row, column)` and kept in row-major order.
/// Adding to an entry accumulates, mirroring how transmutation terms from
/// several reactions land on the same coordinate.
#[derive(Debug, Clone, PartialEq)]
pub struct SparseMatrix {
    dim: usize,
    entries: BTreeMap<(usize, usize), f64>,
}

impl SparseMatrix {
    #[must_use]
    pub fn zeros(dim: usize) -> Self {
        Self {
            dim,
            entries: BTreeMap::new(),
        }
    }

    /// Accumulates `value` into `(row, col)`.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of bounds.
    pub fn add(&mut self, row: usize, col: usize, value: f64) {
        assert!(
            row < self.dim && col < self.dim,
            "({row}, {col}) is outside a {0}x{0} matrix",
            self.dim
        );
        *self.entries.entry((row, col)).or_insert(0.0) += value;
    }

    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.entries.get(&(row, col)).copied().unwrap_or(0.0)
    }

    #[must_use]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of stored entries, including explicit zeros.
    #[must_use]
    pub fn nnz(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        self.entries.iter().map(|(&(r, c), &v)| (r, c, v))
    }

    #[must_use]
    pub fn column_sum(&self, col: usize) -> f64 {
        self.iter().filter(|&(_, c, _)| c == col).map(|(_, _, v)| v).sum()
    }

    /// Maximum absolute column sum.
    #[must_use]
    pub fn norm_one(&self) -> f64 {
        let mut sums = vec![0.0; self.dim];
        for (_, c, v) in self.iter() {
            sums[c] += v.abs();
        }
        sums.into_iter().fold(0.0, f64::max)
    }

    #[must_use]
    pub fn to_dense(&self) -> DMatrix<f64> {
        let mut dense = DMatrix::zeros(self.dim, self.dim);
        for (r, c, v) in self.iter() {
            dense[(r, c)] = v;
        }
        dense
    }

    /// Computes `A·x`.
    ///
    /// # Panics
    ///
    /// Panics if `x` does not match the matrix dimension.
    #[must_use]
    pub fn mul_vec(&self, x: &[f64]) -> Vec<f64> {
        assert_eq!(x.len(), self.dim, "vector length must match matrix dimension");
        let mut y = vec![0.0; self.dim];
        for (r, c, v) in self.iter() {
            y[r] += v * x[c];
        }
        y
    }
}
