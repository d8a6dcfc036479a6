use std::collections::BTreeMap;

use thiserror::Error;

use crate::Zai;

/// Per-parent fission product distributions for one material.
pub type FissionYields = BTreeMap<Zai, FissionYield>;

/// Independent fission product yields for one parent at one energy.
///
/// Products are kept sorted by identity key; repeated products are summed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FissionYield {
    products: Vec<Zai>,
    yields: Vec<f64>,
}

impl FissionYield {
    #[must_use]
    pub fn new(pairs: impl IntoIterator<Item = (Zai, f64)>) -> Self {
        let mut merged = BTreeMap::new();
        for (product, value) in pairs {
            *merged.entry(product).or_insert(0.0) += value;
        }
        let (products, yields) = merged.into_iter().unzip();
        Self { products, yields }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.products.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    #[must_use]
    pub fn get(&self, product: Zai) -> Option<f64> {
        self.products
            .binary_search(&product)
            .ok()
            .map(|i| self.yields[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = (Zai, f64)> + '_ {
        self.products.iter().copied().zip(self.yields.iter().copied())
    }

    #[must_use]
    pub fn products(&self) -> &[Zai] {
        &self.products
    }

    /// Sum of all yields; close to two for a complete distribution.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.yields.iter().sum()
    }

    #[must_use]
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            products: self.products.clone(),
            yields: self.yields.iter().map(|y| y * factor).collect(),
        }
    }

    /// Union of both distributions, summing shared products.
    #[must_use]
    pub fn combined(&self, other: &Self) -> Self {
        Self::new(self.iter().chain(other.iter()))
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FissionYieldError {
    #[error("a fission yield table needs at least one energy")]
    Empty,

    #[error("tabulated energy {0} is not finite and non-negative")]
    InvalidEnergy(f64),

    #[error("energy {0} is tabulated more than once")]
    DuplicateEnergy(f64),
}

/// Fission yield distributions tabulated against incident neutron energy.
#[derive(Debug, Clone, PartialEq)]
pub struct FissionYieldTable {
    energies: Vec<f64>,
    distributions: Vec<FissionYield>,
}

impl FissionYieldTable {
    /// Builds a table from `(energy in eV, distribution)` pairs in any order.
    ///
    /// # Errors
    ///
    /// Fails on an empty table, a negative or non-finite energy, or a repeated
    /// energy.
    pub fn new(
        entries: impl IntoIterator<Item = (f64, FissionYield)>,
    ) -> Result<Self, FissionYieldError> {
        let mut entries: Vec<_> = entries.into_iter().collect();
        if entries.is_empty() {
            return Err(FissionYieldError::Empty);
        }
        if let Some((energy, _)) = entries.iter().find(|(e, _)| !e.is_finite() || *e < 0.0) {
            return Err(FissionYieldError::InvalidEnergy(*energy));
        }
        entries.sort_by(|a, b| a.0.total_cmp(&b.0));
        if let Some(pair) = entries.windows(2).find(|w| w[0].0 == w[1].0) {
            return Err(FissionYieldError::DuplicateEnergy(pair[0].0));
        }

        let (energies, distributions) = entries.into_iter().unzip();
        Ok(Self {
            energies,
            distributions,
        })
    }

    #[must_use]
    pub fn energies(&self) -> &[f64] {
        &self.energies
    }

    /// Distribution at the tabulated energy nearest to `energy`.
    ///
    /// Ties resolve to the lower energy.
    #[must_use]
    pub fn at(&self, energy: f64) -> &FissionYield {
        let upper = self.energies.partition_point(|e| *e < energy);
        let index = if upper == 0 {
            0
        } else if upper == self.energies.len() {
            upper - 1
        } else if self.energies[upper] - energy < energy - self.energies[upper - 1] {
            upper
        } else {
            upper - 1
        };
        &self.distributions[index]
    }
}
