use std::{ops::Range, sync::Arc};

use thiserror::Error;

use crate::{ReactionType, Zai};

/// Sorted `(isotope, reaction)` layout shared by reaction-rate vectors.
///
/// Isotopes are stored once with a pointer range into the reaction list, so
/// reactions of isotope `zais[k]` are `rxns[zptr[k]..zptr[k + 1]]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReactionIndex {
    zais: Vec<Zai>,
    zptr: Vec<usize>,
    rxns: Vec<ReactionType>,
}

impl ReactionIndex {
    /// Builds an index from long-form pairs in any order.
    ///
    /// Duplicate pairs collapse into one channel.
    #[must_use]
    pub fn from_pairs(pairs: impl IntoIterator<Item = (Zai, ReactionType)>) -> Self {
        let mut pairs: Vec<_> = pairs.into_iter().collect();
        pairs.sort_unstable();
        pairs.dedup();

        let mut zais = Vec::new();
        let mut zptr = vec![0];
        let mut rxns = Vec::with_capacity(pairs.len());
        for (zai, rxn) in pairs {
            if zais.last() != Some(&zai) {
                if !zais.is_empty() {
                    zptr.push(rxns.len());
                }
                zais.push(zai);
            }
            rxns.push(rxn);
        }
        if !zais.is_empty() {
            zptr.push(rxns.len());
        }

        Self { zais, zptr, rxns }
    }

    /// Number of `(isotope, reaction)` channels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rxns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rxns.is_empty()
    }

    #[must_use]
    pub fn isotopes(&self) -> &[Zai] {
        &self.zais
    }

    fn span(&self, zai: Zai) -> Option<Range<usize>> {
        let k = self.zais.binary_search(&zai).ok()?;
        Some(self.zptr[k]..self.zptr[k + 1])
    }

    /// Reactions tracked for `zai`, empty if the isotope is not indexed.
    #[must_use]
    pub fn reactions(&self, zai: Zai) -> &[ReactionType] {
        match self.span(zai) {
            Some(span) => &self.rxns[span],
            None => &[],
        }
    }

    /// Flat position of a channel in every vector built on this index.
    #[must_use]
    pub fn position(&self, zai: Zai, rxn: ReactionType) -> Option<usize> {
        let span = self.span(zai)?;
        let offset = self.rxns[span.clone()].binary_search(&rxn).ok()?;
        Some(span.start + offset)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Zai, ReactionType)> + '_ {
        self.zais.iter().enumerate().flat_map(move |(k, &zai)| {
            self.rxns[self.zptr[k]..self.zptr[k + 1]]
                .iter()
                .map(move |&rxn| (zai, rxn))
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RatesError {
    #[error("expected {expected} values for the reaction index, got {found}")]
    LengthMismatch { expected: usize, found: usize },

    #[error("reaction-rate vectors are built on different reaction indices")]
    IndexMismatch,

    #[error("a linear combination needs at least one term")]
    Empty,
}

/// Per-material values on a shared [`ReactionIndex`].
///
/// Used both for microscopic cross sections and for reaction rates, which
/// are cross sections scaled by the one-group flux.
#[derive(Debug, Clone, PartialEq)]
pub struct ReactionRates {
    index: Arc<ReactionIndex>,
    values: Vec<f64>,
}

impl ReactionRates {
    /// # Errors
    ///
    /// Fails if `values` does not have one entry per indexed channel.
    pub fn new(index: Arc<ReactionIndex>, values: Vec<f64>) -> Result<Self, RatesError> {
        if values.len() != index.len() {
            return Err(RatesError::LengthMismatch {
                expected: index.len(),
                found: values.len(),
            });
        }
        Ok(Self { index, values })
    }

    #[must_use]
    pub fn zeros(index: Arc<ReactionIndex>) -> Self {
        let values = vec![0.0; index.len()];
        Self { index, values }
    }

    #[must_use]
    pub fn index(&self) -> &Arc<ReactionIndex> {
        &self.index
    }

    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    #[must_use]
    pub fn get(&self, zai: Zai, rxn: ReactionType) -> Option<f64> {
        self.index.position(zai, rxn).map(|i| self.values[i])
    }

    /// Sets an indexed channel, returning `false` if it is not indexed.
    pub fn set(&mut self, zai: Zai, rxn: ReactionType, value: f64) -> bool {
        match self.index.position(zai, rxn) {
            Some(i) => {
                self.values[i] = value;
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn shares_index(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.index, &other.index) || self.index == other.index
    }

    #[must_use]
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            index: Arc::clone(&self.index),
            values: self.values.iter().map(|v| v * factor).collect(),
        }
    }

    pub fn scale(&mut self, factor: f64) {
        self.values.iter_mut().for_each(|v| *v *= factor);
    }

    /// Computes `Σ wᵢ·rᵢ` over vectors sharing one index.
    ///
    /// # Errors
    ///
    /// Fails if `terms` is empty or the vectors use different indices.
    pub fn linear_combination(terms: &[(f64, &Self)]) -> Result<Self, RatesError> {
        let (_, first) = terms.first().ok_or(RatesError::Empty)?;
        let mut values = vec![0.0; first.values.len()];
        for (weight, rates) in terms {
            if !first.shares_index(rates) {
                return Err(RatesError::IndexMismatch);
            }
            for (acc, v) in values.iter_mut().zip(&rates.values) {
                *acc += weight * v;
            }
        }
        Ok(Self {
            index: Arc::clone(&first.index),
            values,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (Zai, ReactionType, f64)> + '_ {
        self.index
            .iter()
            .zip(&self.values)
            .map(|((zai, rxn), &v)| (zai, rxn, v))
    }
}
