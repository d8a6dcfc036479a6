//! Rolling time history of reaction-rate vectors.
//!
//! Each [`TimeCache`] keeps the most recent few vectors for one material and
//! serves polynomial extrapolations or interpolations between them. An
//! [`XsBank`] holds one cache per burnable material.

mod fit;

use std::collections::VecDeque;

use thiserror::Error;

use crate::{ReactionRates, rates::RatesError};

use fit::Polynomial;

/// Absolute tolerance, in seconds, for matching a stored time exactly.
pub const TIME_ATOL: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CacheError {
    #[error("cannot evaluate a cache with no stored data")]
    Empty,

    #[error("time {time} s does not follow the newest stored time {last} s")]
    NotIncreasing { time: f64, last: f64 },

    #[error("time {0} s is already stored")]
    Duplicate(f64),

    #[error("stored vectors use a different reaction index")]
    IndexMismatch,

    #[error("least-squares fit failed")]
    Fit,

    #[error("fitting order {order} needs more than {capacity} stored points")]
    InvalidOrder { order: usize, capacity: usize },

    #[error("cache capacity must be at least one")]
    ZeroCapacity,

    #[error("expected {expected} materials, got {found}")]
    MaterialCount { expected: usize, found: usize },

    #[error(transparent)]
    Rates(#[from] RatesError),
}

/// Bounded, time-ordered ring of reaction-rate vectors for one material.
///
/// Fit coefficients are computed lazily on the first off-grid evaluation
/// and dropped whenever the stored points change.
#[derive(Debug, Clone)]
pub struct TimeCache {
    capacity: usize,
    order: usize,
    times: VecDeque<f64>,
    values: VecDeque<ReactionRates>,
    fit: Option<Polynomial>,
}

impl TimeCache {
    /// Creates an empty cache holding up to `capacity` points and fitting
    /// polynomials of at most degree `order`.
    ///
    /// # Errors
    ///
    /// Fails if `capacity` is zero or `order` is not below `capacity`.
    pub fn new(capacity: usize, order: usize) -> Result<Self, CacheError> {
        if capacity == 0 {
            return Err(CacheError::ZeroCapacity);
        }
        if order >= capacity {
            return Err(CacheError::InvalidOrder { order, capacity });
        }
        Ok(Self {
            capacity,
            order,
            times: VecDeque::with_capacity(capacity),
            values: VecDeque::with_capacity(capacity),
            fit: None,
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.times.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub fn order(&self) -> usize {
        self.order
    }

    pub fn times(&self) -> impl Iterator<Item = f64> + '_ {
        self.times.iter().copied()
    }

    fn check_index(&self, rates: &ReactionRates) -> Result<(), CacheError> {
        match self.values.front() {
            Some(stored) if !stored.shares_index(rates) => Err(CacheError::IndexMismatch),
            _ => Ok(()),
        }
    }

    /// Drops every stored point, keeping capacity and order.
    pub fn clear(&mut self) {
        self.times.clear();
        self.values.clear();
        self.fit = None;
    }

    /// Appends a point newer than every stored one, evicting the oldest
    /// point when full.
    ///
    /// # Errors
    ///
    /// Fails if `time` is not strictly after the newest stored time or the
    /// vector uses a different reaction index.
    pub fn push(&mut self, time: f64, rates: ReactionRates) -> Result<(), CacheError> {
        if let Some(&last) = self.times.back() {
            if time <= last {
                return Err(CacheError::NotIncreasing { time, last });
            }
        }
        self.check_index(&rates)?;

        if self.times.len() == self.capacity {
            self.times.pop_front();
            self.values.pop_front();
        }
        self.times.push_back(time);
        self.values.push_back(rates);
        self.fit = None;
        Ok(())
    }

    /// Inserts a point at its place in time order.
    ///
    /// When full, the oldest point is evicted. A point older than every
    /// stored one would be that point, so it is discarded and `false` is
    /// returned.
    ///
    /// # Errors
    ///
    /// Fails if `time` is already stored or the vector uses a different
    /// reaction index.
    pub fn insert(&mut self, time: f64, rates: ReactionRates) -> Result<bool, CacheError> {
        if self.times.iter().any(|t| (t - time).abs() <= TIME_ATOL) {
            return Err(CacheError::Duplicate(time));
        }
        self.check_index(&rates)?;

        let mut position = self.times.partition_point(|&t| t < time);
        if self.times.len() == self.capacity {
            if position == 0 {
                log::debug!("discarding point at {time} s older than a full cache");
                return Ok(false);
            }
            self.times.pop_front();
            self.values.pop_front();
            position -= 1;
        }
        self.times.insert(position, time);
        self.values.insert(position, rates);
        self.fit = None;
        Ok(true)
    }

    /// Vector at `time`.
    ///
    /// A stored time within [`TIME_ATOL`] returns its vector unchanged.
    /// Otherwise every channel is fitted with a polynomial of degree
    /// `min(order, len - 1)` and evaluated at `time`.
    ///
    /// # Errors
    ///
    /// Fails if the cache is empty or the fit cannot be solved.
    pub fn evaluate(&mut self, time: f64) -> Result<ReactionRates, CacheError> {
        let first = self.values.front().ok_or(CacheError::Empty)?;
        if let Some(k) = self.times.iter().position(|t| (t - time).abs() <= TIME_ATOL) {
            return Ok(self.values[k].clone());
        }

        let index = std::sync::Arc::clone(first.index());
        if self.fit.is_none() {
            let degree = self.order.min(self.times.len() - 1);
            let times: Vec<f64> = self.times.iter().copied().collect();
            let rows: Vec<&[f64]> = self.values.iter().map(ReactionRates::values).collect();
            self.fit = Some(Polynomial::fit(&times, &rows, degree).ok_or(CacheError::Fit)?);
        }
        let fit = self.fit.as_ref().ok_or(CacheError::Fit)?;

        Ok(ReactionRates::new(index, fit.evaluate(time))?)
    }
}

/// One [`TimeCache`] of microscopic cross sections per burnable material.
#[derive(Debug, Clone)]
pub struct XsBank {
    caches: Vec<TimeCache>,
}

impl XsBank {
    /// # Errors
    ///
    /// Fails under the same conditions as [`TimeCache::new`].
    pub fn new(materials: usize, capacity: usize, order: usize) -> Result<Self, CacheError> {
        let cache = TimeCache::new(capacity, order)?;
        Ok(Self {
            caches: vec![cache; materials],
        })
    }

    #[must_use]
    pub fn materials(&self) -> usize {
        self.caches.len()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.caches.first().map_or(0, TimeCache::len)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_count(&self, found: usize) -> Result<(), CacheError> {
        if found == self.caches.len() {
            Ok(())
        } else {
            Err(CacheError::MaterialCount {
                expected: self.caches.len(),
                found,
            })
        }
    }

    /// Drops the history of every material.
    pub fn clear(&mut self) {
        self.caches.iter_mut().for_each(TimeCache::clear);
    }

    /// Appends one vector per material at `time`.
    ///
    /// # Errors
    ///
    /// Fails on a material count mismatch or any per-material push error.
    pub fn push(&mut self, time: f64, micro_xs: Vec<ReactionRates>) -> Result<(), CacheError> {
        self.check_count(micro_xs.len())?;
        for (cache, xs) in self.caches.iter_mut().zip(micro_xs) {
            cache.push(time, xs)?;
        }
        log::debug!("cached cross sections at {time} s ({} points)", self.len());
        Ok(())
    }

    /// Microscopic cross sections of every material at `time`.
    ///
    /// # Errors
    ///
    /// Fails if the bank is empty or a fit cannot be solved.
    pub fn at(&mut self, time: f64) -> Result<Vec<ReactionRates>, CacheError> {
        self.caches.iter_mut().map(|c| c.evaluate(time)).collect()
    }

    /// Reaction rates at `time`: cross sections scaled by each material's
    /// one-group flux.
    ///
    /// # Errors
    ///
    /// Fails if `flux` has the wrong length or [`XsBank::at`] fails.
    pub fn reaction_rates_at(
        &mut self,
        time: f64,
        flux: &[f64],
    ) -> Result<Vec<ReactionRates>, CacheError> {
        self.check_count(flux.len())?;
        let mut rates = self.at(time)?;
        for (r, &phi) in rates.iter_mut().zip(flux) {
            r.scale(phi);
        }
        Ok(rates)
    }
}
