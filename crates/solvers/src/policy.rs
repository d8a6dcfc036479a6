use ndarray::Array2;
use thiserror::Error;

/// Thresholds for negative densities produced by a depletion solve.
///
/// Both thresholds are percentages of the total positive density across
/// every material.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DensityPolicy {
    warn_percent: f64,
    error_percent: f64,
}

/// Errors that can occur when validating a [`DensityPolicy`].
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum PolicyError {
    #[error("warn threshold must be finite and non-negative, got {0}")]
    Warn(f64),

    #[error("error threshold must be finite and non-negative, got {0}")]
    Error(f64),

    #[error("warn threshold {warn} exceeds error threshold {error}")]
    Order { warn: f64, error: f64 },
}

/// Negative densities at or above the error threshold.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
#[error("negative densities reach {percent}% of the positive density, limit is {threshold}%")]
pub struct NegativeDensity {
    pub percent: f64,
    pub threshold: f64,
}

/// What [`DensityPolicy::apply`] did to the densities.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Policed {
    /// No negative entries.
    Clean,

    /// Negatives below the warn threshold were set to zero.
    Clamped { percent: f64 },

    /// Negatives in the warn band were set to zero and a warning logged.
    Warned { percent: f64 },
}

impl Default for DensityPolicy {
    fn default() -> Self {
        Self {
            warn_percent: 1e-3,
            error_percent: 1.0,
        }
    }
}

impl DensityPolicy {
    /// # Errors
    ///
    /// Fails if either threshold is negative or not finite, or `warn`
    /// exceeds `error`.
    pub fn new(warn_percent: f64, error_percent: f64) -> Result<Self, PolicyError> {
        if !warn_percent.is_finite() || warn_percent < 0.0 {
            return Err(PolicyError::Warn(warn_percent));
        }
        if !error_percent.is_finite() || error_percent < 0.0 {
            return Err(PolicyError::Error(error_percent));
        }
        if warn_percent > error_percent {
            return Err(PolicyError::Order {
                warn: warn_percent,
                error: error_percent,
            });
        }
        Ok(Self {
            warn_percent,
            error_percent,
        })
    }

    #[must_use]
    pub fn warn_percent(&self) -> f64 {
        self.warn_percent
    }

    #[must_use]
    pub fn error_percent(&self) -> f64 {
        self.error_percent
    }

    /// Polices `densities` in place.
    ///
    /// The negative share is the magnitude of all negative entries divided
    /// by the sum of all positive entries. Below the error threshold every
    /// negative entry is set to zero, with a warning from the warn threshold
    /// up.
    ///
    /// # Errors
    ///
    /// Returns [`NegativeDensity`] at or above the error threshold and leaves
    /// `densities` untouched.
    pub fn apply(&self, densities: &mut Array2<f64>) -> Result<Policed, NegativeDensity> {
        let (negative, positive) = densities.iter().fold((0.0, 0.0), |(neg, pos), &n| {
            if n < 0.0 { (neg + n, pos) } else { (neg, pos + n) }
        });
        if negative == 0.0 {
            return Ok(Policed::Clean);
        }

        let percent = if positive > 0.0 {
            100.0 * negative.abs() / positive
        } else {
            f64::INFINITY
        };

        if percent >= self.error_percent {
            return Err(NegativeDensity {
                percent,
                threshold: self.error_percent,
            });
        }

        densities.mapv_inplace(|n| n.max(0.0));
        if percent >= self.warn_percent {
            log::warn!(
                "negative densities at {percent:.4E}% of the positive density were set to zero"
            );
            Ok(Policed::Warned { percent })
        } else {
            Ok(Policed::Clamped { percent })
        }
    }
}
