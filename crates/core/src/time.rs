use std::{
    fmt,
    ops::{Add, Deref, Div},
};

use thiserror::Error;
use uom::{
    Conversion,
    si::{
        f64::Time,
        time::{self, day, second},
    },
};

/// Seconds in one calendar day.
pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// A unit-safe, strictly positive duration used to advance calendar time.
///
/// `TimeIncrement` wraps a [`Time`] value while enforcing that the duration
/// is strictly greater than zero and finite. Coarse steps, sub-steps, and
/// depletion intervals are all expressed with it.
///
/// ```
/// use burnup_core::TimeIncrement;
/// use uom::si::time::day;
///
/// let dt = TimeIncrement::new::<day>(5.0).unwrap();
/// assert_eq!(dt.seconds(), 432_000.0);
/// assert!(TimeIncrement::new::<day>(0.0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct TimeIncrement(Time);

/// Error type returned when constructing an invalid [`TimeIncrement`].
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum TimeIncrementError {
    #[error("time increment must be greater than zero, got {0} s")]
    NotPositive(f64),

    #[error("time increment must be finite, got {0} s")]
    NotFinite(f64),
}

impl TimeIncrement {
    /// Constructs a `TimeIncrement` from a numeric value and unit.
    ///
    /// # Errors
    ///
    /// Returns a [`TimeIncrementError`] if `value` is not strictly positive
    /// and finite.
    pub fn new<U>(value: f64) -> Result<Self, TimeIncrementError>
    where
        U: time::Unit + Conversion<f64, T = f64>,
    {
        Self::from_time(Time::new::<U>(value))
    }

    /// Constructs a `TimeIncrement` from an existing [`Time`] value.
    ///
    /// # Errors
    ///
    /// Returns a [`TimeIncrementError`] if the time is zero, negative, or
    /// not finite.
    pub fn from_time(time: Time) -> Result<Self, TimeIncrementError> {
        let seconds = time.get::<second>();
        if !seconds.is_finite() {
            Err(TimeIncrementError::NotFinite(seconds))
        } else if seconds > 0.0 {
            Ok(Self(time))
        } else {
            Err(TimeIncrementError::NotPositive(seconds))
        }
    }

    /// Returns the increment in seconds.
    #[must_use]
    pub fn seconds(&self) -> f64 {
        self.0.get::<second>()
    }

    /// Returns the increment in days.
    #[must_use]
    pub fn days(&self) -> f64 {
        self.0.get::<day>()
    }

    /// Consumes the `TimeIncrement` and returns the underlying [`Time`].
    #[must_use]
    pub fn into_inner(self) -> Time {
        self.0
    }
}

impl TryFrom<Time> for TimeIncrement {
    type Error = TimeIncrementError;

    fn try_from(t: Time) -> Result<Self, Self::Error> {
        Self::from_time(t)
    }
}

impl Deref for TimeIncrement {
    type Target = Time;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Splits an increment into `parts` equal pieces.
///
/// The result stays strictly positive for any non-zero divisor, so the
/// invariant is preserved without revalidation.
impl Div<usize> for TimeIncrement {
    type Output = TimeIncrement;

    #[allow(clippy::cast_precision_loss)]
    fn div(self, parts: usize) -> Self::Output {
        debug_assert!(parts > 0, "cannot split a time increment into zero parts");
        TimeIncrement(self.0 / parts as f64)
    }
}

/// Scales an increment by a positive factor, e.g. half a step.
impl std::ops::Mul<f64> for TimeIncrement {
    type Output = TimeIncrement;

    fn mul(self, factor: f64) -> Self::Output {
        debug_assert!(factor > 0.0, "time increments scale by positive factors");
        TimeIncrement(self.0 * factor)
    }
}

/// Advances a [`Time`] by an increment.
impl Add<TimeIncrement> for Time {
    type Output = Time;

    fn add(self, rhs: TimeIncrement) -> Self::Output {
        self + rhs.0
    }
}

impl fmt::Display for TimeIncrement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} s", self.seconds())
    }
}
