use std::{fmt, ops::AddAssign};

use uom::si::{
    f64::Time,
    time::{day, second},
};

use crate::TimeIncrement;

/// How a [`Cursor`] advance relates to the coarse-step boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// The advance completes a coarse step.
    Coarse,

    /// The advance lands on a sub-step inside the current coarse step.
    Substep,
}

/// Position of a run in simulated calendar time.
///
/// `total` counts every advance and is the index of the transport
/// evaluation at the cursor's current time. `coarse` only moves on
/// coarse-boundary advances, which also reset `substep`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cursor {
    coarse: usize,
    substep: Option<usize>,
    total: usize,
    time: Time,
}

impl Cursor {
    /// Creates a cursor at the start of the first coarse step.
    #[must_use]
    pub fn new(start: Time) -> Self {
        Self {
            coarse: 0,
            substep: None,
            total: 0,
            time: start,
        }
    }

    /// Creates a cursor at `days` into the calendar.
    #[must_use]
    pub fn starting_at_days(days: f64) -> Self {
        Self::new(Time::new::<day>(days))
    }

    /// Moves the cursor forward by `dt`.
    pub fn advance(&mut self, dt: TimeIncrement, kind: Advance) {
        match kind {
            Advance::Coarse => {
                self.substep = None;
                self.coarse += 1;
            }
            Advance::Substep => {
                self.substep = Some(self.substep.map_or(1, |s| s + 1));
            }
        }
        self.total += 1;
        self.time = self.time + dt;
    }

    #[must_use]
    pub fn coarse(&self) -> usize {
        self.coarse
    }

    #[must_use]
    pub fn substep(&self) -> Option<usize> {
        self.substep
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.total
    }

    #[must_use]
    pub fn time(&self) -> Time {
        self.time
    }

    /// Current calendar time in seconds.
    #[must_use]
    pub fn seconds(&self) -> f64 {
        self.time.get::<second>()
    }

    /// Current calendar time in days.
    #[must_use]
    pub fn days(&self) -> f64 {
        self.time.get::<day>()
    }
}

/// A bare `+=` is a sub-step advance.
impl AddAssign<TimeIncrement> for Cursor {
    fn add_assign(&mut self, dt: TimeIncrement) {
        self.advance(dt, Advance::Substep);
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cursor(coarse={}, substep=", self.coarse)?;
        match self.substep {
            Some(s) => write!(f, "{s}")?,
            None => write!(f, "-")?,
        }
        write!(f, ", total={}, time={:.4} d)", self.total, self.days())
    }
}
