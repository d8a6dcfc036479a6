use thiserror::Error;
use uom::si::{
    f64::{Power, Time},
    power::watt,
    time::day,
};

use crate::{TimeIncrement, TimeIncrementError};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScheduleError {
    #[error("a schedule needs at least one coarse step")]
    Empty,

    #[error("coarse step {step}: {source}")]
    Length {
        step: usize,
        #[source]
        source: TimeIncrementError,
    },

    #[error("coarse step {step}: power must be positive and finite, got {watts} W")]
    Power { step: usize, watts: f64 },

    #[error("coarse step {step}: needs at least one sub-step")]
    NoSubsteps { step: usize },

    #[error("{preliminary} preliminary steps leave no coupled step among {steps} coarse steps")]
    TooManyPreliminary { preliminary: usize, steps: usize },

    #[error("preliminary step {step} uses {substeps} sub-steps; preliminary steps take exactly one")]
    PreliminarySubsteps { step: usize, substeps: usize },

    #[error("{name} has {found} values for {steps} coarse steps")]
    Broadcast {
        name: &'static str,
        found: usize,
        steps: usize,
    },
}

/// One coarse depletion interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoarseStep {
    length: TimeIncrement,
    power: Power,
    substeps: usize,
}

impl CoarseStep {
    #[must_use]
    pub fn length(&self) -> TimeIncrement {
        self.length
    }

    #[must_use]
    pub fn power(&self) -> Power {
        self.power
    }

    /// Transport evaluations inside the step, including the high-fidelity one.
    #[must_use]
    pub fn substeps(&self) -> usize {
        self.substeps
    }

    /// Length of each sub-step.
    #[must_use]
    pub fn substep_length(&self) -> TimeIncrement {
        self.length / self.substeps
    }
}

/// Coarse steps with their powers and sub-step counts.
///
/// The first `preliminary` steps run without reduced-order coupling.
///
/// ```
/// use burnup_core::Schedule;
///
/// let schedule = Schedule::from_days(&[1.0, 5.0, 5.0], &[1.0e6], &[1, 3, 3], 1).unwrap();
/// assert_eq!(schedule.len(), 3);
/// assert_eq!(schedule.transport_solves(), 8);
/// assert!(Schedule::from_days(&[1.0], &[1.0e6], &[2], 1).is_err());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Schedule {
    steps: Vec<CoarseStep>,
    preliminary: usize,
}

impl Schedule {
    /// Validates and builds a schedule from `(length, power, substeps)`
    /// triples.
    ///
    /// # Errors
    ///
    /// Fails if the schedule is empty, a power is not positive and finite,
    /// a step has no sub-steps, `preliminary` is not below the step count, or
    /// a preliminary step has more than one sub-step.
    pub fn new(
        steps: impl IntoIterator<Item = (TimeIncrement, Power, usize)>,
        preliminary: usize,
    ) -> Result<Self, ScheduleError> {
        let mut coarse = Vec::new();
        for (step, (length, power, substeps)) in steps.into_iter().enumerate() {
            let watts = power.get::<watt>();
            if !watts.is_finite() || watts <= 0.0 {
                return Err(ScheduleError::Power { step, watts });
            }
            if substeps == 0 {
                return Err(ScheduleError::NoSubsteps { step });
            }
            if step < preliminary && substeps != 1 {
                return Err(ScheduleError::PreliminarySubsteps { step, substeps });
            }
            coarse.push(CoarseStep {
                length,
                power,
                substeps,
            });
        }

        if coarse.is_empty() {
            return Err(ScheduleError::Empty);
        }
        if preliminary >= coarse.len() {
            return Err(ScheduleError::TooManyPreliminary {
                preliminary,
                steps: coarse.len(),
            });
        }

        Ok(Self {
            steps: coarse,
            preliminary,
        })
    }

    /// Builds a schedule from step lengths in days and powers in watts.
    ///
    /// `power` and `substeps` hold either one value for every step or one
    /// value per step.
    ///
    /// # Errors
    ///
    /// Fails if a length is not positive and finite, a list cannot be
    /// broadcast to the step count, or [`Schedule::new`] rejects the result.
    pub fn from_days(
        days: &[f64],
        power: &[f64],
        substeps: &[usize],
        preliminary: usize,
    ) -> Result<Self, ScheduleError> {
        let steps = days.len();
        let power = broadcast("power", power, steps)?;
        let substeps = broadcast("substeps", substeps, steps)?;

        let triples = days
            .iter()
            .zip(power)
            .zip(substeps)
            .enumerate()
            .map(|(step, ((&d, p), s))| {
                let length = TimeIncrement::new::<day>(d)
                    .map_err(|source| ScheduleError::Length { step, source })?;
                Ok((length, Power::new::<watt>(p), s))
            })
            .collect::<Result<Vec<_>, ScheduleError>>()?;

        Self::new(triples, preliminary)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    #[must_use]
    pub fn steps(&self) -> &[CoarseStep] {
        &self.steps
    }

    #[must_use]
    pub fn preliminary(&self) -> usize {
        self.preliminary
    }

    #[must_use]
    pub fn is_preliminary(&self, step: usize) -> bool {
        step < self.preliminary
    }

    /// Power of the last coarse step, used for the terminal evaluation.
    #[must_use]
    pub fn final_power(&self) -> Power {
        self.steps[self.steps.len() - 1].power
    }

    /// Every transport evaluation in a run: `sum(substeps) + 1`.
    #[must_use]
    pub fn transport_solves(&self) -> usize {
        self.steps.iter().map(|s| s.substeps).sum::<usize>() + 1
    }

    /// High-fidelity evaluations in a run: one per coarse step plus the
    /// terminal one.
    #[must_use]
    pub fn high_fidelity_solves(&self) -> usize {
        self.steps.len() + 1
    }

    #[must_use]
    pub fn duration(&self) -> Time {
        self.steps
            .iter()
            .fold(Time::new::<day>(0.0), |total, s| total + s.length)
    }
}

fn broadcast<T: Copy>(
    name: &'static str,
    values: &[T],
    steps: usize,
) -> Result<Vec<T>, ScheduleError> {
    match values {
        [single] => Ok(vec![*single; steps]),
        many if many.len() == steps => Ok(many.to_vec()),
        _ => Err(ScheduleError::Broadcast {
            name,
            found: values.len(),
            steps,
        }),
    }
}
