//! Run settings loaded from the `[burnup]` table of a TOML document.
//!
//! ```
//! use burnup_core::{DepletionSolverKind, Settings};
//!
//! let settings = Settings::from_toml_str(
//!     r#"
//!     [burnup]
//!     depletion-solver = "pade13"
//!     fitting-order = 2
//!
//!     [burnup.schedule]
//!     days = [1.0, 10.0, 10.0]
//!     power = 6.0e6
//!     substeps = [1, 4, 4]
//!     preliminary-steps = 1
//!     "#,
//! )
//! .unwrap();
//!
//! assert_eq!(settings.depletion_solver, DepletionSolverKind::Pade13);
//! assert_eq!(settings.schedule().unwrap().unwrap().transport_solves(), 10);
//! ```

use std::{fmt, fs, path::Path};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Schedule, ScheduleError};

/// Matrix-exponential back-end used for depletion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DepletionSolverKind {
    /// 16th-order Chebyshev rational approximation.
    #[default]
    Cram16,

    /// Degree-13 Padé approximant with scaling and squaring.
    Pade13,
}

impl DepletionSolverKind {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Cram16 => "cram16",
            Self::Pade13 => "pade13",
        }
    }
}

impl fmt::Display for DepletionSolverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse settings: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("fitting order {order} needs more than {points} fitting points")]
    FittingOrder { order: usize, points: usize },

    #[error("at least one fitting point is required")]
    NoFittingPoints,

    #[error("negative density {name} threshold must be finite and non-negative, got {value}")]
    Threshold { name: &'static str, value: f64 },

    #[error("negative density warn threshold {warn}% exceeds error threshold {error}%")]
    ThresholdOrder { warn: f64, error: f64 },

    #[error("invalid schedule: {0}")]
    Schedule(#[from] ScheduleError),
}

/// A single value applied to every coarse step, or one value per step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PerStep<T> {
    One(T),
    Many(Vec<T>),
}

impl<T: Clone> PerStep<T> {
    #[must_use]
    pub fn to_vec(&self) -> Vec<T> {
        match self {
            Self::One(value) => vec![value.clone()],
            Self::Many(values) => values.clone(),
        }
    }
}

fn one_substep() -> PerStep<usize> {
    PerStep::One(1)
}

/// Coarse-step schedule as written in settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ScheduleSettings {
    /// Coarse-step lengths in days.
    pub days: Vec<f64>,

    /// Power in watts.
    pub power: PerStep<f64>,

    #[serde(default = "one_substep")]
    pub substeps: PerStep<usize>,

    #[serde(default)]
    pub preliminary_steps: usize,
}

impl ScheduleSettings {
    /// # Errors
    ///
    /// Returns the [`ScheduleError`] of an invalid schedule.
    pub fn to_schedule(&self) -> Result<Schedule, ScheduleError> {
        Schedule::from_days(
            &self.days,
            &self.power.to_vec(),
            &self.substeps.to_vec(),
            self.preliminary_steps,
        )
    }
}

/// Settings that tune the depletion engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields, default)]
pub struct Settings {
    pub depletion_solver: DepletionSolverKind,

    /// Maximum polynomial degree for cross-section extrapolation.
    pub fitting_order: usize,

    /// Cross-section points kept per material.
    pub fitting_points: usize,

    pub negative_density_warn_percent: f64,
    pub negative_density_error_percent: f64,

    #[serde(rename = "schedule", skip_serializing_if = "Option::is_none")]
    pub schedule_settings: Option<ScheduleSettings>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            depletion_solver: DepletionSolverKind::default(),
            fitting_order: 1,
            fitting_points: 3,
            negative_density_warn_percent: 1e-3,
            negative_density_error_percent: 1.0,
            schedule_settings: None,
        }
    }
}

/// Other tables belong to the transport solvers and are ignored here.
#[derive(Deserialize)]
struct Document {
    #[serde(default)]
    burnup: Settings,
}

impl Settings {
    /// Parses and validates the `[burnup]` table of a TOML document.
    ///
    /// A missing table yields the defaults.
    ///
    /// # Errors
    ///
    /// Fails on malformed TOML, unknown keys, or values rejected by
    /// [`Settings::validate`].
    pub fn from_toml_str(source: &str) -> Result<Self, SettingsError> {
        let document: Document = toml::from_str(source)?;
        document.burnup.validate()?;
        Ok(document.burnup)
    }

    /// Reads and validates a TOML settings file.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or [`Settings::from_toml_str`]
    /// rejects its contents.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        log::debug!("reading settings from {}", path.display());
        Self::from_toml_str(&fs::read_to_string(path)?)
    }

    /// Checks cross-field constraints.
    ///
    /// # Errors
    ///
    /// Fails if there are no fitting points, the fitting order is not below
    /// the point count, a density threshold is negative or not finite, the
    /// warn threshold exceeds the error threshold, or the schedule is
    /// invalid.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.fitting_points == 0 {
            return Err(SettingsError::NoFittingPoints);
        }
        if self.fitting_order >= self.fitting_points {
            return Err(SettingsError::FittingOrder {
                order: self.fitting_order,
                points: self.fitting_points,
            });
        }

        let warn = self.negative_density_warn_percent;
        let error = self.negative_density_error_percent;
        for (name, value) in [("warn", warn), ("error", error)] {
            if !value.is_finite() || value < 0.0 {
                return Err(SettingsError::Threshold { name, value });
            }
        }
        if warn > error {
            return Err(SettingsError::ThresholdOrder { warn, error });
        }

        self.schedule()?;
        Ok(())
    }

    /// The validated schedule, if one is configured.
    ///
    /// # Errors
    ///
    /// Returns the [`ScheduleError`] of an invalid schedule.
    pub fn schedule(&self) -> Result<Option<Schedule>, ScheduleError> {
        self.schedule_settings
            .as_ref()
            .map(ScheduleSettings::to_schedule)
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let settings = Settings::from_toml_str("").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.depletion_solver.name(), "cram16");
        assert_eq!(settings.schedule().unwrap(), None);
    }

    #[test]
    fn reads_thresholds_and_fitting() {
        let settings = Settings::from_toml_str(
            r"
            [burnup]
            fitting-order = 0
            fitting-points = 1
            negative-density-warn-percent = 0.5
            negative-density-error-percent = 5.0
            ",
        )
        .unwrap();
        assert_eq!(settings.fitting_points, 1);
        assert_eq!(settings.negative_density_error_percent, 5.0);
    }

    #[test]
    fn per_step_lists() {
        let settings = Settings::from_toml_str(
            r"
            [burnup.schedule]
            days = [5.0, 5.0]
            power = [1.0e6, 2.0e6]
            ",
        )
        .unwrap();
        let schedule = settings.schedule().unwrap().unwrap();
        assert_eq!(schedule.len(), 2);
        assert_eq!(schedule.transport_solves(), 3);
    }

    #[test]
    fn rejects_unknown_keys_and_solvers() {
        assert!(matches!(
            Settings::from_toml_str("[burnup]\nfitting-ordre = 1\n"),
            Err(SettingsError::Parse(_))
        ));
        assert!(matches!(
            Settings::from_toml_str("[burnup]\ndepletion-solver = \"cram48\"\n"),
            Err(SettingsError::Parse(_))
        ));
    }

    #[test]
    fn rejects_inconsistent_values() {
        assert!(matches!(
            Settings::from_toml_str("[burnup]\nfitting-order = 3\n"),
            Err(SettingsError::FittingOrder {
                order: 3,
                points: 3
            })
        ));
        assert!(matches!(
            Settings::from_toml_str("[burnup]\nnegative-density-warn-percent = 2.0\n"),
            Err(SettingsError::ThresholdOrder { .. })
        ));
        assert!(matches!(
            Settings::from_toml_str("[burnup]\nnegative-density-error-percent = -1.0\n"),
            Err(SettingsError::Threshold { name: "error", .. })
        ));
        assert!(matches!(
            Settings::from_toml_str(
                "[burnup.schedule]\ndays = [1.0]\npower = 1.0\npreliminary-steps = 1\n"
            ),
            Err(SettingsError::Schedule(
                ScheduleError::TooManyPreliminary { .. }
            ))
        ));
    }
}
