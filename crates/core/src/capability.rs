//! Physics capabilities offered by high-fidelity solvers and required by
//! the depletion coordinator and reduced-order solvers.

use std::{collections::BTreeSet, fmt};

use thiserror::Error;

/// A discrete physics capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Feature {
    FissionMatrix,
    GlobalHomogenization,
    LocalHomogenization,
    MicroReactionXs,
    FissionYields,
}

impl Feature {
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::FissionMatrix => "fission matrix",
            Self::GlobalHomogenization => "global homogenization",
            Self::LocalHomogenization => "local homogenization",
            Self::MicroReactionXs => "microscopic cross sections",
            Self::FissionYields => "fission yields",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Named features plus named macroscopic cross sections.
///
/// ```
/// use burnup_core::{Capabilities, Feature};
///
/// let offered = Capabilities::from_features([Feature::FissionMatrix]);
/// let needed = Capabilities::from_features([Feature::FissionMatrix, Feature::MicroReactionXs]);
///
/// let err = offered.require(&needed).unwrap_err();
/// assert_eq!(err.missing_features, [Feature::MicroReactionXs]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Capabilities {
    features: BTreeSet<Feature>,
    macro_xs: BTreeSet<String>,
}

impl Capabilities {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_features(features: impl IntoIterator<Item = Feature>) -> Self {
        Self {
            features: features.into_iter().collect(),
            macro_xs: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn with_macro_xs<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.macro_xs.extend(names.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn features(&self) -> &BTreeSet<Feature> {
        &self.features
    }

    #[must_use]
    pub fn macro_xs(&self) -> &BTreeSet<String> {
        &self.macro_xs
    }

    #[must_use]
    pub fn contains(&self, feature: Feature) -> bool {
        self.features.contains(&feature)
    }

    #[must_use]
    pub fn contains_macro_xs(&self, name: &str) -> bool {
        self.macro_xs.contains(name)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty() && self.macro_xs.is_empty()
    }

    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            features: self.features.union(&other.features).copied().collect(),
            macro_xs: self.macro_xs.union(&other.macro_xs).cloned().collect(),
        }
    }

    /// Items in `self` that `other` lacks.
    #[must_use]
    pub fn difference(&self, other: &Self) -> Self {
        Self {
            features: self.features.difference(&other.features).copied().collect(),
            macro_xs: self.macro_xs.difference(&other.macro_xs).cloned().collect(),
        }
    }

    #[must_use]
    pub fn is_subset(&self, other: &Self) -> bool {
        self.features.is_subset(&other.features) && self.macro_xs.is_subset(&other.macro_xs)
    }

    /// Checks that `self` offers everything in `needs`.
    ///
    /// # Errors
    ///
    /// Returns an [`IncompatibilityError`] naming every missing item.
    pub fn require(&self, needs: &Self) -> Result<(), IncompatibilityError> {
        let missing = needs.difference(self);
        if missing.is_empty() {
            Ok(())
        } else {
            Err(IncompatibilityError {
                missing_features: missing.features.into_iter().collect(),
                missing_macro_xs: missing.macro_xs.into_iter().collect(),
            })
        }
    }
}

impl FromIterator<Feature> for Capabilities {
    fn from_iter<T: IntoIterator<Item = Feature>>(iter: T) -> Self {
        Self::from_features(iter)
    }
}

/// A solver pairing that cannot run together.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", describe(.missing_features, .missing_macro_xs))]
pub struct IncompatibilityError {
    pub missing_features: Vec<Feature>,
    pub missing_macro_xs: Vec<String>,
}

fn describe(features: &[Feature], macro_xs: &[String]) -> String {
    let mut parts = Vec::new();
    if !features.is_empty() {
        let names: Vec<&str> = features.iter().map(|f| f.description()).collect();
        parts.push(format!("missing features: {}", names.join(", ")));
    }
    if !macro_xs.is_empty() {
        parts.push(format!(
            "missing macroscopic cross sections: {}",
            macro_xs.join(", ")
        ));
    }
    format!("incompatible solvers; {}", parts.join("; "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_operations() {
        let a = Capabilities::from_features([Feature::FissionMatrix, Feature::MicroReactionXs])
            .with_macro_xs(["abs"]);
        let b = Capabilities::from_features([Feature::FissionMatrix]).with_macro_xs(["abs", "fiss"]);

        let union = a.union(&b);
        assert!(union.contains(Feature::MicroReactionXs));
        assert!(union.contains_macro_xs("fiss"));
        assert!(a.is_subset(&union) && b.is_subset(&union));

        let diff = a.difference(&b);
        assert_eq!(diff, Capabilities::from_features([Feature::MicroReactionXs]));
        assert!(b.difference(&union).is_empty());
    }

    #[test]
    fn missing_micro_xs_is_named() {
        let offered = Capabilities::from_features([Feature::FissionMatrix]);
        let needs = Capabilities::from_features([Feature::FissionMatrix, Feature::MicroReactionXs]);

        let err = offered.require(&needs).unwrap_err();
        assert_eq!(err.missing_features, [Feature::MicroReactionXs]);
        assert!(err.missing_macro_xs.is_empty());
        assert_eq!(
            err.to_string(),
            "incompatible solvers; missing features: microscopic cross sections"
        );
    }

    #[test]
    fn missing_macro_xs_is_named() {
        let offered = Capabilities::new();
        let needs = Capabilities::new().with_macro_xs(["inf_flx", "abs"]);

        let err = offered.require(&needs).unwrap_err();
        assert_eq!(
            err.to_string(),
            "incompatible solvers; missing macroscopic cross sections: abs, inf_flx"
        );
        assert!(needs.require(&needs).is_ok());
    }
}
