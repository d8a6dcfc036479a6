use std::{collections::BTreeMap, time::Duration};

use crate::{FissionYields, ReactionRates};

/// Outcome of one transport evaluation.
///
/// `flux` holds the one-group scalar flux of every burnable material. The
/// optional fields are filled by solvers that provide the matching
/// [`Feature`](crate::Feature).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransportResult {
    pub flux: Vec<f64>,

    /// Multiplication factor and its uncertainty.
    pub keff: Option<(f64, f64)>,

    /// Wall-clock time spent in the solver.
    pub runtime: Option<Duration>,

    /// Microscopic cross sections per material.
    pub micro_xs: Option<Vec<ReactionRates>>,

    /// Fission yields per material.
    pub fission_yields: Option<Vec<FissionYields>>,

    /// Named macroscopic cross sections per material.
    pub macro_xs: Option<Vec<BTreeMap<String, f64>>>,
}

impl TransportResult {
    #[must_use]
    pub fn new(flux: Vec<f64>) -> Self {
        Self {
            flux,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_keff(mut self, keff: f64, uncertainty: f64) -> Self {
        self.keff = Some((keff, uncertainty));
        self
    }

    #[must_use]
    pub fn with_runtime(mut self, runtime: Duration) -> Self {
        self.runtime = Some(runtime);
        self
    }

    #[must_use]
    pub fn with_micro_xs(mut self, micro_xs: Vec<ReactionRates>) -> Self {
        self.micro_xs = Some(micro_xs);
        self
    }

    #[must_use]
    pub fn with_fission_yields(mut self, yields: Vec<FissionYields>) -> Self {
        self.fission_yields = Some(yields);
        self
    }

    #[must_use]
    pub fn with_macro_xs(mut self, macro_xs: Vec<BTreeMap<String, f64>>) -> Self {
        self.macro_xs = Some(macro_xs);
        self
    }

    #[must_use]
    pub fn has_negative_flux(&self) -> bool {
        self.flux.iter().any(|&phi| phi < 0.0)
    }
}

/// Flux from an intermediate evaluation inside a stepping scheme.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IntermediateFlux {
    pub flux: Vec<f64>,
    pub runtime: Option<Duration>,
}

impl From<TransportResult> for IntermediateFlux {
    fn from(result: TransportResult) -> Self {
        Self {
            flux: result.flux,
            runtime: result.runtime,
        }
    }
}
