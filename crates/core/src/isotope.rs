//! Isotope identity keys and the transmutation data carried by each isotope.

mod symbols;

use std::{fmt, str::FromStr};

use thiserror::Error;

use crate::FissionYieldTable;

/// Packed `(protons, nucleons, metastable state)` identity key.
///
/// Stored as `Z·10000 + A·10 + I`, so the natural integer order sorts by
/// proton count, then mass number, then metastable state.
///
/// ```
/// use burnup_core::Zai;
///
/// let am = "Am242_m1".parse::<Zai>().unwrap();
/// assert_eq!(am.packed(), 952_421);
/// assert_eq!(am.to_string(), "Am242_m1");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Zai(u32);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ZaiError {
    #[error("proton count {0} is not a known element")]
    UnknownProtonCount(u32),

    #[error("mass number {mass} is invalid for proton count {protons}")]
    InvalidMass { protons: u32, mass: u32 },

    #[error("metastable state {0} is out of range 0..=9")]
    InvalidState(u32),

    #[error("unknown element symbol `{0}`")]
    UnknownSymbol(String),

    #[error("malformed isotope name `{0}`")]
    Malformed(String),
}

impl Zai {
    /// Builds a key from its three components.
    ///
    /// # Errors
    ///
    /// Fails if `z` names no element, `a` is below `z` or above 999, or the
    /// metastable state exceeds 9.
    pub fn new(z: u32, a: u32, i: u32) -> Result<Self, ZaiError> {
        if symbols::symbol(z).is_none() {
            return Err(ZaiError::UnknownProtonCount(z));
        }
        if a < z || a > 999 {
            return Err(ZaiError::InvalidMass { protons: z, mass: a });
        }
        if i > 9 {
            return Err(ZaiError::InvalidState(i));
        }
        Ok(Self(z * 10_000 + a * 10 + i))
    }

    /// Unpacks and validates a `ZZAAAI` ordinal.
    ///
    /// # Errors
    ///
    /// Fails if any unpacked component is invalid, see [`Zai::new`].
    pub fn from_packed(packed: u32) -> Result<Self, ZaiError> {
        Self::new(packed / 10_000, (packed / 10) % 1000, packed % 10)
    }

    #[must_use]
    pub fn packed(self) -> u32 {
        self.0
    }

    #[must_use]
    pub fn protons(self) -> u32 {
        self.0 / 10_000
    }

    #[must_use]
    pub fn mass(self) -> u32 {
        (self.0 / 10) % 1000
    }

    #[must_use]
    pub fn state(self) -> u32 {
        self.0 % 10
    }
}

impl FromStr for Zai {
    type Err = ZaiError;

    /// Parses GND-style names such as `U235`, `Xe135` or `Am242_m1`.
    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let malformed = || ZaiError::Malformed(name.to_owned());

        let (nuclide, state) = match name.split_once("_m") {
            Some((nuclide, state)) => (nuclide, state.parse::<u32>().map_err(|_| malformed())?),
            None => (name, 0),
        };

        let split = nuclide
            .find(|c: char| c.is_ascii_digit())
            .ok_or_else(malformed)?;
        let (symbol, mass) = nuclide.split_at(split);
        if symbol.is_empty() {
            return Err(malformed());
        }
        let mass = mass.parse::<u32>().map_err(|_| malformed())?;
        let z = symbols::proton_count(symbol)
            .ok_or_else(|| ZaiError::UnknownSymbol(symbol.to_owned()))?;

        Self::new(z, mass, state)
    }
}

impl fmt::Display for Zai {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = symbols::symbol(self.protons()).unwrap_or("?");
        write!(f, "{symbol}{}", self.mass())?;
        if self.state() > 0 {
            write!(f, "_m{}", self.state())?;
        }
        Ok(())
    }
}

/// ENDF reaction identifier (MT number).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReactionType(pub u16);

impl ReactionType {
    pub const N_2N: Self = Self(16);
    pub const N_3N: Self = Self(17);
    pub const FISSION: Self = Self(18);
    pub const N_GAMMA: Self = Self(102);
    pub const N_P: Self = Self(103);
    pub const N_ALPHA: Self = Self(107);

    #[must_use]
    pub fn is_fission(self) -> bool {
        self == Self::FISSION
    }
}

impl fmt::Display for ReactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MT{}", self.0)
    }
}

/// A neutron-induced transmutation channel.
#[derive(Debug, Clone, PartialEq)]
pub struct Reaction {
    pub kind: ReactionType,

    /// Product of the reaction, if tracked. Fission products come from
    /// yield distributions instead.
    pub target: Option<Zai>,

    pub branch: f64,

    /// Energy released per reaction in eV.
    pub q_value: f64,
}

impl Reaction {
    #[must_use]
    pub fn new(kind: ReactionType, target: Option<Zai>) -> Self {
        Self {
            kind,
            target,
            branch: 1.0,
            q_value: 0.0,
        }
    }

    #[must_use]
    pub fn with_branch(mut self, branch: f64) -> Self {
        self.branch = branch;
        self
    }

    #[must_use]
    pub fn with_q_value(mut self, q_value: f64) -> Self {
        self.q_value = q_value;
        self
    }
}

/// One radioactive decay path, e.g. `beta-` or `alpha`.
#[derive(Debug, Clone, PartialEq)]
pub struct DecayMode {
    pub target: Option<Zai>,
    pub kind: String,
    pub branch: f64,
}

impl DecayMode {
    #[must_use]
    pub fn new(kind: impl Into<String>, target: Option<Zai>, branch: f64) -> Self {
        Self {
            target,
            kind: kind.into(),
            branch,
        }
    }
}

/// Transmutation and decay data for a single nuclide.
///
/// Isotopes are created and enriched through a
/// [`NetworkBuilder`](crate::NetworkBuilder) and are read-only once the
/// network is built.
#[derive(Debug, Clone, PartialEq)]
pub struct Isotope {
    zai: Zai,
    pub(crate) reactions: Vec<Reaction>,
    pub(crate) decay_modes: Vec<DecayMode>,
    pub(crate) decay_constant: Option<f64>,
    pub(crate) fission_yields: Option<FissionYieldTable>,
}

impl Isotope {
    pub(crate) fn new(zai: Zai) -> Self {
        Self {
            zai,
            reactions: Vec::new(),
            decay_modes: Vec::new(),
            decay_constant: None,
            fission_yields: None,
        }
    }

    #[must_use]
    pub fn zai(&self) -> Zai {
        self.zai
    }

    #[must_use]
    pub fn reactions(&self) -> &[Reaction] {
        &self.reactions
    }

    #[must_use]
    pub fn decay_modes(&self) -> &[DecayMode] {
        &self.decay_modes
    }

    /// Decay constant in 1/s, `None` for stable nuclides.
    #[must_use]
    pub fn decay_constant(&self) -> Option<f64> {
        self.decay_constant
    }

    #[must_use]
    pub fn fission_yields(&self) -> Option<&FissionYieldTable> {
        self.fission_yields.as_ref()
    }

    #[must_use]
    pub fn is_stable(&self) -> bool {
        self.decay_constant.is_none_or(|lambda| lambda == 0.0)
    }
}
