//! Isotope network construction and transmutation matrix assembly.
//!
//! A [`NetworkBuilder`] interns isotopes by identity key while nuclear data
//! is read, then [`NetworkBuilder::build`] freezes them into a sorted,
//! read-only [`Network`]. Lookups on the network use binary search over the
//! identity-key order, and every lookup for a key resolves to the same
//! stored [`Isotope`].

use std::collections::BTreeMap;

use thiserror::Error;

use crate::{
    DecayMode, FissionYieldTable, FissionYields, Isotope, Reaction, ReactionIndex, ReactionRates,
    SparseMatrix, Zai,
};

/// Maps isotope identity keys to matrix rows and columns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IsotopeIndex {
    positions: BTreeMap<Zai, usize>,
}

impl IsotopeIndex {
    /// Assigns consecutive positions in the order given.
    #[must_use]
    pub fn new(isotopes: &[Zai]) -> Self {
        let positions = isotopes.iter().enumerate().map(|(i, &z)| (z, i)).collect();
        Self { positions }
    }

    #[must_use]
    pub fn get(&self, zai: Zai) -> Option<usize> {
        self.positions.get(&zai).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum NetworkError {
    #[error("{zai} has invalid decay constant {value}")]
    InvalidDecayConstant { zai: Zai, value: f64 },

    #[error("{zai} has a branch ratio {value} outside [0, 1]")]
    InvalidBranch { zai: Zai, value: f64 },
}

/// Collects isotopes while nuclear data is processed.
///
/// Each identity key maps to exactly one [`Isotope`]; referring to a key
/// again, directly or as a reaction or decay target, reuses it.
#[derive(Debug, Default)]
pub struct NetworkBuilder {
    isotopes: BTreeMap<Zai, Isotope>,
}

impl NetworkBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&mut self, zai: Zai) -> &mut Isotope {
        self.isotopes.entry(zai).or_insert_with(|| Isotope::new(zai))
    }

    /// Registers an isotope with no data yet.
    pub fn insert(&mut self, zai: Zai) -> &mut Self {
        self.entry(zai);
        self
    }

    pub fn add_reaction(&mut self, parent: Zai, reaction: Reaction) -> &mut Self {
        if let Some(target) = reaction.target {
            self.entry(target);
        }
        self.entry(parent).reactions.push(reaction);
        self
    }

    pub fn add_decay_mode(&mut self, parent: Zai, mode: DecayMode) -> &mut Self {
        if let Some(target) = mode.target {
            self.entry(target);
        }
        self.entry(parent).decay_modes.push(mode);
        self
    }

    /// Sets the decay constant in 1/s.
    pub fn set_decay_constant(&mut self, zai: Zai, lambda: f64) -> &mut Self {
        self.entry(zai).decay_constant = Some(lambda);
        self
    }

    /// Sets the decay constant from a half-life in seconds.
    pub fn set_half_life(&mut self, zai: Zai, seconds: f64) -> &mut Self {
        self.set_decay_constant(zai, std::f64::consts::LN_2 / seconds)
    }

    pub fn set_fission_yields(&mut self, zai: Zai, table: FissionYieldTable) -> &mut Self {
        self.entry(zai).fission_yields = Some(table);
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.isotopes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.isotopes.is_empty()
    }

    /// Freezes the collected isotopes into a sorted network.
    ///
    /// # Errors
    ///
    /// Fails if a decay constant is negative or not finite, or a branch ratio
    /// lies outside `[0, 1]`.
    pub fn build(self) -> Result<Network, NetworkError> {
        for isotope in self.isotopes.values() {
            let zai = isotope.zai();
            if let Some(value) = isotope.decay_constant {
                if !value.is_finite() || value < 0.0 {
                    return Err(NetworkError::InvalidDecayConstant { zai, value });
                }
            }
            let branches = isotope
                .reactions
                .iter()
                .map(|r| r.branch)
                .chain(isotope.decay_modes.iter().map(|d| d.branch));
            for value in branches {
                if !(0.0..=1.0).contains(&value) {
                    return Err(NetworkError::InvalidBranch { zai, value });
                }
            }
        }

        let isotopes: Vec<Isotope> = self.isotopes.into_values().collect();
        log::debug!("built isotope network with {} isotopes", isotopes.len());
        Ok(Network { isotopes })
    }
}

/// Immutable catalogue of isotopes sorted by identity key.
#[derive(Debug, Clone, PartialEq)]
pub struct Network {
    isotopes: Vec<Isotope>,
}

impl Network {
    #[must_use]
    pub fn len(&self) -> usize {
        self.isotopes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.isotopes.is_empty()
    }

    /// Position of `zai` in the network order.
    #[must_use]
    pub fn index(&self, zai: Zai) -> Option<usize> {
        self.isotopes.binary_search_by_key(&zai, Isotope::zai).ok()
    }

    #[must_use]
    pub fn contains(&self, zai: Zai) -> bool {
        self.index(zai).is_some()
    }

    #[must_use]
    pub fn find(&self, zai: Zai) -> Option<&Isotope> {
        self.index(zai).map(|i| &self.isotopes[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Isotope> {
        self.isotopes.iter()
    }

    #[must_use]
    pub fn isotopes(&self) -> &[Isotope] {
        &self.isotopes
    }

    #[must_use]
    pub fn zais(&self) -> Vec<Zai> {
        self.isotopes.iter().map(Isotope::zai).collect()
    }

    /// Row/column assignment following the network order.
    #[must_use]
    pub fn ordering(&self) -> IsotopeIndex {
        IsotopeIndex::new(&self.zais())
    }

    /// Every `(isotope, reaction)` channel carried by the network.
    #[must_use]
    pub fn reaction_index(&self) -> ReactionIndex {
        ReactionIndex::from_pairs(
            self.isotopes
                .iter()
                .flat_map(|iso| iso.reactions().iter().map(move |r| (iso.zai(), r.kind))),
        )
    }

    /// Fission yields of every fissionable isotope at the tabulated energy
    /// nearest to `energy` (eV).
    #[must_use]
    pub fn fission_yields_at(&self, energy: f64) -> FissionYields {
        self.isotopes
            .iter()
            .filter_map(|iso| {
                iso.fission_yields()
                    .map(|table| (iso.zai(), table.at(energy).clone()))
            })
            .collect()
    }

    /// Assembles the transmutation matrix for one material.
    ///
    /// `rates` holds reaction rates (cross section times flux) per
    /// `(isotope, reaction)`. Fission products come from `yields`, keyed by
    /// parent. Isotopes and products absent from `ordering` are skipped.
    #[must_use]
    pub fn form_matrix(
        &self,
        rates: &ReactionRates,
        yields: &FissionYields,
        ordering: &IsotopeIndex,
    ) -> SparseMatrix {
        let mut matrix = SparseMatrix::zeros(ordering.len());

        for isotope in &self.isotopes {
            let Some(col) = ordering.get(isotope.zai()) else {
                continue;
            };

            for reaction in isotope.reactions() {
                let Some(rate) = rates.get(isotope.zai(), reaction.kind) else {
                    continue;
                };
                if rate == 0.0 {
                    continue;
                }
                matrix.add(col, col, -rate * reaction.branch);

                if reaction.kind.is_fission() {
                    let Some(fy) = yields.get(&isotope.zai()) else {
                        continue;
                    };
                    for (product, value) in fy.iter().filter(|&(_, y)| y != 0.0) {
                        if let Some(row) = ordering.get(product) {
                            matrix.add(row, col, rate * value);
                        }
                    }
                } else if let Some(row) = reaction.target.and_then(|t| ordering.get(t)) {
                    matrix.add(row, col, rate * reaction.branch);
                }
            }

            if let Some(lambda) = isotope.decay_constant().filter(|&l| l > 0.0) {
                matrix.add(col, col, -lambda);
                for mode in isotope.decay_modes() {
                    if let Some(row) = mode.target.and_then(|t| ordering.get(t)) {
                        matrix.add(row, col, lambda * mode.branch);
                    }
                }
            }
        }

        matrix
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use approx::assert_relative_eq;

    use crate::{FissionYield, ReactionType};

    // --- Test fixtures ---

    fn zai(name: &str) -> Zai {
        name.parse().unwrap()
    }

    /// U235 captures into U236 and fissions; I135 decays to Xe135, which
    /// captures into Xe136.
    fn network() -> Network {
        let mut builder = NetworkBuilder::new();
        builder
            .add_reaction(
                zai("U235"),
                Reaction::new(ReactionType::N_GAMMA, Some(zai("U236"))),
            )
            .add_reaction(zai("U235"), Reaction::new(ReactionType::FISSION, None))
            .set_fission_yields(
                zai("U235"),
                FissionYieldTable::new([(
                    0.0253,
                    FissionYield::new([(zai("I135"), 0.06), (zai("Xe135"), 0.003)]),
                )])
                .unwrap(),
            )
            .add_decay_mode(zai("I135"), DecayMode::new("beta-", Some(zai("Xe135")), 1.0))
            .set_half_life(zai("I135"), 23_652.0)
            .add_reaction(
                zai("Xe135"),
                Reaction::new(ReactionType::N_GAMMA, Some(zai("Xe136"))),
            );
        builder.build().unwrap()
    }

    fn rates(network: &Network, values: &[(&str, ReactionType, f64)]) -> ReactionRates {
        let mut rates = ReactionRates::zeros(Arc::new(network.reaction_index()));
        for &(name, rxn, value) in values {
            assert!(rates.set(zai(name), rxn, value));
        }
        rates
    }

    // --- Tests ---

    #[test]
    fn builder_registers_targets_and_sorts() {
        let network = network();
        let names: Vec<String> = network.iter().map(|i| i.zai().to_string()).collect();
        assert_eq!(names, ["I135", "Xe135", "Xe136", "U235", "U236"]);
        assert!(network.contains(zai("U236")));
        assert!(!network.contains(zai("U238")));
        assert_eq!(network.index(zai("Xe136")), Some(2));
    }

    #[test]
    fn find_returns_the_same_instance() {
        let network = network();
        let first = network.find(zai("Xe135")).unwrap();
        let second = network.find(zai("Xe135")).unwrap();
        assert!(std::ptr::eq(first, second));
        assert!(network.find(zai("Pu239")).is_none());
    }

    #[test]
    fn reaction_index_covers_all_channels() {
        let index = network().reaction_index();
        assert_eq!(index.len(), 3);
        assert_eq!(
            index.reactions(zai("U235")),
            [ReactionType::FISSION, ReactionType::N_GAMMA]
        );
    }

    #[test]
    fn matrix_terms() {
        let network = network();
        let ordering = network.ordering();
        let rates = rates(
            &network,
            &[
                ("U235", ReactionType::N_GAMMA, 2.0),
                ("U235", ReactionType::FISSION, 10.0),
                ("Xe135", ReactionType::N_GAMMA, 5.0),
            ],
        );
        let yields = network.fission_yields_at(0.0253);
        let m = network.form_matrix(&rates, &yields, &ordering);

        let at = |row: &str, col: &str| {
            m.get(
                ordering.get(zai(row)).unwrap(),
                ordering.get(zai(col)).unwrap(),
            )
        };
        let lambda = std::f64::consts::LN_2 / 23_652.0;

        assert_eq!(m.dim(), 5);
        assert_relative_eq!(at("U235", "U235"), -12.0);
        assert_relative_eq!(at("U236", "U235"), 2.0);
        assert_relative_eq!(at("I135", "U235"), 0.6);
        assert_relative_eq!(at("Xe135", "U235"), 0.03);
        assert_relative_eq!(at("I135", "I135"), -lambda);
        assert_relative_eq!(at("Xe135", "I135"), lambda);
        assert_relative_eq!(at("Xe135", "Xe135"), -5.0);
        assert_relative_eq!(at("Xe136", "Xe135"), 5.0);
    }

    #[test]
    fn destruction_only_columns_conserve_atoms() {
        let network = network();
        let ordering = network.ordering();
        let rates = rates(
            &network,
            &[
                ("U235", ReactionType::N_GAMMA, 2.0),
                ("Xe135", ReactionType::N_GAMMA, 5.0),
            ],
        );
        let m = network.form_matrix(&rates, &FissionYields::new(), &ordering);

        for name in ["U235", "Xe135", "I135"] {
            assert_relative_eq!(m.column_sum(ordering.get(zai(name)).unwrap()), 0.0);
        }
    }

    #[test]
    fn sub_network_ordering_skips_missing_isotopes() {
        let network = network();
        let ordering = IsotopeIndex::new(&[zai("Xe135"), zai("U235")]);
        let rates = rates(
            &network,
            &[
                ("U235", ReactionType::N_GAMMA, 2.0),
                ("U235", ReactionType::FISSION, 10.0),
                ("Xe135", ReactionType::N_GAMMA, 5.0),
            ],
        );
        let m = network.form_matrix(&rates, &network.fission_yields_at(0.0), &ordering);

        assert_eq!(m.dim(), 2);
        assert_eq!(m.nnz(), 3);
        assert_relative_eq!(m.get(1, 1), -12.0);
        assert_relative_eq!(m.get(0, 1), 0.03);
        assert_relative_eq!(m.get(0, 0), -5.0);
    }

    #[test]
    fn build_rejects_bad_data() {
        let mut builder = NetworkBuilder::new();
        builder.set_decay_constant(zai("I135"), -1.0);
        assert!(matches!(
            builder.build(),
            Err(NetworkError::InvalidDecayConstant { .. })
        ));

        let mut builder = NetworkBuilder::new();
        builder.add_reaction(
            zai("U235"),
            Reaction::new(ReactionType::N_GAMMA, None).with_branch(1.5),
        );
        assert!(matches!(
            builder.build(),
            Err(NetworkError::InvalidBranch { .. })
        ));
    }
}
