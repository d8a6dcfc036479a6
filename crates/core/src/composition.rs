use std::collections::BTreeMap;

use ndarray::{Array2, ArrayView1};
use thiserror::Error;

use crate::{IsotopeIndex, Zai};

/// A material whose composition changes during the run.
#[derive(Debug, Clone, PartialEq)]
pub struct BurnableMaterial {
    pub id: usize,
    pub name: String,
    /// Volume in cm³.
    pub volume: f64,
}

impl BurnableMaterial {
    #[must_use]
    pub fn new(id: usize, name: impl Into<String>, volume: f64) -> Self {
        Self {
            id,
            name: name.into(),
            volume,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompositionError {
    #[error("density array has {found} isotope columns but {expected} isotopes are listed")]
    ColumnMismatch { expected: usize, found: usize },

    #[error("isotope {0} is listed more than once")]
    DuplicateIsotope(Zai),
}

/// Atom densities of every burnable material over one isotope ordering.
///
/// `densities` has one row per material and one column per entry of
/// `isotopes`, in atoms/b-cm.
#[derive(Debug, Clone, PartialEq)]
pub struct CompBundle {
    isotopes: Vec<Zai>,
    densities: Array2<f64>,
}

impl CompBundle {
    /// # Errors
    ///
    /// Fails if the column count differs from the isotope count or an
    /// isotope repeats.
    pub fn new(isotopes: Vec<Zai>, densities: Array2<f64>) -> Result<Self, CompositionError> {
        if densities.ncols() != isotopes.len() {
            return Err(CompositionError::ColumnMismatch {
                expected: isotopes.len(),
                found: densities.ncols(),
            });
        }
        let mut seen = std::collections::BTreeSet::new();
        if let Some(&dup) = isotopes.iter().find(|z| !seen.insert(**z)) {
            return Err(CompositionError::DuplicateIsotope(dup));
        }
        Ok(Self {
            isotopes,
            densities,
        })
    }

    /// Lays sparse per-material densities onto a fixed isotope list.
    ///
    /// Isotopes not in `isotopes` are ignored.
    ///
    /// # Errors
    ///
    /// Fails if an isotope repeats.
    pub fn from_materials(
        isotopes: Vec<Zai>,
        materials: &[BTreeMap<Zai, f64>],
    ) -> Result<Self, CompositionError> {
        let ordering = IsotopeIndex::new(&isotopes);
        let mut densities = Array2::zeros((materials.len(), isotopes.len()));
        for (row, material) in materials.iter().enumerate() {
            for (&zai, &density) in material {
                if let Some(col) = ordering.get(zai) {
                    densities[[row, col]] = density;
                }
            }
        }
        Self::new(isotopes, densities)
    }

    #[must_use]
    pub fn isotopes(&self) -> &[Zai] {
        &self.isotopes
    }

    #[must_use]
    pub fn densities(&self) -> &Array2<f64> {
        &self.densities
    }

    #[must_use]
    pub fn materials(&self) -> usize {
        self.densities.nrows()
    }

    #[must_use]
    pub fn material(&self, index: usize) -> ArrayView1<'_, f64> {
        self.densities.row(index)
    }

    #[must_use]
    pub fn ordering(&self) -> IsotopeIndex {
        IsotopeIndex::new(&self.isotopes)
    }

    /// Returns a bundle with new densities over the same isotopes.
    ///
    /// # Errors
    ///
    /// Fails if the column count changes.
    pub fn with_densities(&self, densities: Array2<f64>) -> Result<Self, CompositionError> {
        if densities.ncols() != self.isotopes.len() {
            return Err(CompositionError::ColumnMismatch {
                expected: self.isotopes.len(),
                found: densities.ncols(),
            });
        }
        Ok(Self {
            isotopes: self.isotopes.clone(),
            densities,
        })
    }

    #[must_use]
    pub fn into_parts(self) -> (Vec<Zai>, Array2<f64>) {
        (self.isotopes, self.densities)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use ndarray::array;

    fn zai(name: &str) -> Zai {
        name.parse().unwrap()
    }

    #[test]
    fn lays_out_sparse_materials() {
        let isotopes = vec![zai("Xe135"), zai("U235"), zai("U238")];
        let fuel = BTreeMap::from([(zai("U235"), 1e-3), (zai("U238"), 2e-2), (zai("O16"), 4e-2)]);
        let empty = BTreeMap::new();

        let bundle = CompBundle::from_materials(isotopes, &[fuel, empty]).unwrap();
        assert_eq!(bundle.materials(), 2);
        assert_eq!(bundle.material(0).to_vec(), [0.0, 1e-3, 2e-2]);
        assert_eq!(bundle.material(1).to_vec(), [0.0, 0.0, 0.0]);
        assert_eq!(bundle.ordering().get(zai("U238")), Some(2));
    }

    #[test]
    fn rejects_shape_and_duplicates() {
        assert_eq!(
            CompBundle::new(vec![zai("U235")], array![[1.0, 2.0]]),
            Err(CompositionError::ColumnMismatch {
                expected: 1,
                found: 2
            })
        );
        assert_eq!(
            CompBundle::new(vec![zai("U235"), zai("U235")], array![[1.0, 2.0]]),
            Err(CompositionError::DuplicateIsotope(zai("U235")))
        );

        let bundle = CompBundle::new(vec![zai("U235")], array![[1.0]]).unwrap();
        assert!(bundle.with_densities(array![[1.0, 0.0]]).is_err());
        assert_eq!(
            bundle.with_densities(array![[0.5], [0.25]]).unwrap().materials(),
            2
        );
    }
}
