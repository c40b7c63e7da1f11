use nalgebra::Point3;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GeometryError {
    #[error("Geometry has {symbols} symbol(s) but {positions} position(s)")]
    LengthMismatch { symbols: usize, positions: usize },
}

/// An ordered list of atoms, each with an element symbol and cartesian coordinates.
///
/// The symbol and position lists always have the same length. A `Geometry` is
/// read-only once built; cloning copies both buffers.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Geometry {
    symbols: Vec<String>,
    positions: Vec<Point3<f64>>,
}

impl Geometry {
    /// Creates a geometry from parallel symbol and position lists.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::LengthMismatch`] if the two lists differ in length.
    pub fn new(symbols: Vec<String>, positions: Vec<Point3<f64>>) -> Result<Self, GeometryError> {
        if symbols.len() != positions.len() {
            return Err(GeometryError::LengthMismatch {
                symbols: symbols.len(),
                positions: positions.len(),
            });
        }
        Ok(Self { symbols, positions })
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn positions(&self) -> &[Point3<f64>] {
        &self.positions
    }

    pub fn symbol(&self, index: usize) -> Option<&str> {
        self.symbols.get(index).map(String::as_str)
    }

    pub fn position(&self, index: usize) -> Option<&Point3<f64>> {
        self.positions.get(index)
    }

    /// Iterates over `(symbol, position)` pairs in atom order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Point3<f64>)> {
        self.symbols
            .iter()
            .map(String::as_str)
            .zip(self.positions.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn water() -> Geometry {
        Geometry::new(
            vec!["O".into(), "H".into(), "H".into()],
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(0.0, 0.757, 0.587),
                Point3::new(0.0, -0.757, 0.587),
            ],
        )
        .unwrap()
    }

    #[test]
    fn new_rejects_mismatched_lengths() {
        let result = Geometry::new(vec!["O".into()], vec![]);
        assert_eq!(
            result,
            Err(GeometryError::LengthMismatch {
                symbols: 1,
                positions: 0
            })
        );
    }

    #[test]
    fn accessors_expose_atoms_in_order() {
        let geometry = water();
        assert_eq!(geometry.len(), 3);
        assert!(!geometry.is_empty());
        assert_eq!(geometry.symbol(0), Some("O"));
        assert_eq!(geometry.position(2), Some(&Point3::new(0.0, -0.757, 0.587)));
        assert_eq!(geometry.symbol(3), None);

        let symbols: Vec<&str> = geometry.iter().map(|(s, _)| s).collect();
        assert_eq!(symbols, vec!["O", "H", "H"]);
    }

    #[test]
    fn clone_is_deep_and_independent() {
        let geometry = water();
        let copy = geometry.clone();
        assert_eq!(geometry, copy);
        assert_ne!(geometry.symbols().as_ptr(), copy.symbols().as_ptr());
        assert_ne!(geometry.positions().as_ptr(), copy.positions().as_ptr());
    }

    #[test]
    fn empty_geometry_is_valid() {
        let geometry = Geometry::new(vec![], vec![]).unwrap();
        assert!(geometry.is_empty());
        assert_eq!(geometry.iter().count(), 0);
    }
}
