use crate::core::models::geometry::Geometry;
use crate::core::utils::elements::{ElementError, covalent_radius};
use nalgebra::{DMatrix, Point3};
use thiserror::Error;
use tracing::{debug, info, instrument};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Scale factor applied to the sum of covalent radii when inferring bonds.
pub const DEFAULT_BOND_THRESHOLD: f64 = 1.1;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GraphError {
    #[error(transparent)]
    Element(#[from] ElementError),
    #[error("Bond threshold must be a positive finite number (got {0})")]
    InvalidThreshold(f64),
    #[error("Node {node} is out of range for a graph of {node_count} node(s)")]
    NodeOutOfRange { node: usize, node_count: usize },
    #[error("Self-loop on node {0} is not allowed")]
    SelfLoop(usize),
}

/// Undirected bond graph whose nodes are atom indices labelled by element symbol.
///
/// Neighbor lists are kept sorted in ascending order; edges are recorded once,
/// as `(low, high)`, in insertion order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MolecularGraph {
    labels: Vec<String>,
    adjacency: Vec<Vec<usize>>,
    edges: Vec<(usize, usize)>,
}

impl MolecularGraph {
    /// Creates a graph with one isolated node per label.
    pub fn with_nodes(labels: Vec<String>) -> Self {
        let adjacency = vec![Vec::new(); labels.len()];
        Self {
            labels,
            adjacency,
            edges: Vec::new(),
        }
    }

    /// Infers bonds from interatomic distances.
    ///
    /// Atoms `i < j` are bonded iff `d(i, j) < threshold * (r_i + r_j)`, where `r`
    /// is the covalent radius of the element. The comparison is strict.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Element`] for a symbol missing from the radius table and
    /// [`GraphError::InvalidThreshold`] for a non-positive or non-finite threshold.
    #[instrument(skip_all, name = "bond_inference", fields(atoms = geometry.len()))]
    pub fn from_geometry(geometry: &Geometry, threshold: f64) -> Result<Self, GraphError> {
        if !threshold.is_finite() || threshold <= 0.0 {
            return Err(GraphError::InvalidThreshold(threshold));
        }

        let radii = geometry
            .symbols()
            .iter()
            .map(|s| covalent_radius(s))
            .collect::<Result<Vec<_>, _>>()?;

        info!("Computing distance matrix.");
        let distances = distance_matrix(geometry.positions());

        info!(threshold, "Assigning bonds.");
        let n = geometry.len();
        let bonded_row = |i: usize| -> Vec<usize> {
            (i + 1..n)
                .filter(|&j| distances[(i, j)] < threshold * (radii[i] + radii[j]))
                .collect()
        };

        #[cfg(not(feature = "parallel"))]
        let rows: Vec<Vec<usize>> = (0..n).map(bonded_row).collect();

        #[cfg(feature = "parallel")]
        let rows: Vec<Vec<usize>> = (0..n).into_par_iter().map(bonded_row).collect();

        let mut graph = Self::with_nodes(geometry.symbols().to_vec());
        for (i, partners) in rows.into_iter().enumerate() {
            for j in partners {
                graph.add_edge(i, j)?;
            }
        }

        debug!(bonds = graph.edge_count(), "Bond inference complete.");
        Ok(graph)
    }

    /// Adds an undirected edge between `a` and `b`.
    ///
    /// Returns `Ok(false)` if the edge already exists.
    pub fn add_edge(&mut self, a: usize, b: usize) -> Result<bool, GraphError> {
        let node_count = self.node_count();
        for node in [a, b] {
            if node >= node_count {
                return Err(GraphError::NodeOutOfRange { node, node_count });
            }
        }
        if a == b {
            return Err(GraphError::SelfLoop(a));
        }

        let Err(pos_a) = self.adjacency[a].binary_search(&b) else {
            return Ok(false);
        };
        self.adjacency[a].insert(pos_a, b);
        if let Err(pos_b) = self.adjacency[b].binary_search(&a) {
            self.adjacency[b].insert(pos_b, a);
        }
        self.edges.push((a.min(b), a.max(b)));
        Ok(true)
    }

    pub fn node_count(&self) -> usize {
        self.labels.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn edges(&self) -> &[(usize, usize)] {
        &self.edges
    }

    pub fn label(&self, node: usize) -> Option<&str> {
        self.labels.get(node).map(String::as_str)
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn neighbors(&self, node: usize) -> &[usize] {
        self.adjacency.get(node).map_or(&[], Vec::as_slice)
    }

    pub fn has_edge(&self, a: usize, b: usize) -> bool {
        self.neighbors(a).binary_search(&b).is_ok()
    }
}

/// Full symmetric matrix of euclidean distances between points.
pub fn distance_matrix(positions: &[Point3<f64>]) -> DMatrix<f64> {
    let n = positions.len();
    DMatrix::from_fn(n, n, |i, j| nalgebra::distance(&positions[i], &positions[j]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry(atoms: &[(&str, [f64; 3])]) -> Geometry {
        Geometry::new(
            atoms.iter().map(|(s, _)| s.to_string()).collect(),
            atoms
                .iter()
                .map(|(_, p)| Point3::new(p[0], p[1], p[2]))
                .collect(),
        )
        .unwrap()
    }

    fn water() -> Geometry {
        geometry(&[
            ("O", [0.0, 0.0, 0.1173]),
            ("H", [0.0, 0.7572, -0.4692]),
            ("H", [0.0, -0.7572, -0.4692]),
        ])
    }

    #[test]
    fn water_has_two_oh_bonds() {
        let graph = MolecularGraph::from_geometry(&water(), DEFAULT_BOND_THRESHOLD).unwrap();
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edges(), &[(0, 1), (0, 2)]);
        assert_eq!(graph.neighbors(0), &[1, 2]);
        assert!(!graph.has_edge(1, 2));
        assert_eq!(graph.label(0), Some("O"));
    }

    #[test]
    fn atoms_exactly_at_threshold_are_not_bonded() {
        let limit = DEFAULT_BOND_THRESHOLD * (0.31 + 0.31);
        let at_limit = geometry(&[("H", [0.0, 0.0, 0.0]), ("H", [limit, 0.0, 0.0])]);
        let graph = MolecularGraph::from_geometry(&at_limit, DEFAULT_BOND_THRESHOLD).unwrap();
        assert_eq!(graph.edge_count(), 0);

        let below = geometry(&[("H", [0.0, 0.0, 0.0]), ("H", [limit - 1e-6, 0.0, 0.0])]);
        let graph = MolecularGraph::from_geometry(&below, DEFAULT_BOND_THRESHOLD).unwrap();
        assert_eq!(graph.edges(), &[(0, 1)]);
    }

    #[test]
    fn unknown_element_is_a_lookup_error() {
        let bad = geometry(&[("Xx", [0.0, 0.0, 0.0])]);
        assert_eq!(
            MolecularGraph::from_geometry(&bad, DEFAULT_BOND_THRESHOLD),
            Err(GraphError::Element(ElementError::UnknownElement(
                "Xx".into()
            )))
        );
    }

    #[test]
    fn invalid_threshold_is_rejected() {
        assert!(matches!(
            MolecularGraph::from_geometry(&water(), 0.0),
            Err(GraphError::InvalidThreshold(_))
        ));
        assert!(matches!(
            MolecularGraph::from_geometry(&water(), f64::NAN),
            Err(GraphError::InvalidThreshold(_))
        ));
    }

    #[test]
    fn isolated_atoms_stay_disconnected() {
        let ions = geometry(&[("Na", [0.0, 0.0, 0.0]), ("Cl", [10.0, 0.0, 0.0])]);
        let graph = MolecularGraph::from_geometry(&ions, DEFAULT_BOND_THRESHOLD).unwrap();
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 0);
        assert!(graph.neighbors(1).is_empty());
    }

    #[test]
    fn add_edge_ignores_duplicates_and_rejects_self_loops() {
        let mut graph = MolecularGraph::with_nodes(vec!["C".into(), "C".into(), "C".into()]);
        assert_eq!(graph.add_edge(2, 0), Ok(true));
        assert_eq!(graph.add_edge(0, 2), Ok(false));
        assert_eq!(graph.add_edge(1, 1), Err(GraphError::SelfLoop(1)));
        assert_eq!(
            graph.add_edge(0, 5),
            Err(GraphError::NodeOutOfRange {
                node: 5,
                node_count: 3
            })
        );
        assert_eq!(graph.edges(), &[(0, 2)]);
        assert_eq!(graph.neighbors(2), &[0]);
    }

    #[test]
    fn distance_matrix_is_symmetric_with_zero_diagonal() {
        let geometry = water();
        let matrix = distance_matrix(geometry.positions());
        assert_eq!(matrix.nrows(), 3);
        for i in 0..3 {
            assert_eq!(matrix[(i, i)], 0.0);
            for j in 0..3 {
                assert_eq!(matrix[(i, j)], matrix[(j, i)]);
            }
        }
        assert!((matrix[(1, 2)] - 1.5144).abs() < 1e-9);
    }
}
