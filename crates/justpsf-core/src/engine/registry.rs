use crate::core::graph::components::ResidueGraph;
use crate::core::graph::isomorphism::find_isomorphism;
use crate::core::graph::paths::{angles, dihedrals};
use tracing::{debug, trace};

/// A canonical residue class: the first residue seen with a given labelled
/// topology, plus the internal coordinates computed once for it.
#[derive(Debug, Clone, PartialEq)]
pub struct ResidueClass {
    representative: ResidueGraph,
    angles: Vec<[usize; 3]>,
    dihedrals: Vec<[usize; 4]>,
}

impl ResidueClass {
    fn new(representative: ResidueGraph) -> Self {
        let angles = angles(&representative);
        let dihedrals = dihedrals(&representative);
        Self {
            representative,
            angles,
            dihedrals,
        }
    }

    pub fn representative(&self) -> &ResidueGraph {
        &self.representative
    }

    /// Angle template, in the representative's local indices.
    pub fn angles(&self) -> &[[usize; 3]] {
        &self.angles
    }

    /// Dihedral template, in the representative's local indices.
    pub fn dihedrals(&self) -> &[[usize; 4]] {
        &self.dihedrals
    }
}

/// Result of registering one residue instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    /// Index of the class in registration order.
    pub class: usize,
    /// Whether this instance created the class.
    pub is_new: bool,
    /// `mapping[c]` is the instance-local node matching class-local node `c`.
    pub mapping: Vec<usize>,
}

/// Registry of canonical residue classes for one analysis run.
///
/// Classes are kept in discovery order and matched in that order, so the
/// first isomorphic class always wins.
#[derive(Debug, Default)]
pub struct ResidueRegistry {
    classes: Vec<ResidueClass>,
}

impl ResidueRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns `residue` to an existing class, or opens a new one with the
    /// identity mapping.
    pub fn classify(&mut self, residue: &ResidueGraph) -> Classification {
        for (index, class) in self.classes.iter().enumerate() {
            if let Some(mapping) = find_isomorphism(&class.representative, residue) {
                trace!(class = index, nodes = ?residue.nodes(), "Residue matches existing class.");
                return Classification {
                    class: index,
                    is_new: false,
                    mapping,
                };
            }
        }

        let index = self.classes.len();
        self.classes.push(ResidueClass::new(residue.clone()));
        debug!(
            class = index,
            atoms = residue.node_count(),
            "Registered new residue class."
        );
        Classification {
            class: index,
            is_new: true,
            mapping: (0..residue.node_count()).collect(),
        }
    }

    pub fn classes(&self) -> &[ResidueClass] {
        &self.classes
    }

    pub fn class(&self, index: usize) -> Option<&ResidueClass> {
        self.classes.get(index)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}
