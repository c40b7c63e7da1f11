use thiserror::Error;

/// One atom entry of a residue definition.
#[derive(Debug, Clone, PartialEq)]
pub struct TopologyAtom {
    pub name: String,
    pub atom_type: String,
    pub charge: f64,
}

impl TopologyAtom {
    pub fn new(name: &str, atom_type: &str, charge: f64) -> Self {
        Self {
            name: name.to_string(),
            atom_type: atom_type.to_string(),
            charge,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResidueTopologyError {
    #[error("Residue '{residue}': bond index {index} does not refer to an atom or a declaration")]
    UnresolvedBondIndex { residue: String, index: isize },
}

/// Topology of a single residue class.
///
/// Bond endpoints are indices into `atoms`. A negative index `-1 - k` refers to
/// the k-th entry of the enclosing set's declarations, i.e. an atom that belongs
/// to a neighboring residue in a chain.
#[derive(Debug, Clone, PartialEq)]
pub struct ResidueTopology {
    pub name: String,
    pub charge: f64,
    pub atoms: Vec<TopologyAtom>,
    pub bonds: Vec<(isize, isize)>,
}

impl ResidueTopology {
    pub fn new(name: &str, charge: f64) -> Self {
        Self {
            name: name.to_string(),
            charge,
            atoms: Vec::new(),
            bonds: Vec::new(),
        }
    }

    pub fn atom_index(&self, name: &str) -> Option<usize> {
        self.atoms.iter().position(|a| a.name == name)
    }

    /// Checks that every bond endpoint resolves against the atoms of this
    /// residue or against `declaration_count` external declarations.
    pub fn validate(&self, declaration_count: usize) -> Result<(), ResidueTopologyError> {
        let resolves = |index: isize| {
            if index >= 0 {
                (index as usize) < self.atoms.len()
            } else {
                ((-1 - index) as usize) < declaration_count
            }
        };
        for &(a, b) in &self.bonds {
            for index in [a, b] {
                if !resolves(index) {
                    return Err(ResidueTopologyError::UnresolvedBondIndex {
                        residue: self.name.clone(),
                        index,
                    });
                }
            }
        }
        Ok(())
    }
}

/// A collection of residue definitions plus the header records they depend on.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResidueTopologySet {
    /// Atom type masses, in declaration order.
    pub masses: Vec<(String, f64)>,
    /// External atom declarations (e.g., "-C", "+N").
    pub declarations: Vec<String>,
    /// Default patches (e.g., ("FIRS", "NTER")).
    pub defaults: Vec<(String, String)>,
    /// Keywords of the terms to auto-generate (e.g., "ANGL", "DIHE").
    pub autogenerate: Vec<String>,
    pub residues: Vec<ResidueTopology>,
}

impl ResidueTopologySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mass_of(&self, atom_type: &str) -> Option<f64> {
        self.masses
            .iter()
            .find(|(t, _)| t == atom_type)
            .map(|&(_, m)| m)
    }

    pub fn residue(&self, name: &str) -> Option<&ResidueTopology> {
        self.residues.iter().find(|r| r.name == name)
    }

    pub fn declaration_index(&self, name: &str) -> Option<isize> {
        self.declarations
            .iter()
            .position(|d| d == name)
            .map(|k| -1 - k as isize)
    }

    pub fn validate(&self) -> Result<(), ResidueTopologyError> {
        self.residues
            .iter()
            .try_for_each(|r| r.validate(self.declarations.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn water() -> ResidueTopology {
        let mut residue = ResidueTopology::new("RES1", 0.0);
        residue.atoms.push(TopologyAtom::new("O1", "O", -0.8));
        residue.atoms.push(TopologyAtom::new("H2", "H", 0.4));
        residue.atoms.push(TopologyAtom::new("H3", "H", 0.4));
        residue.bonds = vec![(0, 1), (0, 2)];
        residue
    }

    #[test]
    fn atom_index_finds_atoms_by_name() {
        let residue = water();
        assert_eq!(residue.atom_index("H3"), Some(2));
        assert_eq!(residue.atom_index("C1"), None);
    }

    #[test]
    fn validate_accepts_local_and_declared_indices() {
        let mut residue = water();
        residue.bonds.push((-1, 0));
        assert!(residue.validate(1).is_ok());
        assert_eq!(
            residue.validate(0),
            Err(ResidueTopologyError::UnresolvedBondIndex {
                residue: "RES1".into(),
                index: -1
            })
        );
    }

    #[test]
    fn validate_rejects_indices_past_the_atom_list() {
        let mut residue = water();
        residue.bonds.push((0, 3));
        assert!(residue.validate(0).is_err());
    }

    #[test]
    fn set_lookups_work() {
        let set = ResidueTopologySet {
            masses: vec![("O".into(), 15.999), ("H".into(), 1.008)],
            declarations: vec!["-C".into(), "+N".into()],
            residues: vec![water()],
            ..Default::default()
        };
        assert_eq!(set.mass_of("H"), Some(1.008));
        assert_eq!(set.mass_of("C"), None);
        assert_eq!(set.declaration_index("+N"), Some(-2));
        assert!(set.residue("RES1").is_some());
        assert!(set.validate().is_ok());
    }
}
