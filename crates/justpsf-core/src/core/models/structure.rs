use std::fmt;
use thiserror::Error;

/// Per-atom record of a molecular-mechanics structure.
#[derive(Debug, Clone, PartialEq)]
pub struct AtomRecord {
    /// Segment identifier (e.g., "SYS", "PROA").
    pub segment_name: String,
    /// Residue sequence number.
    pub residue_id: i64,
    /// Residue name (e.g., "TIP3", "RES1").
    pub residue_name: String,
    /// Atom name, unique within its residue (e.g., "O1", "CA").
    pub name: String,
    /// Force field atom type.
    pub atom_type: String,
    /// Partial charge in elementary charge units.
    pub charge: f64,
    /// Atomic mass in g/mol.
    pub mass: f64,
    /// Whether the atom is held fixed during dynamics.
    pub fixed: bool,
}

/// The index-based connectivity groups a structure carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ConnectivitySection {
    Bonds,
    Angles,
    Dihedrals,
    Impropers,
    Donors,
    Acceptors,
}

impl ConnectivitySection {
    pub const ALL: [ConnectivitySection; 6] = [
        Self::Bonds,
        Self::Angles,
        Self::Dihedrals,
        Self::Impropers,
        Self::Donors,
        Self::Acceptors,
    ];

    /// Number of atom indices in one group of this section.
    pub fn indices_per_group(self) -> usize {
        match self {
            Self::Bonds | Self::Donors | Self::Acceptors => 2,
            Self::Angles => 3,
            Self::Dihedrals | Self::Impropers => 4,
        }
    }
}

impl fmt::Display for ConnectivitySection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Bonds => "bonds",
                Self::Angles => "angles",
                Self::Dihedrals => "dihedrals",
                Self::Impropers => "impropers",
                Self::Donors => "donors",
                Self::Acceptors => "acceptors",
            }
        )
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StructureError {
    #[error("Index {index} in {section} is out of range for {atom_count} atom(s)")]
    IndexOutOfRange {
        section: ConnectivitySection,
        index: usize,
        atom_count: usize,
    },
}

/// A connectivity-annotated molecular structure.
///
/// Atoms are stored in order; every group in the connectivity sections holds
/// 0-based indices into the atom list. [`StructureBuilder::build`] guarantees
/// that all indices are in range.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Structure {
    atoms: Vec<AtomRecord>,
    bonds: Vec<[usize; 2]>,
    angles: Vec<[usize; 3]>,
    dihedrals: Vec<[usize; 4]>,
    impropers: Vec<[usize; 4]>,
    donors: Vec<[usize; 2]>,
    acceptors: Vec<[usize; 2]>,
}

impl Structure {
    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    pub fn atoms(&self) -> &[AtomRecord] {
        &self.atoms
    }

    pub fn atom(&self, index: usize) -> Option<&AtomRecord> {
        self.atoms.get(index)
    }

    pub fn bonds(&self) -> &[[usize; 2]] {
        &self.bonds
    }

    pub fn angles(&self) -> &[[usize; 3]] {
        &self.angles
    }

    pub fn dihedrals(&self) -> &[[usize; 4]] {
        &self.dihedrals
    }

    pub fn impropers(&self) -> &[[usize; 4]] {
        &self.impropers
    }

    pub fn donors(&self) -> &[[usize; 2]] {
        &self.donors
    }

    pub fn acceptors(&self) -> &[[usize; 2]] {
        &self.acceptors
    }

    /// Returns the groups of a section as flat slices, one slice per group.
    pub fn groups(&self, section: ConnectivitySection) -> Vec<&[usize]> {
        match section {
            ConnectivitySection::Bonds => self.bonds.iter().map(|g| g.as_slice()).collect(),
            ConnectivitySection::Angles => self.angles.iter().map(|g| g.as_slice()).collect(),
            ConnectivitySection::Dihedrals => {
                self.dihedrals.iter().map(|g| g.as_slice()).collect()
            }
            ConnectivitySection::Impropers => {
                self.impropers.iter().map(|g| g.as_slice()).collect()
            }
            ConnectivitySection::Donors => self.donors.iter().map(|g| g.as_slice()).collect(),
            ConnectivitySection::Acceptors => {
                self.acceptors.iter().map(|g| g.as_slice()).collect()
            }
        }
    }

    pub fn group_count(&self, section: ConnectivitySection) -> usize {
        match section {
            ConnectivitySection::Bonds => self.bonds.len(),
            ConnectivitySection::Angles => self.angles.len(),
            ConnectivitySection::Dihedrals => self.dihedrals.len(),
            ConnectivitySection::Impropers => self.impropers.len(),
            ConnectivitySection::Donors => self.donors.len(),
            ConnectivitySection::Acceptors => self.acceptors.len(),
        }
    }
}

#[derive(Debug, Default)]
pub struct StructureBuilder {
    structure: Structure,
}

impl StructureBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_atom(&mut self, atom: AtomRecord) -> &mut Self {
        self.structure.atoms.push(atom);
        self
    }

    pub fn add_bond(&mut self, bond: [usize; 2]) -> &mut Self {
        self.structure.bonds.push(bond);
        self
    }

    pub fn add_angle(&mut self, angle: [usize; 3]) -> &mut Self {
        self.structure.angles.push(angle);
        self
    }

    pub fn add_dihedral(&mut self, dihedral: [usize; 4]) -> &mut Self {
        self.structure.dihedrals.push(dihedral);
        self
    }

    pub fn add_improper(&mut self, improper: [usize; 4]) -> &mut Self {
        self.structure.impropers.push(improper);
        self
    }

    pub fn add_donor(&mut self, donor: [usize; 2]) -> &mut Self {
        self.structure.donors.push(donor);
        self
    }

    pub fn add_acceptor(&mut self, acceptor: [usize; 2]) -> &mut Self {
        self.structure.acceptors.push(acceptor);
        self
    }

    /// Appends one group read from a flat index slice.
    ///
    /// The slice length must equal [`ConnectivitySection::indices_per_group`].
    pub(crate) fn add_group(&mut self, section: ConnectivitySection, group: &[usize]) -> &mut Self {
        match (section, group) {
            (ConnectivitySection::Bonds, &[a, b]) => self.add_bond([a, b]),
            (ConnectivitySection::Donors, &[a, b]) => self.add_donor([a, b]),
            (ConnectivitySection::Acceptors, &[a, b]) => self.add_acceptor([a, b]),
            (ConnectivitySection::Angles, &[a, b, c]) => self.add_angle([a, b, c]),
            (ConnectivitySection::Dihedrals, &[a, b, c, d]) => self.add_dihedral([a, b, c, d]),
            (ConnectivitySection::Impropers, &[a, b, c, d]) => self.add_improper([a, b, c, d]),
            _ => self,
        }
    }

    /// Finalizes the structure after checking every connectivity index.
    ///
    /// # Errors
    ///
    /// Returns [`StructureError::IndexOutOfRange`] for the first index that does
    /// not refer to an atom.
    pub fn build(self) -> Result<Structure, StructureError> {
        let atom_count = self.structure.atoms.len();
        for section in ConnectivitySection::ALL {
            for group in self.structure.groups(section) {
                if let Some(&index) = group.iter().find(|&&i| i >= atom_count) {
                    return Err(StructureError::IndexOutOfRange {
                        section,
                        index,
                        atom_count,
                    });
                }
            }
        }
        Ok(self.structure)
    }
}
