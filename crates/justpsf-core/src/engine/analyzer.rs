use super::config::AnalysisConfig;
use super::error::EngineError;
use super::progress::{Progress, ProgressReporter};
use super::registry::{Classification, ResidueClass, ResidueRegistry};
use crate::core::graph::components::{ResidueGraph, residues};
use crate::core::graph::molecular_graph::MolecularGraph;
use crate::core::models::geometry::Geometry;
use crate::core::models::residue_topology::{ResidueTopology, ResidueTopologySet, TopologyAtom};
use crate::core::models::structure::{AtomRecord, Structure, StructureBuilder};
use crate::core::utils::elements::atomic_mass;
use tracing::{info, instrument};

/// One connected component of the analysed geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct ResidueInstance {
    /// 1-based residue number, in discovery order.
    pub residue_id: usize,
    pub graph: ResidueGraph,
    pub classification: Classification,
}

impl ResidueInstance {
    /// Global atom index of the node matching class-local node `canonical`.
    fn transport(&self, canonical: usize) -> usize {
        self.graph.global(self.classification.mapping[canonical])
    }
}

/// Bond graph, residues and residue classes of a single geometry.
///
/// All the work happens in [`GeometryAnalyzer::new`]; the export methods only
/// assemble records from the stored results.
#[derive(Debug)]
pub struct GeometryAnalyzer {
    config: AnalysisConfig,
    graph: MolecularGraph,
    registry: ResidueRegistry,
    instances: Vec<ResidueInstance>,
    residue_of_atom: Vec<usize>,
}

impl GeometryAnalyzer {
    #[instrument(skip_all, name = "geometry_analysis", fields(atoms = geometry.len()))]
    pub fn new(
        geometry: &Geometry,
        config: &AnalysisConfig,
        reporter: &ProgressReporter,
    ) -> Result<Self, EngineError> {
        let graph = reporter.phase("Bond inference", || {
            MolecularGraph::from_geometry(geometry, config.bond_threshold)
        })?;
        info!(bonds = graph.edge_count(), "Bond graph built.");

        let components = reporter.phase("Residue detection", || residues(&graph));
        info!(residues = components.len(), "Partitioned into residues.");

        let mut registry = ResidueRegistry::new();
        let mut instances = Vec::with_capacity(components.len());
        let mut residue_of_atom = vec![0; graph.node_count()];

        reporter.phase("Canonicalization", || {
            reporter.report(Progress::TaskStart {
                total_steps: components.len() as u64,
            });
            for (k, residue) in components.into_iter().enumerate() {
                let classification = registry.classify(&residue);
                for &atom in residue.nodes() {
                    residue_of_atom[atom] = k;
                }
                instances.push(ResidueInstance {
                    residue_id: k + 1,
                    graph: residue,
                    classification,
                });
                reporter.report(Progress::TaskIncrement);
            }
            reporter.report(Progress::TaskFinish);
        });
        info!(classes = registry.len(), "Residue classes identified.");

        Ok(Self {
            config: config.clone(),
            graph,
            registry,
            instances,
            residue_of_atom,
        })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn graph(&self) -> &MolecularGraph {
        &self.graph
    }

    pub fn registry(&self) -> &ResidueRegistry {
        &self.registry
    }

    pub fn instances(&self) -> &[ResidueInstance] {
        &self.instances
    }

    pub fn atom_count(&self) -> usize {
        self.graph.node_count()
    }

    /// 1-based residue number of every atom.
    pub fn residue_ids(&self) -> Vec<usize> {
        self.residue_of_atom
            .iter()
            .map(|&k| self.instances[k].residue_id)
            .collect()
    }

    /// Angles of every residue instance in global indices, residue by residue.
    pub fn angles(&self) -> Vec<[usize; 3]> {
        self.instances
            .iter()
            .flat_map(|instance| {
                self.class_of(instance)
                    .angles()
                    .iter()
                    .map(move |angle| oriented(angle.map(|c| instance.transport(c))))
            })
            .collect()
    }

    /// Dihedrals of every residue instance in global indices, residue by residue.
    pub fn dihedrals(&self) -> Vec<[usize; 4]> {
        self.instances
            .iter()
            .flat_map(|instance| {
                self.class_of(instance)
                    .dihedrals()
                    .iter()
                    .map(move |dihedral| oriented(dihedral.map(|c| instance.transport(c))))
            })
            .collect()
    }

    fn class_of(&self, instance: &ResidueInstance) -> &ResidueClass {
        &self.registry.classes()[instance.classification.class]
    }

    /// Assembles the connectivity-annotated structure.
    ///
    /// Atoms are named `{element}{global index + 1}`, typed by their element
    /// and placed in the configured segment; charges are zero.
    #[instrument(skip_all, name = "structure_export")]
    pub fn structure(&self) -> Result<Structure, EngineError> {
        let mut builder = StructureBuilder::new();
        let residue_ids = self.residue_ids();

        for (index, symbol) in self.graph.labels().iter().enumerate() {
            builder.add_atom(AtomRecord {
                segment_name: self.config.segment_name.clone(),
                residue_id: residue_ids[index] as i64,
                residue_name: self.config.segment_name.clone(),
                name: atom_name(symbol, index),
                atom_type: symbol.clone(),
                charge: 0.0,
                mass: atomic_mass(symbol)?,
                fixed: false,
            });
        }
        for &(a, b) in self.graph.edges() {
            builder.add_bond([a, b]);
        }
        for angle in self.angles() {
            builder.add_angle(angle);
        }
        for dihedral in self.dihedrals() {
            builder.add_dihedral(dihedral);
        }

        Ok(builder.build()?)
    }

    /// Builds one residue definition per canonical class.
    #[instrument(skip_all, name = "topology_export")]
    pub fn topology(&self) -> Result<ResidueTopologySet, EngineError> {
        let mut set = ResidueTopologySet::new();
        set.autogenerate = vec!["ANGL".to_string(), "DIHE".to_string()];

        for (n, class) in self.registry.classes().iter().enumerate() {
            let representative = class.representative();
            let mut residue =
                ResidueTopology::new(&format!("{}{}", self.config.residue_prefix, n + 1), 0.0);

            for (local, symbol) in representative.labels().iter().enumerate() {
                if set.mass_of(symbol).is_none() {
                    set.masses.push((symbol.clone(), atomic_mass(symbol)?));
                }
                residue.atoms.push(TopologyAtom::new(
                    &atom_name(symbol, representative.global(local)),
                    symbol,
                    0.0,
                ));
            }
            residue.bonds = representative
                .edges()
                .map(|(a, b)| (a as isize, b as isize))
                .collect();

            set.residues.push(residue);
        }

        set.validate()?;
        Ok(set)
    }
}

fn atom_name(symbol: &str, index: usize) -> String {
    format!("{symbol}{}", index + 1)
}

/// Reverses a path whose last atom precedes its first, so transported
/// templates keep the orientation direct enumeration would report.
fn oriented<const K: usize>(mut path: [usize; K]) -> [usize; K] {
    if path.last() < path.first() {
        path.reverse();
    }
    path
}
