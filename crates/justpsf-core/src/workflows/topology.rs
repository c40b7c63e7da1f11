use crate::core::models::geometry::Geometry;
use crate::core::models::residue_topology::ResidueTopologySet;
use crate::engine::analyzer::GeometryAnalyzer;
use crate::engine::config::AnalysisConfig;
use crate::engine::error::EngineError;
use crate::engine::progress::ProgressReporter;
use tracing::{info, instrument};

/// Derives one residue definition per distinct residue class in `geometry`.
///
/// Residues are named with the configured prefix followed by the class
/// number, in order of first appearance. Angles and dihedrals are left to the
/// `AUTO ANGL DIHE` generation of the consuming program.
#[instrument(skip_all, name = "topology_workflow", fields(atoms = geometry.len()))]
pub fn run(
    geometry: &Geometry,
    config: &AnalysisConfig,
    reporter: &ProgressReporter,
) -> Result<ResidueTopologySet, EngineError> {
    let analyzer = GeometryAnalyzer::new(geometry, config, reporter)?;
    let topology = reporter.phase("Assembly", || analyzer.topology())?;

    info!(
        residues = analyzer.instances().len(),
        classes = topology.residues.len(),
        "Topology workflow completed."
    );
    Ok(topology)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::config::AnalysisConfigBuilder;
    use nalgebra::Point3;

    #[test]
    fn run_names_classes_with_the_configured_prefix() {
        let geometry = Geometry::new(
            vec!["O".into(), "H".into(), "H".into(), "Na".into()],
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(0.0, 0.757, 0.587),
                Point3::new(0.0, -0.757, 0.587),
                Point3::new(5.0, 5.0, 5.0),
            ],
        )
        .unwrap();
        let config = AnalysisConfigBuilder::new().residue_prefix("MOL").build().unwrap();
        let topology = run(&geometry, &config, &ProgressReporter::new()).unwrap();

        let names: Vec<&str> = topology.residues.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["MOL1", "MOL2"]);
        assert_eq!(topology.residues[0].bonds.len(), 2);
        assert_eq!(topology.autogenerate, vec!["ANGL", "DIHE"]);
    }
}
