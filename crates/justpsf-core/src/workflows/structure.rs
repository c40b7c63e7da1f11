use crate::core::models::geometry::Geometry;
use crate::core::models::structure::{ConnectivitySection, Structure};
use crate::engine::analyzer::GeometryAnalyzer;
use crate::engine::config::AnalysisConfig;
use crate::engine::error::EngineError;
use crate::engine::progress::ProgressReporter;
use tracing::{info, instrument};

/// Infers the full connectivity of `geometry`.
///
/// Atoms keep their input order. Bonds come from the distance criterion,
/// angles and dihedrals are enumerated once per residue class and mapped onto
/// every residue of that class.
#[instrument(skip_all, name = "structure_workflow", fields(atoms = geometry.len()))]
pub fn run(
    geometry: &Geometry,
    config: &AnalysisConfig,
    reporter: &ProgressReporter,
) -> Result<Structure, EngineError> {
    let analyzer = GeometryAnalyzer::new(geometry, config, reporter)?;

    let structure = reporter.phase("Assembly", || analyzer.structure())?;

    info!(
        residues = analyzer.instances().len(),
        bonds = structure.group_count(ConnectivitySection::Bonds),
        angles = structure.group_count(ConnectivitySection::Angles),
        dihedrals = structure.group_count(ConnectivitySection::Dihedrals),
        "Structure workflow completed."
    );
    Ok(structure)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    #[test]
    fn run_builds_connectivity_for_a_single_water() {
        let geometry = Geometry::new(
            vec!["O".into(), "H".into(), "H".into()],
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(0.0, 0.757, 0.587),
                Point3::new(0.0, -0.757, 0.587),
            ],
        )
        .unwrap();
        let structure =
            run(&geometry, &AnalysisConfig::default(), &ProgressReporter::new()).unwrap();

        assert_eq!(structure.atoms().len(), 3);
        assert_eq!(structure.groups(ConnectivitySection::Bonds).len(), 2);
        assert_eq!(structure.angles(), [[1, 0, 2]]);
        assert!(structure.groups(ConnectivitySection::Dihedrals).is_empty());
    }
}
