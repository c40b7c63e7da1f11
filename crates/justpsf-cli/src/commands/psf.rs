use super::{Context, prepare};
use crate::cli::PsfArgs;
use crate::config::AnalysisOverrides;
use crate::error::Result;
use crate::utils::files;
use justpsf::core::io::psf::PsfFile;
use justpsf::core::io::traits::MolecularFile;
use justpsf::core::models::structure::ConnectivitySection;
use justpsf::engine::progress::ProgressReporter;
use justpsf::workflows;
use tracing::info;

pub fn run(args: PsfArgs, ctx: &Context) -> Result<()> {
    let overrides = AnalysisOverrides {
        segment_name: args.segment.clone(),
        ..AnalysisOverrides::default()
    };
    let prepared = prepare(&args.geometry, ctx, overrides)?;
    let metadata = prepared.config.psf_metadata(args.flags.as_deref());

    let progress_handler = ctx.progress_handler();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    info!("Invoking the structure workflow...");
    let structure = workflows::structure::run(&prepared.geometry, &prepared.analysis, &reporter)?;

    info!(
        "Writing {} atom(s), {} bond(s), {} angle(s) and {} dihedral(s) as {}",
        structure.len(),
        structure.group_count(ConnectivitySection::Bonds),
        structure.group_count(ConnectivitySection::Angles),
        structure.group_count(ConnectivitySection::Dihedrals),
        metadata.flags
    );
    files::write_output(args.geometry.output.as_deref(), |writer| {
        PsfFile::write_to(&structure, &metadata, writer)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::GeometryArgs;
    use std::fs;
    use tempfile::tempdir;

    const WATER: &str = "3\nwater\nO 0.0 0.0 0.0\nH 0.757 0.586 0.0\nH -0.757 0.586 0.0\n";

    #[test]
    fn writes_a_readable_psf() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("water.xyz");
        let output = dir.path().join("water.psf");
        fs::write(&input, WATER).unwrap();

        let args = PsfArgs {
            geometry: GeometryArgs {
                input,
                output: Some(output.clone()),
                ..GeometryArgs::default()
            },
            flags: Some(vec!["EXT".to_string()]),
            segment: Some("WAT".to_string()),
        };
        let ctx = Context {
            quiet: true,
            ..Context::default()
        };
        run(args, &ctx).unwrap();

        let text = fs::read_to_string(&output).unwrap();
        assert!(text.starts_with("PSF EXT\n"));
        let (structure, _) = PsfFile::read_from_path(&output).unwrap();
        assert_eq!(structure.len(), 3);
        assert_eq!(structure.atoms()[0].segment_name, "WAT");
        assert_eq!(structure.angles(), [[1, 0, 2]]);
    }
}
