use super::{Context, prepare};
use crate::cli::RtfArgs;
use crate::config::AnalysisOverrides;
use crate::error::Result;
use crate::utils::files;
use justpsf::core::io::rtf::RtfFile;
use justpsf::core::io::traits::MolecularFile;
use justpsf::engine::progress::ProgressReporter;
use justpsf::workflows;
use tracing::info;

pub fn run(args: RtfArgs, ctx: &Context) -> Result<()> {
    let overrides = AnalysisOverrides {
        residue_prefix: args.prefix.clone(),
        ..AnalysisOverrides::default()
    };
    let prepared = prepare(&args.geometry, ctx, overrides)?;
    let metadata = prepared.config.rtf_metadata();

    let progress_handler = ctx.progress_handler();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    info!("Invoking the topology workflow...");
    let topology = workflows::topology::run(&prepared.geometry, &prepared.analysis, &reporter)?;

    info!("Writing {} residue definition(s)", topology.residues.len());
    files::write_output(args.geometry.output.as_deref(), |writer| {
        RtfFile::write_to(&topology, &metadata, writer)
    })
}
