pub mod check;
pub mod psf;
pub mod rtf;

use crate::cli::GeometryArgs;
use crate::config::{AnalysisOverrides, PartialConfig};
use crate::error::Result;
use crate::utils::files;
use crate::utils::progress::CliProgressHandler;
use justpsf::core::models::geometry::Geometry;
use justpsf::engine::config::AnalysisConfig;
use std::path::PathBuf;
use tracing::info;

/// Global options every command needs.
#[derive(Debug, Clone, Default)]
pub struct Context {
    pub config_path: Option<PathBuf>,
    pub quiet: bool,
}

impl Context {
    fn progress_handler(&self) -> CliProgressHandler {
        if self.quiet {
            CliProgressHandler::hidden()
        } else {
            CliProgressHandler::new()
        }
    }
}

/// Everything a geometry-analysing command starts from.
struct Prepared {
    config: PartialConfig,
    analysis: AnalysisConfig,
    geometry: Geometry,
}

fn prepare(args: &GeometryArgs, ctx: &Context, mut overrides: AnalysisOverrides) -> Result<Prepared> {
    let mut config = PartialConfig::load(ctx.config_path.as_deref())?;
    config.apply_set_values(&args.set_values)?;

    info!("Merging configuration from file and CLI arguments...");
    overrides.bond_threshold = args.threshold;
    let analysis = config.analysis_config(&overrides)?;

    let geometry = files::read_geometry(&args.input, args.format)?;
    Ok(Prepared {
        config,
        analysis,
        geometry,
    })
}
