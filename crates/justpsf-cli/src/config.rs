use crate::error::{CliError, Result};
use justpsf::core::io::psf::{PsfFlags, PsfMetadata};
use justpsf::core::io::rtf::RtfMetadata;
use justpsf::engine::config::{AnalysisConfig, AnalysisConfigBuilder};
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

const TITLE_MARK: char = '*';

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialAnalysisConfig {
    bond_threshold: Option<f64>,
    segment_name: Option<String>,
    residue_prefix: Option<String>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
struct PartialPsfConfig {
    flags: Option<Vec<String>>,
    title: Option<Vec<String>>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
struct PartialRtfConfig {
    title: Option<Vec<String>>,
}

/// Command-line values that take precedence over the configuration file.
#[derive(Debug, Default, Clone)]
pub struct AnalysisOverrides {
    pub bond_threshold: Option<f64>,
    pub segment_name: Option<String>,
    pub residue_prefix: Option<String>,
}

/// Settings read from a TOML file, every field optional.
///
/// Precedence is command line, then `--set` values, then the file, then the
/// library defaults.
#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct PartialConfig {
    analysis: Option<PartialAnalysisConfig>,
    psf: Option<PartialPsfConfig>,
    rtf: Option<PartialRtfConfig>,
}

impl PartialConfig {
    /// Loads `path` if given, otherwise starts from an empty configuration.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    pub fn analysis_config(&self, overrides: &AnalysisOverrides) -> Result<AnalysisConfig> {
        let file = self.analysis.clone().unwrap_or_default();
        let mut builder = AnalysisConfigBuilder::new();

        if let Some(threshold) = overrides.bond_threshold.or(file.bond_threshold) {
            builder = builder.bond_threshold(threshold);
        }
        if let Some(name) = overrides.segment_name.clone().or(file.segment_name) {
            builder = builder.segment_name(name);
        }
        if let Some(prefix) = overrides.residue_prefix.clone().or(file.residue_prefix) {
            builder = builder.residue_prefix(prefix);
        }

        builder.build().map_err(|e| CliError::Config(e.to_string()))
    }

    /// Header flags and title of the PSF output; defaults to `EXT XPLOR`.
    pub fn psf_metadata(&self, cli_flags: Option<&[String]>) -> PsfMetadata {
        let file = self.psf.clone().unwrap_or_default();
        let mut metadata = PsfMetadata::default();

        if let Some(flags) = cli_flags.map(<[String]>::to_vec).or(file.flags) {
            let flags: Vec<String> = flags.iter().map(|f| f.trim().to_uppercase()).collect();
            metadata.flags = PsfFlags::from_tokens(flags.iter().map(String::as_str));
        }
        if let Some(title) = file.title {
            metadata.title = title
                .into_iter()
                .map(|line| {
                    if line.starts_with(TITLE_MARK) {
                        line
                    } else {
                        format!("{TITLE_MARK} {line}")
                    }
                })
                .collect();
        }
        metadata
    }

    pub fn rtf_metadata(&self) -> RtfMetadata {
        let mut metadata = RtfMetadata::default();
        if let Some(title) = self.rtf.as_ref().and_then(|rtf| rtf.title.clone()) {
            metadata.title = title;
        }
        metadata
    }

    pub fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        for kv_pair in set_values {
            let Some((key, value_str)) = kv_pair.split_once('=') else {
                return Err(CliError::Config(format!(
                    "Invalid --set format: '{}'. Expected KEY=VALUE.",
                    kv_pair
                )));
            };

            match key {
                "analysis.bond-threshold" => {
                    self.analysis
                        .get_or_insert_with(Default::default)
                        .bond_threshold = Some(value_str.parse().map_err(|_| {
                        CliError::Config(format!("Invalid float value for {}: {}", key, value_str))
                    })?);
                }
                "analysis.segment-name" => {
                    self.analysis
                        .get_or_insert_with(Default::default)
                        .segment_name = Some(value_str.to_string());
                }
                "analysis.residue-prefix" => {
                    self.analysis
                        .get_or_insert_with(Default::default)
                        .residue_prefix = Some(value_str.to_string());
                }
                "psf.flags" => {
                    self.psf.get_or_insert_with(Default::default).flags = Some(
                        value_str
                            .split(',')
                            .filter(|f| !f.trim().is_empty())
                            .map(str::to_string)
                            .collect(),
                    );
                }
                _ => {
                    return Err(CliError::Config(format!(
                        "Unsupported configuration key for --set: '{}'",
                        key
                    )));
                }
            }
        }
        Ok(())
    }
}
