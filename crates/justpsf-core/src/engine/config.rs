use crate::core::graph::molecular_graph::DEFAULT_BOND_THRESHOLD;
use thiserror::Error;

pub const DEFAULT_SEGMENT_NAME: &str = "SYS";
pub const DEFAULT_RESIDUE_PREFIX: &str = "RES";

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Bond threshold must be a positive finite number (got {0})")]
    InvalidThreshold(f64),
    #[error("Parameter '{parameter}' must not be blank (got {value:?})")]
    InvalidName {
        parameter: &'static str,
        value: String,
    },
}

/// Parameters of one geometry analysis run.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    /// Scale factor applied to the sum of covalent radii when inferring bonds.
    pub bond_threshold: f64,
    /// Segment label written for every atom of the structure export.
    pub segment_name: String,
    /// Prefix of the residue class names in the topology export.
    pub residue_prefix: String,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            bond_threshold: DEFAULT_BOND_THRESHOLD,
            segment_name: DEFAULT_SEGMENT_NAME.to_string(),
            residue_prefix: DEFAULT_RESIDUE_PREFIX.to_string(),
        }
    }
}

#[derive(Default)]
pub struct AnalysisConfigBuilder {
    bond_threshold: Option<f64>,
    segment_name: Option<String>,
    residue_prefix: Option<String>,
}

impl AnalysisConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bond_threshold(mut self, threshold: f64) -> Self {
        self.bond_threshold = Some(threshold);
        self
    }
    pub fn segment_name(mut self, name: impl Into<String>) -> Self {
        self.segment_name = Some(name.into());
        self
    }
    pub fn residue_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.residue_prefix = Some(prefix.into());
        self
    }

    pub fn build(self) -> Result<AnalysisConfig, ConfigError> {
        let bond_threshold = self.bond_threshold.unwrap_or(DEFAULT_BOND_THRESHOLD);
        if !bond_threshold.is_finite() || bond_threshold <= 0.0 {
            return Err(ConfigError::InvalidThreshold(bond_threshold));
        }

        let segment_name = validated_name(
            "segment_name",
            self.segment_name
                .unwrap_or_else(|| DEFAULT_SEGMENT_NAME.to_string()),
        )?;
        let residue_prefix = validated_name(
            "residue_prefix",
            self.residue_prefix
                .unwrap_or_else(|| DEFAULT_RESIDUE_PREFIX.to_string()),
        )?;

        Ok(AnalysisConfig {
            bond_threshold,
            segment_name,
            residue_prefix,
        })
    }
}

fn validated_name(parameter: &'static str, value: String) -> Result<String, ConfigError> {
    if value.trim().is_empty() || value.chars().any(char::is_whitespace) {
        return Err(ConfigError::InvalidName { parameter, value });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults_match_default_config() {
        let config = AnalysisConfigBuilder::new().build().unwrap();
        assert_eq!(config, AnalysisConfig::default());
        assert_eq!(config.bond_threshold, 1.1);
        assert_eq!(config.segment_name, "SYS");
        assert_eq!(config.residue_prefix, "RES");
    }

    #[test]
    fn builder_overrides_values() {
        let config = AnalysisConfigBuilder::new()
            .bond_threshold(1.3)
            .segment_name("WAT")
            .residue_prefix("MOL")
            .build()
            .unwrap();
        assert_eq!(config.bond_threshold, 1.3);
        assert_eq!(config.segment_name, "WAT");
        assert_eq!(config.residue_prefix, "MOL");
    }

    #[test]
    fn invalid_threshold_is_rejected() {
        for threshold in [0.0, -1.0, f64::INFINITY] {
            assert_eq!(
                AnalysisConfigBuilder::new()
                    .bond_threshold(threshold)
                    .build(),
                Err(ConfigError::InvalidThreshold(threshold))
            );
        }
    }

    #[test]
    fn blank_or_spaced_names_are_rejected() {
        assert_eq!(
            AnalysisConfigBuilder::new().segment_name("  ").build(),
            Err(ConfigError::InvalidName {
                parameter: "segment_name",
                value: "  ".into()
            })
        );
        assert!(
            AnalysisConfigBuilder::new()
                .residue_prefix("A B")
                .build()
                .is_err()
        );
    }
}
