use thiserror::Error;

use super::config::ConfigError;
use crate::core::graph::molecular_graph::GraphError;
use crate::core::models::residue_topology::ResidueTopologyError;
use crate::core::models::structure::StructureError;
use crate::core::utils::elements::ElementError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid configuration: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("Bond graph construction failed: {source}")]
    Graph {
        #[from]
        source: GraphError,
    },

    #[error("Element lookup failed: {source}")]
    Element {
        #[from]
        source: ElementError,
    },

    #[error("Assembled structure is inconsistent: {source}")]
    Structure {
        #[from]
        source: StructureError,
    },

    #[error("Assembled residue topology is inconsistent: {source}")]
    Topology {
        #[from]
        source: ResidueTopologyError,
    },

    #[error("Internal logic error: {0}")]
    Internal(String),
}
