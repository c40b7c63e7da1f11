//! # Workflows Module
//!
//! High-level entry points that take a geometry from coordinates to a written
//! description of its connectivity.
//!
//! Each workflow validates nothing on its own: the [`AnalysisConfig`](crate::engine::config::AnalysisConfig)
//! is already checked by its builder, and all analysis is delegated to the
//! [`GeometryAnalyzer`](crate::engine::analyzer::GeometryAnalyzer).
//!
//! - **Structure Workflow** ([`structure`]) - Geometry to bonds, angles and dihedrals, ready for PSF output
//! - **Topology Workflow** ([`topology`]) - Geometry to one residue definition per canonical class, ready for RTF output

pub mod structure;
pub mod topology;
