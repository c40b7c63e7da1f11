//! # Engine Module
//!
//! This module implements the stateful part of a geometry analysis run: everything
//! that happens between reading a geometry and writing its structure or residue
//! topology.
//!
//! ## Overview
//!
//! A run infers the bond graph, splits it into residues, and sorts the residues into
//! canonical classes so that internal coordinates are enumerated once per class and
//! transported to every instance through the class isomorphism. The registry of
//! classes is owned by the analyzer and lives exactly as long as the run.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Bond threshold and naming parameters with validation
//! - **Residue Registry** ([`registry`]) - Canonical classes and their angle/dihedral templates
//! - **Analyzer** ([`analyzer`]) - Runs the pipeline and exports structures and topologies
//! - **Progress Monitoring** ([`progress`]) - Callback-based progress reporting for front ends
//! - **Error Handling** ([`error`]) - Engine-specific error types and error propagation

pub mod analyzer;
pub mod config;
pub mod error;
pub mod progress;
pub mod registry;
