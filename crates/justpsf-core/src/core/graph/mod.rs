//! # Graph Module
//!
//! Bond inference and the graph algorithms that turn a bond network into residues
//! and internal coordinates.
//!
//! - [`molecular_graph`] - Undirected, element-labelled bond graph built from a
//!   [`Geometry`](crate::core::models::geometry::Geometry) by a covalent-radius test
//! - [`components`] - Partition of the graph into connected residues
//! - [`paths`] - Enumeration of simple paths (angles and dihedrals) inside a residue
//! - [`isomorphism`] - Exact, label-preserving isomorphism between residues

pub mod components;
pub mod isomorphism;
pub mod molecular_graph;
pub mod paths;
