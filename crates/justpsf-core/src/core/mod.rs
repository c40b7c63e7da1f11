//! # Core Module
//!
//! Stateless building blocks of the library: the data records exchanged with the
//! outside world, the graph algorithms that operate on them, and the file codecs
//! that read and write them.
//!
//! ## Architecture
//!
//! - **Data Records** ([`models`]) - Geometries, connectivity-annotated structures and residue topologies
//! - **Graph Algorithms** ([`graph`]) - Bond inference, residue detection, path enumeration and isomorphism
//! - **File I/O** ([`io`]) - XYZ, PDB, PSF and RTF readers and writers behind a common trait
//! - **Utilities** ([`utils`]) - Per-element reference data such as covalent radii and masses
//!
//! Nothing in this module keeps state between calls; the per-run registry of
//! residue classes lives in [`crate::engine`].

pub mod graph;
pub mod io;
pub mod models;
pub mod utils;
