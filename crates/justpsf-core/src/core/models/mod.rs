//! # Core Models Module
//!
//! Plain data records exchanged between the graph engine and the file codecs.
//!
//! - [`geometry`] - Element symbols and cartesian coordinates, the input of an analysis
//! - [`structure`] - Per-atom records plus bond, angle, dihedral, improper, donor and
//!   acceptor index groups, the content of a PSF file
//! - [`residue_topology`] - Residue definitions with local atom lists and bonds, the
//!   content of an RTF file
//!
//! ```ignore
//! use justpsf::core::models::geometry::Geometry;
//! use nalgebra::Point3;
//!
//! let geometry = Geometry::new(
//!     vec!["H".into(), "H".into()],
//!     vec![Point3::origin(), Point3::new(0.74, 0.0, 0.0)],
//! )?;
//! ```

pub mod geometry;
pub mod residue_topology;
pub mod structure;
