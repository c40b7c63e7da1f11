//! # just-psf Core Library
//!
//! Infers the chemical connectivity of a molecular geometry and writes it out as a
//! protein structure file (PSF) or a CHARMM residue topology file (RTF).
//!
//! ## Architectural Philosophy
//!
//! The library follows a strict three-layer architecture:
//!
//! - **[`core`]: The Foundation.** Stateless data records (`Geometry`, `Structure`,
//!   `ResidueTopologySet`), graph algorithms over bonded atoms, and file codecs.
//!
//! - **[`engine`]: The Logic Core.** The stateful analysis of one geometry. It builds
//!   the bond graph, partitions it into residues and groups them into canonical
//!   classes through a run-scoped registry, so each class is analysed once.
//!
//! - **[`workflows`]: The Public API.** Single calls that take a geometry to a
//!   `Structure` or a `ResidueTopologySet`, reporting progress along the way.
//!
//! ## Example
//!
//! ```no_run
//! use justpsf::core::io::psf::PsfFile;
//! use justpsf::core::io::traits::MolecularFile;
//! use justpsf::core::io::xyz::XyzFile;
//! use justpsf::engine::config::AnalysisConfig;
//! use justpsf::engine::progress::ProgressReporter;
//! use justpsf::workflows;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let (geometry, _) = XyzFile::read_from_path("water.xyz")?;
//! let structure = workflows::structure::run(
//!     &geometry,
//!     &AnalysisConfig::default(),
//!     &ProgressReporter::new(),
//! )?;
//! PsfFile::write_record_to_path(&structure, "water.psf")?;
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod engine;
pub mod workflows;
