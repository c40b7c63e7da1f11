//! Provides input/output functionality for molecular file formats.
//!
//! Geometries are read from XYZ or PDB files; structures are encoded as PSF and
//! residue topologies as CHARMM RTF. Every codec implements the
//! [`traits::MolecularFile`] interface, so path-based helpers are shared.

pub(crate) mod lines;
pub mod pdb;
pub mod psf;
pub mod rtf;
pub mod traits;
pub mod xyz;
