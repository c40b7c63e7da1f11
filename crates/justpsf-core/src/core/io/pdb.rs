use super::lines::{LineCursor, slice_and_trim};
use super::traits::MolecularFile;
use crate::core::models::geometry::{Geometry, GeometryError};
use nalgebra::Point3;
use std::io::{self, BufRead, Write};
use thiserror::Error;
use tracing::{debug, instrument, trace};

/// Per-atom annotations carried by `ATOM`/`HETATM` records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdbAtomInfo {
    pub serial: i64,
    pub name: String,
    pub residue_name: String,
    pub chain_id: String,
    pub residue_id: i64,
    pub is_hetero: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PdbMetadata {
    /// One entry per atom, in geometry order. May be empty when writing, in
    /// which case annotations are generated from the element symbols.
    pub atoms: Vec<PdbAtomInfo>,
}

#[derive(Debug, Error)]
pub enum PdbError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse { line: usize, kind: PdbParseErrorKind },
    #[error("Missing END record")]
    MissingEnd,
    #[error("Metadata has {annotations} atom annotation(s) for {atoms} atom(s)")]
    AnnotationMismatch { annotations: usize, atoms: usize },
    #[error("Value '{value}' does not fit in the {width}-column {field} field")]
    FieldOverflow {
        field: &'static str,
        value: String,
        width: usize,
    },
    #[error(transparent)]
    Geometry(#[from] GeometryError),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PdbParseErrorKind {
    #[error("Invalid integer format in columns {columns} (value: '{value}')")]
    InvalidInt { columns: String, value: String },
    #[error("Invalid float format in columns {columns} (value: '{value}')")]
    InvalidFloat { columns: String, value: String },
    #[error("Required field in columns {columns} is empty")]
    MissingRequiredField { columns: String },
}

const SERIAL_WIDTH: usize = 5;
const NAME_WIDTH: usize = 4;
const RESIDUE_NAME_WIDTH: usize = 4;
const CHAIN_WIDTH: usize = 1;
const RESIDUE_ID_WIDTH: usize = 4;
const COORDINATE_WIDTH: usize = 8;
const ELEMENT_WIDTH: usize = 2;

const DEFAULT_RESIDUE_NAME: &str = "UNK";
const DEFAULT_CHAIN_ID: &str = "A";

struct AtomLine<'a> {
    line: &'a str,
    number: usize,
}

impl AtomLine<'_> {
    fn required(&self, start: usize, end: usize) -> Result<&str, PdbError> {
        let value = slice_and_trim(self.line, start, end);
        if value.is_empty() {
            return Err(PdbError::Parse {
                line: self.number,
                kind: PdbParseErrorKind::MissingRequiredField {
                    columns: columns(start, end),
                },
            });
        }
        Ok(value)
    }

    fn int(&self, start: usize, end: usize) -> Result<i64, PdbError> {
        let value = self.required(start, end)?;
        value.parse().map_err(|_| PdbError::Parse {
            line: self.number,
            kind: PdbParseErrorKind::InvalidInt {
                columns: columns(start, end),
                value: value.into(),
            },
        })
    }

    fn float(&self, start: usize, end: usize) -> Result<f64, PdbError> {
        let value = self.required(start, end)?;
        value.parse().map_err(|_| PdbError::Parse {
            line: self.number,
            kind: PdbParseErrorKind::InvalidFloat {
                columns: columns(start, end),
                value: value.into(),
            },
        })
    }
}

/// 1-based inclusive column range, as the PDB format documents fields.
fn columns(start: usize, end: usize) -> String {
    format!("{}-{}", start + 1, end)
}

fn fit(field: &'static str, value: String, width: usize) -> Result<String, PdbError> {
    if value.len() > width {
        return Err(PdbError::FieldOverflow {
            field,
            value,
            width,
        });
    }
    Ok(value)
}

/// Atom names shorter than four characters start in column 14.
fn atom_name_field(name: &str) -> Result<String, PdbError> {
    let name = fit("atom name", name.to_string(), NAME_WIDTH)?;
    Ok(if name.len() < NAME_WIDTH {
        format!(" {name:<3}")
    } else {
        name
    })
}

fn default_annotations(geometry: &Geometry) -> Vec<PdbAtomInfo> {
    geometry
        .iter()
        .enumerate()
        .map(|(i, (symbol, _))| PdbAtomInfo {
            serial: i as i64 + 1,
            name: symbol.to_string(),
            residue_name: DEFAULT_RESIDUE_NAME.to_string(),
            chain_id: DEFAULT_CHAIN_ID.to_string(),
            residue_id: 1,
            is_hetero: false,
        })
        .collect()
}

/// Codec for the coordinate records of Protein Data Bank files.
///
/// Only `ATOM`, `HETATM` and `END` are interpreted; every other record is
/// skipped. The element symbol in columns 77-78 is required, since the
/// geometry is built from elements rather than atom names.
pub struct PdbFile;

impl MolecularFile for PdbFile {
    type Record = Geometry;
    type Metadata = PdbMetadata;
    type Error = PdbError;

    #[instrument(skip_all, name = "pdb_read")]
    fn read_from(reader: &mut impl BufRead) -> Result<(Geometry, PdbMetadata), PdbError> {
        let mut cursor = LineCursor::read(reader)?;
        let mut symbols = Vec::new();
        let mut positions = Vec::new();
        let mut metadata = PdbMetadata::default();
        let mut found_end = false;

        while let Some(line) = cursor.current() {
            let record_type = slice_and_trim(line, 0, 6);
            match record_type {
                "END" => {
                    found_end = true;
                    break;
                }
                "ATOM" | "HETATM" => {
                    let atom = AtomLine {
                        line,
                        number: cursor.line_number(),
                    };
                    let serial = atom.int(6, 11)?;
                    let residue_id = atom.int(22, 26)?;
                    let x = atom.float(30, 38)?;
                    let y = atom.float(38, 46)?;
                    let z = atom.float(46, 54)?;
                    let element = atom.required(76, 78)?;

                    symbols.push(element.to_string());
                    positions.push(Point3::new(x, y, z));
                    metadata.atoms.push(PdbAtomInfo {
                        serial,
                        name: slice_and_trim(line, 12, 16).to_string(),
                        residue_name: slice_and_trim(line, 17, 21).to_string(),
                        chain_id: slice_and_trim(line, 21, 22).to_string(),
                        residue_id,
                        is_hetero: record_type == "HETATM",
                    });
                }
                other => trace!(record = other, "Skipping record."),
            }
            cursor.advance();
        }

        if !found_end {
            return Err(PdbError::MissingEnd);
        }
        debug!(atoms = symbols.len(), "Read PDB geometry.");
        Ok((Geometry::new(symbols, positions)?, metadata))
    }

    #[instrument(skip_all, name = "pdb_write", fields(atoms = geometry.len()))]
    fn write_to(
        geometry: &Geometry,
        metadata: &PdbMetadata,
        writer: &mut impl Write,
    ) -> Result<(), PdbError> {
        let generated;
        let annotations = if metadata.atoms.is_empty() {
            generated = default_annotations(geometry);
            &generated
        } else {
            &metadata.atoms
        };
        if annotations.len() != geometry.len() {
            return Err(PdbError::AnnotationMismatch {
                annotations: annotations.len(),
                atoms: geometry.len(),
            });
        }

        for ((symbol, p), info) in geometry.iter().zip(annotations) {
            let record = if info.is_hetero { "HETATM" } else { "ATOM  " };
            let serial = fit("serial", info.serial.to_string(), SERIAL_WIDTH)?;
            let name = atom_name_field(&info.name)?;
            let residue_name = fit("residue name", info.residue_name.clone(), RESIDUE_NAME_WIDTH)?;
            let chain_id = fit("chain", info.chain_id.clone(), CHAIN_WIDTH)?;
            let residue_id = fit("residue id", info.residue_id.to_string(), RESIDUE_ID_WIDTH)?;
            let [x, y, z] = [p.x, p.y, p.z]
                .map(|v| fit("coordinate", format!("{v:.3}"), COORDINATE_WIDTH));
            let element = fit("element", symbol.to_string(), ELEMENT_WIDTH)?;
            writeln!(
                writer,
                "{record}{serial:>5} {name} {residue_name:<4}{chain_id:1}{residue_id:>4}    {:>8}{:>8}{:>8}{:>6.2}{:>6.2}          {element:>2}",
                x?,
                y?,
                z?,
                1.0,
                0.0,
            )?;
        }
        writeln!(writer, "END")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WATER: &str = "\
REMARK   1 water
ATOM      1  OH2 TIP3W   1      -1.150   0.201   0.021  1.00  0.00      W1   O
HETATM    2  H1  TIP3W   1      -0.209   0.042   0.036  1.00  0.00      W1   H
ATOM      3  H2  TIP3W   1      -1.508  -0.434   0.650  1.00  0.00      W1   H
TER
END
ATOM      4  X   TIP3W   1      -1.508  -0.434   0.650  1.00  0.00      W1   X
";

    fn kind(text: &str) -> (usize, PdbParseErrorKind) {
        match PdbFile::read_from(&mut text.as_bytes()) {
            Err(PdbError::Parse { line, kind }) => (line, kind),
            other => panic!("expected a parse error, got {other:?}"),
        }
    }

    #[test]
    fn reads_atoms_until_end() {
        let (geometry, metadata) = PdbFile::read_from(&mut WATER.as_bytes()).unwrap();
        assert_eq!(geometry.symbols(), ["O", "H", "H"]);
        assert_eq!(geometry.position(0), Some(&Point3::new(-1.150, 0.201, 0.021)));
        assert_eq!(
            metadata.atoms[1],
            PdbAtomInfo {
                serial: 2,
                name: "H1".into(),
                residue_name: "TIP3".into(),
                chain_id: "W".into(),
                residue_id: 1,
                is_hetero: true,
            }
        );
    }

    #[test]
    fn missing_element_and_end_are_errors() {
        let line = "ATOM      1  OH2 TIP3W   1      -1.150   0.201   0.021  1.00  0.00      W1\nEND\n";
        assert_eq!(
            kind(line),
            (1, PdbParseErrorKind::MissingRequiredField { columns: "77-78".into() })
        );
        let bad_x = "REMARK\nATOM      1  OH2 TIP3W   1      -1.1x0   0.201   0.021  1.00  0.00      W1   O\n";
        assert_eq!(
            kind(bad_x),
            (
                2,
                PdbParseErrorKind::InvalidFloat {
                    columns: "31-38".into(),
                    value: "-1.1x0".into()
                }
            )
        );
        let no_end = "ATOM      1  OH2 TIP3W   1      -1.150   0.201   0.021  1.00  0.00      W1   O\n";
        assert!(matches!(
            PdbFile::read_from(&mut no_end.as_bytes()),
            Err(PdbError::MissingEnd)
        ));
    }

    #[test]
    fn writer_round_trips_annotations() {
        let (geometry, metadata) = PdbFile::read_from(&mut WATER.as_bytes()).unwrap();
        let mut out = Vec::new();
        PdbFile::write_to(&geometry, &metadata, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text.lines().next().unwrap(),
            "ATOM      1  OH2 TIP3W   1      -1.150   0.201   0.021  1.00  0.00           O"
        );
        let (again, again_metadata) = PdbFile::read_from(&mut text.as_bytes()).unwrap();
        assert_eq!(again, geometry);
        assert_eq!(again_metadata, metadata);
    }

    #[test]
    fn writer_generates_annotations_and_rejects_overflow() {
        let geometry = Geometry::new(
            vec!["Na".into()],
            vec![Point3::new(1.0, 2.0, 3.0)],
        )
        .unwrap();
        let mut out = Vec::new();
        PdbFile::write_record_to(&geometry, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("ATOM      1  Na  UNK A   1"));
        assert!(text.ends_with("Na\nEND\n"));

        let far = Geometry::new(vec!["C".into()], vec![Point3::new(123456.0, 0.0, 0.0)]).unwrap();
        assert!(matches!(
            PdbFile::write_record_to(&far, &mut Vec::new()),
            Err(PdbError::FieldOverflow { field: "coordinate", .. })
        ));

        let atom = default_annotations(&far).remove(0);
        let metadata = PdbMetadata {
            atoms: vec![atom.clone(), atom],
        };
        assert!(matches!(
            PdbFile::write_to(&far, &metadata, &mut Vec::new()),
            Err(PdbError::AnnotationMismatch { annotations: 2, atoms: 1 })
        ));
    }
}
