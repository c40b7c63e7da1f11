use super::lines::LineCursor;
use super::traits::MolecularFile;
use crate::core::models::geometry::{Geometry, GeometryError};
use nalgebra::Point3;
use std::io::{self, BufRead, Write};
use thiserror::Error;
use tracing::{debug, instrument};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XyzMetadata {
    /// The free-form comment on the second line.
    pub title: String,
}

#[derive(Debug, Error)]
pub enum XyzError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse { line: usize, kind: XyzParseErrorKind },
    #[error("Cannot write symbol '{0}': it must be a single non-empty word")]
    InvalidSymbol(String),
    #[error(transparent)]
    Geometry(#[from] GeometryError),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum XyzParseErrorKind {
    #[error("Invalid atom count '{0}'")]
    InvalidCount(String),
    #[error("Missing title line")]
    MissingTitle,
    #[error("Expected {expected} atom line(s), found {found}")]
    Truncated { expected: usize, found: usize },
    #[error("Expected `symbol x y z`, got '{0}'")]
    MalformedAtom(String),
    #[error("Invalid coordinate '{0}'")]
    InvalidFloat(String),
}

/// Seven decimals with a leading space in place of a plus sign.
fn signed(value: f64) -> String {
    if value.is_sign_negative() {
        format!("{value:.7}")
    } else {
        format!(" {value:.7}")
    }
}

/// Codec for plain XYZ geometry files.
pub struct XyzFile;

impl MolecularFile for XyzFile {
    type Record = Geometry;
    type Metadata = XyzMetadata;
    type Error = XyzError;

    #[instrument(skip_all, name = "xyz_read")]
    fn read_from(reader: &mut impl BufRead) -> Result<(Geometry, XyzMetadata), XyzError> {
        let mut cursor = LineCursor::read(reader)?;
        let error = |line, kind| XyzError::Parse { line, kind };

        let count_line = cursor.current().unwrap_or_default().trim();
        let count: usize = count_line
            .parse()
            .map_err(|_| error(1, XyzParseErrorKind::InvalidCount(count_line.to_string())))?;
        cursor.advance();

        let title = cursor
            .current()
            .ok_or_else(|| error(2, XyzParseErrorKind::MissingTitle))?
            .trim()
            .to_string();
        cursor.advance();

        let mut symbols = Vec::with_capacity(count);
        let mut positions = Vec::with_capacity(count);
        for found in 0..count {
            let line_number = cursor.line_number();
            let Some(line) = cursor.current() else {
                return Err(error(
                    line_number,
                    XyzParseErrorKind::Truncated {
                        expected: count,
                        found,
                    },
                ));
            };
            let fields: Vec<&str> = line.split_whitespace().collect();
            let [symbol, x, y, z, ..] = fields.as_slice() else {
                return Err(error(
                    line_number,
                    XyzParseErrorKind::MalformedAtom(line.to_string()),
                ));
            };
            let coordinate = |value: &str| {
                value.parse::<f64>().map_err(|_| {
                    error(line_number, XyzParseErrorKind::InvalidFloat(value.to_string()))
                })
            };
            positions.push(Point3::new(coordinate(x)?, coordinate(y)?, coordinate(z)?));
            symbols.push(symbol.to_string());
            cursor.advance();
        }

        debug!(atoms = count, "Read XYZ geometry.");
        Ok((Geometry::new(symbols, positions)?, XyzMetadata { title }))
    }

    fn write_to(
        geometry: &Geometry,
        metadata: &XyzMetadata,
        writer: &mut impl Write,
    ) -> Result<(), XyzError> {
        writeln!(writer, "{}", geometry.len())?;
        writeln!(writer, "{}", metadata.title.lines().next().unwrap_or_default())?;
        for (symbol, p) in geometry.iter() {
            if symbol.is_empty() || symbol.chars().any(char::is_whitespace) {
                return Err(XyzError::InvalidSymbol(symbol.to_string()));
            }
            writeln!(
                writer,
                "{:2} {} {} {}",
                symbol,
                signed(p.x),
                signed(p.y),
                signed(p.z)
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WATER: &str = "3\nwater molecule\nO 0.0 0.0 0.0\nH 0.0 0.757 0.587\nH  0.0 -0.757   0.587 extra\n";

    fn kind(text: &str) -> (usize, XyzParseErrorKind) {
        match XyzFile::read_from(&mut text.as_bytes()) {
            Err(XyzError::Parse { line, kind }) => (line, kind),
            other => panic!("expected a parse error, got {other:?}"),
        }
    }

    #[test]
    fn reads_count_title_and_atoms() {
        let (geometry, metadata) = XyzFile::read_from(&mut WATER.as_bytes()).unwrap();
        assert_eq!(metadata.title, "water molecule");
        assert_eq!(geometry.symbols(), ["O", "H", "H"]);
        assert_eq!(geometry.position(2), Some(&Point3::new(0.0, -0.757, 0.587)));
    }

    #[test]
    fn writes_fixed_precision_columns() {
        let (geometry, metadata) = XyzFile::read_from(&mut WATER.as_bytes()).unwrap();
        let mut out = Vec::new();
        XyzFile::write_to(&geometry, &metadata, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "3");
        assert_eq!(lines[1], "water molecule");
        assert_eq!(lines[2], "O   0.0000000  0.0000000  0.0000000");
        assert_eq!(lines[4], "H   0.0000000 -0.7570000  0.5870000");

        let (again, _) = XyzFile::read_from(&mut text.as_bytes()).unwrap();
        assert_eq!(again, geometry);
    }

    #[test]
    fn reports_malformed_input() {
        assert_eq!(kind("three\n\n"), (1, XyzParseErrorKind::InvalidCount("three".into())));
        assert_eq!(kind("1\n"), (2, XyzParseErrorKind::MissingTitle));
        assert_eq!(
            kind("2\nt\nH 0 0 0\n"),
            (4, XyzParseErrorKind::Truncated { expected: 2, found: 1 })
        );
        assert_eq!(kind("1\nt\nH 0 0\n"), (3, XyzParseErrorKind::MalformedAtom("H 0 0".into())));
        assert_eq!(kind("1\nt\nH 0 x 0\n"), (3, XyzParseErrorKind::InvalidFloat("x".into())));
    }

    #[test]
    fn writer_rejects_blank_symbols() {
        let geometry = Geometry::new(vec![" ".into()], vec![Point3::origin()]).unwrap();
        assert!(matches!(
            XyzFile::write_record_to(&geometry, &mut Vec::new()),
            Err(XyzError::InvalidSymbol(_))
        ));
    }
}
