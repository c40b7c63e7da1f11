use std::error::Error;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Defines the interface for reading and writing molecular file formats.
///
/// Each format decodes into one record type (a geometry, a structure, or a
/// residue topology set) plus format-specific metadata that is needed to write
/// the file back faithfully. Implementors handle format-specific parsing and
/// serialization; the path-based helpers are shared.
pub trait MolecularFile {
    /// The in-memory record this format encodes.
    type Record;

    /// The type of metadata associated with the file format.
    type Metadata: Default;

    /// The error type for I/O operations.
    type Error: Error + From<io::Error>;

    /// Reads a record from a buffered reader.
    ///
    /// # Arguments
    ///
    /// * `reader` - The buffered reader to read from.
    ///
    /// # Return
    ///
    /// Returns the parsed record and associated metadata.
    ///
    /// # Errors
    ///
    /// Returns an error if parsing fails or I/O operations encounter issues.
    fn read_from(reader: &mut impl BufRead) -> Result<(Self::Record, Self::Metadata), Self::Error>;

    /// Writes a record and metadata to a writer.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be represented in this format or
    /// writing fails.
    fn write_to(
        record: &Self::Record,
        metadata: &Self::Metadata,
        writer: &mut impl Write,
    ) -> Result<(), Self::Error>;

    /// Writes a record to a writer with default metadata.
    fn write_record_to(record: &Self::Record, writer: &mut impl Write) -> Result<(), Self::Error> {
        Self::write_to(record, &Self::Metadata::default(), writer)
    }

    /// Reads a record from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or parsing fails.
    fn read_from_path<P: AsRef<Path>>(
        path: P,
    ) -> Result<(Self::Record, Self::Metadata), Self::Error> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        Self::read_from(&mut reader)
    }

    /// Writes a record and metadata to a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or writing fails.
    fn write_to_path<P: AsRef<Path>>(
        record: &Self::Record,
        metadata: &Self::Metadata,
        path: P,
    ) -> Result<(), Self::Error> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        Self::write_to(record, metadata, &mut writer)?;
        writer.flush()?;
        Ok(())
    }

    /// Writes a record to a file path with default metadata.
    fn write_record_to_path<P: AsRef<Path>>(
        record: &Self::Record,
        path: P,
    ) -> Result<(), Self::Error> {
        Self::write_to_path(record, &Self::Metadata::default(), path)
    }
}
