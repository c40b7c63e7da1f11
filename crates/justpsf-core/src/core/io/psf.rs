use super::lines::{LineCursor, slice_and_trim};
use super::traits::MolecularFile;
use crate::core::models::structure::{
    AtomRecord, ConnectivitySection, Structure, StructureBuilder, StructureError,
};
use itertools::Itertools;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::io::{self, BufRead, Write};
use thiserror::Error;
use tracing::{debug, info, instrument, trace};

/// Segment name given to atoms whose segment field is blank.
pub const BLANK_SEGMENT_NAME: &str = "SYS";
pub const DEFAULT_TITLE: &str = "* Generated by just-psf";

const TITLE_TAG: &str = "NTITLE";
const ATOM_TAG: &str = "NATOM";
const REAL_WIDTH: usize = 14;
const FIXED_WIDTH: usize = 8;

/// Header flags of a PSF file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PsfFlags {
    /// Wide integer (10) and name (8) fields.
    pub ext: bool,
    /// Atom types are names rather than numeric codes; widens them under `EXT`.
    pub xplor: bool,
    /// Whitespace-separated atom records.
    pub namd: bool,
    /// Charge equilibration data may follow each atom record.
    pub cheq: bool,
    /// Tokens with no effect on the layout, kept for the header.
    pub other: Vec<String>,
}

impl PsfFlags {
    pub fn from_tokens<'a>(tokens: impl IntoIterator<Item = &'a str>) -> Self {
        let mut flags = Self::default();
        for token in tokens {
            match token {
                "EXT" => flags.ext = true,
                "XPLOR" => flags.xplor = true,
                "NAMD" => flags.namd = true,
                "CHEQ" => flags.cheq = true,
                other => flags.other.push(other.to_string()),
            }
        }
        flags
    }

    pub fn extended_xplor() -> Self {
        Self {
            ext: true,
            xplor: true,
            ..Self::default()
        }
    }

    /// Width of every integer field (counts, ids and indices).
    pub fn int_width(&self) -> usize {
        if self.ext { 10 } else { 8 }
    }

    pub fn layout(&self) -> AtomLayout {
        match (self.namd, self.ext, self.xplor) {
            (true, _, _) => AtomLayout::Namd,
            (false, true, true) => AtomLayout::ExtendedXplor,
            (false, true, false) => AtomLayout::Extended,
            (false, false, _) => AtomLayout::Standard,
        }
    }

    pub fn tokens(&self) -> Vec<&str> {
        let known = [
            (self.ext, "EXT"),
            (self.cheq, "CHEQ"),
            (self.xplor, "XPLOR"),
            (self.namd, "NAMD"),
        ];
        known
            .into_iter()
            .filter_map(|(set, token)| set.then_some(token))
            .chain(self.other.iter().map(String::as_str))
            .collect()
    }
}

impl fmt::Display for PsfFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PSF")?;
        for token in self.tokens() {
            write!(f, " {token}")?;
        }
        Ok(())
    }
}

/// Field layout of the atom records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AtomLayout {
    /// `I8 1X A4 1X A4 1X A4 1X A4 1X A4 1X 2G14.6 I8`
    Standard,
    /// `I10 1X A8 1X A8 1X A8 1X A8 1X A4 1X 2G14.6 I8`
    Extended,
    /// `I10 1X A8 1X A8 1X A8 1X A8 1X A6 1X 2G14.6 I8`
    ExtendedXplor,
    /// Whitespace-separated fields.
    Namd,
}

struct FieldWidths {
    id: usize,
    name: usize,
    atom_type: usize,
}

type Columns = (usize, usize);

struct AtomColumns {
    id: Columns,
    segment: Columns,
    residue_id: Columns,
    residue_name: Columns,
    name: Columns,
    atom_type: Columns,
    charge: Columns,
    mass: Columns,
    fixed: Columns,
}

impl AtomLayout {
    fn widths(self) -> FieldWidths {
        match self {
            Self::Standard => FieldWidths {
                id: 8,
                name: 4,
                atom_type: 4,
            },
            Self::Extended => FieldWidths {
                id: 10,
                name: 8,
                atom_type: 4,
            },
            Self::ExtendedXplor | Self::Namd => FieldWidths {
                id: 10,
                name: 8,
                atom_type: 6,
            },
        }
    }
}

impl FieldWidths {
    fn columns(&self) -> AtomColumns {
        let mut start = 0;
        let mut next = |width: usize, gap: usize| {
            let columns = (start, start + width);
            start += width + gap;
            columns
        };
        AtomColumns {
            id: next(self.id, 1),
            segment: next(self.name, 1),
            residue_id: next(self.name, 1),
            residue_name: next(self.name, 1),
            name: next(self.name, 1),
            atom_type: next(self.atom_type, 1),
            charge: next(REAL_WIDTH, 0),
            mass: next(REAL_WIDTH, 0),
            fixed: next(FIXED_WIDTH, 0),
        }
    }
}

/// Raw text of the fields of one atom record.
struct AtomFields<'a> {
    id: &'a str,
    segment: &'a str,
    residue_id: &'a str,
    residue_name: &'a str,
    name: &'a str,
    atom_type: &'a str,
    charge: &'a str,
    mass: &'a str,
    fixed: &'a str,
}

impl AtomColumns {
    fn extract<'a>(&self, line: &'a str) -> AtomFields<'a> {
        let field = |(start, end): Columns| slice_and_trim(line, start, end);
        AtomFields {
            id: field(self.id),
            segment: field(self.segment),
            residue_id: field(self.residue_id),
            residue_name: field(self.residue_name),
            name: field(self.name),
            atom_type: field(self.atom_type),
            charge: field(self.charge),
            mass: field(self.mass),
            fixed: field(self.fixed),
        }
    }
}

fn section_tag(section: ConnectivitySection) -> &'static str {
    match section {
        ConnectivitySection::Bonds => "NBOND",
        ConnectivitySection::Angles => "NTHETA",
        ConnectivitySection::Dihedrals => "NPHI",
        ConnectivitySection::Impropers => "NIMPHI",
        ConnectivitySection::Donors => "NDON",
        ConnectivitySection::Acceptors => "NACC",
    }
}

fn section_for_tag(tag: &str) -> Option<ConnectivitySection> {
    ConnectivitySection::ALL
        .into_iter()
        .find(|&section| section_tag(section) == tag)
}

fn groups_per_line(section: ConnectivitySection) -> usize {
    match section {
        ConnectivitySection::Bonds | ConnectivitySection::Donors | ConnectivitySection::Acceptors => 4,
        ConnectivitySection::Angles => 3,
        ConnectivitySection::Dihedrals | ConnectivitySection::Impropers => 2,
    }
}

/// A section the codec does not interpret, kept as text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSection {
    pub header: String,
    pub lines: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PsfMetadata {
    pub flags: PsfFlags,
    /// Lines of the `NTITLE` section.
    pub title: Vec<String>,
    /// Unrecognized sections, in file order.
    pub extra_sections: Vec<RawSection>,
}

impl Default for PsfMetadata {
    fn default() -> Self {
        Self {
            flags: PsfFlags::extended_xplor(),
            title: vec![DEFAULT_TITLE.to_string()],
            extra_sections: Vec::new(),
        }
    }
}

#[derive(Debug, Error)]
pub enum PsfError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Format error on line {line}: {kind}")]
    Format { line: usize, kind: PsfFormatErrorKind },
    #[error("Count mismatch on line {line} in section {section}: {kind}")]
    CountMismatch {
        line: usize,
        section: String,
        kind: CountMismatchKind,
    },
    #[error("Error in section {section}: indices too {direction}: {}", join_ids(.ids))]
    Range {
        section: String,
        ids: Vec<i64>,
        direction: RangeDirection,
    },
    #[error("Non sequential atom id on line {line}: expected {expected}, found {found}")]
    Sequence {
        line: usize,
        expected: i64,
        found: i64,
    },
    #[error("Missing NATOM section")]
    MissingAtomSection,
    #[error("Section {section} on line {line} appears more than once")]
    DuplicateSection { line: usize, section: String },
    #[error("Value '{value}' does not fit the {width}-character {field} field")]
    FieldOverflow {
        field: &'static str,
        value: String,
        width: usize,
    },
    #[error("Value '{value}' cannot be written as a whitespace-separated {field} field")]
    Unrepresentable { field: &'static str, value: String },
    #[error(transparent)]
    Structure(#[from] StructureError),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PsfFormatErrorKind {
    #[error("this is not a PSF file")]
    NotPsf,
    #[error("expected empty line")]
    ExpectedEmptyLine,
    #[error("expected section")]
    ExpectedSection,
    #[error("incorrectly formatted section header '{0}'")]
    InvalidSectionHeader(String),
    #[error("Invalid integer for {field} (value: '{value}')")]
    InvalidInt { field: &'static str, value: String },
    #[error("Invalid float for {field} (value: '{value}')")]
    InvalidFloat { field: &'static str, value: String },
    #[error("expected at least {expected} fields, got {found}")]
    MissingFields { expected: usize, found: usize },
    #[error("incorrect number of indices, expected {expected}")]
    IncorrectIndexCount { expected: usize },
    #[error("atom ids starting at {first} run past the integer range at record {record}")]
    AtomIdOverflow { first: i64, record: usize },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CountMismatchKind {
    #[error("not enough data, {missing} missing ({expected} expected)")]
    Shortfall { expected: usize, missing: usize },
    #[error("too much data, {extra} extra ({expected} expected)")]
    Excess { expected: usize, extra: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeDirection {
    Large,
    Small,
}

impl fmt::Display for RangeDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Large => write!(f, "large"),
            Self::Small => write!(f, "small"),
        }
    }
}

fn join_ids(ids: &[i64]) -> String {
    ids.iter().join(",")
}

fn format_error(line: usize, kind: PsfFormatErrorKind) -> PsfError {
    PsfError::Format { line, kind }
}

fn parse_int(value: &str, field: &'static str, line: usize) -> Result<i64, PsfError> {
    value.parse().map_err(|_| {
        format_error(
            line,
            PsfFormatErrorKind::InvalidInt {
                field,
                value: value.to_string(),
            },
        )
    })
}

fn parse_float(value: &str, field: &'static str, line: usize) -> Result<f64, PsfError> {
    value.parse().map_err(|_| {
        format_error(
            line,
            PsfFormatErrorKind::InvalidFloat {
                field,
                value: value.to_string(),
            },
        )
    })
}

/// Consumes the blank line that closes a section; end of input also counts.
fn expect_blank(cursor: &mut LineCursor) -> Result<(), PsfError> {
    if cursor.at_end() {
        return Ok(());
    }
    if !cursor.at_blank() {
        return Err(format_error(
            cursor.line_number(),
            PsfFormatErrorKind::ExpectedEmptyLine,
        ));
    }
    cursor.advance();
    Ok(())
}

fn parse_count(line: &str, int_width: usize) -> Option<usize> {
    line.get(..int_width)?.trim().parse().ok()
}

/// Collects the non-blank lines of a section, checking them against `count`.
fn read_records(
    cursor: &mut LineCursor,
    section: &str,
    count: usize,
) -> Result<Vec<(usize, String)>, PsfError> {
    let available = cursor.block().count();
    if available != count {
        let kind = if available > count {
            CountMismatchKind::Excess {
                expected: count,
                extra: available - count,
            }
        } else {
            CountMismatchKind::Shortfall {
                expected: count,
                missing: count - available,
            }
        };
        return Err(PsfError::CountMismatch {
            line: cursor.line_number() + available.min(count),
            section: section.to_string(),
            kind,
        });
    }

    let mut records = Vec::with_capacity(count);
    while let Some(line) = cursor.current() {
        if records.len() == count {
            break;
        }
        records.push((cursor.line_number(), line.to_string()));
        cursor.advance();
    }
    Ok(records)
}

fn parse_atom(line: &str, line_number: usize, layout: AtomLayout) -> Result<(i64, AtomRecord), PsfError> {
    let tokens: Vec<&str>;
    let fields = match layout {
        AtomLayout::Namd => {
            tokens = line.split_whitespace().collect();
            if tokens.len() < 9 {
                return Err(format_error(
                    line_number,
                    PsfFormatErrorKind::MissingFields {
                        expected: 9,
                        found: tokens.len(),
                    },
                ));
            }
            AtomFields {
                id: tokens[0],
                segment: tokens[1],
                residue_id: tokens[2],
                residue_name: tokens[3],
                name: tokens[4],
                atom_type: tokens[5],
                charge: tokens[6],
                mass: tokens[7],
                fixed: tokens[8],
            }
        }
        _ => layout.widths().columns().extract(line),
    };

    let id = parse_int(fields.id, "atom id", line_number)?;
    let segment_name = if fields.segment.is_empty() {
        BLANK_SEGMENT_NAME
    } else {
        fields.segment
    };
    let atom = AtomRecord {
        segment_name: segment_name.to_string(),
        residue_id: parse_int(fields.residue_id, "residue id", line_number)?,
        residue_name: fields.residue_name.to_string(),
        name: fields.name.to_string(),
        atom_type: fields.atom_type.to_string(),
        charge: parse_float(fields.charge, "charge", line_number)?,
        mass: parse_float(fields.mass, "mass", line_number)?,
        fixed: parse_int(fields.fixed, "fixed flag", line_number)? == 1,
    };
    Ok((id, atom))
}

/// Reads the atom records; returns the first atom id and the atoms.
fn read_atoms(
    cursor: &mut LineCursor,
    count: usize,
    layout: AtomLayout,
) -> Result<(i64, Vec<AtomRecord>), PsfError> {
    let records = read_records(cursor, ATOM_TAG, count)?;
    let mut first_id = 1;
    let mut atoms = Vec::with_capacity(records.len());

    for (k, (line_number, line)) in records.iter().enumerate() {
        let (id, atom) = parse_atom(line, *line_number, layout)?;
        if k == 0 {
            first_id = id;
        } else {
            let expected = i64::try_from(k)
                .ok()
                .and_then(|offset| first_id.checked_add(offset))
                .ok_or_else(|| {
                    format_error(
                        *line_number,
                        PsfFormatErrorKind::AtomIdOverflow {
                            first: first_id,
                            record: k + 1,
                        },
                    )
                })?;
            if id != expected {
                return Err(PsfError::Sequence {
                    line: *line_number,
                    expected,
                    found: id,
                });
            }
        }
        atoms.push(atom);
    }
    Ok((first_id, atoms))
}

/// Reads `count` groups of externally numbered indices, packed several groups per line.
fn read_indices(
    cursor: &mut LineCursor,
    section: ConnectivitySection,
    count: usize,
    int_width: usize,
) -> Result<Vec<i64>, PsfError> {
    let per_group = section.indices_per_group();
    let per_line = groups_per_line(section);
    let mut ids = Vec::with_capacity(count * per_group);
    let mut remaining = count;

    while let Some(line) = cursor.current() {
        if line.trim().is_empty() {
            break;
        }
        let line_number = cursor.line_number();
        let to_read = per_line.min(remaining) * per_group;
        let content = line.trim_end();

        // fields past the declared count, on this line or on further lines
        let overrun = remaining == 0
            || (remaining < per_line && content.len() > to_read * int_width);
        if overrun {
            let fields: usize = cursor
                .block()
                .map(|l| l.trim_end().len().div_ceil(int_width))
                .sum();
            return Err(PsfError::CountMismatch {
                line: line_number,
                section: section_tag(section).to_string(),
                kind: CountMismatchKind::Excess {
                    expected: count,
                    extra: fields.saturating_sub(to_read).div_ceil(per_group),
                },
            });
        }

        if content.len() != to_read * int_width {
            return Err(format_error(
                line_number,
                PsfFormatErrorKind::IncorrectIndexCount { expected: to_read },
            ));
        }
        for k in 0..to_read {
            let field = content
                .get(k * int_width..(k + 1) * int_width)
                .map_or("", str::trim);
            ids.push(parse_int(field, "atom index", line_number)?);
        }

        remaining -= to_read / per_group;
        cursor.advance();
    }

    if remaining != 0 {
        return Err(PsfError::CountMismatch {
            line: cursor.line_number(),
            section: section_tag(section).to_string(),
            kind: CountMismatchKind::Shortfall {
                expected: count,
                missing: remaining,
            },
        });
    }
    Ok(ids)
}

/// Keeps everything up to the next section header verbatim.
fn skip_section(cursor: &mut LineCursor) -> RawSection {
    let header = cursor.current().unwrap_or_default().to_string();
    cursor.advance();
    let mut lines = Vec::new();
    while let Some(line) = cursor.current() {
        if line.contains('!') {
            break;
        }
        lines.push(line.to_string());
        cursor.advance();
    }
    while lines.last().is_some_and(|l| l.trim().is_empty()) {
        lines.pop();
    }
    RawSection { header, lines }
}

fn fit_right(value: &str, width: usize, field: &'static str) -> Result<String, PsfError> {
    if value.chars().count() > width {
        return Err(PsfError::FieldOverflow {
            field,
            value: value.to_string(),
            width,
        });
    }
    Ok(format!("{value:>width$}"))
}

fn fit_left(value: &str, width: usize, field: &'static str) -> Result<String, PsfError> {
    if value.chars().count() > width {
        return Err(PsfError::FieldOverflow {
            field,
            value: value.to_string(),
            width,
        });
    }
    Ok(format!("{value:<width$}"))
}

fn format_atom(id: usize, atom: &AtomRecord, layout: AtomLayout) -> Result<String, PsfError> {
    let widths = layout.widths();
    let fixed = if atom.fixed { "1" } else { "0" };

    if layout == AtomLayout::Namd {
        for (field, value) in [
            ("segment name", &atom.segment_name),
            ("residue name", &atom.residue_name),
            ("atom name", &atom.name),
            ("atom type", &atom.atom_type),
        ] {
            if value.is_empty() || value.chars().any(char::is_whitespace) {
                return Err(PsfError::Unrepresentable {
                    field,
                    value: value.clone(),
                });
            }
        }
        return Ok(format!(
            "{id:>iw$} {:<nw$} {:<nw$} {:<nw$} {:<nw$} {:<tw$} {:>rw$.6} {:>rw$.6} {fixed:>fw$}",
            atom.segment_name,
            atom.residue_id,
            atom.residue_name,
            atom.name,
            atom.atom_type,
            atom.charge,
            atom.mass,
            iw = widths.id,
            nw = widths.name,
            tw = widths.atom_type,
            rw = REAL_WIDTH,
            fw = FIXED_WIDTH,
        ));
    }

    Ok([
        fit_right(&id.to_string(), widths.id, "atom id")?,
        " ".to_string(),
        fit_left(&atom.segment_name, widths.name, "segment name")?,
        " ".to_string(),
        fit_left(&atom.residue_id.to_string(), widths.name, "residue id")?,
        " ".to_string(),
        fit_left(&atom.residue_name, widths.name, "residue name")?,
        " ".to_string(),
        fit_left(&atom.name, widths.name, "atom name")?,
        " ".to_string(),
        fit_left(&atom.atom_type, widths.atom_type, "atom type")?,
        " ".to_string(),
        fit_right(&format!("{:.6}", atom.charge), REAL_WIDTH, "charge")?,
        fit_right(&format!("{:.6}", atom.mass), REAL_WIDTH, "mass")?,
        fit_right(fixed, FIXED_WIDTH, "fixed flag")?,
    ]
    .concat())
}

fn write_section_header(
    writer: &mut impl Write,
    count: usize,
    tag: &str,
    comment: Option<&str>,
    int_width: usize,
) -> Result<(), PsfError> {
    let count = fit_right(&count.to_string(), int_width, "record count")?;
    match comment {
        Some(comment) => writeln!(writer, "{count} !{tag}: {comment}")?,
        None => writeln!(writer, "{count} !{tag}")?,
    }
    Ok(())
}

/// Closes a section; empty sections carry an empty data line before the separator.
fn end_section(writer: &mut impl Write, empty: bool) -> Result<(), PsfError> {
    if empty {
        writeln!(writer)?;
    }
    writeln!(writer)?;
    Ok(())
}

/// Codec for the CHARMM/X-PLOR protein structure file.
pub struct PsfFile;

impl MolecularFile for PsfFile {
    type Record = Structure;
    type Metadata = PsfMetadata;
    type Error = PsfError;

    #[instrument(skip_all, name = "psf_read")]
    fn read_from(reader: &mut impl BufRead) -> Result<(Self::Record, Self::Metadata), Self::Error> {
        let mut cursor = LineCursor::read(reader)?;

        let flags = match cursor.current() {
            Some(line) if line.starts_with("PSF") => {
                PsfFlags::from_tokens(line.split_whitespace().skip(1))
            }
            _ => return Err(format_error(1, PsfFormatErrorKind::NotPsf)),
        };
        cursor.advance();
        expect_blank(&mut cursor)?;

        let int_width = flags.int_width();
        let layout = flags.layout();
        debug!(?layout, int_width, "Reading PSF.");

        let mut metadata = PsfMetadata {
            flags,
            title: Vec::new(),
            extra_sections: Vec::new(),
        };
        let mut atoms: Option<(i64, Vec<AtomRecord>)> = None;
        let mut sections: BTreeMap<ConnectivitySection, Vec<i64>> = BTreeMap::new();
        let mut seen = HashSet::new();

        while let Some(line) = cursor.current().map(str::to_string) {
            let header_line = cursor.line_number();
            let Some(bang) = line.find('!') else {
                return Err(format_error(header_line, PsfFormatErrorKind::ExpectedSection));
            };
            let title = &line[bang + 1..];
            let tag = title.split(':').next().unwrap_or_default().trim();
            let section = section_for_tag(tag);

            if tag != TITLE_TAG && tag != ATOM_TAG && section.is_none() {
                trace!(line = header_line, tag, "Skipping unrecognized section.");
                metadata.extra_sections.push(skip_section(&mut cursor));
                continue;
            }
            if !seen.insert(tag.to_string()) {
                return Err(PsfError::DuplicateSection {
                    line: header_line,
                    section: tag.to_string(),
                });
            }

            let count = parse_count(&line, int_width).ok_or_else(|| {
                format_error(
                    header_line,
                    PsfFormatErrorKind::InvalidSectionHeader(line.clone()),
                )
            })?;
            cursor.advance();
            debug!(tag, count, "Parsing section.");

            if count == 0 {
                // an empty section may or may not carry an empty data line
                expect_blank(&mut cursor)?;
                if cursor.at_blank() {
                    cursor.advance();
                }
                if tag == ATOM_TAG {
                    atoms = Some((1, Vec::new()));
                }
                continue;
            }

            if tag == TITLE_TAG {
                metadata.title = read_records(&mut cursor, tag, count)?
                    .into_iter()
                    .map(|(_, text)| text)
                    .collect();
            } else if tag == ATOM_TAG {
                atoms = Some(read_atoms(&mut cursor, count, layout)?);
            } else if let Some(section) = section {
                let ids = read_indices(&mut cursor, section, count, int_width)?;
                sections.insert(section, ids);
            }
            expect_blank(&mut cursor)?;
        }

        let Some((first_id, atom_records)) = atoms else {
            return Err(PsfError::MissingAtomSection);
        };
        let atom_count = atom_records.len();

        let mut builder = StructureBuilder::new();
        for atom in atom_records {
            builder.add_atom(atom);
        }
        for (&section, ids) in &sections {
            let mut local = Vec::with_capacity(ids.len());
            let mut too_large = Vec::new();
            let mut too_small = Vec::new();
            for &id in ids {
                // widened so that no pair of i64 ids can overflow
                let offset = i128::from(id) - i128::from(first_id);
                if offset < 0 {
                    too_small.push(id);
                    continue;
                }
                match usize::try_from(offset) {
                    Ok(index) if index < atom_count => local.push(index),
                    _ => too_large.push(id),
                }
            }

            if !too_large.is_empty() {
                return Err(PsfError::Range {
                    section: section_tag(section).to_string(),
                    ids: too_large,
                    direction: RangeDirection::Large,
                });
            }
            if !too_small.is_empty() {
                return Err(PsfError::Range {
                    section: section_tag(section).to_string(),
                    ids: too_small,
                    direction: RangeDirection::Small,
                });
            }

            for group in local.chunks(section.indices_per_group()) {
                builder.add_group(section, group);
            }
        }

        let structure = builder.build()?;
        info!(
            atoms = structure.len(),
            bonds = structure.bonds().len(),
            angles = structure.angles().len(),
            dihedrals = structure.dihedrals().len(),
            "PSF read complete."
        );
        Ok((structure, metadata))
    }

    #[instrument(skip_all, name = "psf_write", fields(atoms = structure.len()))]
    fn write_to(
        structure: &Self::Record,
        metadata: &Self::Metadata,
        writer: &mut impl Write,
    ) -> Result<(), Self::Error> {
        let int_width = metadata.flags.int_width();
        let layout = metadata.flags.layout();

        writeln!(writer, "{}", metadata.flags)?;
        writeln!(writer)?;

        write_section_header(writer, metadata.title.len(), TITLE_TAG, None, int_width)?;
        for line in &metadata.title {
            writeln!(writer, "{line}")?;
        }
        end_section(writer, metadata.title.is_empty())?;

        write_section_header(writer, structure.len(), ATOM_TAG, None, int_width)?;
        for (k, atom) in structure.atoms().iter().enumerate() {
            writeln!(writer, "{}", format_atom(k + 1, atom, layout)?)?;
        }
        end_section(writer, structure.is_empty())?;

        for section in ConnectivitySection::ALL {
            let groups = structure.groups(section);
            let comment = section.to_string();
            write_section_header(
                writer,
                groups.len(),
                section_tag(section),
                Some(comment.as_str()),
                int_width,
            )?;
            for line_groups in groups.chunks(groups_per_line(section)) {
                let mut line = String::new();
                for group in line_groups {
                    for &index in group.iter() {
                        line.push_str(&fit_right(&(index + 1).to_string(), int_width, "atom index")?);
                    }
                }
                writeln!(writer, "{line}")?;
            }
            end_section(writer, groups.is_empty())?;
        }

        for raw in &metadata.extra_sections {
            writeln!(writer, "{}", raw.header)?;
            for line in &raw.lines {
                writeln!(writer, "{line}")?;
            }
            writeln!(writer)?;
        }

        debug!(layout = ?layout, "PSF write complete.");
        Ok(())
    }
}
