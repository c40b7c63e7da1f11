use super::lines::LineCursor;
use super::traits::MolecularFile;
use crate::core::models::residue_topology::{
    ResidueTopology, ResidueTopologyError, ResidueTopologySet, TopologyAtom,
};
use crate::core::utils::elements::is_known_element;
use itertools::Itertools;
use std::io::{self, BufRead, Write};
use thiserror::Error;
use tracing::{debug, info, instrument};

/// Oldest topology file version the reader understands.
pub const MIN_VERSION: i64 = 19;
pub const DEFAULT_VERSION: (i64, i64) = (36, 1);

const COMMENT: char = '!';
const TITLE_MARK: char = '*';
const BONDS_PER_LINE: usize = 4;

/// Residue keywords that are recognized but not interpreted.
const SKIPPED_KEYWORDS: [&str; 7] = ["GROU", "IC", "IMPR", "CMAP", "DONO", "ACCE", "PATC"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RtfMetadata {
    /// Title lines, without their leading `*`.
    pub title: Vec<String>,
    pub version: (i64, i64),
}

impl Default for RtfMetadata {
    fn default() -> Self {
        Self {
            title: vec!["Generated by just-psf".to_string()],
            version: DEFAULT_VERSION,
        }
    }
}

#[derive(Debug, Error)]
pub enum RtfError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse { line: usize, kind: RtfParseErrorKind },
    #[error("Missing END statement")]
    MissingEnd,
    #[error("Cannot write {field} '{value}': it must be a single non-empty word")]
    InvalidName { field: &'static str, value: String },
    #[error(transparent)]
    Topology(#[from] ResidueTopologyError),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RtfParseErrorKind {
    #[error("expected `*` to end the title")]
    UnterminatedTitle,
    #[error("expected the file version")]
    MissingVersion,
    #[error("cannot parse topology file version {0} (< {MIN_VERSION})")]
    UnsupportedVersion(i64),
    #[error("expected integer, got '{0}'")]
    InvalidInt(String),
    #[error("expected number, got '{0}'")]
    InvalidFloat(String),
    #[error("`{0}` is missing a value")]
    MissingValue(String),
    #[error("`{0}` expects names in pairs")]
    UnpairedValue(String),
    #[error("a MASS is already defined for `{0}`")]
    DuplicateMass(String),
    #[error("`{0}` is already DECLared")]
    DuplicateDeclaration(String),
    #[error("an atom with name `{0}` already exists")]
    DuplicateAtom(String),
    #[error("unknown atom type `{0}`")]
    UnknownAtomType(String),
    #[error("unknown atom name `{0}` in bond")]
    UnknownAtomName(String),
    #[error("unknown keyword `{0}`")]
    UnknownKeyword(String),
    #[error("unexpected content after END: `{0}`")]
    TrailingContent(String),
}

/// One non-empty, comment-stripped line split into words.
struct Statement {
    line: usize,
    words: Vec<String>,
}

impl Statement {
    /// Keywords are matched on their first four characters.
    fn keyword(&self) -> String {
        self.words[0].chars().take(4).collect::<String>().to_uppercase()
    }

    fn args(&self) -> &[String] {
        &self.words[1..]
    }

    fn error(&self, kind: RtfParseErrorKind) -> RtfError {
        RtfError::Parse {
            line: self.line,
            kind,
        }
    }

    fn arg(&self, k: usize) -> Result<&str, RtfError> {
        self.args()
            .get(k)
            .map(String::as_str)
            .ok_or_else(|| self.error(RtfParseErrorKind::MissingValue(self.keyword())))
    }

    fn int_arg(&self, k: usize) -> Result<i64, RtfError> {
        let value = self.arg(k)?;
        value
            .parse()
            .map_err(|_| self.error(RtfParseErrorKind::InvalidInt(value.to_string())))
    }

    fn float_arg(&self, k: usize) -> Result<f64, RtfError> {
        let value = self.arg(k)?;
        value
            .parse()
            .map_err(|_| self.error(RtfParseErrorKind::InvalidFloat(value.to_string())))
    }

    fn pairs(&self) -> Result<Vec<(&str, &str)>, RtfError> {
        let args = self.args();
        if args.len() % 2 != 0 {
            return Err(self.error(RtfParseErrorKind::UnpairedValue(self.keyword())));
        }
        Ok(args
            .chunks(2)
            .map(|pair| (pair[0].as_str(), pair[1].as_str()))
            .collect())
    }

    fn starts_block(&self) -> bool {
        matches!(self.keyword().as_str(), "RESI" | "END")
    }
}

fn read_title(cursor: &mut LineCursor) -> Result<Vec<String>, RtfError> {
    let mut title = Vec::new();
    if !cursor.current().is_some_and(|l| l.starts_with(TITLE_MARK)) {
        return Ok(title);
    }
    loop {
        let line_number = cursor.line_number();
        let Some(line) = cursor.current() else {
            return Err(RtfError::Parse {
                line: line_number,
                kind: RtfParseErrorKind::UnterminatedTitle,
            });
        };
        let Some(text) = line.strip_prefix(TITLE_MARK) else {
            return Err(RtfError::Parse {
                line: line_number,
                kind: RtfParseErrorKind::UnterminatedTitle,
            });
        };
        if text.trim().is_empty() {
            cursor.advance();
            return Ok(title);
        }
        title.push(text.trim().to_string());
        cursor.advance();
    }
}

fn read_statements(cursor: &mut LineCursor) -> Vec<Statement> {
    let mut statements = Vec::new();
    while let Some(line) = cursor.current() {
        let content = line.split(COMMENT).next().unwrap_or_default();
        let words: Vec<String> = content.split_whitespace().map(str::to_string).collect();
        if !words.is_empty() {
            statements.push(Statement {
                line: cursor.line_number(),
                words,
            });
        }
        cursor.advance();
    }
    statements
}

fn read_version(statement: Option<&Statement>) -> Result<(i64, i64), RtfError> {
    let Some(statement) = statement else {
        return Err(RtfError::Parse {
            line: 1,
            kind: RtfParseErrorKind::MissingVersion,
        });
    };
    let parse = |word: &String| {
        word.parse::<i64>()
            .map_err(|_| statement.error(RtfParseErrorKind::InvalidInt(word.clone())))
    };
    let [major, minor] = statement.words.as_slice() else {
        return Err(statement.error(RtfParseErrorKind::MissingVersion));
    };
    let major = parse(major)?;
    if major < MIN_VERSION {
        return Err(statement.error(RtfParseErrorKind::UnsupportedVersion(major)));
    }
    Ok((major, parse(minor)?))
}

fn read_declaration(set: &mut ResidueTopologySet, statement: &Statement) -> Result<(), RtfError> {
    match statement.keyword().as_str() {
        "MASS" => {
            statement.int_arg(0)?;
            let atom_type = statement.arg(1)?;
            if set.mass_of(atom_type).is_some() {
                return Err(statement.error(RtfParseErrorKind::DuplicateMass(atom_type.to_string())));
            }
            let mass = statement.float_arg(2)?;
            set.masses.push((atom_type.to_string(), mass));
        }
        "DECL" => {
            let name = statement.arg(0)?;
            if set.declaration_index(name).is_some() {
                return Err(statement.error(RtfParseErrorKind::DuplicateDeclaration(name.to_string())));
            }
            set.declarations.push(name.to_string());
        }
        "DEFA" => {
            for (a, b) in statement.pairs()? {
                set.defaults.push((a.to_string(), b.to_string()));
            }
        }
        "AUTO" => {
            for word in statement.args() {
                if !set.autogenerate.contains(word) {
                    set.autogenerate.push(word.clone());
                }
            }
        }
        other => {
            return Err(statement.error(RtfParseErrorKind::UnknownKeyword(other.to_string())));
        }
    }
    Ok(())
}

fn read_residue<'a>(
    set: &ResidueTopologySet,
    header: &Statement,
    body: impl Iterator<Item = &'a Statement>,
) -> Result<ResidueTopology, RtfError> {
    let mut residue = ResidueTopology::new(header.arg(0)?, header.float_arg(1)?);
    debug!(residue = %residue.name, "Parsing residue.");

    let resolve = |residue: &ResidueTopology, name: &str| -> Option<isize> {
        residue
            .atom_index(name)
            .map(|k| k as isize)
            .or_else(|| set.declaration_index(name))
    };

    for statement in body {
        let keyword = statement.keyword();
        match keyword.as_str() {
            "ATOM" => {
                let name = statement.arg(0)?;
                if resolve(&residue, name).is_some() {
                    return Err(statement.error(RtfParseErrorKind::DuplicateAtom(name.to_string())));
                }
                let atom_type = statement.arg(1)?;
                if set.mass_of(atom_type).is_none() {
                    return Err(statement.error(RtfParseErrorKind::UnknownAtomType(atom_type.to_string())));
                }
                let charge = statement.float_arg(2)?;
                residue.atoms.push(TopologyAtom::new(name, atom_type, charge));
            }
            "BOND" | "DOUB" => {
                for (a, b) in statement.pairs()? {
                    let index = |name: &str| {
                        resolve(&residue, name).ok_or_else(|| {
                            statement.error(RtfParseErrorKind::UnknownAtomName(name.to_string()))
                        })
                    };
                    let bond = (index(a)?, index(b)?);
                    residue.bonds.push(bond);
                }
            }
            k if SKIPPED_KEYWORDS.contains(&k) => {}
            _ => {
                return Err(statement.error(RtfParseErrorKind::UnknownKeyword(keyword)));
            }
        }
    }
    Ok(residue)
}

fn check_word(field: &'static str, value: &str) -> Result<(), RtfError> {
    if value.is_empty() || value.contains(COMMENT) || value.chars().any(char::is_whitespace) {
        return Err(RtfError::InvalidName {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}

fn bond_name<'a>(
    set: &'a ResidueTopologySet,
    residue: &'a ResidueTopology,
    index: isize,
) -> Result<&'a str, RtfError> {
    let name = if index >= 0 {
        residue.atoms.get(index as usize).map(|a| a.name.as_str())
    } else {
        set.declarations
            .get((-1 - index) as usize)
            .map(String::as_str)
    };
    name.ok_or_else(|| {
        RtfError::Topology(ResidueTopologyError::UnresolvedBondIndex {
            residue: residue.name.clone(),
            index,
        })
    })
}

/// Codec for CHARMM residue topology files.
pub struct RtfFile;

impl MolecularFile for RtfFile {
    type Record = ResidueTopologySet;
    type Metadata = RtfMetadata;
    type Error = RtfError;

    #[instrument(skip_all, name = "rtf_read")]
    fn read_from(reader: &mut impl BufRead) -> Result<(Self::Record, Self::Metadata), Self::Error> {
        let mut cursor = LineCursor::read(reader)?;
        let title = read_title(&mut cursor)?;
        let statements = read_statements(&mut cursor);
        let mut statements = statements.iter().peekable();

        let version = read_version(statements.next())?;
        debug!(major = version.0, minor = version.1, "Reading topology file.");

        let mut set = ResidueTopologySet::new();
        while let Some(statement) = statements.next_if(|s| !s.starts_block()) {
            read_declaration(&mut set, statement)?;
        }

        while let Some(header) = statements.next_if(|s| s.keyword() == "RESI") {
            let mut body = Vec::new();
            while let Some(statement) = statements.next_if(|s| !s.starts_block()) {
                body.push(statement);
            }
            let residue = read_residue(&set, header, body.into_iter())?;
            set.residues.push(residue);
        }

        if statements.next().is_none() {
            return Err(RtfError::MissingEnd);
        }
        if let Some(extra) = statements.next() {
            return Err(extra.error(RtfParseErrorKind::TrailingContent(extra.words.join(" "))));
        }

        info!(
            masses = set.masses.len(),
            residues = set.residues.len(),
            "Topology file read complete."
        );
        Ok((set, RtfMetadata { title, version }))
    }

    #[instrument(skip_all, name = "rtf_write", fields(residues = set.residues.len()))]
    fn write_to(
        set: &Self::Record,
        metadata: &Self::Metadata,
        writer: &mut impl Write,
    ) -> Result<(), Self::Error> {
        set.validate()?;

        // a blank title line would read back as the end of the title
        for line in metadata.title.iter().filter(|l| !l.trim().is_empty()) {
            writeln!(writer, "{TITLE_MARK} {}", line.trim())?;
        }
        writeln!(writer, "{TITLE_MARK}")?;
        writeln!(writer, "{} {}", metadata.version.0, metadata.version.1)?;
        writeln!(writer)?;

        for (k, (atom_type, mass)) in set.masses.iter().enumerate() {
            check_word("atom type", atom_type)?;
            let element = if is_known_element(atom_type) {
                format!(" {atom_type}")
            } else {
                String::new()
            };
            writeln!(writer, "MASS {:>5} {:<6} {:>10}{element}", k + 1, atom_type, mass)?;
        }
        for declaration in &set.declarations {
            check_word("declaration", declaration)?;
            writeln!(writer, "DECL {declaration}")?;
        }
        if !set.defaults.is_empty() {
            let pairs = set.defaults.iter().map(|(a, b)| format!("{a} {b}")).join(" ");
            writeln!(writer, "DEFA {pairs}")?;
        }
        if !set.autogenerate.is_empty() {
            writeln!(writer, "AUTO {}", set.autogenerate.join(" "))?;
        }
        writeln!(writer)?;

        for residue in &set.residues {
            check_word("residue name", &residue.name)?;
            writeln!(writer, "RESI {} {}", residue.name, residue.charge)?;
            for atom in &residue.atoms {
                check_word("atom name", &atom.name)?;
                check_word("atom type", &atom.atom_type)?;
                writeln!(writer, "ATOM {:<6} {:<6} {:>7}", atom.name, atom.atom_type, atom.charge)?;
            }
            for chunk in residue.bonds.chunks(BONDS_PER_LINE) {
                let pairs: Vec<String> = chunk
                    .iter()
                    .map(|&(a, b)| {
                        Ok(format!(
                            "{} {}",
                            bond_name(set, residue, a)?,
                            bond_name(set, residue, b)?
                        ))
                    })
                    .collect::<Result<_, RtfError>>()?;
                writeln!(writer, "BOND {}", pairs.iter().join("  "))?;
            }
            writeln!(writer)?;
        }

        writeln!(writer, "END")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WATER: &str = "\
* Water model
* second line
*
36  1

MASS     1 HT          1.008 H ! TIP3P hydrogen
MASS     2 OT        15.9994 O
DECL -C
DECL +N
DEFA FIRS NTER LAST CTER
AUTO ANGLES DIHE

RESI TIP3         0.000 ! tip3p water model
GROUP
ATOM OH2  OT     -0.834
ATOM H1   HT      0.417
ATOM H2   HT      0.417
BOND OH2 H1 OH2 H2 H1 H2    ! the last bond is for SHAKE
IC H1 OH2 H2 0.0 0.0 0.0 0.0 0.0
ACCEPTOR OH2
PATCHING FIRS NONE LAST NONE

RESIDUE LINK 0.0
ATOM C OT 0.0
BOND C -C C +N

END
";

    fn read(text: &str) -> Result<(ResidueTopologySet, RtfMetadata), RtfError> {
        RtfFile::read_from(&mut text.as_bytes())
    }

    fn kind(text: &str) -> RtfParseErrorKind {
        match read(text) {
            Err(RtfError::Parse { kind, .. }) => kind,
            other => panic!("expected a parse error, got {other:?}"),
        }
    }

    #[test]
    fn reads_header_and_residues() {
        let (set, metadata) = read(WATER).unwrap();
        assert_eq!(metadata.title, vec!["Water model", "second line"]);
        assert_eq!(metadata.version, (36, 1));

        assert_eq!(
            set.masses,
            vec![("HT".to_string(), 1.008), ("OT".to_string(), 15.9994)]
        );
        assert_eq!(set.declarations, vec!["-C", "+N"]);
        assert_eq!(
            set.defaults,
            vec![
                ("FIRS".to_string(), "NTER".to_string()),
                ("LAST".to_string(), "CTER".to_string())
            ]
        );
        assert_eq!(set.autogenerate, vec!["ANGLES", "DIHE"]);

        let water = set.residue("TIP3").unwrap();
        assert_eq!(water.charge, 0.0);
        assert_eq!(water.atoms.len(), 3);
        assert_eq!(water.atoms[0], TopologyAtom::new("OH2", "OT", -0.834));
        assert_eq!(water.bonds, vec![(0, 1), (0, 2), (1, 2)]);

        // declarations resolve to negative indices
        assert_eq!(set.residue("LINK").unwrap().bonds, vec![(0, -1), (0, -2)]);
    }

    #[test]
    fn title_and_header_are_optional_parts() {
        let (set, metadata) = read("  19 1  \nRESI TEST 0.0\nEND").unwrap();
        assert!(metadata.title.is_empty());
        assert_eq!(metadata.version, (19, 1));
        assert_eq!(set.residues.len(), 1);
        assert!(set.residues[0].atoms.is_empty());
    }

    #[test]
    fn round_trips_through_the_writer() {
        let (set, metadata) = read(WATER).unwrap();
        let mut out = Vec::new();
        RtfFile::write_to(&set, &metadata, &mut out).unwrap();
        let (again, metadata_again) = RtfFile::read_from(&mut out.as_slice()).unwrap();
        assert_eq!(again, set);
        assert_eq!(metadata_again, metadata);
    }

    #[test]
    fn header_errors() {
        assert_eq!(kind("*title\n"), RtfParseErrorKind::UnterminatedTitle);
        assert_eq!(kind("*title\n19 1\nEND\n"), RtfParseErrorKind::UnterminatedTitle);
        assert_eq!(kind("18 1\nEND\n"), RtfParseErrorKind::UnsupportedVersion(18));
        assert_eq!(kind("36\nEND\n"), RtfParseErrorKind::MissingVersion);
        assert_eq!(kind("a 1\nEND\n"), RtfParseErrorKind::InvalidInt("a".into()));
        assert_eq!(
            kind("36 1\nMASS 1 HT 1.0\nMASS 2 HT 1.0\nEND\n"),
            RtfParseErrorKind::DuplicateMass("HT".into())
        );
        assert_eq!(
            kind("36 1\nDECL +N\nDECL +N\nEND\n"),
            RtfParseErrorKind::DuplicateDeclaration("+N".into())
        );
        assert_eq!(
            kind("36 1\nDEFA FIRS\nEND\n"),
            RtfParseErrorKind::UnpairedValue("DEFA".into())
        );
        assert_eq!(
            kind("36 1\nMASS 1 HT x\nEND\n"),
            RtfParseErrorKind::InvalidFloat("x".into())
        );
        assert_eq!(
            kind("36 1\nFOO bar\nEND\n"),
            RtfParseErrorKind::UnknownKeyword("FOO".into())
        );
    }

    #[test]
    fn residue_errors() {
        let header = "36 1\nMASS 1 HT 1.0\nDECL +N\n";
        let with = |body: &str| format!("{header}RESI R 0.0\n{body}\nEND\n");
        assert_eq!(
            kind(&with("ATOM H HX 0.0")),
            RtfParseErrorKind::UnknownAtomType("HX".into())
        );
        assert_eq!(
            kind(&with("ATOM H HT 0.0\nATOM H HT 0.0")),
            RtfParseErrorKind::DuplicateAtom("H".into())
        );
        assert_eq!(
            kind(&with("ATOM +N HT 0.0")),
            RtfParseErrorKind::DuplicateAtom("+N".into())
        );
        assert_eq!(
            kind(&with("ATOM H HT 0.0\nBOND H X")),
            RtfParseErrorKind::UnknownAtomName("X".into())
        );
        assert_eq!(
            kind(&with("MASS 2 OT 16.0")),
            RtfParseErrorKind::UnknownKeyword("MASS".into())
        );
        assert_eq!(kind(&with("ATOM H HT")), RtfParseErrorKind::MissingValue("ATOM".into()));
    }

    #[test]
    fn end_is_required_and_final() {
        assert!(matches!(read("36 1\nRESI R 0.0\n"), Err(RtfError::MissingEnd)));
        assert_eq!(
            kind("36 1\nEND\nRESI R 0.0\n"),
            RtfParseErrorKind::TrailingContent("RESI R 0.0".into())
        );
        // comments and blank lines may follow END
        assert!(read("36 1\nEND\n\n! done\n").is_ok());
    }

    #[test]
    fn writer_rejects_unresolved_bonds_and_bad_names() {
        let mut set = ResidueTopologySet::new();
        set.masses.push(("C".into(), 12.011));
        let mut residue = ResidueTopology::new("RES1", 0.0);
        residue.atoms.push(TopologyAtom::new("C1", "C", 0.0));
        residue.bonds.push((0, -1));
        set.residues.push(residue);

        assert!(matches!(
            RtfFile::write_record_to(&set, &mut Vec::new()),
            Err(RtfError::Topology(_))
        ));

        set.residues[0].bonds.clear();
        set.residues[0].atoms[0].name = "C 1".into();
        assert!(matches!(
            RtfFile::write_record_to(&set, &mut Vec::new()),
            Err(RtfError::InvalidName { field: "atom name", .. })
        ));
    }

    #[test]
    fn writer_output_lists_elements_for_element_types() {
        let mut set = ResidueTopologySet::new();
        set.masses.push(("O".into(), 15.999));
        set.masses.push(("OT".into(), 15.9994));
        set.autogenerate = vec!["ANGL".into(), "DIHE".into()];
        let mut out = Vec::new();
        RtfFile::write_record_to(&set, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("* Generated by just-psf\n*\n36 1\n"));
        assert!(text.contains("MASS     1 O          15.999 O\n"));
        assert!(text.contains("MASS     2 OT        15.9994\n"));
        assert!(text.contains("AUTO ANGL DIHE\n"));
        assert!(text.trim_end().ends_with("END"));
    }
}
