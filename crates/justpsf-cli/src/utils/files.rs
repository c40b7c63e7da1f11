use crate::cli::GeometryFormat;
use crate::error::{CliError, Result};
use justpsf::core::io::pdb::PdbFile;
use justpsf::core::io::traits::MolecularFile;
use justpsf::core::io::xyz::XyzFile;
use justpsf::core::models::geometry::Geometry;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use tracing::info;

/// Picks the geometry format from `--format`, else from the file extension.
pub fn resolve_format(path: &Path, explicit: Option<GeometryFormat>) -> Result<GeometryFormat> {
    if let Some(format) = explicit {
        return Ok(format);
    }
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("xyz") => Ok(GeometryFormat::Xyz),
        Some("pdb" | "ent") => Ok(GeometryFormat::Pdb),
        _ => Err(CliError::Argument(format!(
            "Cannot guess the format of '{}'; use --format xyz or --format pdb.",
            path.display()
        ))),
    }
}

pub fn read_geometry(path: &Path, explicit: Option<GeometryFormat>) -> Result<Geometry> {
    let format = resolve_format(path, explicit)?;
    info!("Loading {:?} geometry from {:?}", format, path);
    let parsing = |source: anyhow::Error| CliError::FileParsing {
        path: path.to_path_buf(),
        source,
    };
    let geometry = match format {
        GeometryFormat::Xyz => XyzFile::read_from_path(path).map_err(|e| parsing(e.into()))?.0,
        GeometryFormat::Pdb => PdbFile::read_from_path(path).map_err(|e| parsing(e.into()))?.0,
    };
    info!("Loaded {} atom(s).", geometry.len());
    Ok(geometry)
}

/// Writes to `path`, or to stdout when no path is given, through `write`.
pub fn write_output<E>(
    path: Option<&Path>,
    write: impl FnOnce(&mut Box<dyn Write>) -> std::result::Result<(), E>,
) -> Result<()>
where
    E: Into<anyhow::Error>,
{
    let target = path.map_or_else(|| "<stdout>".to_string(), |p| p.display().to_string());
    let mut writer: Box<dyn Write> = match path {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(io::stdout().lock()),
    };
    write(&mut writer).map_err(|e| CliError::FileWriting {
        target: target.clone(),
        source: e.into(),
    })?;
    writer.flush()?;
    info!("Output written to {}", target);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn format_is_guessed_from_extension() {
        assert_eq!(
            resolve_format(Path::new("a/water.XYZ"), None).unwrap(),
            GeometryFormat::Xyz
        );
        assert_eq!(
            resolve_format(Path::new("1abc.pdb"), None).unwrap(),
            GeometryFormat::Pdb
        );
        assert_eq!(
            resolve_format(Path::new("geometry.txt"), Some(GeometryFormat::Xyz)).unwrap(),
            GeometryFormat::Xyz
        );
        assert!(matches!(
            resolve_format(Path::new("geometry"), None),
            Err(CliError::Argument(_))
        ));
    }

    #[test]
    fn read_geometry_reports_the_failing_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.xyz");
        fs::write(&path, "two\n\n").unwrap();
        match read_geometry(&path, None) {
            Err(CliError::FileParsing { path: p, .. }) => assert_eq!(p, path),
            other => panic!("expected a parsing error, got {other:?}"),
        }
    }

    #[test]
    fn write_output_creates_the_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.txt");
        write_output(Some(&path), |w| writeln!(w, "hello")).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "hello\n");
    }
}
