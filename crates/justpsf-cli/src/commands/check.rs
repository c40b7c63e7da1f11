use crate::cli::CheckArgs;
use crate::error::{CliError, Result};
use justpsf::core::io::psf::{PsfFile, PsfMetadata};
use justpsf::core::io::traits::MolecularFile;
use justpsf::core::models::structure::{ConnectivitySection, Structure};
use std::collections::BTreeSet;
use tracing::info;

pub fn run(args: CheckArgs) -> Result<()> {
    info!("Decoding {:?}", &args.input);
    let (structure, metadata) =
        PsfFile::read_from_path(&args.input).map_err(|e| CliError::FileParsing {
            path: args.input.clone(),
            source: e.into(),
        })?;

    println!("✓ {} decoded successfully.", args.input.display());
    for (key, value) in summarize(&structure, &metadata) {
        println!("  {key:<16} {value}");
    }
    Ok(())
}

/// Label/value rows describing a decoded PSF.
pub fn summarize(structure: &Structure, metadata: &PsfMetadata) -> Vec<(String, String)> {
    let mut rows = vec![
        ("header".to_string(), metadata.flags.to_string()),
        ("title lines".to_string(), metadata.title.len().to_string()),
        ("atoms".to_string(), structure.len().to_string()),
    ];

    let residues: BTreeSet<(&str, i64)> = structure
        .atoms()
        .iter()
        .map(|a| (a.segment_name.as_str(), a.residue_id))
        .collect();
    let segments: BTreeSet<&str> = residues.iter().map(|&(segment, _)| segment).collect();
    rows.push(("residues".to_string(), residues.len().to_string()));
    rows.push((
        "segments".to_string(),
        segments.into_iter().collect::<Vec<_>>().join(", "),
    ));

    for section in ConnectivitySection::ALL {
        rows.push((section.to_string(), structure.group_count(section).to_string()));
    }

    let charge: f64 = structure.atoms().iter().map(|a| a.charge).sum();
    let mass: f64 = structure.atoms().iter().map(|a| a.mass).sum();
    rows.push(("total charge".to_string(), format!("{charge:.6}")));
    rows.push(("total mass".to_string(), format!("{mass:.4}")));

    if !metadata.extra_sections.is_empty() {
        let tags: Vec<&str> = metadata
            .extra_sections
            .iter()
            .map(|s| section_tag(&s.header))
            .collect();
        rows.push(("skipped sections".to_string(), tags.join(", ")));
    }
    rows
}

fn section_tag(header: &str) -> &str {
    header
        .split_once('!')
        .map(|(_, rest)| rest.split([':', ' ']).next().unwrap_or(rest))
        .unwrap_or(header)
        .trim()
}
