use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "Pierre Beaujean",
    version,
    about = "just-psf - Infer bonds, angles and dihedrals from a molecular geometry and write them as a CHARMM PSF or RTF file.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output and progress display
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Path to a configuration file in TOML format.
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Set the number of threads used for bond inference.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a protein structure file (PSF) from a geometry.
    Psf(PsfArgs),
    /// Generate a residue topology file (RTF) with one residue per molecule type.
    Rtf(RtfArgs),
    /// Decode a PSF file and print a summary of its contents.
    Check(CheckArgs),
}

/// Supported geometry file formats.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryFormat {
    Xyz,
    Pdb,
}

/// Options shared by every command that analyses a geometry.
#[derive(Args, Debug, Clone, Default)]
pub struct GeometryArgs {
    /// Path to the input geometry (XYZ or PDB).
    #[arg(required = true, value_name = "INPUT")]
    pub input: PathBuf,

    /// Output path. Writes to standard output when omitted.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Input format. Guessed from the file extension when omitted.
    #[arg(long, value_enum, value_name = "FORMAT")]
    pub format: Option<GeometryFormat>,

    /// Override the bond threshold (bonded if d < threshold * (r1 + r2)).
    #[arg(short = 't', long, value_name = "FLOAT")]
    pub threshold: Option<f64>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S analysis.bond-threshold=1.2
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Arguments for the `psf` subcommand.
#[derive(Args, Debug, Clone)]
pub struct PsfArgs {
    #[command(flatten)]
    pub geometry: GeometryArgs,

    /// Header flags selecting the atom record layout (e.g., EXT,XPLOR).
    #[arg(long, value_delimiter = ',', value_name = "FLAGS")]
    pub flags: Option<Vec<String>>,

    /// Override the segment name given to every atom.
    #[arg(short, long, value_name = "NAME")]
    pub segment: Option<String>,
}

/// Arguments for the `rtf` subcommand.
#[derive(Args, Debug, Clone)]
pub struct RtfArgs {
    #[command(flatten)]
    pub geometry: GeometryArgs,

    /// Override the prefix of generated residue names.
    #[arg(short, long, value_name = "PREFIX")]
    pub prefix: Option<String>,
}

/// Arguments for the `check` subcommand.
#[derive(Args, Debug, Clone)]
pub struct CheckArgs {
    /// Path to the PSF file to decode.
    #[arg(required = true, value_name = "PSF")]
    pub input: PathBuf,
}
