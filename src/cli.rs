use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::presets::DEFAULT_PRESET_FILE;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Remap accounting spreadsheet exports into the revenue reporting layout",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print the column headers derived from rows 7 and 8 of a workbook
    Headers(HeadersArgs),
    /// Show the remapped output in a formatted table
    Preview(PreviewArgs),
    /// Write the remapped output to an .xlsx (or .csv) file
    Convert(ConvertArgs),
    /// Manage named mapping presets
    Preset(PresetArgs),
}

#[derive(Debug, Args)]
pub struct HeadersArgs {
    /// Input workbook (.xlsx or .xls)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
}

/// Options shared by every command that runs the remap pipeline.
#[derive(Debug, Args)]
pub struct PipelineArgs {
    /// Input workbook (.xlsx or .xls)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Row filters such as `Doanh thu >= 1000` or `Diễn giải not contains TAA`
    #[arg(long = "filter", action = clap::ArgAction::Append)]
    pub filters: Vec<String>,
    /// Drop the `not contains TAA` filter added on import
    #[arg(long = "no-default-filter")]
    pub no_default_filter: bool,
    /// Use this saved preset instead of the built-in mapping
    #[arg(long)]
    pub preset: Option<String>,
    /// Preset store location
    #[arg(long = "presets", default_value = DEFAULT_PRESET_FILE)]
    pub presets: PathBuf,
}

#[derive(Debug, Args)]
pub struct PreviewArgs {
    #[command(flatten)]
    pub pipeline: PipelineArgs,
    /// Number of rows to display
    #[arg(long, default_value_t = 10)]
    pub rows: usize,
    /// Display every row
    #[arg(long, conflicts_with = "rows")]
    pub all: bool,
}

#[derive(Debug, Args)]
pub struct ConvertArgs {
    #[command(flatten)]
    pub pipeline: PipelineArgs,
    /// Output file; `.csv` or `-` writes CSV, anything else a workbook
    #[arg(short = 'o', long = "output")]
    pub output: PathBuf,
    /// Character encoding for CSV output (defaults to utf-8)
    #[arg(long = "output-encoding")]
    pub output_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct PresetArgs {
    /// Preset store location
    #[arg(long = "presets", default_value = DEFAULT_PRESET_FILE, global = true)]
    pub presets: PathBuf,
    #[command(subcommand)]
    pub action: PresetCommand,
}

#[derive(Debug, Subcommand)]
pub enum PresetCommand {
    /// List saved preset names
    List,
    /// Print the column mappings of a preset
    Show { name: String },
    /// Remove a preset
    Delete { name: String },
    /// Save the built-in mapping under a new name
    Init {
        name: String,
        /// Clear input columns that this workbook does not have
        #[arg(short = 'i', long = "input")]
        input: Option<PathBuf>,
    },
    /// Save a preset from a JSON array of column mapping records
    Import {
        name: String,
        #[arg(long = "file")]
        file: PathBuf,
    },
}
