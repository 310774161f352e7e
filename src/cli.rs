//! CLI argument parsing with clap

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Photo Renamer - sort photos and videos into date folders
///
/// Renames every matched file to `YYYYMMDD_HHMMSS_<category>_<name>` based
/// on its creation time and moves it into a `YYYY-MM-DD` folder under the
/// input directory. A live-photo video adopts the timestamp of the still
/// image sharing its base name, so the pair stays together.
#[derive(Parser, Debug)]
#[command(name = "photo-renamer")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Rename and sort the files under the input directory
    Rename(RunArgs),

    /// Preview the rename decisions without touching the filesystem
    Preview(RunArgs),
}

/// Arguments shared by both subcommands
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Target directory containing the photos to rename
    /// (defaults to the current directory)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Category string identifying the instrument that took the photos
    /// (defaults to the name of the target directory)
    #[arg(short, long)]
    pub category: Option<String>,

    /// Verbose output; also pauses for Enter at the end of the run
    #[arg(short, long)]
    pub verbose: bool,
}
