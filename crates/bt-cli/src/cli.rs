//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::commands::{analyze, batch, convert, template, validate};

/// Vehicle-log tagging utility.
///
/// Derives tag documents from decoded recording event streams, validates
/// hand-edited tag specifications, and aggregates movement durations across
/// many recordings.
#[derive(Debug, Parser)]
#[command(name = "bt", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print or write an empty tag template.
    Template(template::TemplateArgs),

    /// Tag a single recording's event log.
    Convert(convert::ConvertArgs),

    /// Tag every recording under a directory.
    Batch(batch::BatchArgs),

    /// Validate edited tag-specification files.
    Validate(validate::ValidateArgs),

    /// Aggregate movement durations across tag documents.
    Analyze(analyze::AnalyzeArgs),
}
