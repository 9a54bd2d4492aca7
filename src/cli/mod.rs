//! Command-line interface for iconpress.

use clap::{Parser, Subcommand};

pub mod build;
pub mod completions;
pub mod init;
pub mod list;
pub mod normalize;
pub mod validate;

/// iconpress - Icon sheet compositor
#[derive(Parser, Debug)]
#[command(name = "iconpress")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Suppress status output
    #[arg(long, short, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compose sheets from discovered assets
    Build(build::BuildArgs),

    /// List discovered assets per group
    List(list::ListArgs),

    /// Rename files to the canonical naming convention
    Normalize(normalize::NormalizeArgs),

    /// Check the manifest and scan without composing
    Validate(validate::ValidateArgs),

    /// Initialize a project (generates sheets.yaml)
    Init(init::InitArgs),

    /// Generate shell completions
    Completions(completions::CompletionsArgs),
}
