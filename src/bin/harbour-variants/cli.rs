//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Attribute-based variant selection for Harbour
#[derive(Parser)]
#[command(name = "harbour-variants")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Global config file (defaults to the user config directory)
    #[arg(long, global = true, env = "HARBOUR_VARIANTS_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Select artifacts for the manifest's request
    Select(SelectArgs),

    /// List every minimal transform chain for the request
    Chains(ChainsArgs),

    /// Print the transform registry as a Graphviz DOT graph
    Graph(GraphArgs),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Args)]
pub struct SelectArgs {
    /// Path to the selection manifest
    pub manifest: PathBuf,

    /// Override a requested attribute (name=value), repeatable
    #[arg(short, long = "request", value_name = "NAME=VALUE")]
    pub requests: Vec<String>,

    /// Return no artifacts instead of failing when nothing matches
    #[arg(long)]
    pub allow_empty: bool,

    /// Run the selected transforms (dry run) and list the artifacts
    #[arg(long)]
    pub realize: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Args)]
pub struct ChainsArgs {
    /// Path to the selection manifest
    pub manifest: PathBuf,

    /// Override a requested attribute (name=value), repeatable
    #[arg(short, long = "request", value_name = "NAME=VALUE")]
    pub requests: Vec<String>,
}

#[derive(Args)]
pub struct GraphArgs {
    /// Path to the selection manifest
    pub manifest: PathBuf,
}
