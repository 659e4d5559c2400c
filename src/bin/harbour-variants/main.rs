//! harbour-variants CLI - inspect variant selection for a manifest

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("harbour_variants=debug")
    } else {
        EnvFilter::new("harbour_variants=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let global = commands::GlobalOptions {
        color: !cli.no_color,
        config: cli.config,
    };

    match cli.command {
        Commands::Select(args) => commands::select::execute(args, &global),
        Commands::Chains(args) => commands::chains::execute(args, &global),
        Commands::Graph(args) => commands::graph::execute(args, &global),
    }
}
