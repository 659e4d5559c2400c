//! `harbour-variants chains` command

use anyhow::Result;

use super::{GlobalOptions, Session};
use crate::cli::ChainsArgs;

pub fn execute(args: ChainsArgs, global: &GlobalOptions) -> Result<()> {
    let session = Session::load(&args.manifest, global)?;
    let manifest = &session.manifest;
    let request = manifest.request_with(&args.requests)?;

    let chains = session
        .selector()
        .transform_candidates(manifest.producer(), &request)?;

    if chains.is_empty() {
        println!("no transform chains produce {}", request);
        return Ok(());
    }

    println!(
        "{} chain(s) from `{}` produce {}:",
        chains.len(),
        manifest.producer().name(),
        request
    );
    for (i, chain) in chains.iter().enumerate() {
        println!("  {}. {}", i + 1, chain.describe());
    }
    Ok(())
}
