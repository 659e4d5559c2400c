//! `harbour-variants graph` command

use anyhow::Result;

use super::{GlobalOptions, Session};
use crate::cli::GraphArgs;
use harbour_variants::transform::TransformGraph;

pub fn execute(args: GraphArgs, global: &GlobalOptions) -> Result<()> {
    let session = Session::load(&args.manifest, global)?;
    let manifest = &session.manifest;

    let graph = TransformGraph::new(manifest.registry(), manifest.producer().variants());
    tracing::debug!(
        "Transform graph has {} node(s) and {} edge(s)",
        graph.node_count(),
        graph.edge_count()
    );

    print!("{}", graph.to_dot());
    Ok(())
}
