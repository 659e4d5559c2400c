//! `harbour-variants select` command

use anyhow::Result;
use serde::Serialize;

use super::{GlobalOptions, Session};
use crate::cli::{OutputFormat, SelectArgs};
use harbour_variants::select::Candidate;
use harbour_variants::util::diagnostic::emit;
use harbour_variants::{Artifact, AttributeSet, ResolvedArtifactSet};

/// JSON form of a selection outcome.
#[derive(Serialize)]
struct SelectionReport<'a> {
    producer: &'a str,
    request: &'a AttributeSet,
    result: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    variant: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    transforms: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    attributes: Option<&'a AttributeSet>,
    #[serde(skip_serializing_if = "Option::is_none")]
    artifacts: Option<Vec<Artifact>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    failure: Option<FailureReport<'a>>,
}

#[derive(Serialize)]
struct FailureReport<'a> {
    kind: &'static str,
    message: String,
    candidates: &'a [Candidate],
}

pub fn execute(args: SelectArgs, global: &GlobalOptions) -> Result<()> {
    let session = Session::load(&args.manifest, global)?;
    let manifest = &session.manifest;
    let producer = manifest.producer();
    let request = manifest.request_with(&args.requests)?;
    let allow_empty = args.allow_empty || session.config.allow_no_matching_variants();

    let result = session.selector().select(producer, &request, allow_empty);

    let artifacts = if args.realize && !result.is_broken() {
        Some(result.realize()?)
    } else {
        None
    };

    match args.format {
        OutputFormat::Text => print_text(&result, artifacts.as_deref()),
        OutputFormat::Json => {
            let report = report(producer.name().as_str(), &request, &result, artifacts);
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    if let Some(failure) = result.failure() {
        emit(&failure.to_diagnostic(), global.color);
        std::process::exit(1);
    }
    Ok(())
}

fn print_text(result: &ResolvedArtifactSet, artifacts: Option<&[Artifact]>) {
    match result {
        ResolvedArtifactSet::Direct(variant) => {
            println!("selected variant {}", variant.describe());
        }
        ResolvedArtifactSet::Transformed(set) => {
            println!("selected transform chain {}", set.variant().describe());
        }
        ResolvedArtifactSet::Empty => println!("no matching variant (allowed)"),
        ResolvedArtifactSet::Broken(_) => return,
    }

    if let Some(artifacts) = artifacts {
        println!("artifacts:");
        for artifact in artifacts {
            println!("  {}", artifact);
        }
    }
}

fn report<'a>(
    producer: &'a str,
    request: &'a AttributeSet,
    result: &'a ResolvedArtifactSet,
    artifacts: Option<Vec<Artifact>>,
) -> SelectionReport<'a> {
    let (variant, transforms) = match result {
        ResolvedArtifactSet::Direct(variant) => (Some(variant.id().to_string()), Vec::new()),
        ResolvedArtifactSet::Transformed(set) => (
            Some(set.variant().root().id().to_string()),
            set.variant()
                .steps()
                .iter()
                .map(|step| step.definition().to_string())
                .collect(),
        ),
        ResolvedArtifactSet::Empty | ResolvedArtifactSet::Broken(_) => (None, Vec::new()),
    };

    SelectionReport {
        producer,
        request,
        result: result.kind(),
        variant,
        transforms,
        attributes: result.attributes(),
        artifacts,
        failure: result.failure().map(|failure| FailureReport {
            kind: failure.kind(),
            message: failure.to_string(),
            candidates: failure.candidates(),
        }),
    }
}
