//! Transition command - move a document to a new status.

use std::path::PathBuf;

use clap::Args;
use console::style;

use tally_core::models::document::DocumentStatus;

use super::{read_document, write_document};

/// Arguments for the transition command.
#[derive(Args)]
pub struct TransitionArgs {
    /// Document JSON file
    document: PathBuf,

    /// Target status (sent, accepted, rejected, paid, delivered, cancelled)
    status: DocumentStatus,

    /// Output file (default: update the document in place)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Fail unless the document is still at this version
    #[arg(long)]
    expect_version: Option<u64>,
}

pub async fn run(args: TransitionArgs) -> anyhow::Result<()> {
    let mut document = read_document(&args.document)?;

    if let Some(expected) = args.expect_version {
        document.ensure_version(expected)?;
    }

    let change = document.transition(args.status).map_err(|e| {
        let next = document.next_statuses();
        if next.is_empty() {
            anyhow::anyhow!("{}; {} is closed", e, document.display_number())
        } else {
            let names: Vec<&str> = next.iter().map(|s| s.as_str()).collect();
            anyhow::anyhow!("{}; allowed: {}", e, names.join(", "))
        }
    })?;

    let output = args.output.as_ref().unwrap_or(&args.document);
    write_document(&document, output)?;

    println!(
        "{} {} {}: {} -> {} (version {})",
        style("✓").green(),
        document.kind(),
        document.display_number(),
        change.from,
        change.to,
        change.version
    );

    Ok(())
}
