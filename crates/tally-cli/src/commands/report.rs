//! Report command - dashboard figures across a set of documents.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::Args;
use console::style;
use glob::glob;
use tracing::warn;

use tally_core::money::FinancialSummary;

use super::{load_config, read_document, today};

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum ReportFormat {
    Json,
    Text,
}

/// Arguments for the report command.
#[derive(Args)]
pub struct ReportArgs {
    /// Document JSON files or glob pattern
    #[arg(required = true)]
    input: String,

    /// Evaluate overdue invoices as of this date (default: today)
    #[arg(long)]
    as_of: Option<NaiveDate>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: ReportFormat,
}

pub async fn run(args: ReportArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("json"))
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    let mut documents = Vec::with_capacity(files.len());
    for path in &files {
        match read_document(path) {
            Ok(document) => documents.push(document),
            Err(e) => warn!("Skipping {}: {}", path.display(), e),
        }
    }

    let as_of = args.as_of.unwrap_or_else(today);
    let summary = FinancialSummary::from_documents(&documents, &config.billing, as_of);

    match args.format {
        ReportFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
        ReportFormat::Text => {
            print!("{}", format_text(&summary, documents.len()));
            if documents.len() < files.len() {
                eprintln!(
                    "{} {} file(s) could not be read",
                    style("!").yellow(),
                    files.len() - documents.len()
                );
            }
        }
    }

    Ok(())
}

fn format_text(summary: &FinancialSummary, document_count: usize) -> String {
    let money = |amount| summary.currency.format(amount);
    let mut output = String::new();

    output.push_str(&format!(
        "{} documents as of {} ({})\n\n",
        document_count,
        summary.as_of,
        summary.currency.code()
    ));

    output.push_str("Invoices:\n");
    output.push_str(&format!("  Invoiced:     {}\n", money(summary.invoiced)));
    output.push_str(&format!("  Paid:         {}\n", money(summary.paid)));
    output.push_str(&format!("  Outstanding:  {}\n", money(summary.outstanding)));
    output.push_str(&format!(
        "  Overdue:      {} ({} invoice(s))\n",
        money(summary.overdue),
        summary.overdue_count
    ));
    if let Some(rate) = summary.collection_rate() {
        output.push_str(&format!("  Collected:    {}%\n", rate));
    }

    output.push_str("\nPipeline:\n");
    output.push_str(&format!("  Quoted:       {}\n", money(summary.quoted_pipeline)));
    output.push_str(&format!("  Purchases:    {}\n", money(summary.purchase_commitments)));
    output.push_str(&format!("  Profit (paid): {}\n", money(summary.realised_profit)));

    if summary.foreign_currency_documents > 0 {
        output.push_str(&format!(
            "\n{} document(s) in other currencies not included in amounts\n",
            summary.foreign_currency_documents
        ));
    }

    if !summary.status_counts.is_empty() {
        output.push_str("\nBy status:\n");
        for count in &summary.status_counts {
            output.push_str(&format!(
                "  {:<15} {:<10} {}\n",
                count.kind.as_str(),
                count.status.as_str(),
                count.count
            ));
        }
    }

    output
}
