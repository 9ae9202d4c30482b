//! Draft command - start a new document, optionally from a supplier quote.

use std::path::PathBuf;

use chrono::{Duration, NaiveDate};
use clap::Args;
use console::style;
use tracing::info;

use tally_core::models::config::BillingConfig;
use tally_core::models::document::{CounterpartyRef, Document, DocumentKind};
use tally_core::money::Currency;

use super::extract::extract_file;
use super::{load_config, today, write_document};

/// Arguments for the draft command.
#[derive(Args)]
pub struct DraftArgs {
    /// Document kind (quotation, invoice, po)
    kind: DocumentKind,

    /// Client id (quotations, invoices) or supplier id (purchase orders)
    #[arg(long)]
    counterparty: String,

    /// Counterparty display name
    #[arg(long)]
    name: Option<String>,

    /// Document number, e.g. "INV-2024-031"
    #[arg(long)]
    number: Option<String>,

    /// Import every valid candidate line item from this PDF or text file
    #[arg(long)]
    from: Option<PathBuf>,

    /// Validity, payment or delivery date (YYYY-MM-DD)
    #[arg(long)]
    due_date: Option<NaiveDate>,

    /// Currency code (ZAR, USD, EUR, GBP)
    #[arg(long)]
    currency: Option<String>,

    /// Draft without tax
    #[arg(long)]
    no_tax: bool,

    /// Output document file
    #[arg(short, long)]
    output: PathBuf,
}

pub async fn run(args: DraftArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    if args.output.exists() {
        anyhow::bail!("Refusing to overwrite {}", args.output.display());
    }

    let counterparty = CounterpartyRef {
        kind: args.kind.counterparty_kind(),
        id: args.counterparty.clone(),
        name: args.name.clone(),
    };

    let mut document = Document::new(args.kind, counterparty)?
        .with_tax_applicable(!args.no_tax && config.billing.tax_applicable_by_default);

    if let Some(number) = &args.number {
        document = document.with_number(number.as_str());
    }
    if let Some(code) = &args.currency {
        let currency: Currency = code.parse()?;
        document = document.with_currency(currency.code());
    }
    if let Some(due) = args.due_date.or_else(|| default_due_date(args.kind, &config.billing)) {
        document = document.with_due_date(due);
    }

    if let Some(source) = &args.from {
        let extraction = extract_file(source, &config)?;
        let lines = extraction.confirm_valid();
        let skipped = extraction.candidate_items.len() - lines.len();
        if skipped > 0 {
            eprintln!(
                "{} Skipped {} candidate(s) that need manual entry",
                style("!").yellow(),
                skipped
            );
        }
        info!("Imported {} line items from {}", lines.len(), source.display());
        document.set_lines(lines)?;
    }

    write_document(&document, &args.output)?;

    println!(
        "{} Drafted {} {} with {} line item(s) at {}",
        style("✓").green(),
        document.kind(),
        document.display_number(),
        document.lines().len(),
        args.output.display()
    );

    Ok(())
}

fn default_due_date(kind: DocumentKind, billing: &BillingConfig) -> Option<NaiveDate> {
    let days = match kind {
        DocumentKind::Quotation => billing.quotation_validity_days,
        DocumentKind::Invoice => billing.invoice_terms_days,
        DocumentKind::PurchaseOrder => return None,
    };
    Some(today() + Duration::days(i64::from(days)))
}
