//! Totals command - subtotal, tax, total and profit estimate of a document.

use std::path::PathBuf;

use clap::Args;
use rust_decimal::Decimal;
use serde::Serialize;

use tally_core::models::config::BillingConfig;
use tally_core::models::document::Document;
use tally_core::money::{compute_totals, display_currency, DocumentTotals};

use super::{load_config, read_document, today};

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum TotalsFormat {
    Json,
    Text,
}

/// Arguments for the totals command.
#[derive(Args)]
pub struct TotalsArgs {
    /// Document JSON file
    document: PathBuf,

    /// Display currency, overriding the document's
    #[arg(long)]
    currency: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: TotalsFormat,
}

#[derive(Serialize)]
struct TotalsReport {
    document: String,
    kind: String,
    status: String,
    currency: String,
    tax_rate: Decimal,
    #[serde(flatten)]
    totals: DocumentTotals,
    formatted: FormattedTotals,
}

#[derive(Serialize)]
struct FormattedTotals {
    subtotal: String,
    tax: String,
    total: String,
    profit_estimate: String,
}

pub async fn run(args: TotalsArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let document = read_document(&args.document)?;

    let code = args
        .currency
        .as_deref()
        .or(document.currency())
        .unwrap_or(config.billing.currency.as_str())
        .to_uppercase();

    let report = build_report(&document, &config.billing, &code);

    match args.format {
        TotalsFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        TotalsFormat::Text => print!("{}", format_text(&report)),
    }

    Ok(())
}

fn build_report(document: &Document, billing: &BillingConfig, code: &str) -> TotalsReport {
    let totals = compute_totals(document, billing).rounded();
    let currency = display_currency(code, billing);
    let fmt = |amount| currency.format(amount);

    TotalsReport {
        document: document.display_number(),
        kind: document.kind().to_string(),
        status: document.effective_status(today()).to_string(),
        currency: currency.code().to_string(),
        tax_rate: if document.tax_applicable() {
            billing.tax_rate
        } else {
            Decimal::ZERO
        },
        totals,
        formatted: FormattedTotals {
            subtotal: fmt(totals.subtotal),
            tax: fmt(totals.tax),
            total: fmt(totals.total),
            profit_estimate: fmt(totals.profit_estimate),
        },
    }
}

fn format_text(report: &TotalsReport) -> String {
    let tax_label = format!(
        "Tax ({}%):",
        (report.tax_rate * Decimal::ONE_HUNDRED).normalize()
    );
    let rows = [
        ("Subtotal:", &report.formatted.subtotal),
        (tax_label.as_str(), &report.formatted.tax),
        ("Total:", &report.formatted.total),
        ("Est. profit:", &report.formatted.profit_estimate),
    ];

    let mut output = format!("{} ({}, {})\n", report.document, report.kind, report.status);
    for (label, value) in rows {
        output.push_str(&format!("  {:<15}{}\n", label, value));
    }
    output
}
