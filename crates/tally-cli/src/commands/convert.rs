//! Convert command - turn an accepted quotation into a draft invoice.

use std::path::{Path, PathBuf};

use chrono::{Duration, NaiveDate};
use clap::Args;
use console::style;

use tally_core::lifecycle::convert_to_invoice;

use super::{load_config, read_document, today, write_document};

/// Arguments for the convert command.
#[derive(Args)]
pub struct ConvertArgs {
    /// Accepted quotation JSON file (updated in place)
    quotation: PathBuf,

    /// Invoice due date (default: today plus the configured payment terms)
    #[arg(long)]
    due_date: Option<NaiveDate>,

    /// Invoice output file (default: <quotation>-invoice.json)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

pub async fn run(args: ConvertArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let mut quotation = read_document(&args.quotation)?;

    let due_date = args.due_date.unwrap_or_else(|| {
        today() + Duration::days(i64::from(config.billing.invoice_terms_days))
    });

    let invoice_path = args
        .output
        .clone()
        .unwrap_or_else(|| invoice_path_for(&args.quotation));
    if invoice_path.exists() {
        anyhow::bail!("Refusing to overwrite {}", invoice_path.display());
    }

    let invoice = convert_to_invoice(&mut quotation, Some(due_date))?;

    write_document(&invoice, &invoice_path)?;
    write_document(&quotation, &args.quotation)?;

    println!(
        "{} Converted {} into invoice {} due {} at {}",
        style("✓").green(),
        quotation.display_number(),
        invoice.display_number(),
        due_date,
        invoice_path.display()
    );

    Ok(())
}

fn invoice_path_for(quotation: &Path) -> PathBuf {
    let stem = quotation
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("quotation");
    quotation.with_file_name(format!("{}-invoice.json", stem))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invoice_path_sits_next_to_quotation() {
        assert_eq!(
            invoice_path_for(Path::new("jobs/q-12.json")),
            PathBuf::from("jobs/q-12-invoice.json")
        );
    }
}
