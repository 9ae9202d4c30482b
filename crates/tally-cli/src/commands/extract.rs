//! Extract command - candidate line items from a single supplier quote.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use tally_core::extract::{ExtractionResult, LineItemExtractor, MatchSource, Strategy};
use tally_core::models::config::TallyConfig;
use tally_core::money::Currency;
use tally_core::pdf::{PdfExtractor, PdfProcessor};

use super::{load_config, OutputFormat};

/// Arguments for the extract command.
#[derive(Args)]
pub struct ExtractArgs {
    /// Input file (PDF or plain text)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Disable the line-by-line fallback
    #[arg(long)]
    no_fallback: bool,
}

pub async fn run(args: ExtractArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let mut config = load_config(config_path)?;
    if args.no_fallback {
        config.extraction.line_fallback = false;
    }

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Extracting line items from {}", args.input.display());

    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {msg}")?
            .progress_chars("##-"),
    );
    pb.set_message("Reading document...");
    pb.set_position(20);

    let result = extract_file(&args.input, &config)?;

    pb.set_position(100);
    pb.finish_and_clear();

    let currency = config.billing.resolve_currency(None);
    let output = format_result(&result, args.format, currency)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    if !matches!(args.format, OutputFormat::Text) && !result.warnings.is_empty() {
        eprintln!("{}", style("Review notes:").yellow());
        for warning in &result.warnings {
            eprintln!("  - {}", warning);
        }
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

/// Read a PDF or text file and extract candidate line items from it.
pub fn extract_file(path: &Path, config: &TallyConfig) -> anyhow::Result<ExtractionResult> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    let extractor = LineItemExtractor::from_config(&config.extraction);

    let pages: Vec<String> = match extension.as_str() {
        "pdf" => {
            let data = fs::read(path)?;
            let pdf = PdfExtractor::from_bytes(&data)?;
            debug!("PDF has {} pages", pdf.page_count());
            pdf.extract_pages(&config.pdf)?
                .into_iter()
                .map(|page| page.text)
                .collect()
        }
        "txt" | "text" => vec![fs::read_to_string(path)?],
        _ => anyhow::bail!("Unsupported file format: {}", extension),
    };

    Ok(extractor.extract_pages(&pages)?)
}

pub fn source_label(source: MatchSource) -> &'static str {
    match source {
        MatchSource::Triplet => "triplet",
        MatchSource::LineWithTrailingPrice => "line_trailing_price",
        MatchSource::LineWithLeadingQuantity => "line_leading_quantity",
    }
}

pub fn strategy_label(strategy: Strategy) -> &'static str {
    match strategy {
        Strategy::Triplet => "triplet",
        Strategy::LineFallback => "line_fallback",
        Strategy::NoMatch => "no_match",
    }
}

pub fn format_result(
    result: &ExtractionResult,
    format: OutputFormat,
    currency: Currency,
) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(result)?),
        OutputFormat::Csv => format_csv(result),
        OutputFormat::Text => Ok(format_text(result, currency)),
    }
}

fn format_csv(result: &ExtractionResult) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "index",
        "description",
        "quantity",
        "unit_price",
        "line_total",
        "source",
        "confidence",
    ])?;

    for (i, item) in result.candidate_items.iter().enumerate() {
        wtr.write_record([
            &i.to_string(),
            &item.description,
            &item.quantity.to_string(),
            &item.unit_price.to_string(),
            &item.line_total.to_string(),
            source_label(item.source),
            &format!("{:.2}", item.confidence),
        ])?;
    }

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_text(result: &ExtractionResult, currency: Currency) -> String {
    let mut output = String::new();

    output.push_str(&format!("Strategy: {}\n", strategy_label(result.strategy)));
    output.push_str(&format!(
        "Candidates: {}\n",
        result.candidate_items.len()
    ));

    if !result.candidate_items.is_empty() {
        output.push('\n');
        for (i, item) in result.candidate_items.iter().enumerate() {
            output.push_str(&format!(
                "  [{}] {} x {} @ {} = {}\n",
                i,
                item.quantity,
                item.description,
                currency.format(item.unit_price),
                currency.format(item.line_total)
            ));
        }
    }

    if !result.warnings.is_empty() {
        output.push_str("\nReview notes:\n");
        for warning in &result.warnings {
            output.push_str(&format!("  - {}\n", warning));
        }
    }

    output
}
