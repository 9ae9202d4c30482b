//! CLI for importing quote line items and managing document totals and status.

mod commands;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::{batch, config, convert, draft, extract, report, totals, transition};

/// Tally - quotations, invoices and purchase orders from the command line
#[derive(Parser)]
#[command(name = "tally")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract candidate line items from a supplier quote (PDF or text)
    Extract(extract::ExtractArgs),

    /// Extract line items from many files
    Batch(batch::BatchArgs),

    /// Draft a new quotation, invoice or purchase order
    Draft(draft::DraftArgs),

    /// Show subtotal, tax, total and profit estimate of a document
    Totals(totals::TotalsArgs),

    /// Move a document to a new status
    Transition(transition::TransitionArgs),

    /// Convert an accepted quotation into a draft invoice
    Convert(convert::ConvertArgs),

    /// Summarise amounts across a set of documents
    Report(report::ReportArgs),

    /// Manage configuration
    Config(config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Extract(args) => extract::run(args, config_path).await,
        Commands::Batch(args) => batch::run(args, config_path).await,
        Commands::Draft(args) => draft::run(args, config_path).await,
        Commands::Totals(args) => totals::run(args, config_path).await,
        Commands::Transition(args) => transition::run(args).await,
        Commands::Convert(args) => convert::run(args, config_path).await,
        Commands::Report(args) => report::run(args, config_path).await,
        Commands::Config(args) => config::run(args, config_path).await,
    }
}
