//! Subcommands and the file handling they share.

pub mod batch;
pub mod config;
pub mod convert;
pub mod draft;
pub mod extract;
pub mod report;
pub mod totals;
pub mod transition;

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::{debug, warn};

use tally_core::models::config::TallyConfig;
use tally_core::models::document::Document;

/// Output format shared by the extraction commands.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Text => "txt",
        }
    }
}

pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tally")
        .join("config.json")
}

/// Config file named by `--config`, or the default location.
pub fn config_file(explicit: Option<&str>) -> PathBuf {
    explicit.map(PathBuf::from).unwrap_or_else(default_config_path)
}

/// Load configuration; a missing default file means defaults.
pub fn load_config(explicit: Option<&str>) -> anyhow::Result<TallyConfig> {
    if let Some(path) = explicit {
        return Ok(TallyConfig::from_file(Path::new(path))?);
    }

    let path = default_config_path();
    if path.exists() {
        debug!("Loading config from {}", path.display());
        Ok(TallyConfig::from_file(&path)?)
    } else {
        Ok(TallyConfig::default())
    }
}

/// Read a document JSON file, warning about inconsistencies.
pub fn read_document(path: &Path) -> anyhow::Result<Document> {
    if !path.exists() {
        anyhow::bail!("Document file not found: {}", path.display());
    }

    let content = fs::read_to_string(path)?;
    let document: Document = serde_json::from_str(&content)
        .map_err(|e| anyhow::anyhow!("{} is not a valid document: {}", path.display(), e))?;

    for issue in document.validate() {
        warn!("{}: {}", path.display(), issue);
    }

    Ok(document)
}

pub fn write_document(document: &Document, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_string_pretty(document)?)?;
    debug!("Wrote {} to {}", document.display_number(), path.display());
    Ok(())
}

pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}
