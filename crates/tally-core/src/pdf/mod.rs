//! PDF text source for line-item extraction.

mod extractor;

pub use extractor::PdfExtractor;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{PdfError, TallyError};
use crate::models::config::PdfConfig;

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// Text read from a single PDF page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PdfPage {
    /// Page number (1-indexed).
    pub number: u32,
    pub text: String,
}

/// Trait for PDF processing implementations.
pub trait PdfProcessor {
    /// Load a PDF from bytes.
    fn load(&mut self, data: &[u8]) -> Result<()>;

    /// Get the number of pages in the PDF.
    fn page_count(&self) -> u32;

    /// Extract text from the entire PDF.
    fn extract_text(&self) -> Result<String>;

    /// Extract text from a specific page.
    fn extract_page_text(&self, page: u32) -> Result<String>;

    /// Readable pages in order.
    ///
    /// Pages that fail to decode or carry less than `min_text_length`
    /// characters are skipped. When no page qualifies the whole-document
    /// text is tried as a single page before giving up.
    fn extract_pages(&self, config: &PdfConfig) -> crate::error::Result<Vec<PdfPage>> {
        let total = self.page_count();
        if total == 0 {
            return Err(PdfError::NoPages.into());
        }
        let limit = match config.max_pages {
            0 => total,
            n => total.min(n as u32),
        };

        let mut pages = Vec::new();
        for number in 1..=limit {
            match self.extract_page_text(number) {
                Ok(text) if is_readable(&text, config) => pages.push(PdfPage { number, text }),
                Ok(_) => debug!("Page {} has too little text, skipping", number),
                Err(e) => warn!("Could not read page {}: {}", number, e),
            }
        }

        if pages.is_empty() {
            debug!("No page text found, trying whole-document extraction");
            match self.extract_text() {
                Ok(text) if is_readable(&text, config) => pages.push(PdfPage { number: 1, text }),
                Ok(_) => {}
                Err(e) => warn!("Whole-document extraction failed: {}", e),
            }
        }

        if pages.is_empty() {
            return Err(TallyError::ExtractionFailure(format!(
                "no readable text in {} page(s)",
                limit
            )));
        }

        debug!("Read {} of {} pages", pages.len(), limit);
        Ok(pages)
    }
}

fn is_readable(text: &str, config: &PdfConfig) -> bool {
    let trimmed = text.trim();
    !trimmed.is_empty() && trimmed.chars().count() >= config.min_text_length
}
