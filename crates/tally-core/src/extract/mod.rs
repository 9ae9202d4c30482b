//! Line-item extraction from quote and invoice text.
//!
//! This is a best-effort aid for importing supplier quotes: every candidate
//! must be confirmed by a person before it becomes a [`LineItem`].

mod patterns;
mod scanner;

pub use scanner::{CandidateScanner, LineScanner, TripletScanner};

use std::time::Instant;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Result, TallyError};
use crate::models::config::ExtractionConfig;
use crate::models::line_item::LineItem;
use scanner::DescriptionRules;

/// Which pattern produced a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchSource {
    /// `<unit price><quantity><total>` run.
    Triplet,
    /// "description quantity price" line.
    LineWithTrailingPrice,
    /// "quantity description price" line.
    LineWithLeadingQuantity,
}

/// Which strategy produced the candidate list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    Triplet,
    LineFallback,
    NoMatch,
}

/// An unvalidated line-item-shaped record awaiting review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateItem {
    pub description: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    /// Total as printed (triplets) or computed (line scan).
    pub line_total: Decimal,
    pub source: MatchSource,
    /// Rough confidence (0.0 - 1.0).
    pub confidence: f32,
    /// Byte range of the matched text in the source.
    pub span: (usize, usize),
}

impl CandidateItem {
    /// Accept this candidate as a line item after review.
    pub fn confirm(&self) -> Result<LineItem> {
        LineItem::new(self.description.clone(), self.quantity, self.unit_price)
    }

    /// Whether the printed total agrees with quantity × unit price.
    pub fn is_consistent(&self) -> bool {
        Decimal::from(self.quantity).checked_mul(self.unit_price) == Some(self.line_total)
    }
}

/// Output of one extraction run. Not persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Text the candidates were taken from.
    pub raw_text: String,
    /// Candidates in document order.
    pub candidate_items: Vec<CandidateItem>,
    pub strategy: Strategy,
    /// Notes for the reviewer.
    pub warnings: Vec<String>,
    /// Processing time in milliseconds.
    pub processing_time_ms: u64,
}

impl ExtractionResult {
    pub fn is_empty(&self) -> bool {
        self.candidate_items.is_empty()
    }

    /// Confirm the candidates at `indices`, in the order given.
    pub fn confirm_selected(&self, indices: &[usize]) -> Result<Vec<LineItem>> {
        indices
            .iter()
            .map(|&i| {
                self.candidate_items
                    .get(i)
                    .ok_or_else(|| {
                        TallyError::InvalidLineItem(format!("no candidate at index {}", i))
                    })?
                    .confirm()
            })
            .collect()
    }

    /// Confirm every candidate, skipping those that fail validation.
    pub fn confirm_valid(&self) -> Vec<LineItem> {
        self.candidate_items
            .iter()
            .filter_map(|c| c.confirm().ok())
            .collect()
    }
}

/// Heuristic line-item extractor.
pub struct LineItemExtractor {
    line_fallback: bool,
    rules: DescriptionRules,
}

impl LineItemExtractor {
    /// Create an extractor with default settings.
    pub fn new() -> Self {
        Self::from_config(&ExtractionConfig::default())
    }

    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self {
            line_fallback: config.line_fallback,
            rules: DescriptionRules {
                strip_leading_index: config.strip_leading_index,
                max_len: config.max_description_len.max(1),
            },
        }
    }

    /// Enable or disable the line-by-line fallback.
    pub fn with_line_fallback(mut self, enabled: bool) -> Self {
        self.line_fallback = enabled;
        self
    }

    /// Set leading index stripping.
    pub fn with_index_stripping(mut self, enabled: bool) -> Self {
        self.rules.strip_leading_index = enabled;
        self
    }

    /// Candidates found in `text`; empty when nothing matches.
    pub fn extract_line_items(&self, text: &str) -> Vec<CandidateItem> {
        self.run(text).0
    }

    /// Extract candidates with strategy and reviewer notes.
    pub fn extract(&self, text: &str) -> ExtractionResult {
        let start = Instant::now();
        debug!("Extracting line items from {} characters of text", text.len());

        let (candidate_items, strategy) = self.run(text);

        let mut warnings = Vec::new();
        if strategy == Strategy::LineFallback {
            warnings.push(
                "No price/quantity/total columns found; items were read line by line".to_string(),
            );
        }
        if candidate_items.is_empty() {
            warnings.push("No line items recognised".to_string());
        }
        for (i, item) in candidate_items.iter().enumerate() {
            if item.description.is_empty() {
                warnings.push(format!("Item {} has no description", i + 1));
            }
            if !item.is_consistent() {
                warnings.push(format!(
                    "Item {} total {} does not equal {} x {}",
                    i + 1,
                    item.line_total,
                    item.quantity,
                    item.unit_price
                ));
            }
        }

        info!(
            "Extracted {} candidates via {:?} with {} warnings",
            candidate_items.len(),
            strategy,
            warnings.len()
        );

        ExtractionResult {
            raw_text: text.to_string(),
            candidate_items,
            strategy,
            warnings,
            processing_time_ms: start.elapsed().as_millis() as u64,
        }
    }

    /// Extract from page texts in order. Fails only when no page has text.
    pub fn extract_pages<S: AsRef<str>>(&self, pages: &[S]) -> Result<ExtractionResult> {
        let readable: Vec<&str> = pages
            .iter()
            .map(|p| p.as_ref())
            .filter(|p| !p.trim().is_empty())
            .collect();

        if readable.is_empty() {
            return Err(TallyError::ExtractionFailure(format!(
                "no readable text in {} page(s)",
                pages.len()
            )));
        }

        Ok(self.extract(&readable.join("\n")))
    }

    fn run(&self, text: &str) -> (Vec<CandidateItem>, Strategy) {
        let triplets = TripletScanner { rules: self.rules }.scan(text);
        // Columns were recognised even if every row was malformed
        if !triplets.is_empty() || TripletScanner::has_raw_match(text) {
            return (keep_plausible(triplets), Strategy::Triplet);
        }

        if self.line_fallback {
            let lines = LineScanner { rules: self.rules }.scan(text);
            if !lines.is_empty() {
                return (keep_plausible(lines), Strategy::LineFallback);
            }
        }

        (Vec::new(), Strategy::NoMatch)
    }
}

impl Default for LineItemExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Extract candidates with default settings.
pub fn extract_line_items(text: &str) -> Vec<CandidateItem> {
    LineItemExtractor::new().extract_line_items(text)
}

/// Drop zero quantities and all-zero rows (headers, section labels).
fn keep_plausible(candidates: Vec<CandidateItem>) -> Vec<CandidateItem> {
    candidates
        .into_iter()
        .filter(|c| c.quantity > 0)
        .filter(|c| !(c.unit_price.is_zero() && c.line_total.is_zero()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_single_triplet() {
        let items = extract_line_items("Widget X R100.00 2 R200.00");

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].description, "Widget X");
        assert_eq!(items[0].quantity, 2);
        assert_eq!(items[0].unit_price, Decimal::new(10000, 2));
        assert_eq!(items[0].line_total, Decimal::new(20000, 2));
        assert_eq!(items[0].source, MatchSource::Triplet);
    }

    #[test]
    fn test_no_matches_is_empty_not_error() {
        let extractor = LineItemExtractor::new();
        let result = extractor.extract("Thank you for your business.\nBanking details below.");

        assert!(result.is_empty());
        assert_eq!(result.strategy, Strategy::NoMatch);
        assert!(extract_line_items("").is_empty());
    }

    #[test]
    fn test_supplier_quote_layout() {
        let text = "QUOTATION Q-1042\nItem Description Price Qty Total\n\
                    01 Hikvision 4MP Dome R1,250.00 4 R5,000.00\n\
                    02 16CH NVR R3,899.99 1 R3,899.99\n\
                    03 Installation labour R450.00 6 R2,700.00\n\
                    Subtotal R11,599.99";
        let items = extract_line_items(text);

        assert_eq!(items.len(), 3);
        assert!(items[0].description.ends_with("Hikvision 4MP Dome"));
        assert_eq!(items[1].description, "16CH NVR");
        assert_eq!(items[1].unit_price, Decimal::new(389999, 2));
        assert_eq!(items[2].description, "Installation labour");
        assert_eq!(items[2].quantity, 6);
    }

    #[test]
    fn test_zero_rows_are_dropped() {
        let text = "Section header R0.00 1 R0.00 Cable R5.00 0 R0.00 Bracket R20.00 2 R40.00";
        let items = extract_line_items(text);

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].description, "Bracket");
    }

    #[test]
    fn test_fallback_only_without_triplets() {
        let text = "Keypad 2 R650.00\n1 Battery 12V 7Ah 310.00";
        let result = LineItemExtractor::new().extract(text);

        assert_eq!(result.strategy, Strategy::LineFallback);
        assert_eq!(result.candidate_items.len(), 2);
        assert_eq!(result.candidate_items[1].description, "Battery 12V 7Ah");
        assert_eq!(result.candidate_items[1].unit_price, Decimal::new(31000, 2));

        let disabled = LineItemExtractor::new().with_line_fallback(false).extract(text);
        assert_eq!(disabled.strategy, Strategy::NoMatch);
    }

    #[test]
    fn test_triplets_suppress_fallback() {
        let text = "Siren R200.00 1 R200.00\nKeypad 2 R650.00";
        let items = extract_line_items(text);

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].description, "Siren");
    }

    #[test]
    fn test_extract_pages() {
        let extractor = LineItemExtractor::new();
        let pages = vec!["".to_string(), "Beam R900.00 2 R1,800.00".to_string()];
        let result = extractor.extract_pages(&pages).unwrap();
        assert_eq!(result.candidate_items.len(), 1);

        let blank = vec!["  ".to_string(), "\n".to_string()];
        assert!(matches!(
            extractor.extract_pages(&blank),
            Err(TallyError::ExtractionFailure(_))
        ));
    }

    #[test]
    fn test_confirm_candidates() {
        let result = LineItemExtractor::new().extract("Relay R35.00 3 R105.00 R10.00 1 R10.00");
        assert_eq!(result.candidate_items.len(), 2);

        let confirmed = result.confirm_selected(&[0]).unwrap();
        assert_eq!(confirmed[0].line_total(), Decimal::new(10500, 2));

        // second candidate has no description and cannot be confirmed as-is
        assert!(result.confirm_selected(&[1]).is_err());
        assert!(result.confirm_selected(&[7]).is_err());
        assert_eq!(result.confirm_valid().len(), 1);
        assert!(result.warnings.iter().any(|w| w.contains("no description")));
    }

    #[test]
    fn test_overflowing_amounts_are_skipped() {
        let extractor = LineItemExtractor::new();

        let triplet = extractor.extract("Item R79228162514264337593543950.00 4000000000 R1.00");
        assert_eq!(triplet.strategy, Strategy::Triplet);
        assert!(triplet.is_empty());
        assert!(triplet.warnings.iter().any(|w| w.contains("No line items")));

        let line = extractor.extract_line_items("Item 4000000000 R79228162514264337593543950.00");
        assert!(line.is_empty());
    }

    #[test]
    fn test_overflowing_candidate_is_inconsistent() {
        let candidate = CandidateItem {
            description: "Item".to_string(),
            quantity: 4_000_000_000,
            unit_price: Decimal::MAX,
            line_total: Decimal::ONE,
            source: MatchSource::Triplet,
            confidence: 0.6,
            span: (0, 0),
        };
        assert!(!candidate.is_consistent());
        assert!(candidate.confirm().is_err());
    }

    #[test]
    fn test_index_stripping_can_be_disabled() {
        let items = LineItemExtractor::new()
            .with_index_stripping(false)
            .extract_line_items("07 Strobe R80.00 1 R80.00");
        assert_eq!(items[0].description, "07 Strobe");
    }
}
