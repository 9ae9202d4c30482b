//! Candidate scanners: the price/quantity/total triplet scan and the line scan.

use std::str::FromStr;

use rust_decimal::Decimal;
use tracing::trace;

use super::patterns::{
    LEADING_INDEX, LINE_LEADING_QUANTITY, LINE_TRAILING_PRICE, PRICE_QTY_TOTAL, SUMMARY_LABEL,
    WHITESPACE_RUN,
};
use super::{CandidateItem, MatchSource};

/// Finds raw line-item candidates in text.
pub trait CandidateScanner {
    /// Every candidate in document order, before filtering.
    fn scan(&self, text: &str) -> Vec<CandidateItem>;
}

/// Description cleanup shared by both scanners.
#[derive(Debug, Clone, Copy)]
pub(crate) struct DescriptionRules {
    pub strip_leading_index: bool,
    pub max_len: usize,
}

impl DescriptionRules {
    pub(crate) fn clean(&self, raw: &str) -> String {
        let collapsed = WHITESPACE_RUN.replace_all(raw.trim(), " ");
        let stripped = if self.strip_leading_index {
            LEADING_INDEX.replace(&collapsed, "").into_owned()
        } else {
            collapsed.into_owned()
        };
        stripped.chars().take(self.max_len).collect::<String>().trim().to_string()
    }
}

/// Scans for `<unit price><quantity><total>` runs anywhere in the text.
///
/// The description of each match is the text since the end of the previous one.
pub struct TripletScanner {
    pub(crate) rules: DescriptionRules,
}

impl TripletScanner {
    /// Whether `text` contains any triplet-shaped run, parsable or not.
    pub(crate) fn has_raw_match(text: &str) -> bool {
        PRICE_QTY_TOTAL.is_match(text)
    }
}

impl CandidateScanner for TripletScanner {
    fn scan(&self, text: &str) -> Vec<CandidateItem> {
        let mut results = Vec::new();
        let mut previous_end = 0;

        for caps in PRICE_QTY_TOTAL.captures_iter(text) {
            let Some(full_match) = caps.get(0) else {
                continue;
            };
            let description = self.rules.clean(&text[previous_end..full_match.start()]);
            previous_end = full_match.end();

            let (Some(unit_price), Some(quantity), Some(line_total)) = (
                parse_amount(&caps[1], &caps[2]),
                caps[3].parse::<u32>().ok(),
                parse_amount(&caps[4], &caps[5]),
            ) else {
                trace!("Skipping malformed triplet {:?}", full_match.as_str());
                continue;
            };

            let Some(computed) = Decimal::from(quantity).checked_mul(unit_price) else {
                trace!("Skipping triplet with overflowing total {:?}", full_match.as_str());
                continue;
            };
            let consistent = computed == line_total;
            results.push(CandidateItem {
                description,
                quantity,
                unit_price,
                line_total,
                source: MatchSource::Triplet,
                confidence: if consistent { 0.9 } else { 0.6 },
                span: (full_match.start(), full_match.end()),
            });
        }

        results
    }
}

/// Scans line by line for "description qty price" or "qty description price".
///
/// The trailing price is read as the unit price.
pub struct LineScanner {
    pub(crate) rules: DescriptionRules,
}

impl LineScanner {
    fn scan_line(&self, line: &str, offset: usize) -> Option<CandidateItem> {
        let (description, quantity, price, source) =
            if let Some(caps) = LINE_TRAILING_PRICE.captures(line) {
                (
                    self.rules.clean(&caps[1]),
                    caps[2].parse::<u32>().ok(),
                    parse_amount(&caps[3], &caps[4]),
                    MatchSource::LineWithTrailingPrice,
                )
            } else if let Some(caps) = LINE_LEADING_QUANTITY.captures(line) {
                (
                    DescriptionRules {
                        strip_leading_index: false,
                        ..self.rules
                    }
                    .clean(&caps[2]),
                    caps[1].parse::<u32>().ok(),
                    parse_amount(&caps[3], &caps[4]),
                    MatchSource::LineWithLeadingQuantity,
                )
            } else {
                return None;
            };

        if SUMMARY_LABEL.is_match(&description) {
            trace!("Skipping summary row {:?}", line);
            return None;
        }

        let (quantity, unit_price) = (quantity?, price?);
        let Some(line_total) = Decimal::from(quantity).checked_mul(unit_price) else {
            trace!("Skipping line with overflowing total {:?}", line);
            return None;
        };
        Some(CandidateItem {
            description,
            quantity,
            unit_price,
            line_total,
            source,
            confidence: 0.5,
            span: (offset, offset + line.len()),
        })
    }
}

impl CandidateScanner for LineScanner {
    fn scan(&self, text: &str) -> Vec<CandidateItem> {
        let mut results = Vec::new();
        let mut offset = 0;

        for raw_line in text.split_inclusive('\n') {
            let line = raw_line.trim_end_matches(['\r', '\n']);
            if let Some(candidate) = self.scan_line(line, offset) {
                results.push(candidate);
            }
            offset += raw_line.len();
        }

        results
    }
}

/// Build a decimal from an integer part with comma grouping and two fraction digits.
fn parse_amount(integer_part: &str, fraction: &str) -> Option<Decimal> {
    let integer_part = integer_part.replace(',', "");
    Decimal::from_str(&format!("{}.{}", integer_part, fraction)).ok()
}
