//! Regex patterns for line-item extraction.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // <unit price><quantity><total>, e.g. "R1,250.00 2 R2,500.00" or "R1,250.002R2,500.00".
    // The quantity must be followed by whitespace or a currency symbol.
    pub static ref PRICE_QTY_TOTAL: Regex = Regex::new(
        r"(?:R|\$|€|£)?\s*(\d{1,3}(?:,\d{3})+|\d+)\.(\d{2})\s*(\d+)(?:\s+|\s*(?:R|\$|€|£)\s*)(\d{1,3}(?:,\d{3})+|\d+)\.(\d{2})"
    ).unwrap();

    // "Description 2 R100.00" - quantity then price at the end of the line.
    pub static ref LINE_TRAILING_PRICE: Regex = Regex::new(
        r"^(.*?\S)\s+(\d+)\s+(?:R|\$|€|£)?\s*(\d{1,3}(?:,\d{3})+|\d+)\.(\d{2})\s*$"
    ).unwrap();

    // "2 Description R100.00" - quantity at the start of the line.
    pub static ref LINE_LEADING_QUANTITY: Regex = Regex::new(
        r"^(\d+)\s+(.*?\S)\s+(?:R|\$|€|£)?\s*(\d{1,3}(?:,\d{3})+|\d+)\.(\d{2})\s*$"
    ).unwrap();

    // Row index in front of a description ("01 ", "3 ").
    pub static ref LEADING_INDEX: Regex = Regex::new(
        r"^\d+\s+"
    ).unwrap();

    pub static ref WHITESPACE_RUN: Regex = Regex::new(
        r"\s+"
    ).unwrap();

    // Summary rows that look like items in the line scan.
    pub static ref SUMMARY_LABEL: Regex = Regex::new(
        r"(?i)^(?:sub\s*-?\s*total|total|grand\s+total|vat|tax|balance|amount\s+due|discount|deposit)\b"
    ).unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_triplet_pattern() {
        let caps = PRICE_QTY_TOTAL.captures("Widget X R100.00 2 R200.00").unwrap();
        assert_eq!(&caps[1], "100");
        assert_eq!(&caps[3], "2");
        assert_eq!(&caps[4], "200");

        let caps = PRICE_QTY_TOTAL.captures("R1,250.50 10R12,505.00").unwrap();
        assert_eq!(&caps[1], "1,250");
        assert_eq!(&caps[2], "50");
        assert_eq!(&caps[3], "10");
        assert_eq!(&caps[4], "12,505");

        assert!(!PRICE_QTY_TOTAL.is_match("R100.0 2 R200.00"));
    }

    #[test]
    fn test_line_patterns() {
        let caps = LINE_TRAILING_PRICE.captures("Door contact 4 R85.00").unwrap();
        assert_eq!(&caps[1], "Door contact");
        assert_eq!(&caps[2], "4");

        let caps = LINE_LEADING_QUANTITY.captures("3 PIR detector 420.00").unwrap();
        assert_eq!(&caps[1], "3");
        assert_eq!(&caps[2], "PIR detector");

        assert!(!LINE_TRAILING_PRICE.is_match("3 PIR detector 420.00"));
    }

    #[test]
    fn test_summary_label() {
        assert!(SUMMARY_LABEL.is_match("Sub-total"));
        assert!(SUMMARY_LABEL.is_match("VAT"));
        assert!(!SUMMARY_LABEL.is_match("Value pack"));
    }
}
