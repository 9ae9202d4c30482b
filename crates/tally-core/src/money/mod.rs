//! Document totals, tax and currency display.
//!
//! Everything here is pure: no I/O and no global settings. Tax rate and
//! currency always arrive through a [`BillingConfig`].

mod currency;
pub mod report;

pub use currency::{
    display_currency, format_currency, format_currency_or_fallback, parse_currency, round_money,
    Currency, CurrencyFormat, SymbolPosition,
};
pub use report::{FinancialSummary, StatusCount};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::config::BillingConfig;
use crate::models::document::Document;
use crate::models::line_item::{LineItem, MAX_LINE_AMOUNT};

/// Totals derived from a document's lines and the billing configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentTotals {
    /// Sum of line totals before tax.
    pub subtotal: Decimal,
    /// Tax on the subtotal (zero when the document carries no tax).
    pub tax: Decimal,
    /// Subtotal plus tax.
    pub total: Decimal,
    /// Margin over lines with a known cost price.
    pub profit_estimate: Decimal,
}

impl DocumentTotals {
    /// Copy with every amount rounded for display.
    pub fn rounded(&self) -> Self {
        Self {
            subtotal: round_money(self.subtotal),
            tax: round_money(self.tax),
            total: round_money(self.total),
            profit_estimate: round_money(self.profit_estimate),
        }
    }
}

/// Sum of `quantity × unit_price` over all lines.
///
/// Each line is capped at [`MAX_LINE_AMOUNT`], so the sum cannot overflow.
pub fn compute_subtotal(lines: &[LineItem]) -> Decimal {
    lines.iter().map(LineItem::line_total).sum()
}

/// Tax due on a subtotal.
pub fn compute_tax(subtotal: Decimal, tax_rate: Decimal, tax_applicable: bool) -> Decimal {
    if tax_applicable {
        subtotal * tax_rate
    } else {
        Decimal::ZERO
    }
}

/// `subtotal × (1 + tax_rate)` when tax applies, otherwise the subtotal itself.
pub fn compute_total(subtotal: Decimal, tax_rate: Decimal, tax_applicable: bool) -> Decimal {
    if tax_applicable {
        subtotal * (Decimal::ONE + tax_rate)
    } else {
        subtotal
    }
}

/// Sum of `quantity × (unit_price − cost_price)`; lines without a cost add nothing.
pub fn compute_profit_estimate(lines: &[LineItem]) -> Decimal {
    lines.iter().filter_map(LineItem::margin).sum()
}

/// Subtotal, tax, total and profit estimate for a document.
pub fn compute_totals(document: &Document, billing: &BillingConfig) -> DocumentTotals {
    let lines = document.lines();
    let subtotal = compute_subtotal(lines);
    let tax_applicable = document.tax_applicable();

    DocumentTotals {
        subtotal,
        tax: compute_tax(subtotal, billing.tax_rate, tax_applicable),
        total: compute_total(subtotal, billing.tax_rate, tax_applicable),
        profit_estimate: compute_profit_estimate(lines),
    }
}
