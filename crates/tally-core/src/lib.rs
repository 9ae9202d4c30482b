//! Core library for small-business quotations, invoices and purchase orders.
//!
//! This crate provides:
//! - Document and line item models with edit locking
//! - The per-kind status lifecycle, including quotation to invoice conversion
//! - Totals, tax, profit estimates and currency formatting on exact decimals
//! - Line-item extraction from supplier quote text and PDFs

pub mod error;
pub mod extract;
pub mod lifecycle;
pub mod models;
pub mod money;
pub mod pdf;

pub use error::{PdfError, Result, TallyError};
pub use extract::{
    extract_line_items, CandidateItem, ExtractionResult, LineItemExtractor, MatchSource, Strategy,
};
pub use lifecycle::{allowed_transitions, can_transition, convert_to_invoice, StatusChange};
pub use models::config::{BillingConfig, ExtractionConfig, PdfConfig, TallyConfig};
pub use models::document::{
    CounterpartyKind, CounterpartyRef, Document, DocumentId, DocumentKind, DocumentStatus,
};
pub use models::line_item::{LineItem, MAX_LINE_AMOUNT};
pub use money::{
    compute_profit_estimate, compute_subtotal, compute_total, compute_totals, display_currency,
    format_currency, format_currency_or_fallback, parse_currency, Currency, DocumentTotals,
    FinancialSummary,
};
pub use pdf::{PdfExtractor, PdfPage, PdfProcessor};
