//! Error types for the tally-core library.

use thiserror::Error;

use crate::models::document::{DocumentKind, DocumentStatus};

/// Main error type for the tally library.
#[derive(Error, Debug)]
pub enum TallyError {
    /// No readable text could be obtained from the source document.
    #[error("extraction failed: {0}")]
    ExtractionFailure(String),

    /// A currency code outside the supported set was requested.
    #[error("unsupported currency code: {0:?}")]
    InvalidCurrency(String),

    /// The requested status change is not allowed from the current status.
    #[error("invalid transition for {kind}: {from} -> {to}")]
    InvalidTransition {
        kind: DocumentKind,
        from: DocumentStatus,
        to: DocumentStatus,
    },

    /// Line items were edited on a document that has left Draft.
    #[error("document {id} is locked (status: {status})")]
    DocumentLocked { id: String, status: DocumentStatus },

    /// A line item failed boundary validation.
    #[error("invalid line item: {0}")]
    InvalidLineItem(String),

    /// A document record is inconsistent, e.g. a purchase order issued to a client.
    #[error("invalid document: {0}")]
    InvalidDocument(String),

    /// The caller's snapshot of a document is older than the document itself.
    #[error("stale write: expected version {expected}, document is at {actual}")]
    StaleVersion { expected: u64, actual: u64 },

    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl TallyError {
    /// Whether the failure was caused by the caller's request rather than the environment.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            TallyError::InvalidCurrency(_)
                | TallyError::InvalidTransition { .. }
                | TallyError::DocumentLocked { .. }
                | TallyError::InvalidLineItem(_)
                | TallyError::InvalidDocument(_)
                | TallyError::StaleVersion { .. }
        )
    }
}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract text from PDF.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// Invalid page number requested.
    #[error("invalid page number: {0}")]
    InvalidPage(u32),
}

/// Result type for the tally library.
pub type Result<T> = std::result::Result<T, TallyError>;
