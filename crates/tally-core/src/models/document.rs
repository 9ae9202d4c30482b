//! Quotation, invoice and purchase-order records.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use super::line_item::LineItem;
use crate::error::{Result, TallyError};

/// Unique identifier of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(Uuid);

impl DocumentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// First block of the UUID, used for human-facing references.
    pub fn short(&self) -> String {
        self.0.simple().to_string()[..8].to_uppercase()
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for DocumentId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

/// Type of business document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Quotation,
    Invoice,
    PurchaseOrder,
}

impl DocumentKind {
    /// The kind of counterparty this document is issued to or received from.
    pub fn counterparty_kind(&self) -> CounterpartyKind {
        match self {
            DocumentKind::Quotation | DocumentKind::Invoice => CounterpartyKind::Client,
            DocumentKind::PurchaseOrder => CounterpartyKind::Supplier,
        }
    }

    /// Prefix used when a document has no assigned number.
    pub fn number_prefix(&self) -> &'static str {
        match self {
            DocumentKind::Quotation => "QUO",
            DocumentKind::Invoice => "INV",
            DocumentKind::PurchaseOrder => "PO",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Quotation => "quotation",
            DocumentKind::Invoice => "invoice",
            DocumentKind::PurchaseOrder => "purchase_order",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "quotation" | "quote" => Ok(DocumentKind::Quotation),
            "invoice" => Ok(DocumentKind::Invoice),
            "purchase_order" | "po" => Ok(DocumentKind::PurchaseOrder),
            other => Err(format!("unknown document kind: {}", other)),
        }
    }
}

/// Lifecycle status of a document.
///
/// `Overdue` is derived at read time for sent invoices past their due date;
/// it is never stored by a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Draft,
    Sent,
    #[serde(alias = "approved")]
    Accepted,
    Rejected,
    Converted,
    Paid,
    Overdue,
    Delivered,
    Cancelled,
}

impl DocumentStatus {
    /// Terminal statuses permit no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            DocumentStatus::Paid
                | DocumentStatus::Cancelled
                | DocumentStatus::Converted
                | DocumentStatus::Rejected
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentStatus::Draft => "draft",
            DocumentStatus::Sent => "sent",
            DocumentStatus::Accepted => "accepted",
            DocumentStatus::Rejected => "rejected",
            DocumentStatus::Converted => "converted",
            DocumentStatus::Paid => "paid",
            DocumentStatus::Overdue => "overdue",
            DocumentStatus::Delivered => "delivered",
            DocumentStatus::Cancelled => "cancelled",
        }
    }

    pub const ALL: [DocumentStatus; 9] = [
        DocumentStatus::Draft,
        DocumentStatus::Sent,
        DocumentStatus::Accepted,
        DocumentStatus::Rejected,
        DocumentStatus::Converted,
        DocumentStatus::Paid,
        DocumentStatus::Overdue,
        DocumentStatus::Delivered,
        DocumentStatus::Cancelled,
    ];
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        match s.as_str() {
            "approved" => Ok(DocumentStatus::Accepted),
            "canceled" => Ok(DocumentStatus::Cancelled),
            _ => DocumentStatus::ALL
                .into_iter()
                .find(|status| status.as_str() == s)
                .ok_or_else(|| format!("unknown document status: {}", s)),
        }
    }
}

/// Whether a counterparty is a client or a supplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CounterpartyKind {
    Client,
    Supplier,
}

/// Reference to the client or supplier a document belongs to.
///
/// The counterparty record itself lives elsewhere and outlives the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterpartyRef {
    pub kind: CounterpartyKind,
    pub id: String,
    /// Display name captured when the document was drafted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl CounterpartyRef {
    pub fn client(id: impl Into<String>) -> Self {
        Self {
            kind: CounterpartyKind::Client,
            id: id.into(),
            name: None,
        }
    }

    pub fn supplier(id: impl Into<String>) -> Self {
        Self {
            kind: CounterpartyKind::Supplier,
            id: id.into(),
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// A quotation, invoice or purchase order with its owned line items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub(crate) id: DocumentId,
    pub(crate) kind: DocumentKind,
    /// Business-facing document number, e.g. "INV-2024-031".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    pub(crate) counterparty: CounterpartyRef,
    pub(crate) status: DocumentStatus,
    pub(crate) created_at: DateTime<Utc>,
    /// Validity date for quotations, payment due date for invoices,
    /// expected delivery for purchase orders.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) due_date: Option<NaiveDate>,
    #[serde(default)]
    pub(crate) lines: Vec<LineItem>,
    #[serde(default = "default_tax_applicable")]
    pub(crate) tax_applicable: bool,
    /// Currency code for display; falls back to the configured default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub(crate) version: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) converted_from: Option<DocumentId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) converted_into: Option<DocumentId>,
}

fn default_tax_applicable() -> bool {
    true
}

impl Document {
    /// Draft a new, empty document for the given counterparty.
    pub fn new(kind: DocumentKind, counterparty: CounterpartyRef) -> Result<Self> {
        Self::new_at(kind, counterparty, Utc::now())
    }

    /// Draft a new document with an explicit creation timestamp.
    pub fn new_at(
        kind: DocumentKind,
        counterparty: CounterpartyRef,
        created_at: DateTime<Utc>,
    ) -> Result<Self> {
        if counterparty.kind != kind.counterparty_kind() {
            return Err(TallyError::InvalidDocument(format!(
                "a {} must reference a {:?} counterparty",
                kind,
                kind.counterparty_kind()
            )));
        }
        if counterparty.id.trim().is_empty() {
            return Err(TallyError::InvalidDocument(
                "counterparty id is empty".to_string(),
            ));
        }

        Ok(Self {
            id: DocumentId::new(),
            kind,
            number: None,
            counterparty,
            status: DocumentStatus::Draft,
            created_at,
            due_date: None,
            lines: Vec::new(),
            tax_applicable: true,
            currency: None,
            notes: None,
            version: 0,
            converted_from: None,
            converted_into: None,
        })
    }

    pub fn with_number(mut self, number: impl Into<String>) -> Self {
        self.number = Some(number.into());
        self
    }

    pub fn with_due_date(mut self, due_date: NaiveDate) -> Self {
        self.due_date = Some(due_date);
        self
    }

    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = Some(currency.into());
        self
    }

    pub fn with_tax_applicable(mut self, tax_applicable: bool) -> Self {
        self.tax_applicable = tax_applicable;
        self
    }

    pub fn id(&self) -> DocumentId {
        self.id
    }

    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    /// Stored status. See [`Document::effective_status`] for the read-time view.
    pub fn status(&self) -> DocumentStatus {
        self.status
    }

    pub fn counterparty(&self) -> &CounterpartyRef {
        &self.counterparty
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn due_date(&self) -> Option<NaiveDate> {
        self.due_date
    }

    pub fn lines(&self) -> &[LineItem] {
        &self.lines
    }

    pub fn tax_applicable(&self) -> bool {
        self.tax_applicable
    }

    pub fn currency(&self) -> Option<&str> {
        self.currency.as_deref()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn converted_from(&self) -> Option<DocumentId> {
        self.converted_from
    }

    pub fn converted_into(&self) -> Option<DocumentId> {
        self.converted_into
    }

    /// Number for display, falling back to a kind prefix and short id.
    pub fn display_number(&self) -> String {
        match &self.number {
            Some(number) if !number.trim().is_empty() => number.clone(),
            _ => format!("{}-{}", self.kind.number_prefix(), self.id.short()),
        }
    }

    /// Whether line items and pricing may still be edited.
    pub fn is_editable(&self) -> bool {
        self.status == DocumentStatus::Draft
    }

    pub fn add_line(&mut self, item: LineItem) -> Result<()> {
        self.ensure_editable()?;
        self.lines.push(item);
        self.touch();
        Ok(())
    }

    pub fn replace_line(&mut self, index: usize, item: LineItem) -> Result<LineItem> {
        self.ensure_editable()?;
        let slot = self
            .lines
            .get_mut(index)
            .ok_or_else(|| TallyError::InvalidLineItem(format!("no line at index {}", index)))?;
        let previous = std::mem::replace(slot, item);
        self.touch();
        Ok(previous)
    }

    pub fn remove_line(&mut self, index: usize) -> Result<LineItem> {
        self.ensure_editable()?;
        if index >= self.lines.len() {
            return Err(TallyError::InvalidLineItem(format!(
                "no line at index {}",
                index
            )));
        }
        let removed = self.lines.remove(index);
        self.touch();
        Ok(removed)
    }

    pub fn set_lines(&mut self, lines: Vec<LineItem>) -> Result<()> {
        self.ensure_editable()?;
        self.lines = lines;
        self.touch();
        Ok(())
    }

    pub fn clear_lines(&mut self) -> Result<()> {
        self.set_lines(Vec::new())
    }

    pub fn set_tax_applicable(&mut self, tax_applicable: bool) -> Result<()> {
        self.ensure_editable()?;
        self.tax_applicable = tax_applicable;
        self.touch();
        Ok(())
    }

    pub fn set_currency(&mut self, currency: Option<String>) -> Result<()> {
        self.ensure_editable()?;
        self.currency = currency;
        self.touch();
        Ok(())
    }

    /// Due dates may move until the document is closed.
    pub fn set_due_date(&mut self, due_date: Option<NaiveDate>) -> Result<()> {
        if self.status.is_terminal() {
            return Err(self.locked());
        }
        self.due_date = due_date;
        self.touch();
        Ok(())
    }

    /// Reject a write based on a snapshot older than this document.
    pub fn ensure_version(&self, expected: u64) -> Result<()> {
        if expected != self.version {
            return Err(TallyError::StaleVersion {
                expected,
                actual: self.version,
            });
        }
        Ok(())
    }

    /// Check the record for inconsistencies a loader should report.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if self.counterparty.kind != self.kind.counterparty_kind() {
            issues.push(format!(
                "{} references a {:?} counterparty",
                self.kind, self.counterparty.kind
            ));
        }

        if self.counterparty.id.trim().is_empty() {
            issues.push("Missing counterparty id".to_string());
        }

        if self.status == DocumentStatus::Overdue {
            issues.push(
                "Overdue is derived from the due date and should not be stored".to_string(),
            );
        }

        if !crate::lifecycle::is_reachable(self.kind, self.status) {
            issues.push(format!("Status {} does not apply to a {}", self.status, self.kind));
        }

        if self.kind == DocumentKind::Invoice
            && self.status != DocumentStatus::Draft
            && self.due_date.is_none()
        {
            issues.push("Issued invoice has no due date".to_string());
        }

        if self.lines.is_empty() && self.status != DocumentStatus::Draft {
            issues.push("No line items".to_string());
        }

        issues
    }

    pub(crate) fn ensure_editable(&self) -> Result<()> {
        if !self.is_editable() {
            debug!("Rejected edit on {} {} in status {}", self.kind, self.id, self.status);
            return Err(self.locked());
        }
        Ok(())
    }

    pub(crate) fn touch(&mut self) {
        self.version += 1;
    }

    fn locked(&self) -> TallyError {
        TallyError::DocumentLocked {
            id: self.id.to_string(),
            status: self.status,
        }
    }
}
