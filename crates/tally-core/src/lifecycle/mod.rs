//! Document status lifecycle.
//!
//! Every document starts in Draft and moves forward through explicit
//! actions. Line items freeze as soon as a document leaves Draft.
//!
//! ```text
//! Quotation       Draft -> Sent -> Accepted -> Converted
//!                               -> Rejected
//! Invoice         Draft -> Sent -> Paid
//!                          (Overdue is derived from the due date)
//! PurchaseOrder   Draft -> Sent -> Delivered
//!                               -> Cancelled
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Result, TallyError};
use crate::models::document::{Document, DocumentId, DocumentKind, DocumentStatus};

use DocumentStatus::*;

/// A status change that was applied to a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    pub document: DocumentId,
    pub from: DocumentStatus,
    pub to: DocumentStatus,
    /// Document version after the change.
    pub version: u64,
}

/// Statuses reachable in one step from `from`.
pub fn allowed_transitions(kind: DocumentKind, from: DocumentStatus) -> &'static [DocumentStatus] {
    match (kind, from) {
        (_, Draft) => &[Sent],
        (DocumentKind::Quotation, Sent) => &[Accepted, Rejected],
        (DocumentKind::Quotation, Accepted) => &[Converted],
        (DocumentKind::Invoice, Sent) => &[Paid],
        (DocumentKind::PurchaseOrder, Sent) => &[Delivered, Cancelled],
        _ => &[],
    }
}

pub fn can_transition(kind: DocumentKind, from: DocumentStatus, to: DocumentStatus) -> bool {
    allowed_transitions(kind, from).contains(&to)
}

/// Whether a status can be stored for this kind of document.
pub fn is_reachable(kind: DocumentKind, status: DocumentStatus) -> bool {
    match status {
        Draft | Sent => true,
        Accepted | Rejected | Converted => kind == DocumentKind::Quotation,
        Paid => kind == DocumentKind::Invoice,
        Delivered | Cancelled => kind == DocumentKind::PurchaseOrder,
        Overdue => false,
    }
}

impl Document {
    /// Move to `target`, leaving the document untouched on failure.
    ///
    /// Quotations reach Converted through [`convert_to_invoice`], which
    /// creates the invoice in the same step.
    pub fn transition(&mut self, target: DocumentStatus) -> Result<StatusChange> {
        self.check_transition(target)?;
        if target == Converted {
            return Err(self.invalid_transition(target));
        }
        Ok(self.apply_transition(target))
    }

    /// Status as seen on `today`: a sent invoice past its due date reads as Overdue.
    pub fn effective_status(&self, today: NaiveDate) -> DocumentStatus {
        match (self.kind, self.status, self.due_date) {
            (DocumentKind::Invoice, Sent, Some(due)) if due < today => Overdue,
            (_, status, _) => status,
        }
    }

    /// Whether the quotation's validity date has passed without a decision.
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        self.kind == DocumentKind::Quotation
            && matches!(self.status, Draft | Sent)
            && self.due_date.is_some_and(|valid_until| valid_until < today)
    }

    /// Statuses an action may move this document to right now.
    pub fn next_statuses(&self) -> &'static [DocumentStatus] {
        allowed_transitions(self.kind, self.status)
    }

    fn check_transition(&self, target: DocumentStatus) -> Result<()> {
        if self.status.is_terminal() || !can_transition(self.kind, self.status, target) {
            warn!(
                "Rejected {} transition {} -> {} for {}",
                self.kind, self.status, target, self.id
            );
            return Err(self.invalid_transition(target));
        }
        Ok(())
    }

    fn apply_transition(&mut self, target: DocumentStatus) -> StatusChange {
        let from = self.status;
        self.status = target;
        self.touch();
        info!("{} {}: {} -> {}", self.kind, self.display_number(), from, target);

        StatusChange {
            document: self.id,
            from,
            to: target,
            version: self.version,
        }
    }

    fn invalid_transition(&self, target: DocumentStatus) -> TallyError {
        TallyError::InvalidTransition {
            kind: self.kind,
            from: self.status,
            to: target,
        }
    }
}

/// Value form of [`Document::transition`]: returns the updated copy.
pub fn transition(document: &Document, target: DocumentStatus) -> Result<Document> {
    let mut updated = document.clone();
    updated.transition(target)?;
    Ok(updated)
}

/// Turn an accepted quotation into a draft invoice.
///
/// The invoice copies the quotation's lines, counterparty, tax flag,
/// currency and notes. The quotation moves to Converted and records the
/// new invoice's id.
pub fn convert_to_invoice(
    quotation: &mut Document,
    due_date: Option<NaiveDate>,
) -> Result<Document> {
    if quotation.kind != DocumentKind::Quotation {
        return Err(quotation.invalid_transition(Converted));
    }
    quotation.check_transition(Converted)?;

    let mut invoice = Document::new(DocumentKind::Invoice, quotation.counterparty.clone())?
        .with_tax_applicable(quotation.tax_applicable);
    invoice.lines = quotation.lines.clone();
    invoice.currency = quotation.currency.clone();
    invoice.notes = quotation.notes.clone();
    invoice.due_date = due_date;
    invoice.converted_from = Some(quotation.id);

    quotation.converted_into = Some(invoice.id);
    quotation.apply_transition(Converted);

    info!(
        "Converted quotation {} into invoice {}",
        quotation.display_number(),
        invoice.display_number()
    );

    Ok(invoice)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::document::CounterpartyRef;
    use crate::models::line_item::LineItem;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;

    fn draft(kind: DocumentKind) -> Document {
        let counterparty = match kind {
            DocumentKind::PurchaseOrder => CounterpartyRef::supplier("s-1"),
            _ => CounterpartyRef::client("c-1"),
        };
        let mut doc = Document::new(kind, counterparty).unwrap();
        doc.add_line(LineItem::new("Gate motor", 1, Decimal::new(4500, 0)).unwrap())
            .unwrap();
        doc
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_invoice_happy_path() {
        let mut doc = draft(DocumentKind::Invoice);
        let change = doc.transition(Sent).unwrap();
        assert_eq!(change.from, Draft);
        assert_eq!(change.to, Sent);
        assert_eq!(change.version, doc.version());

        doc.transition(Paid).unwrap();
        assert_eq!(doc.status(), Paid);
        assert!(doc.status().is_terminal());
        assert!(doc.next_statuses().is_empty());
    }

    #[test]
    fn test_paid_to_draft_is_rejected_and_unchanged() {
        let mut doc = draft(DocumentKind::Invoice);
        doc.transition(Sent).unwrap();
        doc.transition(Paid).unwrap();

        let before = doc.clone();
        let err = doc.transition(Draft).unwrap_err();
        assert!(matches!(
            err,
            TallyError::InvalidTransition { from: Paid, to: Draft, .. }
        ));
        assert_eq!(doc, before);

        assert!(transition(&before, Draft).is_err());
    }

    #[test]
    fn test_overdue_is_not_a_transition_target() {
        let mut doc = draft(DocumentKind::Invoice);
        doc.transition(Sent).unwrap();
        assert!(doc.transition(Overdue).is_err());
        assert_eq!(doc.status(), Sent);
    }

    #[test]
    fn test_effective_status_overdue() {
        let mut doc = draft(DocumentKind::Invoice).with_due_date(date(2024, 5, 31));
        assert_eq!(doc.effective_status(date(2024, 6, 30)), Draft);

        doc.transition(Sent).unwrap();
        assert_eq!(doc.effective_status(date(2024, 5, 31)), Sent);
        assert_eq!(doc.effective_status(date(2024, 6, 1)), Overdue);
        assert_eq!(doc.status(), Sent);

        // overdue invoices can still be paid
        doc.transition(Paid).unwrap();
        assert_eq!(doc.effective_status(date(2024, 6, 1)), Paid);
    }

    #[test]
    fn test_kind_specific_targets() {
        let mut po = draft(DocumentKind::PurchaseOrder);
        po.transition(Sent).unwrap();
        assert!(po.transition(Paid).is_err());
        assert!(po.transition(Accepted).is_err());
        po.transition(Cancelled).unwrap();
        assert!(po.transition(Delivered).is_err());

        let mut invoice = draft(DocumentKind::Invoice);
        assert!(invoice.transition(Paid).is_err());
        assert_eq!(invoice.status(), Draft);
    }

    #[test]
    fn test_terminal_states_have_no_exits() {
        for kind in [DocumentKind::Quotation, DocumentKind::Invoice, DocumentKind::PurchaseOrder] {
            for status in DocumentStatus::ALL {
                if status.is_terminal() {
                    assert!(allowed_transitions(kind, status).is_empty());
                }
            }
        }
    }

    #[test]
    fn test_lines_lock_after_sending() {
        let mut doc = draft(DocumentKind::Quotation);
        doc.transition(Sent).unwrap();
        let extra = LineItem::new("Extra beam", 1, Decimal::ONE).unwrap();
        assert!(matches!(doc.add_line(extra), Err(TallyError::DocumentLocked { .. })));
    }

    #[test]
    fn test_convert_accepted_quotation() {
        let mut quote = draft(DocumentKind::Quotation)
            .with_currency("ZAR")
            .with_tax_applicable(false);
        quote.transition(Sent).unwrap();
        quote.transition(Accepted).unwrap();

        let invoice = convert_to_invoice(&mut quote, Some(date(2024, 7, 1))).unwrap();

        assert_eq!(quote.status(), Converted);
        assert_eq!(quote.converted_into(), Some(invoice.id()));
        assert_eq!(invoice.converted_from(), Some(quote.id()));
        assert_eq!(invoice.kind(), DocumentKind::Invoice);
        assert_eq!(invoice.status(), Draft);
        assert_eq!(invoice.lines(), quote.lines());
        assert_eq!(invoice.counterparty(), quote.counterparty());
        assert!(!invoice.tax_applicable());
        assert_eq!(invoice.currency(), Some("ZAR"));
        assert_eq!(invoice.due_date(), Some(date(2024, 7, 1)));
    }

    #[test]
    fn test_convert_requires_acceptance() {
        let mut quote = draft(DocumentKind::Quotation);
        quote.transition(Sent).unwrap();

        let before = quote.clone();
        assert!(convert_to_invoice(&mut quote, None).is_err());
        assert_eq!(quote, before);

        let mut invoice = draft(DocumentKind::Invoice);
        assert!(convert_to_invoice(&mut invoice, None).is_err());
    }

    #[test]
    fn test_converted_only_through_conversion() {
        let mut quote = draft(DocumentKind::Quotation);
        quote.transition(Sent).unwrap();
        quote.transition(Accepted).unwrap();
        assert!(quote.transition(Converted).is_err());
        assert_eq!(quote.status(), Accepted);
    }

    #[test]
    fn test_quotation_expiry() {
        let mut quote = draft(DocumentKind::Quotation).with_due_date(date(2024, 1, 31));
        quote.transition(Sent).unwrap();
        assert!(!quote.is_expired(date(2024, 1, 31)));
        assert!(quote.is_expired(date(2024, 2, 1)));

        quote.transition(Accepted).unwrap();
        assert!(!quote.is_expired(date(2024, 2, 1)));
    }

    #[test]
    fn test_reachability() {
        assert!(is_reachable(DocumentKind::Invoice, Paid));
        assert!(!is_reachable(DocumentKind::Invoice, Accepted));
        assert!(!is_reachable(DocumentKind::Quotation, Overdue));
        assert!(is_reachable(DocumentKind::PurchaseOrder, Delivered));
    }
}
