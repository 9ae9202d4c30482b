//! Dashboard figures across a set of documents.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{compute_totals, Currency};
use crate::models::config::BillingConfig;
use crate::models::document::{Document, DocumentKind, DocumentStatus};

/// Number of documents of one kind in one (effective) status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCount {
    pub kind: DocumentKind,
    pub status: DocumentStatus,
    pub count: usize,
}

/// Portfolio figures for the financial dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialSummary {
    /// Reporting currency. Documents in other currencies are counted but not summed.
    pub currency: Currency,
    /// Date overdue status was evaluated against.
    pub as_of: NaiveDate,
    /// Tax-inclusive total of every issued invoice.
    pub invoiced: Decimal,
    /// Paid invoices.
    pub paid: Decimal,
    /// Sent invoices awaiting payment, overdue ones included.
    pub outstanding: Decimal,
    /// Portion of `outstanding` past its due date.
    pub overdue: Decimal,
    pub overdue_count: usize,
    /// Sent and accepted quotations not yet converted.
    pub quoted_pipeline: Decimal,
    /// Sent and delivered purchase orders.
    pub purchase_commitments: Decimal,
    /// Margin on paid invoices.
    pub realised_profit: Decimal,
    /// Documents left out of the amounts because of their currency.
    pub foreign_currency_documents: usize,
    pub status_counts: Vec<StatusCount>,
}

impl FinancialSummary {
    /// Aggregate a document set as seen on `as_of`.
    pub fn from_documents(
        documents: &[Document],
        billing: &BillingConfig,
        as_of: NaiveDate,
    ) -> Self {
        let currency = billing.resolve_currency(None);
        let mut summary = Self {
            currency,
            as_of,
            invoiced: Decimal::ZERO,
            paid: Decimal::ZERO,
            outstanding: Decimal::ZERO,
            overdue: Decimal::ZERO,
            overdue_count: 0,
            quoted_pipeline: Decimal::ZERO,
            purchase_commitments: Decimal::ZERO,
            realised_profit: Decimal::ZERO,
            foreign_currency_documents: 0,
            status_counts: Vec::new(),
        };

        let mut counts: BTreeMap<(u8, u8), StatusCount> = BTreeMap::new();

        for document in documents {
            let status = document.effective_status(as_of);
            counts
                .entry((kind_order(document.kind()), status_order(status)))
                .or_insert_with(|| StatusCount {
                    kind: document.kind(),
                    status,
                    count: 0,
                })
                .count += 1;

            if status == DocumentStatus::Overdue {
                summary.overdue_count += 1;
            }

            // Unsupported codes count as foreign
            let in_currency = document
                .currency()
                .is_none_or(|code| code.parse::<Currency>().ok() == Some(currency));
            if !in_currency {
                debug!(
                    "Skipping amounts of {} in {:?}",
                    document.display_number(),
                    document.currency()
                );
                summary.foreign_currency_documents += 1;
                continue;
            }

            let totals = compute_totals(document, billing);

            match (document.kind(), status) {
                (DocumentKind::Invoice, DocumentStatus::Paid) => {
                    summary.invoiced += totals.total;
                    summary.paid += totals.total;
                    summary.realised_profit += totals.profit_estimate;
                }
                (DocumentKind::Invoice, DocumentStatus::Sent) => {
                    summary.invoiced += totals.total;
                    summary.outstanding += totals.total;
                }
                (DocumentKind::Invoice, DocumentStatus::Overdue) => {
                    summary.invoiced += totals.total;
                    summary.outstanding += totals.total;
                    summary.overdue += totals.total;
                }
                (DocumentKind::Quotation, DocumentStatus::Sent | DocumentStatus::Accepted) => {
                    summary.quoted_pipeline += totals.total;
                }
                (DocumentKind::PurchaseOrder, DocumentStatus::Sent | DocumentStatus::Delivered) => {
                    summary.purchase_commitments += totals.total;
                }
                _ => {}
            }
        }

        summary.status_counts = counts.into_values().collect();
        summary
    }

    /// Share of issued invoice value that has been collected, in percent.
    pub fn collection_rate(&self) -> Option<Decimal> {
        if self.invoiced.is_zero() {
            None
        } else {
            Some((self.paid / self.invoiced * Decimal::ONE_HUNDRED).round_dp(1))
        }
    }
}

fn kind_order(kind: DocumentKind) -> u8 {
    match kind {
        DocumentKind::Quotation => 0,
        DocumentKind::Invoice => 1,
        DocumentKind::PurchaseOrder => 2,
    }
}

fn status_order(status: DocumentStatus) -> u8 {
    DocumentStatus::ALL
        .iter()
        .position(|s| *s == status)
        .unwrap_or(DocumentStatus::ALL.len()) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::document::CounterpartyRef;
    use crate::models::line_item::LineItem;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn document(kind: DocumentKind, price: &str, path: &[DocumentStatus]) -> Document {
        let counterparty = match kind {
            DocumentKind::PurchaseOrder => CounterpartyRef::supplier("s-1"),
            _ => CounterpartyRef::client("c-1"),
        };
        let mut doc = Document::new(kind, counterparty)
            .unwrap()
            .with_due_date(date(2024, 3, 1));
        doc.add_line(
            LineItem::new("Item", 1, dec(price))
                .unwrap()
                .with_cost_price(dec("50"))
                .unwrap(),
        )
        .unwrap();
        for status in path {
            doc.transition(*status).unwrap();
        }
        doc
    }

    #[test]
    fn test_summary_buckets() {
        use DocumentStatus::*;

        let docs = vec![
            document(DocumentKind::Invoice, "100", &[Sent, Paid]),
            document(DocumentKind::Invoice, "200", &[Sent]),
            document(DocumentKind::Invoice, "400", &[]),
            document(DocumentKind::Quotation, "1000", &[Sent, Accepted]),
            document(DocumentKind::Quotation, "999", &[Sent, Rejected]),
            document(DocumentKind::PurchaseOrder, "80", &[Sent, Delivered]),
        ];

        let billing = BillingConfig::default();
        let summary = FinancialSummary::from_documents(&docs, &billing, date(2024, 4, 1));

        assert_eq!(summary.paid, dec("115"));
        assert_eq!(summary.outstanding, dec("230"));
        assert_eq!(summary.overdue, dec("230"));
        assert_eq!(summary.overdue_count, 1);
        assert_eq!(summary.invoiced, dec("345"));
        assert_eq!(summary.quoted_pipeline, dec("1150"));
        assert_eq!(summary.purchase_commitments, dec("92"));
        assert_eq!(summary.realised_profit, dec("50"));

        let overdue = summary
            .status_counts
            .iter()
            .find(|c| c.kind == DocumentKind::Invoice && c.status == Overdue)
            .unwrap();
        assert_eq!(overdue.count, 1);
    }

    #[test]
    fn test_not_overdue_before_due_date() {
        let docs = vec![document(DocumentKind::Invoice, "200", &[DocumentStatus::Sent])];
        let summary =
            FinancialSummary::from_documents(&docs, &BillingConfig::default(), date(2024, 2, 1));
        assert_eq!(summary.overdue, Decimal::ZERO);
        assert_eq!(summary.outstanding, dec("230"));
    }

    #[test]
    fn test_foreign_currency_not_summed() {
        let mut doc = document(DocumentKind::Invoice, "100", &[]);
        doc.set_currency(Some("USD".to_string())).unwrap();
        doc.transition(DocumentStatus::Sent).unwrap();
        doc.transition(DocumentStatus::Paid).unwrap();

        let summary = FinancialSummary::from_documents(
            &[doc],
            &BillingConfig::default(),
            date(2024, 1, 1),
        );
        assert_eq!(summary.paid, Decimal::ZERO);
        assert_eq!(summary.foreign_currency_documents, 1);
        assert_eq!(summary.status_counts.len(), 1);
    }

    #[test]
    fn test_unsupported_currency_not_summed() {
        let mut jpy = document(DocumentKind::Invoice, "100", &[]);
        jpy.set_currency(Some("JPY".to_string())).unwrap();
        jpy.transition(DocumentStatus::Sent).unwrap();

        let mut zar = document(DocumentKind::Invoice, "200", &[]);
        zar.set_currency(Some("zar".to_string())).unwrap();
        zar.transition(DocumentStatus::Sent).unwrap();

        let summary = FinancialSummary::from_documents(
            &[jpy, zar],
            &BillingConfig::default(),
            date(2024, 1, 1),
        );
        assert_eq!(summary.outstanding, dec("230"));
        assert_eq!(summary.foreign_currency_documents, 1);
    }

    #[test]
    fn test_collection_rate() {
        let docs = vec![
            document(
                DocumentKind::Invoice,
                "100",
                &[DocumentStatus::Sent, DocumentStatus::Paid],
            ),
            document(DocumentKind::Invoice, "300", &[DocumentStatus::Sent]),
        ];
        let summary =
            FinancialSummary::from_documents(&docs, &BillingConfig::default(), date(2024, 1, 1));
        assert_eq!(summary.collection_rate(), Some(dec("25.0")));

        let empty =
            FinancialSummary::from_documents(&[], &BillingConfig::default(), date(2024, 1, 1));
        assert_eq!(empty.collection_rate(), None);
    }
}
