//! Priced rows on a quotation, invoice or purchase order.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TallyError};

/// Largest amount a single line may reach (`quantity × price`).
///
/// Keeps document sums, tax and margins well inside `Decimal` range.
pub const MAX_LINE_AMOUNT: Decimal = Decimal::from_parts(2_764_472_320, 232_830, 0, false, 0);

/// A single priced row within a document.
///
/// The line total is always derived from quantity and unit price. It shows
/// up in serialized output for convenience but is ignored on input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "LineItemRecord", into = "LineItemRecord")]
pub struct LineItem {
    description: String,
    quantity: u32,
    unit_price: Decimal,
    cost_price: Option<Decimal>,
}

impl LineItem {
    /// Create a validated line item.
    pub fn new(description: impl Into<String>, quantity: u32, unit_price: Decimal) -> Result<Self> {
        let description = description.into().trim().to_string();
        if description.is_empty() {
            return Err(TallyError::InvalidLineItem("description is empty".to_string()));
        }
        validate_quantity(quantity)?;
        validate_price("unit price", unit_price)?;
        validate_amount("unit price", quantity, unit_price)?;

        Ok(Self {
            description,
            quantity,
            unit_price,
            cost_price: None,
        })
    }

    /// Attach the purchase cost used for margin estimates.
    pub fn with_cost_price(mut self, cost_price: Decimal) -> Result<Self> {
        validate_price("cost price", cost_price)?;
        validate_amount("cost price", self.quantity, cost_price)?;
        self.cost_price = Some(cost_price);
        Ok(self)
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn unit_price(&self) -> Decimal {
        self.unit_price
    }

    pub fn cost_price(&self) -> Option<Decimal> {
        self.cost_price
    }

    /// Total for this line (`quantity × unit_price`).
    pub fn line_total(&self) -> Decimal {
        Decimal::from(self.quantity) * self.unit_price
    }

    /// Estimated margin for this line, if the cost price is known.
    pub fn margin(&self) -> Option<Decimal> {
        self.cost_price
            .map(|cost| Decimal::from(self.quantity) * (self.unit_price - cost))
    }

    pub fn set_description(&mut self, description: impl Into<String>) -> Result<()> {
        let description = description.into().trim().to_string();
        if description.is_empty() {
            return Err(TallyError::InvalidLineItem("description is empty".to_string()));
        }
        self.description = description;
        Ok(())
    }

    pub fn set_quantity(&mut self, quantity: u32) -> Result<()> {
        validate_quantity(quantity)?;
        validate_amount("unit price", quantity, self.unit_price)?;
        if let Some(cost) = self.cost_price {
            validate_amount("cost price", quantity, cost)?;
        }
        self.quantity = quantity;
        Ok(())
    }

    pub fn set_unit_price(&mut self, unit_price: Decimal) -> Result<()> {
        validate_price("unit price", unit_price)?;
        validate_amount("unit price", self.quantity, unit_price)?;
        self.unit_price = unit_price;
        Ok(())
    }

    pub fn set_cost_price(&mut self, cost_price: Option<Decimal>) -> Result<()> {
        if let Some(cost) = cost_price {
            validate_price("cost price", cost)?;
            validate_amount("cost price", self.quantity, cost)?;
        }
        self.cost_price = cost_price;
        Ok(())
    }
}

fn validate_quantity(quantity: u32) -> Result<()> {
    if quantity == 0 {
        return Err(TallyError::InvalidLineItem("quantity must be positive".to_string()));
    }
    Ok(())
}

fn validate_price(field: &str, value: Decimal) -> Result<()> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(TallyError::InvalidLineItem(format!(
            "{} must not be negative: {}",
            field, value
        )));
    }
    Ok(())
}

fn validate_amount(field: &str, quantity: u32, price: Decimal) -> Result<()> {
    match Decimal::from(quantity).checked_mul(price) {
        Some(amount) if amount <= MAX_LINE_AMOUNT => Ok(()),
        _ => Err(TallyError::InvalidLineItem(format!(
            "{} × {} exceeds the line limit of {}",
            quantity, field, MAX_LINE_AMOUNT
        ))),
    }
}

/// Wire shape of a line item.
#[derive(Serialize, Deserialize)]
struct LineItemRecord {
    description: String,
    quantity: u32,
    unit_price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    cost_price: Option<Decimal>,
    #[serde(default, skip_deserializing)]
    line_total: Decimal,
}

impl TryFrom<LineItemRecord> for LineItem {
    type Error = TallyError;

    fn try_from(record: LineItemRecord) -> Result<Self> {
        let item = LineItem::new(record.description, record.quantity, record.unit_price)?;
        match record.cost_price {
            Some(cost) => item.with_cost_price(cost),
            None => Ok(item),
        }
    }
}

impl From<LineItem> for LineItemRecord {
    fn from(item: LineItem) -> Self {
        let line_total = item.line_total();
        Self {
            description: item.description,
            quantity: item.quantity,
            unit_price: item.unit_price,
            cost_price: item.cost_price,
            line_total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_line_total_is_derived() {
        let mut item = LineItem::new("CCTV camera", 3, dec("1250.50")).unwrap();
        assert_eq!(item.line_total(), dec("3751.50"));

        item.set_quantity(4).unwrap();
        assert_eq!(item.line_total(), dec("5002.00"));

        item.set_unit_price(dec("10.00")).unwrap();
        assert_eq!(item.line_total(), dec("40.00"));
    }

    #[test]
    fn test_rejects_invalid_values() {
        assert!(matches!(
            LineItem::new("Cable", 0, dec("1.00")),
            Err(TallyError::InvalidLineItem(_))
        ));
        assert!(matches!(
            LineItem::new("Cable", 1, dec("-1.00")),
            Err(TallyError::InvalidLineItem(_))
        ));
        assert!(matches!(
            LineItem::new("   ", 1, dec("1.00")),
            Err(TallyError::InvalidLineItem(_))
        ));

        let item = LineItem::new("Cable", 1, dec("1.00")).unwrap();
        assert!(item.with_cost_price(dec("-0.01")).is_err());
    }

    #[test]
    fn test_failed_setter_leaves_item_unchanged() {
        let mut item = LineItem::new("Alarm panel", 2, dec("900.00")).unwrap();
        assert!(item.set_quantity(0).is_err());
        assert_eq!(item.quantity(), 2);
    }

    #[test]
    fn test_margin() {
        let item = LineItem::new("Keypad", 2, dec("100.00"))
            .unwrap()
            .with_cost_price(dec("60.00"))
            .unwrap();
        assert_eq!(item.margin(), Some(dec("80.00")));

        let item = LineItem::new("Labour", 1, dec("450.00")).unwrap();
        assert_eq!(item.margin(), None);
    }

    #[test]
    fn test_serialized_line_total_is_ignored_on_input() {
        let json =
            r#"{"description":"Siren","quantity":2,"unit_price":"150.00","line_total":"9999.00"}"#;
        let item: LineItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.line_total(), dec("300.00"));

        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["line_total"], "300.00");
    }

    #[test]
    fn test_deserialize_validates() {
        let json = r#"{"description":"Siren","quantity":0,"unit_price":"150.00"}"#;
        assert!(serde_json::from_str::<LineItem>(json).is_err());

        let json =
            r#"{"description":"Siren","quantity":2,"unit_price":"50000000000000000000000000000"}"#;
        assert!(serde_json::from_str::<LineItem>(json).is_err());
    }

    #[test]
    fn test_line_amount_limit() {
        assert!(LineItem::new("Cable", 1, MAX_LINE_AMOUNT).is_ok());
        assert!(matches!(
            LineItem::new("Cable", 2, MAX_LINE_AMOUNT),
            Err(TallyError::InvalidLineItem(_))
        ));
        assert!(LineItem::new("Cable", u32::MAX, Decimal::MAX).is_err());

        let mut item = LineItem::new("Cable", 1, MAX_LINE_AMOUNT).unwrap();
        assert!(item.set_quantity(3).is_err());
        assert_eq!(item.quantity(), 1);

        let mut item = LineItem::new("Cable", 4, dec("1.00")).unwrap();
        assert!(item.set_unit_price(MAX_LINE_AMOUNT).is_err());
        assert!(item.clone().with_cost_price(MAX_LINE_AMOUNT).is_err());
        assert!(item.set_cost_price(Some(MAX_LINE_AMOUNT)).is_err());
        assert_eq!(item.unit_price(), dec("1.00"));
    }
}
