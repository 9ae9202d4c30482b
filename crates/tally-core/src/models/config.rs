//! Configuration for extraction, PDF handling and billing.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TallyError};
use crate::money::Currency;

/// Main configuration for tally.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TallyConfig {
    /// Tax, currency and payment-term settings.
    pub billing: BillingConfig,

    /// PDF processing configuration.
    pub pdf: PdfConfig,

    /// Line-item extraction configuration.
    pub extraction: ExtractionConfig,
}

/// Tax and currency settings passed to the money functions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BillingConfig {
    /// Tax rate as a fraction (0.15 = 15%).
    pub tax_rate: Decimal,

    /// Currency code used when a document does not specify one.
    pub currency: String,

    /// Currency used when a requested code is not supported.
    pub fallback_currency: String,

    /// Whether newly drafted documents carry tax.
    pub tax_applicable_by_default: bool,

    /// Days a quotation stays valid when no date is given.
    pub quotation_validity_days: u32,

    /// Days until an invoice falls due when no date is given.
    pub invoice_terms_days: u32,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            tax_rate: Decimal::new(15, 2),
            currency: "ZAR".to_string(),
            fallback_currency: "ZAR".to_string(),
            tax_applicable_by_default: true,
            quotation_validity_days: 30,
            invoice_terms_days: 30,
        }
    }
}

impl BillingConfig {
    /// Resolve a document's currency, falling back to the configured defaults.
    pub fn resolve_currency(&self, code: Option<&str>) -> Currency {
        code.and_then(|c| c.parse().ok())
            .or_else(|| self.currency.parse().ok())
            .or_else(|| self.fallback_currency.parse().ok())
            .unwrap_or_default()
    }
}

/// PDF processing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// Maximum pages to read (0 = unlimited).
    pub max_pages: usize,

    /// Minimum text length for a page to count as readable.
    pub min_text_length: usize,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            max_pages: 0,
            min_text_length: 20,
        }
    }
}

/// Line-item extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Scan line by line when no price/quantity/total triplets are found.
    pub line_fallback: bool,

    /// Strip a leading row index ("01 ") from descriptions.
    pub strip_leading_index: bool,

    /// Descriptions are cut to this many characters.
    pub max_description_len: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            line_fallback: true,
            strip_leading_index: true,
            max_description_len: 500,
        }
    }
}

impl TallyConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| TallyError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| TallyError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Check values that serde cannot.
    pub fn validate(&self) -> Result<()> {
        let rate = self.billing.tax_rate;
        if rate < Decimal::ZERO || rate > Decimal::ONE {
            return Err(TallyError::Config(format!(
                "tax_rate must be a fraction between 0 and 1, got {}",
                rate
            )));
        }

        self.billing.currency.parse::<Currency>()?;
        self.billing.fallback_currency.parse::<Currency>()?;

        if self.extraction.max_description_len == 0 {
            return Err(TallyError::Config(
                "max_description_len must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = TallyConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.billing.tax_rate, Decimal::new(15, 2));
        assert_eq!(config.billing.currency, "ZAR");
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: TallyConfig =
            serde_json::from_str(r#"{"billing": {"tax_rate": 0.2, "currency": "GBP"}}"#).unwrap();
        assert_eq!(config.billing.tax_rate, Decimal::new(2, 1));
        assert_eq!(config.billing.fallback_currency, "ZAR");
        assert!(config.extraction.line_fallback);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = TallyConfig::default();
        config.billing.tax_rate = Decimal::new(15, 0);
        assert!(matches!(config.validate(), Err(TallyError::Config(_))));

        let mut config = TallyConfig::default();
        config.billing.currency = "JPY".to_string();
        assert!(matches!(config.validate(), Err(TallyError::InvalidCurrency(_))));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = TallyConfig::default();
        config.billing.currency = "USD".to_string();
        config.save(&path).unwrap();

        let loaded = TallyConfig::from_file(&path).unwrap();
        assert_eq!(loaded.billing.currency, "USD");
        assert_eq!(loaded.billing.tax_rate, config.billing.tax_rate);
    }

    #[test]
    fn test_resolve_currency() {
        let billing = BillingConfig::default();
        assert_eq!(billing.resolve_currency(Some("usd")), Currency::Usd);
        assert_eq!(billing.resolve_currency(Some("XYZ")), Currency::Zar);
        assert_eq!(billing.resolve_currency(None), Currency::Zar);
    }
}
