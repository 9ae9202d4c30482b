//! Supported currencies and their display rules.

use std::fmt;
use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Result, TallyError};
use crate::models::config::BillingConfig;

/// Currencies the portal can display amounts in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// South African rand.
    #[default]
    Zar,
    /// US dollar.
    Usd,
    /// Euro.
    Eur,
    /// Pound sterling.
    Gbp,
}

/// Where the currency symbol goes relative to the number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolPosition {
    Prefix,
    Suffix,
}

/// Locale rules bound to a currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrencyFormat {
    pub symbol: &'static str,
    pub position: SymbolPosition,
    /// Space between the symbol and the number.
    pub spaced: bool,
    pub group_separator: char,
    pub decimal_separator: char,
}

impl Currency {
    pub const ALL: [Currency; 4] = [Currency::Zar, Currency::Usd, Currency::Eur, Currency::Gbp];

    /// ISO 4217 code.
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Zar => "ZAR",
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Gbp => "GBP",
        }
    }

    pub fn format_rules(&self) -> CurrencyFormat {
        match self {
            // en-ZA
            Currency::Zar => CurrencyFormat {
                symbol: "R",
                position: SymbolPosition::Prefix,
                spaced: true,
                group_separator: ' ',
                decimal_separator: '.',
            },
            // en-US
            Currency::Usd => CurrencyFormat {
                symbol: "$",
                position: SymbolPosition::Prefix,
                spaced: false,
                group_separator: ',',
                decimal_separator: '.',
            },
            // de-DE
            Currency::Eur => CurrencyFormat {
                symbol: "€",
                position: SymbolPosition::Suffix,
                spaced: true,
                group_separator: '.',
                decimal_separator: ',',
            },
            // en-GB
            Currency::Gbp => CurrencyFormat {
                symbol: "£",
                position: SymbolPosition::Prefix,
                spaced: false,
                group_separator: ',',
                decimal_separator: '.',
            },
        }
    }

    /// Render an amount, rounded half away from zero to two places.
    pub fn format(&self, amount: Decimal) -> String {
        let rules = self.format_rules();
        let rounded = round_money(amount);
        let negative = rounded.is_sign_negative() && !rounded.is_zero();

        let plain = format!("{:.2}", rounded.abs());
        let (integer_part, fraction_part) = plain.split_once('.').unwrap_or((plain.as_str(), "00"));

        let mut number = group_digits(integer_part, rules.group_separator);
        number.push(rules.decimal_separator);
        number.push_str(fraction_part);

        let space = if rules.spaced { " " } else { "" };
        let body = match rules.position {
            SymbolPosition::Prefix => format!("{}{}{}", rules.symbol, space, number),
            SymbolPosition::Suffix => format!("{}{}{}", number, space, rules.symbol),
        };

        if negative { format!("-{}", body) } else { body }
    }

    /// Parse text produced by [`Currency::format`] back into an amount.
    pub fn parse(&self, text: &str) -> Option<Decimal> {
        let rules = self.format_rules();
        let trimmed = text.trim();
        let (negative, rest) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };

        let number = rest
            .trim()
            .trim_start_matches(rules.symbol)
            .trim_end_matches(rules.symbol)
            .trim();
        if number.is_empty() {
            return None;
        }

        let mut normalized = String::with_capacity(number.len());
        for c in number.chars() {
            if c == rules.group_separator || c == '\u{00a0}' {
                continue;
            } else if c == rules.decimal_separator {
                normalized.push('.');
            } else if c.is_ascii_digit() {
                normalized.push(c);
            } else {
                return None;
            }
        }

        let value = Decimal::from_str(&normalized).ok()?;
        Some(if negative { -value } else { value })
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = TallyError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_uppercase().as_str() {
            "ZAR" => Ok(Currency::Zar),
            "USD" => Ok(Currency::Usd),
            "EUR" => Ok(Currency::Eur),
            "GBP" => Ok(Currency::Gbp),
            _ => Err(TallyError::InvalidCurrency(s.to_string())),
        }
    }
}

/// Round to two decimal places, half away from zero.
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Format an amount in the currency named by `code`.
pub fn format_currency(amount: Decimal, code: &str) -> Result<String> {
    let currency: Currency = code.parse()?;
    Ok(currency.format(amount))
}

/// Currency amounts are shown in: `code` if supported, otherwise the configured fallback.
pub fn display_currency(code: &str, billing: &BillingConfig) -> Currency {
    match code.parse::<Currency>() {
        Ok(currency) => currency,
        Err(e) => {
            let fallback = billing.resolve_currency(Some(billing.fallback_currency.as_str()));
            warn!("{}; formatting in {} instead", e, fallback);
            fallback
        }
    }
}

/// Format an amount, using the configured fallback currency for unsupported codes.
pub fn format_currency_or_fallback(amount: Decimal, code: &str, billing: &BillingConfig) -> String {
    display_currency(code, billing).format(amount)
}

/// Parse a formatted amount in the currency named by `code`.
pub fn parse_currency(text: &str, code: &str) -> Result<Option<Decimal>> {
    let currency: Currency = code.parse()?;
    Ok(currency.parse(text))
}

fn group_digits(digits: &str, separator: char) -> String {
    let chars: Vec<char> = digits.chars().collect();
    let mut grouped = String::with_capacity(chars.len() + chars.len() / 3);

    for (i, c) in chars.iter().enumerate() {
        if i > 0 && (chars.len() - i) % 3 == 0 {
            grouped.push(separator);
        }
        grouped.push(*c);
    }

    grouped
}
