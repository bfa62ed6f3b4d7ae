//! Dual-currency amounts, entry-time conversion, and display formatting.

use std::fmt;
use std::ops::{Add, AddAssign, Sub};

use serde::{Deserialize, Serialize};

/// Exchange rate applied when no snapshot value is available.
pub const DEFAULT_EXCHANGE_RATE: f64 = 58.5;

/// The two currencies tracked side by side on every amount.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum Currency {
    #[serde(rename = "RD$")]
    Local,
    #[default]
    #[serde(rename = "US$")]
    Foreign,
}

impl Currency {
    pub fn symbol(self) -> &'static str {
        match self {
            Currency::Local => "RD$",
            Currency::Foreign => "US$",
        }
    }

    pub fn parse(raw: &str) -> Option<Currency> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "RD$" | "RD" | "DOP" | "LOCAL" => Some(Currency::Local),
            "US$" | "US" | "USD" | "FOREIGN" => Some(Currency::Foreign),
            _ => None,
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A `(local, foreign)` pair. The two sides are independent values.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct DualAmount {
    pub local: f64,
    pub foreign: f64,
}

impl DualAmount {
    pub const ZERO: DualAmount = DualAmount {
        local: 0.0,
        foreign: 0.0,
    };

    pub fn new(local: f64, foreign: f64) -> Self {
        Self { local, foreign }
    }

    /// Builds a pair from a local entry, deriving the foreign side through `rate`.
    pub fn from_local_entry(local: f64, rate: f64) -> Self {
        Self {
            local,
            foreign: foreign_from_local(local, rate),
        }
    }

    /// Per-side `max(0, value)`.
    pub fn clamp_non_negative(self) -> Self {
        Self {
            local: self.local.max(0.0),
            foreign: self.foreign.max(0.0),
        }
    }

    pub fn is_zero(&self) -> bool {
        self.local == 0.0 && self.foreign == 0.0
    }

    /// Collapses both sides into local currency.
    pub fn normalized_to_local(&self, rate: f64) -> f64 {
        self.local + self.foreign * rate
    }
}

impl Add for DualAmount {
    type Output = DualAmount;

    fn add(self, rhs: DualAmount) -> DualAmount {
        DualAmount::new(self.local + rhs.local, self.foreign + rhs.foreign)
    }
}

impl AddAssign for DualAmount {
    fn add_assign(&mut self, rhs: DualAmount) {
        self.local += rhs.local;
        self.foreign += rhs.foreign;
    }
}

impl Sub for DualAmount {
    type Output = DualAmount;

    fn sub(self, rhs: DualAmount) -> DualAmount {
        DualAmount::new(self.local - rhs.local, self.foreign - rhs.foreign)
    }
}

/// Converts a local amount to foreign currency at entry time, rounded to cents.
/// A non-positive rate yields zero.
pub fn foreign_from_local(local: f64, rate: f64) -> f64 {
    if rate > 0.0 {
        round_cents(local / rate)
    } else {
        0.0
    }
}

pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Locale-aware formatting preferences.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LocaleConfig {
    pub language_tag: String,
    pub decimal_separator: char,
    pub grouping_separator: char,
}

impl Default for LocaleConfig {
    fn default() -> Self {
        Self {
            language_tag: "es-DO".into(),
            decimal_separator: '.',
            grouping_separator: ',',
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum NegativeStyle {
    #[default]
    Sign,
    Parentheses,
}

/// Fixed-precision number with the locale's grouping and decimal separators.
pub fn format_number(locale: &LocaleConfig, value: f64, precision: u8) -> String {
    let fixed = format!("{:.*}", usize::from(precision), value.abs());
    let (whole, fraction) = match fixed.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (fixed.as_str(), None),
    };

    let mut out = String::with_capacity(fixed.len() + whole.len() / 3 + 1);
    if value < 0.0 {
        out.push('-');
    }
    for (idx, digit) in whole.chars().enumerate() {
        if idx > 0 && (whole.len() - idx) % 3 == 0 {
            out.push(locale.grouping_separator);
        }
        out.push(digit);
    }
    if let Some(fraction) = fraction {
        out.push(locale.decimal_separator);
        out.push_str(fraction);
    }
    out
}

/// Renders `amount` as `RD$ 1,234.50` (or `US$ ...`).
pub fn format_money(
    amount: f64,
    currency: Currency,
    locale: &LocaleConfig,
    negative_style: NegativeStyle,
) -> String {
    let body = format_number(locale, amount.abs(), 2);
    if amount < 0.0 {
        match negative_style {
            NegativeStyle::Sign => format!("{} -{}", currency.symbol(), body),
            NegativeStyle::Parentheses => format!("{} ({})", currency.symbol(), body),
        }
    } else {
        format!("{} {}", currency.symbol(), body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_conversion_rounds_to_cents() {
        assert_eq!(foreign_from_local(1000.0, 58.5), 17.09);
        assert_eq!(foreign_from_local(1000.0, 0.0), 0.0);
        assert_eq!(foreign_from_local(1000.0, -3.0), 0.0);
    }

    #[test]
    fn remaining_side_clamps_each_currency() {
        let diff = DualAmount::new(100.0, 5.0) - DualAmount::new(150.0, 2.0);
        assert_eq!(diff.clamp_non_negative(), DualAmount::new(0.0, 3.0));
    }

    #[test]
    fn formats_grouped_money() {
        let locale = LocaleConfig::default();
        assert_eq!(
            format_money(1234567.5, Currency::Local, &locale, NegativeStyle::Sign),
            "RD$ 1,234,567.50"
        );
        assert_eq!(
            format_money(-20.0, Currency::Foreign, &locale, NegativeStyle::Parentheses),
            "US$ (20.00)"
        );
    }

    #[test]
    fn number_follows_locale_separators() {
        let locale = LocaleConfig {
            language_tag: "es-ES".into(),
            decimal_separator: ',',
            grouping_separator: '.',
        };
        assert_eq!(format_number(&locale, 1234567.891, 2), "1.234.567,89");
        assert_eq!(format_number(&locale, -999.6, 0), "-1.000");
        assert_eq!(format_number(&LocaleConfig::default(), 12.0, 0), "12");
    }

    #[test]
    fn currency_serializes_with_symbols() {
        let json = serde_json::to_string(&Currency::Local).unwrap();
        assert_eq!(json, "\"RD$\"");
        assert_eq!(Currency::parse("usd"), Some(Currency::Foreign));
        assert_eq!(Currency::parse("EUR"), None);
    }
}
