//! Currency conversion against a single snapshot

use crate::core::error::ConversionError;
use crate::core::snapshot::RateSnapshot;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq)]
pub struct ConversionRequest {
    pub amount: f64,
    pub source: String,
    pub target: String,
}

impl ConversionRequest {
    pub fn new(amount: f64, source: &str, target: &str) -> Self {
        Self {
            amount,
            source: source.to_string(),
            target: target.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConversionResult {
    pub amount: f64,
    pub source: String,
    pub target: String,
    /// Units of `target` per unit of `source`.
    pub rate: f64,
    pub converted: f64,
    pub fetched_at: DateTime<Utc>,
}

impl ConversionResult {
    /// The converted amount rounded to cents, for display only.
    pub fn rounded(&self) -> f64 {
        round_cents(self.converted)
    }
}

pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Converts `request.amount` using the rates in `snapshot`.
///
/// Checks run in a fixed order and the first failure is returned: the amount
/// must be positive and finite, at most `max_amount`, both currencies must
/// have a rate and they must differ.
pub fn convert(
    request: &ConversionRequest,
    snapshot: &RateSnapshot,
    max_amount: f64,
) -> Result<ConversionResult, ConversionError> {
    check_amount(request.amount, max_amount)?;

    let source_rate = snapshot
        .rate(&request.source)
        .ok_or_else(|| ConversionError::UnknownCurrency(request.source.clone()))?;
    let target_rate = snapshot
        .rate(&request.target)
        .ok_or_else(|| ConversionError::UnknownCurrency(request.target.clone()))?;

    if request.source == request.target {
        return Err(ConversionError::SameCurrency(request.source.clone()));
    }

    let rate = target_rate / source_rate;
    let converted = request.amount * rate;
    if !(rate.is_finite() && converted.is_finite()) {
        return Err(ConversionError::OutOfRange {
            amount: request.amount,
            source_code: request.source.clone(),
            target: request.target.clone(),
        });
    }

    Ok(ConversionResult {
        amount: request.amount,
        source: request.source.clone(),
        target: request.target.clone(),
        rate,
        converted,
        fetched_at: snapshot.fetched_at,
    })
}

/// Amount checks shared by the conversion and the amount prompt.
pub fn check_amount(amount: f64, max_amount: f64) -> Result<(), ConversionError> {
    if !(amount.is_finite() && amount > 0.0) {
        return Err(ConversionError::InvalidAmount(amount));
    }
    if amount > max_amount {
        return Err(ConversionError::AmountTooLarge {
            amount,
            max: max_amount,
        });
    }
    Ok(())
}

/// Parses a user-entered amount. Comma group separators and surrounding
/// whitespace are accepted, e.g. `" 1,250.75 "`.
pub fn parse_amount(input: &str) -> Option<f64> {
    let cleaned: String = input.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok()
}

/// Formats an amount with comma grouping and two decimals, e.g. `1,250.75`.
pub fn format_amount(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((&fixed, "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if value < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{sign}{grouped}.{frac_part}")
}
