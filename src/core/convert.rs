//! Conversion engine: resolves two codes against a rate store and computes
//! the converted amount plus both pairwise rates via a USD base.

use crate::core::rates::RateStore;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConvertError {
    #[error("no rate available for '{0}'")]
    UnresolvedCode(String),
    #[error("invalid amount: {0}")]
    InvalidAmount(String),
}

/// Result of a single conversion. Derived on demand, never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct Conversion {
    pub from: String,
    pub to: String,
    pub amount: f64,
    pub converted_amount: f64,
    pub rate_from_to_to: f64,
    pub rate_to_to_from: f64,
}

impl Conversion {
    pub fn amount_line(&self, decimals: usize) -> String {
        format!("{:.*}", decimals, self.converted_amount)
    }

    /// Unit-rate statements for both directions, e.g. `1 USD = 0.900000 EUR`.
    pub fn rate_lines(&self, decimals: usize) -> (String, String) {
        (
            format!(
                "1 {} = {:.*} {}",
                self.from, decimals, self.rate_from_to_to, self.to
            ),
            format!(
                "1 {} = {:.*} {}",
                self.to, decimals, self.rate_to_to_from, self.from
            ),
        )
    }
}

/// Parses a user-supplied amount. Empty input is treated as zero; anything
/// else must parse as a finite, non-negative number.
pub fn parse_amount(input: &str) -> Result<f64, ConvertError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(0.0);
    }
    let amount: f64 = trimmed
        .parse()
        .map_err(|_| ConvertError::InvalidAmount(format!("'{trimmed}' is not a number")))?;
    validate_amount(amount)?;
    Ok(amount)
}

fn validate_amount(amount: f64) -> Result<(), ConvertError> {
    if !amount.is_finite() {
        return Err(ConvertError::InvalidAmount(format!(
            "'{amount}' is not finite"
        )));
    }
    if amount < 0.0 {
        return Err(ConvertError::InvalidAmount(format!(
            "'{amount}' is negative"
        )));
    }
    Ok(())
}

/// Converts `amount` units of `from` into `to` using the store's normalized
/// USD-per-unit rates. Codes missing from the store (which includes unset
/// slots and any rate that failed the positivity check on ingestion) fail
/// with `UnresolvedCode`; a zero rate can therefore never reach the division.
pub fn convert(
    store: &RateStore,
    from: &str,
    to: &str,
    amount: f64,
) -> Result<Conversion, ConvertError> {
    validate_amount(amount)?;

    let resolve = |code: &str| {
        store
            .get(code)
            .filter(|r| r.usd_rate > 0.0)
            .ok_or_else(|| ConvertError::UnresolvedCode(code.to_string()))
    };
    let from = resolve(from)?;
    let to = resolve(to)?;

    let usd_value = amount * from.usd_rate;
    Ok(Conversion {
        from: from.code.clone(),
        to: to.code.clone(),
        amount,
        converted_amount: usd_value / to.usd_rate,
        rate_from_to_to: from.usd_rate / to.usd_rate,
        rate_to_to_from: to.usd_rate / from.usd_rate,
    })
}
