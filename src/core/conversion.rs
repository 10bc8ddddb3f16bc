//! Conversion requests, results and the amount arithmetic behind them.

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

/// Decimal places kept in a converted amount.
pub const RESULT_SCALE: u32 = 2;

/// Largest amount accepted for conversion. Keeps `amount * rate` inside
/// `Decimal`'s range for any realistic rate.
pub const MAX_AMOUNT: f64 = 1e15;

/// What the user asked for, exactly as entered (codes normalized).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionRequest {
    pub amount: String,
    pub source: String,
    pub target: String,
}

impl ConversionRequest {
    pub fn new(amount: &str, source: &str, target: &str) -> Self {
        ConversionRequest {
            amount: amount.to_string(),
            source: normalize_code(source),
            target: normalize_code(target),
        }
    }

    /// Parses the amount, rejecting anything that is not a positive number.
    pub fn parsed_amount(&self) -> Result<Decimal, ConversionError> {
        parse_amount(&self.amount)
    }
}

impl Default for ConversionRequest {
    fn default() -> Self {
        ConversionRequest::new("100", "USD", "KGS")
    }
}

/// Currency codes are compared and sent upper-case.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConversionResult {
    pub converted_amount: Decimal,
    pub rate: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConversionError {
    #[error("Enter a valid amount")]
    InvalidAmount,

    #[error("Could not fetch exchange rates. Please try again.")]
    NetworkFailure,

    #[error("Currency not found: {0}")]
    CurrencyNotFound(String),

    /// The rate was fetched but the product cannot be represented.
    #[error("Converted amount is out of range")]
    OutOfRange,

    #[error("Converter has been shut down")]
    ShutDown,
}

/// Accepts plain decimals ("12.50") and scientific notation ("1e3").
///
/// The amount must be a positive finite number no larger than [`MAX_AMOUNT`].
/// Digits beyond `Decimal`'s 28 places are rounded off, so a tiny positive
/// amount converts to `0.00` rather than being rejected.
pub fn parse_amount(text: &str) -> Result<Decimal, ConversionError> {
    let trimmed = text.trim();
    let value: f64 = trimmed
        .parse()
        .map_err(|_| ConversionError::InvalidAmount)?;
    if !value.is_finite() || value <= 0.0 || value > MAX_AMOUNT {
        return Err(ConversionError::InvalidAmount);
    }

    let amount = Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .ok()
        .or_else(|| Decimal::from_f64(value))
        // below Decimal's resolution
        .unwrap_or(Decimal::ZERO);
    Ok(amount)
}

/// `round(amount * rate, 2)`, half away from zero, in decimal arithmetic.
pub fn compute(amount: Decimal, rate: f64) -> Result<ConversionResult, ConversionError> {
    let rate_dec = Decimal::from_f64(rate).ok_or(ConversionError::OutOfRange)?;
    let mut converted = amount
        .checked_mul(rate_dec)
        .ok_or(ConversionError::OutOfRange)?
        .round_dp_with_strategy(RESULT_SCALE, RoundingStrategy::MidpointAwayFromZero);
    converted.rescale(RESULT_SCALE);

    Ok(ConversionResult {
        converted_amount: converted,
        rate,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_normalizes_codes() {
        let request = ConversionRequest::new("10", " usd", "kgs ");
        assert_eq!(request.source, "USD");
        assert_eq!(request.target, "KGS");
        assert_eq!(request.amount, "10");
    }

    #[test]
    fn test_invalid_amounts_are_rejected() {
        for text in ["", "   ", "0", "0.00", "-5", "-0.01", "abc", "12abc", "NaN", "inf"] {
            assert_eq!(
                parse_amount(text),
                Err(ConversionError::InvalidAmount),
                "amount {text:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_valid_amounts_are_parsed() {
        assert_eq!(parse_amount("100").unwrap(), Decimal::from(100));
        assert_eq!(parse_amount(" 12.50 ").unwrap(), Decimal::new(1250, 2));
        assert_eq!(parse_amount("1e3").unwrap(), Decimal::from(1000));
    }

    #[test]
    fn test_amount_limits() {
        assert_eq!(parse_amount("1e15").unwrap(), Decimal::from(1_000_000_000_000_000u64));
        for text in ["1e30", "1000000000000001", "79228162514264337593543950335"] {
            assert_eq!(
                parse_amount(text),
                Err(ConversionError::InvalidAmount),
                "amount {text:?} is above the limit"
            );
        }
    }

    #[test]
    fn test_tiny_amounts_convert_to_zero() {
        for text in ["1e-30", "0.0000000000000000000000000000001"] {
            let amount = parse_amount(text).expect("tiny positive amounts are accepted");
            let result = compute(amount, 87.45).unwrap();
            assert_eq!(result.converted_amount.to_string(), "0.00", "amount {text:?}");
        }
        let amount = parse_amount("0.0000000000000000000000000001").unwrap();
        assert!(amount > Decimal::ZERO);
    }

    #[test]
    fn test_compute_out_of_range() {
        assert_eq!(compute(Decimal::MAX, 2.0), Err(ConversionError::OutOfRange));
        assert_eq!(compute(Decimal::ONE, 1e30), Err(ConversionError::OutOfRange));
        assert_eq!(compute(Decimal::ONE, f64::NAN), Err(ConversionError::OutOfRange));
    }

    #[test]
    fn test_compute_reference_scenario() {
        let result = compute(parse_amount("100").unwrap(), 87.45).unwrap();
        assert_eq!(result.converted_amount.to_string(), "8745.00");
        assert_eq!(result.rate, 87.45);
    }

    #[test]
    fn test_compute_rounds_half_away_from_zero() {
        let cases = [
            ("0.125", 1.0, "0.13"),
            ("1.005", 1.0, "1.01"),
            ("10", 0.0333, "0.33"),
            ("2.5", 0.5, "1.25"),
            ("3", 0.9, "2.70"),
        ];
        for (amount, rate, expected) in cases {
            let result = compute(parse_amount(amount).unwrap(), rate).unwrap();
            assert_eq!(
                result.converted_amount.to_string(),
                expected,
                "{amount} x {rate}"
            );
        }
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            ConversionError::CurrencyNotFound("KGS".to_string()).to_string(),
            "Currency not found: KGS"
        );
        assert_eq!(
            ConversionError::InvalidAmount.to_string(),
            "Enter a valid amount"
        );
    }
}
