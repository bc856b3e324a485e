//! Display formatting of conversion results.

use super::convert::ConversionError;
use rust_decimal::{Decimal, RoundingStrategy};

/// Shown in place of a number when a conversion fails.
pub const ERROR_TEXT: &str = "Error";

/// Formats `value` with at most `decimal_places` fraction digits, dropping
/// trailing zeros (the `#.########` pattern). Midpoints round to even.
pub fn format_decimal(value: Decimal, decimal_places: u32) -> String {
    let rounded = value
        .round_dp_with_strategy(decimal_places, RoundingStrategy::MidpointNearestEven)
        .normalize();
    if rounded.is_zero() {
        // avoid "-0"
        return "0".to_string();
    }
    rounded.to_string()
}

pub fn format_result(result: &Result<Decimal, ConversionError>, decimal_places: u32) -> String {
    match result {
        Ok(value) => format_decimal(*value, decimal_places),
        Err(_) => ERROR_TEXT.to_string(),
    }
}
