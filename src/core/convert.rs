//! Conversion between units of one category.
//!
//! All arithmetic is done in `rust_decimal::Decimal`: up to 28 significant
//! digits, exact multiplication within that range, and division rounded to
//! 28 significant digits. Overflow and division by zero are reported as
//! domain errors instead of panicking.

use super::unit::{Category, Unit};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use thiserror::Error;

const FAHRENHEIT: &str = "°F";
const KELVIN: &str = "K";

const FAHRENHEIT_OFFSET: Decimal = dec!(32);
const KELVIN_OFFSET: Decimal = dec!(273.15);
const FIVE: Decimal = dec!(5);
const NINE: Decimal = dec!(9);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversionError {
    #[error("Cannot convert between {from} and {to}")]
    CategoryMismatch { from: Category, to: Category },

    #[error("{0}")]
    Domain(String),
}

fn overflow() -> ConversionError {
    ConversionError::Domain("Value out of range".to_string())
}

/// Converts `value` expressed in `from` into `to`.
pub fn convert(value: Decimal, from: &Unit, to: &Unit) -> Result<Decimal, ConversionError> {
    if from.category != to.category {
        return Err(ConversionError::CategoryMismatch {
            from: from.category,
            to: to.category,
        });
    }

    if from.category == Category::Temperature {
        return convert_temperature(value, &from.symbol, &to.symbol);
    }

    if from == to {
        return Ok(value);
    }

    if to.to_base.is_zero() {
        return Err(ConversionError::Domain(format!(
            "Unit {} has no conversion factor",
            to.symbol
        )));
    }

    value
        .checked_mul(from.to_base)
        .and_then(|base| base.checked_div(to.to_base))
        .ok_or_else(overflow)
}

fn convert_temperature(value: Decimal, from: &str, to: &str) -> Result<Decimal, ConversionError> {
    if from == KELVIN && value.is_sign_negative() && !value.is_zero() {
        return Err(ConversionError::Domain(
            "Temperature in Kelvin cannot be negative".to_string(),
        ));
    }

    if from == to {
        return Ok(value);
    }

    let celsius = match from {
        FAHRENHEIT => value
            .checked_sub(FAHRENHEIT_OFFSET)
            .and_then(|v| v.checked_mul(FIVE))
            .and_then(|v| v.checked_div(NINE)),
        KELVIN => value.checked_sub(KELVIN_OFFSET),
        // Celsius and anything unrecognised
        _ => Some(value),
    }
    .ok_or_else(overflow)?;

    match to {
        FAHRENHEIT => celsius
            .checked_mul(NINE)
            .and_then(|v| v.checked_div(FIVE))
            .and_then(|v| v.checked_add(FAHRENHEIT_OFFSET))
            .ok_or_else(overflow),
        KELVIN => {
            let kelvin = celsius.checked_add(KELVIN_OFFSET).ok_or_else(overflow)?;
            if kelvin.is_sign_negative() && !kelvin.is_zero() {
                return Err(ConversionError::Domain(
                    "Result in Kelvin cannot be negative".to_string(),
                ));
            }
            Ok(kelvin)
        }
        _ => Ok(celsius),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog::{find_unit, units_for};

    fn unit(category: Category, symbol: &str) -> Unit {
        find_unit(&units_for(category), symbol)
            .cloned()
            .unwrap_or_else(|| panic!("missing unit {symbol}"))
    }

    fn assert_close(actual: Decimal, expected: Decimal, tolerance: Decimal) {
        assert!(
            (actual - expected).abs() <= tolerance,
            "expected {expected}, got {actual}"
        );
    }

    fn static_categories() -> impl Iterator<Item = Category> {
        Category::ALL.into_iter().filter(|c| *c != Category::Crypto)
    }

    #[test]
    fn test_round_trip_within_category() {
        let values = [dec!(0), dec!(1), dec!(123.456), dec!(-42.5), dec!(98765.4321)];
        for category in static_categories() {
            let units = units_for(category);
            for a in &units {
                for b in &units {
                    for x in values {
                        if category == Category::Temperature && x.is_sign_negative() {
                            continue;
                        }
                        let there = convert(x, a, b).unwrap();
                        let back = convert(there, b, a).unwrap();
                        let tolerance = dec!(0.000000001) * (x.abs() + Decimal::ONE);
                        assert_close(back, x, tolerance);
                    }
                }
            }
        }
    }

    #[test]
    fn test_identity() {
        for category in static_categories() {
            for u in units_for(category) {
                for x in [dec!(0), dec!(1), dec!(123.456), dec!(0.000000001)] {
                    assert_eq!(convert(x, &u, &u).unwrap(), x, "{}", u.symbol);
                }
            }
        }
    }

    #[test]
    fn test_cross_category_always_fails() {
        let crypto = Unit::new("US Dollar", "USD", Decimal::ONE, Category::Crypto);
        let samples: Vec<Unit> = static_categories()
            .map(|c| units_for(c).remove(0))
            .chain(std::iter::once(crypto))
            .collect();

        for a in &samples {
            for b in &samples {
                if a.category == b.category {
                    continue;
                }
                assert_eq!(
                    convert(dec!(1), a, b),
                    Err(ConversionError::CategoryMismatch {
                        from: a.category,
                        to: b.category
                    })
                );
            }
        }
    }

    #[test]
    fn test_temperature_reference_points() {
        let c = unit(Category::Temperature, "°C");
        let f = unit(Category::Temperature, "°F");
        let k = unit(Category::Temperature, "K");

        assert_eq!(convert(dec!(0), &c, &f).unwrap(), dec!(32));
        assert_eq!(convert(dec!(100), &c, &f).unwrap(), dec!(212));
        assert_eq!(convert(dec!(0), &c, &k).unwrap(), dec!(273.15));
        assert_eq!(convert(dec!(212), &f, &c).unwrap(), dec!(100));
        assert_eq!(convert(dec!(273.15), &k, &c).unwrap(), dec!(0));
        assert_eq!(convert(dec!(-40), &c, &f).unwrap(), dec!(-40));
    }

    #[test]
    fn test_negative_kelvin_is_rejected() {
        let c = unit(Category::Temperature, "°C");
        let f = unit(Category::Temperature, "°F");
        let k = unit(Category::Temperature, "K");

        assert!(matches!(
            convert(dec!(-300), &k, &c),
            Err(ConversionError::Domain(_))
        ));
        assert!(matches!(
            convert(dec!(-1), &k, &k),
            Err(ConversionError::Domain(_))
        ));
        // Below absolute zero expressed in Celsius/Fahrenheit
        assert!(matches!(
            convert(dec!(-300), &c, &k),
            Err(ConversionError::Domain(_))
        ));
        assert!(matches!(
            convert(dec!(-500), &f, &k),
            Err(ConversionError::Domain(_))
        ));
        assert_eq!(convert(dec!(-273.15), &c, &k).unwrap(), dec!(0));
    }

    #[test]
    fn test_unknown_temperature_symbol_is_celsius() {
        let c = unit(Category::Temperature, "°C");
        let r = Unit::new("Reaumur", "°Ré", Decimal::ZERO, Category::Temperature);
        assert_eq!(convert(dec!(25), &r, &c).unwrap(), dec!(25));
        assert_eq!(convert(dec!(25), &c, &r).unwrap(), dec!(25));
    }

    #[test]
    fn test_linear_reference_points() {
        let m = unit(Category::Length, "m");
        let km = unit(Category::Length, "km");
        let mi = unit(Category::Length, "mi");
        let inch = unit(Category::Length, "in");
        let cm = unit(Category::Length, "cm");

        assert_eq!(convert(dec!(1000), &m, &km).unwrap(), dec!(1));
        assert_close(convert(dec!(1), &mi, &m).unwrap(), dec!(1609.344), dec!(0.001));
        assert_eq!(convert(dec!(1), &inch, &cm).unwrap(), dec!(2.54));

        let h = unit(Category::Time, "h");
        let min = unit(Category::Time, "min");
        assert_eq!(convert(dec!(1.5), &h, &min).unwrap(), dec!(90));
    }

    #[test]
    fn test_zero_target_factor_is_domain_error() {
        let usd = Unit::new("US Dollar", "USD", Decimal::ONE, Category::Crypto);
        let dead = Unit::new("Dead coin", "DEAD", Decimal::ZERO, Category::Crypto);
        assert!(matches!(
            convert(dec!(1), &usd, &dead),
            Err(ConversionError::Domain(_))
        ));
    }

    #[test]
    fn test_overflow_is_domain_error() {
        let nm = unit(Category::Length, "nm");
        let km = unit(Category::Length, "km");
        assert!(matches!(
            convert(Decimal::MAX, &km, &nm),
            Err(ConversionError::Domain(_))
        ));
    }

    #[test]
    fn test_error_messages() {
        let m = unit(Category::Length, "m");
        let g = unit(Category::Mass, "g");
        assert_eq!(
            convert(dec!(1), &m, &g).unwrap_err().to_string(),
            "Cannot convert between Length and Mass"
        );
    }
}
