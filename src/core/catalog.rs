//! Static unit tables
//!
//! Order within each table matters: the first two units are the default
//! from/to selection of any consumer.

use super::unit::{Category, Unit};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Returns the ordered units of a category. Crypto units come from the
/// price cache, so the crypto table is empty.
pub fn units_for(category: Category) -> Vec<Unit> {
    let table: &[(&str, &str, Decimal)] = match category {
        Category::Length => &[
            ("Meter", "m", dec!(1)),
            ("Kilometer", "km", dec!(1000)),
            ("Decimeter", "dm", dec!(0.1)),
            ("Centimeter", "cm", dec!(0.01)),
            ("Millimeter", "mm", dec!(0.001)),
            ("Micrometer", "µm", dec!(0.000001)),
            ("Nanometer", "nm", dec!(0.000000001)),
            ("Mile", "mi", dec!(1609.344)),
            ("Nautical mile", "nmi", dec!(1852)),
            ("Yard", "yd", dec!(0.9144)),
            ("Foot", "ft", dec!(0.3048)),
            ("Inch", "in", dec!(0.0254)),
        ],
        Category::Mass => &[
            ("Gram", "g", dec!(1)),
            ("Kilogram", "kg", dec!(1000)),
            ("Milligram", "mg", dec!(0.001)),
            ("Tonne", "t", dec!(1000000)),
            ("Quintal", "q", dec!(100000)),
            ("Microgram", "µg", dec!(0.000001)),
            ("Pound", "lb", dec!(453.592)),
            ("Ounce", "oz", dec!(28.3495)),
            ("Troy ounce", "oz t", dec!(31.1)),
            ("Carat", "ct", dec!(0.2)),
        ],
        Category::Temperature => &[
            ("Celsius", "°C", Decimal::ZERO),
            ("Fahrenheit", "°F", Decimal::ZERO),
            ("Kelvin", "K", Decimal::ZERO),
        ],
        Category::Volume => &[
            ("Liter", "l", dec!(1)),
            ("Milliliter", "ml", dec!(0.001)),
            ("Cubic meter", "m³", dec!(1000)),
            ("Cubic centimeter", "cm³", dec!(0.001)),
            ("Hectoliter", "hl", dec!(100)),
            ("Gallon (US)", "gal", dec!(3.785411784)),
            ("Gallon (UK)", "gal (uk)", dec!(4.54609)),
            ("Pint (US)", "pt", dec!(0.473176)),
            ("Fluid ounce (US)", "fl oz", dec!(0.0295735)),
        ],
        Category::Area => &[
            ("Square meter", "m²", dec!(1)),
            ("Square kilometer", "km²", dec!(1000000)),
            ("Square centimeter", "cm²", dec!(0.0001)),
            ("Hectare", "ha", dec!(10000)),
            ("Are", "a", dec!(100)),
            ("Acre", "ac", dec!(4046.85642)),
            ("Square foot", "ft²", dec!(0.092903)),
        ],
        Category::Speed => &[
            ("Meters per second", "m/s", dec!(1)),
            ("Kilometers per hour", "km/h", dec!(0.277778)),
            ("Kilometers per minute", "km/min", dec!(16.66666666666667)),
            ("Kilometers per second", "km/s", dec!(1000)),
            ("Miles per hour", "mph", dec!(0.44704)),
            ("Knot", "kn", dec!(0.514444444444)),
            ("Feet per second", "ft/s", dec!(0.3048)),
        ],
        Category::Time => &[
            ("Second", "s", dec!(1)),
            ("Millisecond", "ms", dec!(0.001)),
            ("Minute", "min", dec!(60)),
            ("Hour", "h", dec!(3600)),
            ("Day", "d", dec!(86400)),
            ("Week", "wk", dec!(604800)),
            ("Year (365 days)", "y", dec!(31536000)),
        ],
        Category::Crypto => &[],
    };

    table
        .iter()
        .map(|(name, symbol, to_base)| Unit::new(name, symbol, *to_base, category))
        .collect()
}

/// Finds a unit by symbol, preferring an exact match over a case-insensitive one.
pub fn find_unit<'a>(units: &'a [Unit], symbol: &str) -> Option<&'a Unit> {
    let symbol = symbol.trim();
    units
        .iter()
        .find(|u| u.symbol == symbol)
        .or_else(|| units.iter().find(|u| u.symbol.eq_ignore_ascii_case(symbol)))
}

/// Looks a symbol up across every static table.
pub fn resolve_symbol(symbol: &str) -> Option<Unit> {
    Category::ALL
        .into_iter()
        .find_map(|category| find_unit(&units_for(category), symbol).cloned())
}
