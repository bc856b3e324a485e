//! Unit and category types

use anyhow::anyhow;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Length,
    Mass,
    Temperature,
    Volume,
    Area,
    Speed,
    Time,
    Crypto,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::Length,
        Category::Mass,
        Category::Temperature,
        Category::Volume,
        Category::Area,
        Category::Speed,
        Category::Time,
        Category::Crypto,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Category::Length => "Length",
            Category::Mass => "Mass",
            Category::Temperature => "Temperature",
            Category::Volume => "Volume",
            Category::Area => "Area",
            Category::Speed => "Speed",
            Category::Time => "Time",
            Category::Crypto => "Crypto",
        }
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Category {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| anyhow!("Invalid category: {}", s))
    }
}

/// A unit of measure within a category.
///
/// `to_base` converts one of this unit into the category's base unit. It is
/// unused (zero) for temperature, which converts through formulas instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    pub name: String,
    pub symbol: String,
    pub to_base: Decimal,
    pub category: Category,
}

impl Unit {
    pub fn new(name: &str, symbol: &str, to_base: Decimal, category: Category) -> Self {
        Unit {
            name: name.to_string(),
            symbol: symbol.to_string(),
            to_base,
            category,
        }
    }

    /// Label used in unit pickers, e.g. `Kilometer (km)`.
    pub fn label(&self) -> String {
        format!("{} ({})", self.name, self.symbol)
    }
}
