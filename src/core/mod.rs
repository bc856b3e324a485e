//! Conversion engine and crypto pricing core

pub mod cache;
pub mod catalog;
pub mod config;
pub mod convert;
pub mod format;
pub mod history;
pub mod log;
pub mod price;
pub mod unit;

// Re-export main types for cleaner imports
pub use cache::{PriceCache, is_crypto};
pub use catalog::units_for;
pub use convert::{ConversionError, convert};
pub use history::HistoryFetcher;
pub use price::{Coin, FeedError, Fiat, HistoricalPoint, PriceFeed};
pub use unit::{Category, Unit};
