//! Command-line front end over the conversion core.

pub mod convert;
pub mod history;
pub mod setup;
pub mod shell;
pub mod ui;
pub mod units;

use crate::core::cache::default_units;
use crate::core::catalog::{find_unit, resolve_symbol, units_for};
use crate::core::{Category, HistoryFetcher, PriceCache, PriceFeed, Unit};
use crate::providers::util::with_retry;
use anyhow::{Context, Result, anyhow};
use std::sync::Arc;
use tracing::warn;

/// Attempts made on the first crypto price load before giving up.
pub const MAX_LOAD_ATTEMPTS: usize = 5;
const RETRY_DELAY_MS: u64 = 500;

/// Shared state of one CLI invocation.
pub struct Session {
    pub cache: PriceCache,
    pub history: HistoryFetcher,
    pub decimal_places: u32,
    pub offline: bool,
    retry_delay_ms: u64,
}

impl Session {
    pub fn new(feed: Arc<dyn PriceFeed>, decimal_places: u32, offline: bool) -> Self {
        Self {
            cache: PriceCache::new(Arc::clone(&feed)),
            history: HistoryFetcher::new(feed),
            decimal_places,
            offline,
            retry_delay_ms: RETRY_DELAY_MS,
        }
    }

    #[cfg(test)]
    pub(crate) fn new_for_test(feed: Arc<dyn PriceFeed>) -> Self {
        Self {
            retry_delay_ms: 1,
            ..Self::new(feed, crate::core::config::DEFAULT_DECIMAL_PLACES, false)
        }
    }

    /// First load of crypto units, retried up to [`MAX_LOAD_ATTEMPTS`] times.
    /// Offline sessions get the default prices.
    pub async fn load_crypto_units(&self) -> Result<Vec<Unit>> {
        if self.offline {
            warn!("Offline mode, using default crypto prices");
            return Ok(default_units());
        }

        let pb = ui::new_spinner("Fetching crypto prices...");
        let cache = &self.cache;
        let result = with_retry(
            move || cache.get_crypto_units(),
            MAX_LOAD_ATTEMPTS - 1,
            self.retry_delay_ms,
        )
        .await;
        pb.finish_and_clear();

        result.map_err(anyhow::Error::from).with_context(|| {
            format!(
                "Failed to load crypto prices after {MAX_LOAD_ATTEMPTS} attempts. Try again later or use --offline"
            )
        })
    }

    pub async fn units(&self, category: Category) -> Result<Vec<Unit>> {
        match category {
            Category::Crypto => self.load_crypto_units().await,
            _ => Ok(units_for(category)),
        }
    }

    /// Resolves a from/to symbol pair. Without a category, static tables are
    /// searched first and crypto prices are only fetched for crypto symbols.
    pub async fn resolve_pair(
        &self,
        from: &str,
        to: &str,
        category: Option<Category>,
    ) -> Result<(Unit, Unit)> {
        if let Some(category) = category {
            let units = self.units(category).await?;
            let lookup = |symbol: &str| {
                find_unit(&units, symbol)
                    .cloned()
                    .ok_or_else(|| anyhow!("Unknown unit '{}' in {}", symbol, category))
            };
            return Ok((lookup(from)?, lookup(to)?));
        }

        let (from_unit, to_unit) = (resolve_symbol(from), resolve_symbol(to));
        let needs_crypto = (from_unit.is_none() && is_crypto_symbol(from))
            || (to_unit.is_none() && is_crypto_symbol(to));
        let crypto_units = if needs_crypto {
            self.load_crypto_units().await?
        } else {
            vec![]
        };

        let lookup = |found: Option<Unit>, symbol: &str| {
            found
                .or_else(|| find_unit(&crypto_units, symbol).cloned())
                .ok_or_else(|| anyhow!("Unknown unit: {}", symbol))
        };
        Ok((lookup(from_unit, from)?, lookup(to_unit, to)?))
    }
}

/// True when `symbol` names a crypto unit (coin or quote currency).
pub fn is_crypto_symbol(symbol: &str) -> bool {
    find_unit(&default_units(), symbol).is_some()
}


#[cfg(test)]
mod tests {
    use super::test_utils::StubFeed;
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_resolve_static_pair_skips_network() {
        let feed = Arc::new(StubFeed::default());
        let session = Session::new_for_test(feed.clone());

        let (from, to) = session.resolve_pair("mi", "km", None).await.unwrap();
        assert_eq!(from.category, Category::Length);
        assert_eq!(to.symbol, "km");
        assert_eq!(feed.quote_calls(), 0);
    }

    #[tokio::test]
    async fn test_resolve_crypto_pair_fetches_prices() {
        let feed = Arc::new(StubFeed::default());
        let session = Session::new_for_test(feed.clone());

        let (from, to) = session.resolve_pair("btc", "PLN", None).await.unwrap();
        assert_eq!(from.symbol, "BTC");
        assert_eq!(from.to_base, dec!(60000));
        assert_eq!(to.to_base, dec!(0.25));
        assert_eq!(feed.quote_calls(), 1);
    }

    #[tokio::test]
    async fn test_resolve_mixed_pair_keeps_categories() {
        let session = Session::new_for_test(Arc::new(StubFeed::default()));
        let (from, to) = session.resolve_pair("kg", "BTC", None).await.unwrap();
        assert_eq!(from.category, Category::Mass);
        assert_eq!(to.category, Category::Crypto);
    }

    #[tokio::test]
    async fn test_resolve_with_category() {
        let session = Session::new_for_test(Arc::new(StubFeed::default()));
        let (from, to) = session
            .resolve_pair("°F", "K", Some(Category::Temperature))
            .await
            .unwrap();
        assert_eq!(from.name, "Fahrenheit");
        assert_eq!(to.name, "Kelvin");

        let err = session
            .resolve_pair("m", "kg", Some(Category::Length))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Unknown unit 'kg' in Length");
    }

    #[tokio::test]
    async fn test_resolve_unknown_symbol() {
        let session = Session::new_for_test(Arc::new(StubFeed::default()));
        let err = session.resolve_pair("m", "furlong", None).await.unwrap_err();
        assert_eq!(err.to_string(), "Unknown unit: furlong");
    }

    #[tokio::test]
    async fn test_initial_load_gives_up_after_max_attempts() {
        let feed = Arc::new(StubFeed::failing());
        let session = Session::new_for_test(feed.clone());

        let err = session.load_crypto_units().await.unwrap_err();
        assert!(err.to_string().contains("after 5 attempts"));
        assert_eq!(feed.quote_calls(), MAX_LOAD_ATTEMPTS);
    }

    #[tokio::test]
    async fn test_offline_uses_defaults() {
        let feed = Arc::new(StubFeed::failing());
        let session = Session::new(feed.clone(), 8, true);

        let units = session.units(Category::Crypto).await.unwrap();
        assert_eq!(units, default_units());
        assert_eq!(feed.quote_calls(), 0);
    }
}
