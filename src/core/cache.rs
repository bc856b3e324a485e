//! Time-boxed cache of crypto prices.
//!
//! Prices and their fetch time live in one immutable [`CryptoPriceSnapshot`]
//! that is swapped as a whole, so a reader never sees a fresh timestamp with
//! stale prices.

use super::price::{Coin, CoinQuotes, FeedError, Fiat, PriceFeed};
use super::unit::{Category, Unit};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};

/// How long a fetched snapshot is served without asking the feed again.
pub const FRESHNESS_WINDOW: Duration = Duration::from_secs(60);

/// USD prices by unit symbol, including the synthetic PLN and EUR entries.
#[derive(Debug, Clone)]
pub struct CryptoPriceSnapshot {
    pub prices: HashMap<String, Decimal>,
    pub fetched_at: DateTime<Utc>,
    fetched_instant: Instant,
}

fn positive(value: Option<Decimal>) -> Option<Decimal> {
    value.filter(|v| *v > Decimal::ZERO)
}

impl CryptoPriceSnapshot {
    pub fn from_quotes(quotes: &CoinQuotes) -> Self {
        let mut prices = HashMap::new();

        for coin in Coin::ALL {
            let quoted = quotes.get(&coin).and_then(|q| positive(q.usd));
            if quoted.is_none() {
                warn!(coin = %coin, "No USD quote, using default price");
            }
            prices.insert(
                coin.symbol().to_string(),
                quoted.unwrap_or_else(|| coin.default_price()),
            );
        }

        let btc = quotes.get(&Coin::Bitcoin);
        let btc_usd = btc.and_then(|q| positive(q.usd));
        for (fiat, btc_in_fiat) in [
            (Fiat::Pln, btc.and_then(|q| positive(q.pln))),
            (Fiat::Eur, btc.and_then(|q| positive(q.eur))),
        ] {
            let rate = btc_usd
                .zip(btc_in_fiat)
                .and_then(|(usd, other)| usd.checked_div(other))
                .unwrap_or_else(|| fiat.default_rate());
            prices.insert(fiat.symbol().to_string(), rate);
        }

        CryptoPriceSnapshot {
            prices,
            fetched_at: Utc::now(),
            fetched_instant: Instant::now(),
        }
    }

    pub fn age(&self) -> Duration {
        self.fetched_instant.elapsed()
    }

    pub fn units(&self) -> Vec<Unit> {
        units_from_prices(&self.prices)
    }
}

/// Builds the ordered crypto units: USD, PLN, EUR, then each coin.
fn units_from_prices(prices: &HashMap<String, Decimal>) -> Vec<Unit> {
    let fiats = Fiat::ALL.into_iter().map(|fiat| {
        let rate = prices
            .get(fiat.symbol())
            .copied()
            .unwrap_or_else(|| fiat.default_rate());
        Unit::new(fiat.name(), fiat.symbol(), rate, Category::Crypto)
    });
    let coins = Coin::ALL.into_iter().map(|coin| {
        let price = prices
            .get(coin.symbol())
            .copied()
            .unwrap_or_else(|| coin.default_price());
        Unit::new(coin.name(), coin.symbol(), price, Category::Crypto)
    });
    fiats.chain(coins).collect()
}

/// Crypto units priced with the documented default values.
pub fn default_units() -> Vec<Unit> {
    units_from_prices(&HashMap::new())
}

/// True only for crypto units that are one of the tracked coins.
pub fn is_crypto(unit: &Unit) -> bool {
    unit.category == Category::Crypto && Coin::from_symbol(&unit.symbol).is_some()
}

pub struct PriceCache {
    feed: Arc<dyn PriceFeed>,
    freshness: Duration,
    snapshot: RwLock<Option<Arc<CryptoPriceSnapshot>>>,
    fetch_lock: Mutex<()>,
}

impl PriceCache {
    pub fn new(feed: Arc<dyn PriceFeed>) -> Self {
        Self::with_freshness_window(feed, FRESHNESS_WINDOW)
    }

    pub fn with_freshness_window(feed: Arc<dyn PriceFeed>, freshness: Duration) -> Self {
        Self {
            feed,
            freshness,
            snapshot: RwLock::new(None),
            fetch_lock: Mutex::new(()),
        }
    }

    async fn fresh_snapshot(&self) -> Option<Arc<CryptoPriceSnapshot>> {
        self.snapshot
            .read()
            .await
            .as_ref()
            .filter(|s| s.age() < self.freshness)
            .cloned()
    }

    /// Returns crypto units, fetching prices only when the snapshot is stale.
    ///
    /// Callers overlapping a fetch wait for it and reuse its result. On
    /// failure the error is returned and the previous snapshot is kept.
    pub async fn get_crypto_units(&self) -> Result<Vec<Unit>, FeedError> {
        if let Some(snapshot) = self.fresh_snapshot().await {
            debug!("Cache HIT");
            return Ok(snapshot.units());
        }

        let _guard = self.fetch_lock.lock().await;
        if let Some(snapshot) = self.fresh_snapshot().await {
            debug!("Cache HIT after waiting for fetch");
            return Ok(snapshot.units());
        }

        debug!("Cache MISS, fetching prices");
        self.fetch_and_store().await
    }

    /// Fetches prices whatever the snapshot's age. On failure the previous
    /// snapshot stays in place.
    pub async fn refresh(&self) -> Result<Vec<Unit>, FeedError> {
        let _guard = self.fetch_lock.lock().await;
        debug!("Cache REFRESH, fetching prices");
        self.fetch_and_store().await
    }

    /// Caller must hold `fetch_lock`.
    async fn fetch_and_store(&self) -> Result<Vec<Unit>, FeedError> {
        let quotes = self.feed.fetch_quotes().await?;
        let snapshot = Arc::new(CryptoPriceSnapshot::from_quotes(&quotes));
        *self.snapshot.write().await = Some(Arc::clone(&snapshot));
        debug!("Cache PUT");

        Ok(snapshot.units())
    }

    pub async fn clear_cache(&self) {
        *self.snapshot.write().await = None;
        debug!("Cache CLEAR");
    }

    pub async fn snapshot(&self) -> Option<Arc<CryptoPriceSnapshot>> {
        self.snapshot.read().await.clone()
    }

    /// Units from the latest snapshot whatever its age, or the defaults.
    pub async fn last_known_units(&self) -> Vec<Unit> {
        match self.snapshot().await {
            Some(snapshot) => snapshot.units(),
            None => default_units(),
        }
    }
}
