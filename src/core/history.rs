//! Historical price series for charts. Best effort: failures yield an empty
//! series.

use super::cache::is_crypto;
use super::price::{Coin, Fiat, HistoricalPoint, PriceFeed};
use super::unit::Unit;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

pub const DEFAULT_HISTORY_DAYS: u32 = 14;

pub struct HistoryFetcher {
    feed: Arc<dyn PriceFeed>,
}

impl HistoryFetcher {
    pub fn new(feed: Arc<dyn PriceFeed>) -> Self {
        Self { feed }
    }

    #[instrument(
        name = "HistoryFetch",
        skip(self, crypto_unit, fiat_unit),
        fields(crypto = %crypto_unit.symbol, fiat = %fiat_unit.symbol)
    )]
    pub async fn get_history(
        &self,
        crypto_unit: &Unit,
        fiat_unit: &Unit,
        window_days: u32,
    ) -> Vec<HistoricalPoint> {
        let Some(coin) = Coin::from_symbol(&crypto_unit.symbol) else {
            debug!("No price history for symbol");
            return vec![];
        };
        let vs = Fiat::from_symbol_or_usd(&fiat_unit.symbol);

        match self.feed.fetch_market_chart(coin, vs, window_days).await {
            Ok(points) => {
                debug!(points = points.len(), "Fetched price history");
                points
            }
            Err(e) => {
                warn!(error = %e, "Failed to fetch price history");
                vec![]
            }
        }
    }
}

/// Picks the (crypto, quote) pair worth charting for a from/to selection.
///
/// A coin on the `from` side is charted in the `to` unit; otherwise a coin on
/// the `to` side is charted in the `from` unit.
pub fn chart_pair<'a>(from: &'a Unit, to: &'a Unit) -> Option<(&'a Unit, &'a Unit)> {
    if is_crypto(from) {
        Some((from, to))
    } else if is_crypto(to) {
        Some((to, from))
    } else {
        None
    }
}
