//! Crypto pricing abstractions and core types

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Display;
use std::str::FromStr;
use thiserror::Error;

/// Coins with a tracked price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum Coin {
    Bitcoin,
    Ethereum,
    Tether,
    Solana,
    Dogecoin,
    Cardano,
}

impl Coin {
    pub const ALL: [Coin; 6] = [
        Coin::Bitcoin,
        Coin::Ethereum,
        Coin::Tether,
        Coin::Solana,
        Coin::Dogecoin,
        Coin::Cardano,
    ];

    pub fn symbol(&self) -> &'static str {
        match self {
            Coin::Bitcoin => "BTC",
            Coin::Ethereum => "ETH",
            Coin::Tether => "USDT",
            Coin::Solana => "SOL",
            Coin::Dogecoin => "DOGE",
            Coin::Cardano => "ADA",
        }
    }

    /// Identifier used by the price API.
    pub fn api_id(&self) -> &'static str {
        match self {
            Coin::Bitcoin => "bitcoin",
            Coin::Ethereum => "ethereum",
            Coin::Tether => "tether",
            Coin::Solana => "solana",
            Coin::Dogecoin => "dogecoin",
            Coin::Cardano => "cardano",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Coin::Bitcoin => "Bitcoin",
            Coin::Ethereum => "Ethereum",
            Coin::Tether => "Tether",
            Coin::Solana => "Solana",
            Coin::Dogecoin => "Dogecoin",
            Coin::Cardano => "Cardano",
        }
    }

    /// Conservative USD price used when no quote is available.
    pub fn default_price(&self) -> Decimal {
        match self {
            Coin::Bitcoin => dec!(50000),
            Coin::Ethereum => dec!(3000),
            Coin::Tether => dec!(1),
            Coin::Solana => dec!(100),
            Coin::Dogecoin => dec!(0.1),
            Coin::Cardano => dec!(0.5),
        }
    }

    pub fn from_symbol(symbol: &str) -> Option<Coin> {
        Coin::ALL.into_iter().find(|c| c.symbol() == symbol)
    }
}

impl Display for Coin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

impl FromStr for Coin {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Coin::from_symbol(&s.trim().to_uppercase()).ok_or_else(|| anyhow!("Unknown coin: {}", s))
    }
}

/// Quote currencies supported by the price API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum Fiat {
    Usd,
    Pln,
    Eur,
}

impl Fiat {
    pub const ALL: [Fiat; 3] = [Fiat::Usd, Fiat::Pln, Fiat::Eur];

    pub fn symbol(&self) -> &'static str {
        match self {
            Fiat::Usd => "USD",
            Fiat::Pln => "PLN",
            Fiat::Eur => "EUR",
        }
    }

    pub fn api_id(&self) -> &'static str {
        match self {
            Fiat::Usd => "usd",
            Fiat::Pln => "pln",
            Fiat::Eur => "eur",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Fiat::Usd => "US Dollar",
            Fiat::Pln => "Polish Zloty",
            Fiat::Eur => "Euro",
        }
    }

    /// USD value of one unit of this currency when no cross-rate is known.
    pub fn default_rate(&self) -> Decimal {
        match self {
            Fiat::Usd => Decimal::ONE,
            Fiat::Pln => dec!(0.25),
            Fiat::Eur => dec!(1.08),
        }
    }

    /// Maps a unit symbol to a quote currency; anything unknown quotes in USD.
    pub fn from_symbol_or_usd(symbol: &str) -> Fiat {
        Fiat::ALL
            .into_iter()
            .find(|f| f.symbol().eq_ignore_ascii_case(symbol.trim()))
            .unwrap_or(Fiat::Usd)
    }
}

impl Display for Fiat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Prices of one coin in each quote currency. Missing quotes are `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoinQuote {
    pub usd: Option<Decimal>,
    pub pln: Option<Decimal>,
    pub eur: Option<Decimal>,
}

pub type CoinQuotes = HashMap<Coin, CoinQuote>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalPoint {
    pub timestamp: DateTime<Utc>,
    pub price: Decimal,
}

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Rate limited by price API")]
    RateLimited,

    #[error("HTTP error: {status}")]
    Http { status: u16 },

    #[error("Failed to parse response: {0}")]
    Parse(String),
}

/// Remote source of crypto prices.
#[async_trait]
pub trait PriceFeed: Send + Sync {
    /// Fetches current prices of every tracked coin in all quote currencies.
    async fn fetch_quotes(&self) -> Result<CoinQuotes, FeedError>;

    /// Fetches a price series of `coin` quoted in `vs` over the last `days`.
    async fn fetch_market_chart(
        &self,
        coin: Coin,
        vs: Fiat,
        days: u32,
    ) -> Result<Vec<HistoricalPoint>, FeedError>;
}
