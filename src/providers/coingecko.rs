use anyhow::Result;
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use reqwest::StatusCode;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::core::price::{Coin, CoinQuote, CoinQuotes, FeedError, Fiat, HistoricalPoint, PriceFeed};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

// CoinGeckoProvider implementation for PriceFeed
pub struct CoinGeckoProvider {
    base_url: String,
    client: reqwest::Client,
}

impl CoinGeckoProvider {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("xconv/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(CoinGeckoProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, FeedError> {
        debug!("Requesting {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(FeedError::RateLimited);
        }
        if !status.is_success() {
            return Err(FeedError::Http {
                status: status.as_u16(),
            });
        }

        let text = response.text().await.map_err(request_error)?;
        serde_json::from_str(&text).map_err(|e| FeedError::Parse(e.to_string()))
    }
}

fn request_error(e: reqwest::Error) -> FeedError {
    if e.is_timeout() {
        FeedError::Timeout
    } else {
        FeedError::Network(e.to_string())
    }
}

// Prices are read straight from the JSON text into `Decimal`, never through f64.
#[derive(Deserialize, Debug)]
struct SimplePriceQuote {
    #[serde(default, with = "rust_decimal::serde::arbitrary_precision_option")]
    usd: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::arbitrary_precision_option")]
    pln: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::arbitrary_precision_option")]
    eur: Option<Decimal>,
}

/// `[timestampMillis, price]`
#[derive(Deserialize, Debug)]
struct ChartPoint(
    i64,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")] Decimal,
);

#[derive(Deserialize, Debug)]
struct MarketChartResponse {
    prices: Vec<ChartPoint>,
}

#[async_trait]
impl PriceFeed for CoinGeckoProvider {
    #[instrument(name = "CoinGeckoPriceFetch", skip(self))]
    async fn fetch_quotes(&self) -> Result<CoinQuotes, FeedError> {
        let ids: Vec<_> = Coin::ALL.iter().map(Coin::api_id).collect();
        let vs: Vec<_> = Fiat::ALL.iter().map(Fiat::api_id).collect();
        let url = format!(
            "{}/simple/price?ids={}&vs_currencies={}",
            self.base_url,
            ids.join(","),
            vs.join(",")
        );

        let data: HashMap<String, SimplePriceQuote> = self.get_json(&url).await?;

        let quotes: CoinQuotes = Coin::ALL
            .into_iter()
            .filter_map(|coin| {
                data.get(coin.api_id()).map(|q| {
                    (
                        coin,
                        CoinQuote {
                            usd: q.usd,
                            pln: q.pln,
                            eur: q.eur,
                        },
                    )
                })
            })
            .collect();
        debug!(coins = quotes.len(), "Received CoinGecko quotes");

        Ok(quotes)
    }

    #[instrument(
        name = "CoinGeckoChartFetch",
        skip(self, coin, vs),
        fields(coin = %coin, vs = %vs)
    )]
    async fn fetch_market_chart(
        &self,
        coin: Coin,
        vs: Fiat,
        days: u32,
    ) -> Result<Vec<HistoricalPoint>, FeedError> {
        let url = format!(
            "{}/coins/{}/market_chart?vs_currency={}&days={}",
            self.base_url,
            coin.api_id(),
            vs.api_id(),
            days
        );

        let data: MarketChartResponse = self.get_json(&url).await?;
        let total = data.prices.len();

        let points: Vec<HistoricalPoint> = data
            .prices
            .into_iter()
            .filter_map(|ChartPoint(ts_millis, price)| {
                let timestamp = Utc.timestamp_millis_opt(ts_millis).single()?;
                Some(HistoricalPoint { timestamp, price })
            })
            .collect();

        if points.len() < total {
            warn!(
                skipped = total - points.len(),
                "Skipped unreadable market chart points"
            );
        }

        Ok(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub async fn create_price_mock_server(status: u16, body: &str) -> MockServer {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/simple/price"))
            .and(query_param(
                "ids",
                "bitcoin,ethereum,tether,solana,dogecoin,cardano",
            ))
            .and(query_param("vs_currencies", "usd,pln,eur"))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&mock_server)
            .await;

        mock_server
    }

    #[tokio::test]
    async fn test_successful_quotes_fetch() {
        let mock_response = r#"{
            "bitcoin": {"usd": 60000.5, "pln": 240000, "eur": 55000},
            "ethereum": {"usd": 2500, "pln": 10000, "eur": 2300},
            "tether": {"usd": 1.0, "pln": 4.0, "eur": 0.92},
            "solana": {"usd": 150, "pln": 600, "eur": 138},
            "dogecoin": {"usd": 0.2, "pln": 0.8, "eur": 0.18},
            "cardano": {"usd": 0.4, "pln": 1.6, "eur": 0.37}
        }"#;
        let mock_server = create_price_mock_server(200, mock_response).await;

        let provider = CoinGeckoProvider::new(&mock_server.uri()).unwrap();
        let quotes = provider.fetch_quotes().await.unwrap();

        assert_eq!(quotes.len(), 6);
        let btc = &quotes[&Coin::Bitcoin];
        assert_eq!(btc.usd, Some(dec!(60000.5)));
        assert_eq!(btc.pln, Some(dec!(240000)));
        assert_eq!(btc.eur, Some(dec!(55000)));
        assert_eq!(quotes[&Coin::Dogecoin].usd, Some(dec!(0.2)));
    }

    #[tokio::test]
    async fn test_missing_coins_and_fields() {
        let mock_response = r#"{
            "bitcoin": {"usd": 60000},
            "ethereum": {}
        }"#;
        let mock_server = create_price_mock_server(200, mock_response).await;

        let provider = CoinGeckoProvider::new(&mock_server.uri()).unwrap();
        let quotes = provider.fetch_quotes().await.unwrap();

        assert_eq!(quotes.len(), 2);
        assert_eq!(quotes[&Coin::Bitcoin].pln, None);
        assert_eq!(quotes[&Coin::Ethereum], CoinQuote::default());
        assert!(!quotes.contains_key(&Coin::Solana));
    }

    #[tokio::test]
    async fn test_quotes_keep_every_digit() {
        let mock_response = r#"{
            "tether": {"usd": 1.000123456789012345678, "pln": 3.9876543210987654321, "eur": 0.1}
        }"#;
        let mock_server = create_price_mock_server(200, mock_response).await;

        let provider = CoinGeckoProvider::new(&mock_server.uri()).unwrap();
        let quotes = provider.fetch_quotes().await.unwrap();

        let tether = &quotes[&Coin::Tether];
        assert_eq!(tether.usd, Some(dec!(1.000123456789012345678)));
        assert_eq!(tether.pln, Some(dec!(3.9876543210987654321)));
        assert_eq!(tether.eur, Some(dec!(0.1)));
    }

    #[tokio::test]
    async fn test_rate_limited() {
        let mock_server = create_price_mock_server(429, "Too Many Requests").await;
        let provider = CoinGeckoProvider::new(&mock_server.uri()).unwrap();

        let result = provider.fetch_quotes().await;
        assert!(matches!(result, Err(FeedError::RateLimited)));
    }

    #[tokio::test]
    async fn test_server_error() {
        let mock_server = create_price_mock_server(500, "").await;
        let provider = CoinGeckoProvider::new(&mock_server.uri()).unwrap();

        let result = provider.fetch_quotes().await;
        assert!(matches!(result, Err(FeedError::Http { status: 500 })));
        assert_eq!(result.unwrap_err().to_string(), "HTTP error: 500");
    }

    #[tokio::test]
    async fn test_malformed_response() {
        let mock_server = create_price_mock_server(200, r#"{"bitcoin": "lots"}"#).await;
        let provider = CoinGeckoProvider::new(&mock_server.uri()).unwrap();

        let result = provider.fetch_quotes().await;
        assert!(matches!(result, Err(FeedError::Parse(_))));
        assert!(
            result
                .unwrap_err()
                .to_string()
                .starts_with("Failed to parse response")
        );
    }

    #[tokio::test]
    async fn test_connection_refused() {
        // Nothing listens on the discard port
        let provider = CoinGeckoProvider::new("http://127.0.0.1:9").unwrap();
        let result = provider.fetch_quotes().await;
        assert!(matches!(
            result,
            Err(FeedError::Network(_)) | Err(FeedError::Timeout)
        ));
    }

    #[tokio::test]
    async fn test_market_chart_fetch() {
        let mock_server = MockServer::start().await;
        let mock_response = r#"{
            "prices": [[1700000000000, 37000.5], [1700003600000, 37100.123456789012345]],
            "market_caps": [],
            "total_volumes": []
        }"#;

        Mock::given(method("GET"))
            .and(path("/coins/ethereum/market_chart"))
            .and(query_param("vs_currency", "pln"))
            .and(query_param("days", "14"))
            .respond_with(ResponseTemplate::new(200).set_body_string(mock_response))
            .mount(&mock_server)
            .await;

        let provider = CoinGeckoProvider::new(&mock_server.uri()).unwrap();
        let points = provider
            .fetch_market_chart(Coin::Ethereum, Fiat::Pln, 14)
            .await
            .unwrap();

        assert_eq!(points.len(), 2);
        assert_eq!(points[0].timestamp.timestamp_millis(), 1_700_000_000_000);
        assert_eq!(points[0].price, dec!(37000.5));
        assert_eq!(points[1].price, dec!(37100.123456789012345));
        assert!(points[0].timestamp < points[1].timestamp);
    }

    #[tokio::test]
    async fn test_market_chart_malformed() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/coins/bitcoin/market_chart"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"error": "coin not found"}"#))
            .mount(&mock_server)
            .await;

        let provider = CoinGeckoProvider::new(&mock_server.uri()).unwrap();
        let result = provider
            .fetch_market_chart(Coin::Bitcoin, Fiat::Usd, 7)
            .await;
        assert!(matches!(result, Err(FeedError::Parse(_))));
    }
}
