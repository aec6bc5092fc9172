//! CoinGecko market data. The one batch-capable price provider: a single
//! `coins/markets` call covers the whole asset list.

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::config::Asset;
use crate::core::error::FetchError;
use crate::core::market::{MarketDataProvider, PriceRecord, QUOTE_CURRENCY};
use crate::providers::http_client;

pub const NAME: &str = "coingecko";

pub struct CoinGeckoProvider {
    base_url: String,
    client: reqwest::Client,
}

impl CoinGeckoProvider {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        Ok(CoinGeckoProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: http_client(timeout)?,
        })
    }
}

#[derive(Deserialize, Debug)]
struct MarketItem {
    id: String,
    current_price: Option<f64>,
    price_change_percentage_24h: Option<f64>,
    total_volume: Option<f64>,
}

#[async_trait]
impl MarketDataProvider for CoinGeckoProvider {
    fn name(&self) -> &'static str {
        NAME
    }

    fn batch_capable(&self) -> bool {
        true
    }

    #[instrument(name = "CoinGeckoFetch", skip(self, assets))]
    async fn fetch_quotes(&self, assets: &[Asset]) -> Result<Vec<PriceRecord>, FetchError> {
        let ids: Vec<&str> = assets.iter().map(|a| a.symbol.as_str()).collect();
        let url = format!("{}/api/v3/coins/markets", self.base_url);
        debug!("Requesting market data from {}", url);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("vs_currency", QUOTE_CURRENCY.to_lowercase().as_str()),
                ("ids", ids.join(",").as_str()),
                ("order", "market_cap_desc"),
                ("price_change_percentage", "24h"),
            ])
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(NAME, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::from_status(NAME, status));
        }

        let text = response
            .text()
            .await
            .map_err(|e| FetchError::from_reqwest(NAME, e))?;
        let items: Vec<MarketItem> = serde_json::from_str(&text)
            .map_err(|e| FetchError::invalid(NAME, format!("unexpected body: {e}")))?;

        let fetched_at = Utc::now();
        let mut records = Vec::new();
        for item in items {
            // Unknown ids in the response are ignored; assets the provider
            // skipped simply stay unresolved for the caller.
            if !assets.iter().any(|a| a.symbol == item.id) {
                continue;
            }
            let Some(price) = item.current_price else {
                continue;
            };
            let record = PriceRecord {
                symbol: item.id,
                price,
                change_pct_24h: item.price_change_percentage_24h,
                volume_24h: item.total_volume.unwrap_or(0.0),
                currency: QUOTE_CURRENCY.to_string(),
                source: NAME.to_string(),
                fetched_at,
            }
            .validate()
            .map_err(|msg| FetchError::invalid(NAME, msg))?;
            records.push(record);
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::FetchErrorKind;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn asset(symbol: &str, ticker: &str) -> Asset {
        Asset {
            symbol: symbol.to_string(),
            name: symbol.to_string(),
            ticker: ticker.to_string(),
            search_terms: vec![],
        }
    }

    async fn mock_markets(body: &str, status: u16) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v3/coins/markets"))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn test_successful_batch_fetch() {
        let body = r#"[
            {"id": "bitcoin", "current_price": 64250.5, "price_change_percentage_24h": 2.1, "total_volume": 32000000000.0},
            {"id": "ethereum", "current_price": 3150.0, "price_change_percentage_24h": -1.4, "total_volume": 15000000000.0}
        ]"#;
        let server = mock_markets(body, 200).await;

        let provider =
            CoinGeckoProvider::new(&server.uri(), Duration::from_secs(5)).unwrap();
        let assets = vec![asset("bitcoin", "BTC"), asset("ethereum", "ETH")];
        let records = provider.fetch_quotes(&assets).await.unwrap();

        assert_eq!(records.len(), 2);
        let btc = records.iter().find(|r| r.symbol == "bitcoin").unwrap();
        assert_eq!(btc.price, 64250.5);
        assert_eq!(btc.change_pct_24h, Some(2.1));
        assert_eq!(btc.currency, "USD");
        assert_eq!(btc.source, "coingecko");
    }

    #[tokio::test]
    async fn test_query_includes_requested_ids() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v3/coins/markets"))
            .and(query_param("ids", "bitcoin,solana"))
            .and(query_param("vs_currency", "usd"))
            .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
            .mount(&server)
            .await;

        let provider =
            CoinGeckoProvider::new(&server.uri(), Duration::from_secs(5)).unwrap();
        let assets = vec![asset("bitcoin", "BTC"), asset("solana", "SOL")];
        let records = provider.fetch_quotes(&assets).await.unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_rate_limit_maps_to_rate_limited_kind() {
        let server = mock_markets("slow down", 429).await;
        let provider =
            CoinGeckoProvider::new(&server.uri(), Duration::from_secs(5)).unwrap();
        let err = provider
            .fetch_quotes(&[asset("bitcoin", "BTC")])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), FetchErrorKind::RateLimited);
    }

    #[tokio::test]
    async fn test_malformed_body_is_invalid_response() {
        let server = mock_markets(r#"{"unexpected": true}"#, 200).await;
        let provider =
            CoinGeckoProvider::new(&server.uri(), Duration::from_secs(5)).unwrap();
        let err = provider
            .fetch_quotes(&[asset("bitcoin", "BTC")])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), FetchErrorKind::InvalidResponse);
    }

    #[tokio::test]
    async fn test_negative_price_is_rejected() {
        let body = r#"[{"id": "bitcoin", "current_price": -5.0, "total_volume": 10.0}]"#;
        let server = mock_markets(body, 200).await;
        let provider =
            CoinGeckoProvider::new(&server.uri(), Duration::from_secs(5)).unwrap();
        let err = provider
            .fetch_quotes(&[asset("bitcoin", "BTC")])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), FetchErrorKind::InvalidResponse);
    }
}
