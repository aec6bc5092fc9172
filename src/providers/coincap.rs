//! CoinCap asset lookup. One call per asset; numeric fields arrive as JSON
//! strings and must be parsed before validation.

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

pub const NAME: &str = "coincap";

pub struct CoinCapProvider {
    base_url: String,
    client: reqwest::Client,
}

impl CoinCapProvider {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        Ok(CoinCapProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: http_client(timeout)?,
        })
    }
}

#[derive(Deserialize, Debug)]
struct AssetResponse {
    data: AssetData,
}

#[derive(Deserialize, Debug)]
struct AssetData {
    #[serde(rename = "priceUsd")]
    price_usd: String,
    #[serde(rename = "changePercent24Hr")]
    change_percent_24h: Option<String>,
    #[serde(rename = "volumeUsd24Hr")]
    volume_usd_24h: Option<String>,
}

fn parse_field(value: &str, field: &str) -> Result<f64, FetchError> {
    value
        .parse::<f64>()
        .map_err(|_| FetchError::invalid(NAME, format!("non-numeric {field}: {value:?}")))
}

#[async_trait]
impl MarketDataProvider for CoinCapProvider {
    fn name(&self) -> &'static str {
        NAME
    }

    #[instrument(name = "CoinCapFetch", skip(self, assets))]
    async fn fetch_quotes(&self, assets: &[Asset]) -> Result<Vec<PriceRecord>, FetchError> {
        // Not batch-capable: the acquirer calls with one asset at a time.
        let Some(asset) = assets.first() else {
            return Ok(Vec::new());
        };

        let url = format!("{}/v2/assets/{}", self.base_url, asset.symbol);
        debug!("Requesting asset data from {}", url);

        let response = self
            .client
            .get(&url)
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
        let parsed: AssetResponse = serde_json::from_str(&text)
            .map_err(|e| FetchError::invalid(NAME, format!("unexpected body: {e}")))?;

        let data = parsed.data;
        let price = parse_field(&data.price_usd, "priceUsd")?;
        let change_pct_24h = data
            .change_percent_24h
            .as_deref()
            .map(|v| parse_field(v, "changePercent24Hr"))
            .transpose()?;
        let volume_24h = data
            .volume_usd_24h
            .as_deref()
            .map(|v| parse_field(v, "volumeUsd24Hr"))
            .transpose()?
            .unwrap_or(0.0);

        let record = PriceRecord {
            symbol: asset.symbol.clone(),
            price,
            change_pct_24h,
            volume_24h,
            currency: QUOTE_CURRENCY.to_string(),
            source: NAME.to_string(),
            fetched_at: Utc::now(),
        }
        .validate()
        .map_err(|msg| FetchError::invalid(NAME, msg))?;

        Ok(vec![record])
    }
}
