//! CryptoCompare quotes via `pricemultifull`, which carries price, 24h
//! change and volume in one payload. Keyed by exchange ticker rather than
//! the internal symbol.

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::config::Asset;
use crate::core::error::FetchError;
use crate::core::market::{MarketDataProvider, PriceRecord, QUOTE_CURRENCY};
use crate::providers::http_client;

pub const NAME: &str = "cryptocompare";

pub struct CryptoCompareProvider {
    base_url: String,
    client: reqwest::Client,
}

impl CryptoCompareProvider {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        Ok(CryptoCompareProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: http_client(timeout)?,
        })
    }
}

#[derive(Deserialize, Debug)]
struct PriceMultiFullResponse {
    #[serde(rename = "RAW")]
    raw: Option<HashMap<String, HashMap<String, RawQuote>>>,
}

#[derive(Deserialize, Debug)]
struct RawQuote {
    #[serde(rename = "PRICE")]
    price: f64,
    #[serde(rename = "CHANGEPCT24HOUR")]
    change_pct_24h: Option<f64>,
    #[serde(rename = "VOLUME24HOURTO")]
    volume_24h_to: Option<f64>,
}

#[async_trait]
impl MarketDataProvider for CryptoCompareProvider {
    fn name(&self) -> &'static str {
        NAME
    }

    #[instrument(name = "CryptoCompareFetch", skip(self, assets))]
    async fn fetch_quotes(&self, assets: &[Asset]) -> Result<Vec<PriceRecord>, FetchError> {
        // Not batch-capable: the acquirer calls with one asset at a time.
        let Some(asset) = assets.first() else {
            return Ok(Vec::new());
        };

        let url = format!("{}/data/pricemultifull", self.base_url);
        debug!("Requesting quote from {} for {}", url, asset.ticker);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("fsyms", asset.ticker.as_str()),
                ("tsyms", QUOTE_CURRENCY),
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
        let parsed: PriceMultiFullResponse = serde_json::from_str(&text)
            .map_err(|e| FetchError::invalid(NAME, format!("unexpected body: {e}")))?;

        // CryptoCompare reports errors as 200 with no RAW section.
        let quote = parsed
            .raw
            .as_ref()
            .and_then(|raw| raw.get(&asset.ticker))
            .and_then(|by_currency| by_currency.get(QUOTE_CURRENCY))
            .ok_or_else(|| {
                FetchError::invalid(NAME, format!("no quote for {} in response", asset.ticker))
            })?;

        let record = PriceRecord {
            symbol: asset.symbol.clone(),
            price: quote.price,
            change_pct_24h: quote.change_pct_24h,
            volume_24h: quote.volume_24h_to.unwrap_or(0.0),
            currency: QUOTE_CURRENCY.to_string(),
            source: NAME.to_string(),
            fetched_at: Utc::now(),
        }
        .validate()
        .map_err(|msg| FetchError::invalid(NAME, msg))?;

        Ok(vec![record])
    }
}
