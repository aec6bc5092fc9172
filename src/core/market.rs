//! Market data abstractions and core types

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::Asset;
use crate::core::error::FetchError;

/// Quote currency every provider payload is normalized into.
pub const QUOTE_CURRENCY: &str = "USD";

#[derive(Debug, Clone, Serialize)]
pub struct PriceRecord {
    pub symbol: String,
    pub price: f64,
    pub change_pct_24h: Option<f64>,
    pub volume_24h: f64,
    pub currency: String,
    pub source: String,
    pub fetched_at: DateTime<Utc>,
}

impl PriceRecord {
    /// Rejects records a provider filled with garbage instead of data. A
    /// failed asset must surface as [`PriceOutcome::Failed`], never as a
    /// record with sentinel values.
    pub fn validate(self) -> Result<Self, String> {
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(format!("invalid price {} for {}", self.price, self.symbol));
        }
        if !self.volume_24h.is_finite() || self.volume_24h < 0.0 {
            return Err(format!(
                "invalid 24h volume {} for {}",
                self.volume_24h, self.symbol
            ));
        }
        Ok(self)
    }
}

/// Per-asset result of a full pass over the provider chain.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PriceOutcome {
    Quote(PriceRecord),
    Failed { reason: String },
}

impl PriceOutcome {
    pub fn as_quote(&self) -> Option<&PriceRecord> {
        match self {
            PriceOutcome::Quote(record) => Some(record),
            PriceOutcome::Failed { .. } => None,
        }
    }
}

#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether one call can resolve the whole asset list. Providers without
    /// batch lookups are called once per asset by the acquirer.
    fn batch_capable(&self) -> bool {
        false
    }

    /// Fetch quotes for the given assets. May return fewer records than
    /// requested; unresolved assets fall through to the next provider.
    async fn fetch_quotes(&self, assets: &[Asset]) -> Result<Vec<PriceRecord>, FetchError>;
}
