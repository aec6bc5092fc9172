//! HTTP clients for the configured data providers.

pub mod coincap;
pub mod coingecko;
pub mod cryptocompare;
pub mod guardian;
pub mod newsapi;
pub mod rss;

use std::time::Duration;

pub(crate) const USER_AGENT: &str = concat!("coinsense/", env!("CARGO_PKG_VERSION"));

/// Shared reqwest client setup. Timeout must be positive; config validation
/// guarantees it before any provider is constructed.
pub(crate) fn http_client(timeout: Duration) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
}
