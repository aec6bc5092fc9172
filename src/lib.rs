pub mod config;
pub mod core;
pub mod log;
pub mod news;
pub mod prices;
pub mod providers;
pub mod report;
pub mod scorers;
pub mod status;
pub mod ui;

use anyhow::{bail, Result};
use futures::future::join_all;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::core::market::{MarketDataProvider, PriceOutcome};
use crate::core::news::NewsProvider;
use crate::core::retry::{RetryPolicy, RunContext};
use crate::core::sentiment::{aggregate, AggregationSettings};
use crate::news::NewsAcquirer;
use crate::prices::PriceAcquirer;
use crate::report::{AssetReport, RunReport};

pub enum AppCommand {
    Report,
    Status,
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("Crypto sentiment analyzer starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    match command {
        AppCommand::Report => run_report(&config).await,
        AppCommand::Status => run_status(&config).await,
    }
}

fn retry_policy(config: &AppConfig) -> RetryPolicy {
    RetryPolicy {
        max_retries: config.retry.max_retries,
        base_delay: std::time::Duration::from_millis(config.retry.base_delay_ms),
        backoff_factor: config.retry.backoff_factor,
        max_backoff: std::time::Duration::from_secs(config.retry.max_backoff_secs),
    }
}

/// Instantiate the price provider chain in configured order.
fn build_price_chain(config: &AppConfig) -> Result<Vec<Arc<dyn MarketDataProvider>>> {
    let timeout = config.retry.timeout();
    let endpoints = &config.providers;
    let mut chain: Vec<Arc<dyn MarketDataProvider>> = Vec::new();

    for name in config.apis.prices.order() {
        match name.as_str() {
            providers::coingecko::NAME => chain.push(Arc::new(
                providers::coingecko::CoinGeckoProvider::new(&endpoints.coingecko.base_url, timeout)?,
            )),
            providers::coincap::NAME => chain.push(Arc::new(
                providers::coincap::CoinCapProvider::new(&endpoints.coincap.base_url, timeout)?,
            )),
            providers::cryptocompare::NAME => {
                chain.push(Arc::new(providers::cryptocompare::CryptoCompareProvider::new(
                    &endpoints.cryptocompare.base_url,
                    timeout,
                )?))
            }
            other => bail!("Unknown price provider in config: {other}"),
        }
    }

    if chain.is_empty() {
        bail!("No price providers configured");
    }
    Ok(chain)
}

/// Instantiate the news provider chain in configured order. Key-gated
/// providers without a key are skipped, not errors: the RSS fallback needs
/// no credentials and keeps the chain usable out of the box.
fn build_news_chain(config: &AppConfig) -> Result<Vec<Arc<dyn NewsProvider>>> {
    let timeout = config.retry.timeout();
    let endpoints = &config.providers;
    let mut chain: Vec<Arc<dyn NewsProvider>> = Vec::new();

    for name in config.apis.news.order() {
        match name.as_str() {
            providers::newsapi::NAME => match &endpoints.newsapi.api_key {
                Some(key) => chain.push(Arc::new(providers::newsapi::NewsApiProvider::new(
                    &endpoints.newsapi.base_url,
                    key,
                    timeout,
                )?)),
                None => warn!("Skipping NewsAPI: no API key configured"),
            },
            providers::guardian::NAME => match &endpoints.guardian.api_key {
                Some(key) => chain.push(Arc::new(providers::guardian::GuardianProvider::new(
                    &endpoints.guardian.base_url,
                    key,
                    timeout,
                )?)),
                None => warn!("Skipping Guardian: no API key configured"),
            },
            providers::rss::NAME => chain.push(Arc::new(providers::rss::RssProvider::new(
                endpoints.rss.feeds.clone(),
                timeout,
            )?)),
            other => bail!("Unknown news provider in config: {other}"),
        }
    }

    if chain.is_empty() {
        bail!("No usable news providers configured");
    }
    Ok(chain)
}

async fn run_report(config: &AppConfig) -> Result<()> {
    let assets = &config.cryptocurrencies;
    let policy = retry_policy(config);
    let ctx = RunContext::new(config.retry.max_consecutive_failures);

    let price_acquirer = PriceAcquirer::new(
        build_price_chain(config)?,
        policy.clone(),
        config.retry.rate_limit_delay(),
    );
    let news_acquirer = NewsAcquirer::new(
        build_news_chain(config)?,
        policy,
        config.retry.rate_limit_delay(),
        config.news.clone(),
    );

    let pb = ui::new_progress_bar(assets.len() as u64, true);
    pb.set_message("Collecting market data and news...");

    // Prices for all assets and news per asset run concurrently; both sides
    // share the failure guard.
    let news_futures = assets.iter().map(|asset| {
        let pb = pb.clone();
        let acquirer = &news_acquirer;
        let ctx = &ctx;
        async move {
            let articles = acquirer.get_articles(asset, ctx).await;
            pb.inc(1);
            articles
        }
    });
    let (mut prices, articles_per_asset) =
        tokio::join!(price_acquirer.get_prices(assets, &ctx), join_all(news_futures));
    pb.finish_and_clear();

    if ctx.halted() {
        warn!("Run ended early: too many consecutive provider failures");
    }

    let settings = AggregationSettings {
        confidence_threshold: config.sentiment.confidence_threshold,
        label_bound: config.sentiment.label_bound,
    };
    let scorers = scorers::default_scorers();

    let mut reports = Vec::with_capacity(assets.len());
    for (asset, articles) in assets.iter().zip(articles_per_asset) {
        let sentiment = aggregate(&asset.symbol, &articles, &scorers, &settings);
        let price = prices
            .remove(&asset.symbol)
            .unwrap_or(PriceOutcome::Failed {
                reason: "no outcome recorded".to_string(),
            });
        reports.push(AssetReport {
            asset: asset.clone(),
            price,
            sentiment,
            headlines: articles,
        });
    }

    let report = RunReport::new(reports);
    println!("{}", report.display_as_table());

    let html_path = report.write_html(Path::new(&config.report.output_dir))?;
    println!(
        "\nHTML report written to {}",
        ui::style_text(&html_path.display().to_string(), ui::StyleType::Subtle)
    );

    if config.report.save_raw_data {
        let snapshot_path = report.write_snapshot(Path::new(&config.report.data_dir))?;
        info!("Raw snapshot written to {}", snapshot_path.display());
    }

    Ok(())
}

async fn run_status(config: &AppConfig) -> Result<()> {
    let statuses = status::check_providers(config).await?;
    println!("{}", status::display_as_table(&statuses));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EndpointConfig;

    fn base_config() -> AppConfig {
        let yaml = r#"---
cryptocurrencies:
  - symbol: bitcoin
    name: Bitcoin
    ticker: BTC
"#;
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_price_chain_follows_configured_order() {
        let config = base_config();
        let chain = build_price_chain(&config).unwrap();
        assert_eq!(chain.len(), 3);
        assert_eq!(chain[0].name(), "coingecko");
        assert_eq!(chain[1].name(), "coincap");
        assert_eq!(chain[2].name(), "cryptocompare");
    }

    #[test]
    fn test_unknown_price_provider_is_an_error() {
        let mut config = base_config();
        config.apis.prices.primary = "binance".to_string();
        assert!(build_price_chain(&config).is_err());
    }

    #[test]
    fn test_news_chain_skips_keyless_providers() {
        let mut config = base_config();
        config.providers.newsapi = EndpointConfig {
            base_url: "https://newsapi.org".to_string(),
            api_key: None,
        };
        config.providers.guardian = EndpointConfig {
            base_url: "https://content.guardianapis.com".to_string(),
            api_key: None,
        };

        let chain = build_news_chain(&config).unwrap();
        assert_eq!(chain.len(), 1);
        assert_eq!(chain[0].name(), "rss");
    }

    #[test]
    fn test_news_chain_includes_keyed_providers() {
        let mut config = base_config();
        config.providers.newsapi.api_key = Some("key-a".to_string());
        config.providers.guardian.api_key = Some("key-b".to_string());

        let chain = build_news_chain(&config).unwrap();
        assert_eq!(chain.len(), 3);
        assert_eq!(chain[0].name(), "newsapi");
        assert_eq!(chain[1].name(), "guardian");
        assert_eq!(chain[2].name(), "rss");
    }
}
