use anyhow::{Context, Result, bail};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use std::{fs, path::PathBuf};
use tracing::debug;

/// One tracked cryptocurrency: internal symbol (provider id), display name,
/// exchange ticker, and the terms used for news search.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Asset {
    pub symbol: String,
    pub name: String,
    pub ticker: String,
    #[serde(default)]
    pub search_terms: Vec<String>,
}

impl Asset {
    /// Terms used to search news, falling back to name and ticker when the
    /// config does not list any.
    pub fn effective_search_terms(&self) -> Vec<String> {
        if self.search_terms.is_empty() {
            vec![self.name.clone(), self.ticker.clone()]
        } else {
            self.search_terms.clone()
        }
    }
}

/// Provider order for one data domain.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ChainConfig {
    pub primary: String,
    #[serde(default)]
    pub fallbacks: Vec<String>,
}

impl ChainConfig {
    pub fn order(&self) -> Vec<String> {
        let mut order = vec![self.primary.clone()];
        order.extend(self.fallbacks.iter().cloned());
        order
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ApisConfig {
    pub prices: ChainConfig,
    pub news: ChainConfig,
}

impl Default for ApisConfig {
    fn default() -> Self {
        ApisConfig {
            prices: ChainConfig {
                primary: "coingecko".to_string(),
                fallbacks: vec!["coincap".to_string(), "cryptocompare".to_string()],
            },
            news: ChainConfig {
                primary: "newsapi".to_string(),
                fallbacks: vec!["guardian".to_string(), "rss".to_string()],
            },
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct EndpointConfig {
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
}

impl EndpointConfig {
    fn new(base_url: &str) -> Self {
        EndpointConfig {
            base_url: base_url.to_string(),
            api_key: None,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RssConfig {
    pub feeds: Vec<String>,
}

impl Default for RssConfig {
    fn default() -> Self {
        RssConfig {
            feeds: [
                "https://cointelegraph.com/rss",
                "https://cryptonews.com/news/feed",
                "https://bitcoinmagazine.com/.rss/full/",
                "https://decrypt.co/feed",
                "https://www.coindesk.com/arc/outboundfeeds/rss/",
                "https://www.newsbtc.com/feed/",
                "https://cryptoslate.com/feed/",
                "https://ambcrypto.com/feed/",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ProvidersConfig {
    pub coingecko: EndpointConfig,
    pub coincap: EndpointConfig,
    pub cryptocompare: EndpointConfig,
    pub newsapi: EndpointConfig,
    pub guardian: EndpointConfig,
    pub rss: RssConfig,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        ProvidersConfig {
            coingecko: EndpointConfig::new("https://api.coingecko.com"),
            coincap: EndpointConfig::new("https://api.coincap.io"),
            cryptocompare: EndpointConfig::new("https://min-api.cryptocompare.com"),
            newsapi: EndpointConfig::new("https://newsapi.org"),
            guardian: EndpointConfig::new("https://content.guardianapis.com"),
            rss: RssConfig::default(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct NewsConfig {
    /// Recency window in hours; older articles never reach the scorers.
    pub time_period_hours: i64,
    pub max_articles_per_crypto: usize,
    pub min_article_length: usize,
}

impl Default for NewsConfig {
    fn default() -> Self {
        NewsConfig {
            time_period_hours: 48,
            max_articles_per_crypto: 10,
            min_article_length: 80,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct SentimentConfig {
    /// Articles whose combined confidence is below this are excluded
    /// (boundary inclusive).
    pub confidence_threshold: f64,
    /// Polarity beyond +/- this bound maps to positive/negative.
    pub label_bound: f64,
}

impl Default for SentimentConfig {
    fn default() -> Self {
        SentimentConfig {
            confidence_threshold: 0.1,
            label_bound: 0.15,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub timeout_secs: u64,
    /// Courtesy pause before every provider call.
    pub rate_limit_delay_ms: u64,
    pub base_delay_ms: u64,
    pub backoff_factor: f64,
    pub max_backoff_secs: u64,
    pub max_consecutive_failures: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        RetryConfig {
            max_retries: 3,
            timeout_secs: 10,
            rate_limit_delay_ms: 250,
            base_delay_ms: 500,
            backoff_factor: 2.0,
            max_backoff_secs: 30,
            max_consecutive_failures: 8,
        }
    }
}

impl RetryConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn rate_limit_delay(&self) -> Duration {
        Duration::from_millis(self.rate_limit_delay_ms)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ReportConfig {
    pub output_dir: String,
    /// When set, the assembled per-asset records are also written as JSON.
    pub save_raw_data: bool,
    pub data_dir: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        ReportConfig {
            output_dir: "reports".to_string(),
            save_raw_data: false,
            data_dir: "data".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    pub cryptocurrencies: Vec<Asset>,
    #[serde(default)]
    pub apis: ApisConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub news: NewsConfig,
    #[serde(default)]
    pub sentiment: SentimentConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub report: ReportConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("io", "coinsense", "coinsense")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let mut config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        config.resolve_api_keys();
        config.validate()?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    /// API keys come from the environment when the config file leaves them
    /// unset. A provider with no key is skipped, not attempted.
    fn resolve_api_keys(&mut self) {
        if self.providers.newsapi.api_key.is_none() {
            if let Ok(key) = std::env::var("NEWSAPI_API_KEY") {
                self.providers.newsapi.api_key = Some(key);
            }
        }
        if self.providers.guardian.api_key.is_none() {
            if let Ok(key) = std::env::var("GUARDIAN_API_KEY") {
                self.providers.guardian.api_key = Some(key);
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.cryptocurrencies.is_empty() {
            bail!("No cryptocurrencies configured");
        }
        if self.apis.prices.primary.is_empty() {
            bail!("No primary price provider configured");
        }
        if self.apis.news.primary.is_empty() {
            bail!("No primary news provider configured");
        }
        if self.retry.timeout_secs == 0 {
            bail!("Request timeout must be positive");
        }
        if self.retry.backoff_factor < 1.0 {
            bail!("Backoff factor must be >= 1.0");
        }
        if !(0.0..=1.0).contains(&self.sentiment.confidence_threshold) {
            bail!("Confidence threshold must be within 0.0..=1.0");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_deserialization_with_defaults() {
        let yaml_str = r#"
cryptocurrencies:
  - symbol: "bitcoin"
    name: "Bitcoin"
    ticker: "BTC"
    search_terms: ["bitcoin", "btc"]
  - symbol: "solana"
    name: "Solana"
    ticker: "SOL"
"#;

        let config: AppConfig = serde_yaml::from_str(yaml_str).expect("Failed to deserialize");
        assert_eq!(config.cryptocurrencies.len(), 2);
        assert_eq!(config.cryptocurrencies[0].symbol, "bitcoin");
        assert_eq!(
            config.cryptocurrencies[0].effective_search_terms(),
            vec!["bitcoin".to_string(), "btc".to_string()]
        );
        // Unset search terms fall back to name and ticker.
        assert_eq!(
            config.cryptocurrencies[1].effective_search_terms(),
            vec!["Solana".to_string(), "SOL".to_string()]
        );

        assert_eq!(config.apis.prices.primary, "coingecko");
        assert_eq!(config.apis.news.order(), vec!["newsapi", "guardian", "rss"]);
        assert_eq!(config.news.time_period_hours, 48);
        assert_eq!(config.sentiment.confidence_threshold, 0.1);
        assert_eq!(config.retry.max_retries, 3);
        assert_eq!(
            config.providers.coingecko.base_url,
            "https://api.coingecko.com"
        );
        assert_eq!(config.providers.rss.feeds.len(), 8);
    }

    #[test]
    fn test_config_overrides() {
        let yaml_str = r#"
cryptocurrencies:
  - symbol: "ethereum"
    name: "Ethereum"
    ticker: "ETH"
apis:
  prices:
    primary: "coincap"
    fallbacks: ["coingecko"]
  news:
    primary: "guardian"
providers:
  coincap:
    base_url: "http://localhost:9000"
  newsapi:
    base_url: "https://newsapi.org"
    api_key: "from-config"
retry:
  max_retries: 5
  rate_limit_delay_ms: 0
"#;
        let config: AppConfig = serde_yaml::from_str(yaml_str).unwrap();
        assert_eq!(config.apis.prices.order(), vec!["coincap", "coingecko"]);
        assert_eq!(config.apis.news.order(), vec!["guardian"]);
        assert_eq!(config.providers.coincap.base_url, "http://localhost:9000");
        assert_eq!(
            config.providers.newsapi.api_key.as_deref(),
            Some("from-config")
        );
        assert_eq!(config.retry.max_retries, 5);
        assert_eq!(config.retry.rate_limit_delay(), Duration::ZERO);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let yaml_str = r#"
cryptocurrencies:
  - symbol: "bitcoin"
    name: "Bitcoin"
    ticker: "BTC"
retry:
  timeout_secs: 0
"#;
        let config: AppConfig = serde_yaml::from_str(yaml_str).unwrap();
        assert!(config.validate().is_err());

        let config: AppConfig = serde_yaml::from_str("cryptocurrencies: []").unwrap();
        assert!(config.validate().is_err());
    }
}
