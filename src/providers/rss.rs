//! RSS feed fallback. No API key and no query language: every configured
//! feed is pulled and items are kept when a search term appears in the title
//! or summary. Individual feed failures are logged and skipped so one dead
//! feed cannot sink the whole fallback.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rss::Channel;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::core::error::FetchError;
use crate::core::news::{Article, NewsProvider, NewsQuery};
use crate::providers::http_client;

pub const NAME: &str = "rss";

pub struct RssProvider {
    feeds: Vec<String>,
    client: reqwest::Client,
}

impl RssProvider {
    pub fn new(feeds: Vec<String>, timeout: Duration) -> Result<Self> {
        Ok(RssProvider {
            feeds,
            client: http_client(timeout)?,
        })
    }

    async fn fetch_feed(&self, feed_url: &str) -> Result<Channel, FetchError> {
        debug!("Fetching RSS feed {}", feed_url);
        let response = self
            .client
            .get(feed_url)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(NAME, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::from_status(NAME, status));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::from_reqwest(NAME, e))?;
        Channel::read_from(&bytes[..])
            .map_err(|e| FetchError::invalid(NAME, format!("feed parse error: {e}")))
    }
}

fn matches_terms(item_text: &str, terms: &[String]) -> bool {
    let haystack = item_text.to_lowercase();
    terms.iter().any(|t| haystack.contains(&t.to_lowercase()))
}

fn parse_pub_date(raw: Option<&str>) -> Option<DateTime<Utc>> {
    raw.and_then(|ts| DateTime::parse_from_rfc2822(ts).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

#[async_trait]
impl NewsProvider for RssProvider {
    fn name(&self) -> &'static str {
        NAME
    }

    #[instrument(name = "RssSearch", skip(self, query))]
    async fn search(&self, query: &NewsQuery) -> Result<Vec<Article>, FetchError> {
        let mut articles = Vec::new();

        for feed_url in &self.feeds {
            if articles.len() >= query.page_size {
                break;
            }

            let channel = match self.fetch_feed(feed_url).await {
                Ok(channel) => channel,
                Err(err) => {
                    warn!("Skipping feed {}: {}", feed_url, err);
                    continue;
                }
            };

            let publication = if channel.title().is_empty() {
                "RSS Feed".to_string()
            } else {
                channel.title().to_string()
            };

            for item in channel.items() {
                let title = item.title().unwrap_or_default();
                let summary = item.description().unwrap_or_default();
                if !matches_terms(&format!("{title} {summary}"), &query.terms) {
                    continue;
                }

                // Items without a parseable date cannot be window-checked,
                // so they are dropped.
                let Some(published_at) = parse_pub_date(item.pub_date()) else {
                    continue;
                };
                if published_at < query.since {
                    continue;
                }

                articles.push(Article {
                    title: title.to_string(),
                    body: summary.to_string(),
                    url: item.link().unwrap_or_default().to_string(),
                    source: publication.clone(),
                    provider: NAME.to_string(),
                    published_at,
                });
            }
        }

        Ok(articles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn feed_body(pub_date: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Test Crypto Wire</title>
    <link>https://example.com</link>
    <description>test feed</description>
    <item>
      <title>Bitcoin rallies past resistance</title>
      <link>https://example.com/btc-rally</link>
      <description>Bitcoin extended its gains in heavy trading volume today.</description>
      <pubDate>{pub_date}</pubDate>
    </item>
    <item>
      <title>Football transfer news</title>
      <link>https://example.com/football</link>
      <description>Nothing about digital assets here.</description>
      <pubDate>{pub_date}</pubDate>
    </item>
  </channel>
</rss>"#
        )
    }

    fn query(terms: &[&str]) -> NewsQuery {
        NewsQuery {
            terms: terms.iter().map(|t| t.to_string()).collect(),
            since: Utc::now() - ChronoDuration::hours(48),
            page_size: 10,
        }
    }

    #[tokio::test]
    async fn test_keyword_filtering_keeps_relevant_items() {
        let pub_date = Utc::now().to_rfc2822();
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/feed"))
            .respond_with(ResponseTemplate::new(200).set_body_string(feed_body(&pub_date)))
            .mount(&server)
            .await;

        let provider = RssProvider::new(
            vec![format!("{}/feed", server.uri())],
            Duration::from_secs(5),
        )
        .unwrap();
        let articles = provider.search(&query(&["bitcoin"])).await.unwrap();

        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].title, "Bitcoin rallies past resistance");
        assert_eq!(articles[0].source, "Test Crypto Wire");
        assert_eq!(articles[0].provider, "rss");
    }

    #[tokio::test]
    async fn test_stale_items_are_dropped() {
        let pub_date = (Utc::now() - ChronoDuration::hours(100)).to_rfc2822();
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/feed"))
            .respond_with(ResponseTemplate::new(200).set_body_string(feed_body(&pub_date)))
            .mount(&server)
            .await;

        let provider = RssProvider::new(
            vec![format!("{}/feed", server.uri())],
            Duration::from_secs(5),
        )
        .unwrap();
        let articles = provider.search(&query(&["bitcoin"])).await.unwrap();
        assert!(articles.is_empty());
    }

    #[tokio::test]
    async fn test_broken_feed_is_skipped_not_fatal() {
        let pub_date = Utc::now().to_rfc2822();
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/broken"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not xml at all"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/good"))
            .respond_with(ResponseTemplate::new(200).set_body_string(feed_body(&pub_date)))
            .mount(&server)
            .await;

        let provider = RssProvider::new(
            vec![
                format!("{}/broken", server.uri()),
                format!("{}/good", server.uri()),
            ],
            Duration::from_secs(5),
        )
        .unwrap();
        let articles = provider.search(&query(&["bitcoin"])).await.unwrap();
        assert_eq!(articles.len(), 1);
    }

    #[tokio::test]
    async fn test_no_feeds_yields_empty() {
        let provider = RssProvider::new(vec![], Duration::from_secs(5)).unwrap();
        let articles = provider.search(&query(&["bitcoin"])).await.unwrap();
        assert!(articles.is_empty());
    }
}
