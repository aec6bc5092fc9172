//! NewsAPI `everything` search. Requires an API key; without one the chain
//! builder skips this provider entirely.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::core::error::FetchError;
use crate::core::news::{Article, NewsProvider, NewsQuery};
use crate::providers::http_client;

pub const NAME: &str = "newsapi";

pub struct NewsApiProvider {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl NewsApiProvider {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self> {
        Ok(NewsApiProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            client: http_client(timeout)?,
        })
    }
}

#[derive(Deserialize, Debug)]
struct SearchResponse {
    status: String,
    #[serde(default)]
    articles: Vec<ArticleItem>,
}

#[derive(Deserialize, Debug)]
struct ArticleItem {
    title: Option<String>,
    description: Option<String>,
    content: Option<String>,
    url: Option<String>,
    #[serde(rename = "publishedAt")]
    published_at: Option<String>,
    source: Option<SourceItem>,
}

#[derive(Deserialize, Debug)]
struct SourceItem {
    name: Option<String>,
}

#[async_trait]
impl NewsProvider for NewsApiProvider {
    fn name(&self) -> &'static str {
        NAME
    }

    #[instrument(name = "NewsApiSearch", skip(self, query))]
    async fn search(&self, query: &NewsQuery) -> Result<Vec<Article>, FetchError> {
        let q = query.terms.join(" OR ");
        let url = format!("{}/v2/everything", self.base_url);
        debug!("Searching news at {} for {:?}", url, q);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("q", q.as_str()),
                ("language", "en"),
                ("sortBy", "publishedAt"),
                ("pageSize", query.page_size.min(100).to_string().as_str()),
                (
                    "from",
                    query.since.format("%Y-%m-%dT%H:%M:%SZ").to_string().as_str(),
                ),
                ("apiKey", self.api_key.as_str()),
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
        let parsed: SearchResponse = serde_json::from_str(&text)
            .map_err(|e| FetchError::invalid(NAME, format!("unexpected body: {e}")))?;

        if parsed.status != "ok" {
            return Err(FetchError::invalid(
                NAME,
                format!("response status {:?}", parsed.status),
            ));
        }

        let articles = parsed
            .articles
            .into_iter()
            .filter_map(|item| {
                // Articles with no parseable timestamp or no text at all are
                // untrusted noise; drop them here.
                let published_at = item
                    .published_at
                    .as_deref()
                    .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
                    .map(|dt| dt.with_timezone(&Utc))?;
                let body = item.content.or(item.description)?;
                Some(Article {
                    title: item.title.unwrap_or_default(),
                    body,
                    url: item.url.unwrap_or_default(),
                    source: item
                        .source
                        .and_then(|s| s.name)
                        .unwrap_or_else(|| "Unknown".to_string()),
                    provider: NAME.to_string(),
                    published_at,
                })
            })
            .collect();

        Ok(articles)
    }
}
