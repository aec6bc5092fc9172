//! News abstractions: article shape, provider trait, qualifying filters.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::core::error::FetchError;

#[derive(Debug, Clone, Serialize)]
pub struct Article {
    pub title: String,
    pub body: String,
    pub url: String,
    /// Publication name as reported by the provider.
    pub source: String,
    /// Provider that fetched the article.
    pub provider: String,
    pub published_at: DateTime<Utc>,
}

/// Search request handed to every news provider in the chain.
#[derive(Debug, Clone)]
pub struct NewsQuery {
    /// OR-combined when the provider supports a query language.
    pub terms: Vec<String>,
    pub since: DateTime<Utc>,
    pub page_size: usize,
}

#[async_trait]
pub trait NewsProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn search(&self, query: &NewsQuery) -> Result<Vec<Article>, FetchError>;
}

/// Drops articles outside the recency window or below the body length
/// threshold, orders most recent first and truncates to `max_articles`.
pub fn qualify(
    mut articles: Vec<Article>,
    since: DateTime<Utc>,
    min_body_len: usize,
    max_articles: usize,
) -> Vec<Article> {
    articles.retain(|a| a.published_at >= since && a.body.len() >= min_body_len);
    articles.sort_by(|a, b| b.published_at.cmp(&a.published_at));
    articles.truncate(max_articles);
    articles
}
