//! Guardian content search. One request per search term since the API has no
//! OR operator in its plain query field; results are merged.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::core::error::FetchError;
use crate::core::news::{Article, NewsProvider, NewsQuery};
use crate::providers::http_client;

pub const NAME: &str = "guardian";

pub struct GuardianProvider {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl GuardianProvider {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self> {
        Ok(GuardianProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            client: http_client(timeout)?,
        })
    }
}

#[derive(Deserialize, Debug)]
struct SearchEnvelope {
    response: SearchResponse,
}

#[derive(Deserialize, Debug)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<ResultItem>,
}

#[derive(Deserialize, Debug)]
struct ResultItem {
    #[serde(rename = "webTitle")]
    web_title: Option<String>,
    #[serde(rename = "webUrl")]
    web_url: Option<String>,
    #[serde(rename = "webPublicationDate")]
    web_publication_date: Option<String>,
    fields: Option<FieldsItem>,
}

#[derive(Deserialize, Debug)]
struct FieldsItem {
    headline: Option<String>,
    #[serde(rename = "trailText")]
    trail_text: Option<String>,
    #[serde(rename = "bodyText")]
    body_text: Option<String>,
}

#[async_trait]
impl NewsProvider for GuardianProvider {
    fn name(&self) -> &'static str {
        NAME
    }

    #[instrument(name = "GuardianSearch", skip(self, query))]
    async fn search(&self, query: &NewsQuery) -> Result<Vec<Article>, FetchError> {
        let url = format!("{}/search", self.base_url);
        let mut articles = Vec::new();

        for term in &query.terms {
            // Bare tickers match too much sport and finance noise; anchor the
            // query to the crypto context.
            let q = format!("\"{term}\" cryptocurrency");
            debug!("Searching Guardian at {} for {:?}", url, q);

            let response = self
                .client
                .get(&url)
                .query(&[
                    ("q", q.as_str()),
                    ("from-date", query.since.format("%Y-%m-%d").to_string().as_str()),
                    ("show-fields", "headline,trailText,bodyText"),
                    ("page-size", "50"),
                    ("order-by", "newest"),
                    ("api-key", self.api_key.as_str()),
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
            let parsed: SearchEnvelope = serde_json::from_str(&text)
                .map_err(|e| FetchError::invalid(NAME, format!("unexpected body: {e}")))?;

            for item in parsed.response.results {
                let Some(published_at) = item
                    .web_publication_date
                    .as_deref()
                    .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
                    .map(|dt| dt.with_timezone(&Utc))
                else {
                    continue;
                };

                let fields = item.fields;
                let title = fields
                    .as_ref()
                    .and_then(|f| f.headline.clone())
                    .or(item.web_title)
                    .unwrap_or_default();
                let body = fields
                    .as_ref()
                    .and_then(|f| f.body_text.clone())
                    .or_else(|| fields.as_ref().and_then(|f| f.trail_text.clone()))
                    .unwrap_or_else(|| title.clone());

                articles.push(Article {
                    title,
                    body,
                    url: item.web_url.unwrap_or_default(),
                    source: "The Guardian".to_string(),
                    provider: NAME.to_string(),
                    published_at,
                });
            }

            if articles.len() >= query.page_size {
                break;
            }
        }

        Ok(articles)
    }
}
