//! News acquisition over an ordered provider chain, one walk per asset.
//!
//! A provider call only settles the asset when it yields articles that
//! survive the qualifying filters. A successful call with nothing usable
//! advances the chain the same way a failure would, but without feeding
//! the failure guard. An asset ending the chain empty-handed is a normal
//! outcome, scored downstream as insufficient data.

use std::sync::Arc;
use std::time::Duration;
use chrono::Utc;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::{Asset, NewsConfig};
use crate::core::news::{qualify, Article, NewsProvider, NewsQuery};
use crate::core::retry::{RetryAction, RetryPolicy, RunContext};

pub struct NewsAcquirer {
    providers: Vec<Arc<dyn NewsProvider>>,
    policy: RetryPolicy,
    rate_limit_delay: Duration,
    settings: NewsConfig,
}

impl NewsAcquirer {
    pub fn new(
        providers: Vec<Arc<dyn NewsProvider>>,
        policy: RetryPolicy,
        rate_limit_delay: Duration,
        settings: NewsConfig,
    ) -> Self {
        NewsAcquirer {
            providers,
            policy,
            rate_limit_delay,
            settings,
        }
    }

    /// Collect qualified articles for one asset. Empty only when the whole
    /// chain produced nothing usable.
    pub async fn get_articles(&self, asset: &Asset, ctx: &RunContext) -> Vec<Article> {
        let since = Utc::now() - chrono::Duration::hours(self.settings.time_period_hours);
        let query = NewsQuery {
            terms: asset.effective_search_terms(),
            since,
            page_size: self.settings.max_articles_per_crypto.max(10) * 3,
        };

        for (index, provider) in self.providers.iter().enumerate() {
            if ctx.halted() {
                warn!("Failure guard tripped; skipping remaining news providers");
                break;
            }
            let is_last = index == self.providers.len() - 1;

            let Some(raw) = self
                .call_with_retry(provider.as_ref(), &query, ctx, is_last)
                .await
            else {
                continue;
            };

            let qualified = qualify(
                raw,
                since,
                self.settings.min_article_length,
                self.settings.max_articles_per_crypto,
            );
            if qualified.is_empty() {
                debug!(
                    "{} returned no qualifying articles for {}; advancing",
                    provider.name(),
                    asset.symbol
                );
                continue;
            }

            info!(
                "Collected {} article(s) for {} from {}",
                qualified.len(),
                asset.symbol,
                provider.name()
            );
            return qualified;
        }

        warn!("No qualifying articles found for {}", asset.symbol);
        Vec::new()
    }

    async fn call_with_retry(
        &self,
        provider: &dyn NewsProvider,
        query: &NewsQuery,
        ctx: &RunContext,
        is_last: bool,
    ) -> Option<Vec<Article>> {
        let mut attempt: u32 = 0;
        loop {
            if ctx.halted() {
                return None;
            }
            sleep(self.rate_limit_delay).await;

            match provider.search(query).await {
                Ok(articles) => {
                    ctx.record_success();
                    return Some(articles);
                }
                Err(err) => {
                    ctx.record_failure();
                    match self.policy.next_action(err.kind(), attempt, is_last) {
                        RetryAction::Retry(delay) => {
                            debug!(
                                "Attempt {} against {} failed: {}. Retrying in {:?}",
                                attempt + 1,
                                provider.name(),
                                err,
                                delay
                            );
                            ctx.record_backoff(delay);
                            sleep(delay).await;
                            attempt += 1;
                        }
                        RetryAction::Advance => {
                            warn!("Advancing past {}: {}", provider.name(), err);
                            return None;
                        }
                        RetryAction::GiveUp => {
                            warn!("Giving up on {}: {}", provider.name(), err);
                            return None;
                        }
                    }
                }
            }
        }
    }
}
