//! Crypto price acquisition over an ordered provider chain.
//!
//! Each asset walks the chain until some provider yields a valid record or
//! the chain is exhausted. Batch-capable providers resolve all outstanding
//! assets in one call; the rest are queried per asset. Transient failures
//! are retried in place per the policy, everything else advances the chain.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::Asset;
use crate::core::market::{MarketDataProvider, PriceOutcome, PriceRecord};
use crate::core::retry::{RetryAction, RetryPolicy, RunContext};

pub struct PriceAcquirer {
    providers: Vec<Arc<dyn MarketDataProvider>>,
    policy: RetryPolicy,
    rate_limit_delay: Duration,
}

impl PriceAcquirer {
    pub fn new(
        providers: Vec<Arc<dyn MarketDataProvider>>,
        policy: RetryPolicy,
        rate_limit_delay: Duration,
    ) -> Self {
        PriceAcquirer {
            providers,
            policy,
            rate_limit_delay,
        }
    }

    /// Resolve a price record (or a terminal failure) for every asset.
    /// Different assets may be answered by different providers in one run.
    pub async fn get_prices(
        &self,
        assets: &[Asset],
        ctx: &RunContext,
    ) -> HashMap<String, PriceOutcome> {
        let mut resolved: HashMap<String, PriceOutcome> = HashMap::new();
        let mut pending: Vec<Asset> = assets.to_vec();

        for (index, provider) in self.providers.iter().enumerate() {
            if pending.is_empty() {
                break;
            }
            if ctx.halted() {
                warn!("Failure guard tripped; skipping remaining price providers");
                break;
            }
            let is_last = index == self.providers.len() - 1;

            if provider.batch_capable() {
                match self
                    .call_with_retry(provider.as_ref(), &pending, ctx, is_last)
                    .await
                {
                    Some(records) => {
                        for record in records {
                            pending.retain(|a| a.symbol != record.symbol);
                            resolved.insert(record.symbol.clone(), PriceOutcome::Quote(record));
                        }
                    }
                    None => continue,
                }
            } else {
                let mut still_pending = Vec::new();
                for asset in pending {
                    if ctx.halted() {
                        still_pending.push(asset);
                        continue;
                    }
                    let batch = std::slice::from_ref(&asset);
                    match self
                        .call_with_retry(provider.as_ref(), batch, ctx, is_last)
                        .await
                    {
                        Some(records) if !records.is_empty() => {
                            for record in records {
                                resolved
                                    .insert(record.symbol.clone(), PriceOutcome::Quote(record));
                            }
                        }
                        _ => still_pending.push(asset),
                    }
                }
                pending = still_pending;
            }

            if !pending.is_empty() {
                debug!(
                    "{} asset(s) unresolved after provider {}",
                    pending.len(),
                    provider.name()
                );
            }
        }

        for asset in pending {
            warn!("No provider produced a price for {}", asset.symbol);
            resolved.insert(
                asset.symbol.clone(),
                PriceOutcome::Failed {
                    reason: "all providers exhausted".to_string(),
                },
            );
        }

        info!(
            "Price acquisition finished: {}/{} assets resolved",
            resolved
                .values()
                .filter(|o| o.as_quote().is_some())
                .count(),
            assets.len()
        );
        resolved
    }

    /// One provider, one asset batch: retry transient failures in place until
    /// the policy says to move on. `None` means this provider is done for.
    async fn call_with_retry(
        &self,
        provider: &dyn MarketDataProvider,
        assets: &[Asset],
        ctx: &RunContext,
        is_last: bool,
    ) -> Option<Vec<PriceRecord>> {
        let mut attempt: u32 = 0;
        loop {
            if ctx.halted() {
                return None;
            }
            sleep(self.rate_limit_delay).await;

            match provider.fetch_quotes(assets).await {
                Ok(records) => {
                    ctx.record_success();
                    return Some(records);
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::{FetchError, FetchErrorKind};
    use crate::core::market::QUOTE_CURRENCY;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn asset(symbol: &str) -> Asset {
        Asset {
            symbol: symbol.to_string(),
            name: symbol.to_string(),
            ticker: symbol.to_uppercase(),
            search_terms: vec![],
        }
    }

    fn record(symbol: &str, source: &str) -> PriceRecord {
        PriceRecord {
            symbol: symbol.to_string(),
            price: 100.0,
            change_pct_24h: Some(1.0),
            volume_24h: 5000.0,
            currency: QUOTE_CURRENCY.to_string(),
            source: source.to_string(),
            fetched_at: Utc::now(),
        }
    }

    /// Scripted provider: plays back a sequence of failures, then succeeds.
    struct ScriptedProvider {
        name: &'static str,
        batch: bool,
        failures: Vec<FetchErrorKind>,
        calls: AtomicUsize,
    }

    impl ScriptedProvider {
        fn new(name: &'static str, batch: bool, failures: Vec<FetchErrorKind>) -> Arc<Self> {
            Arc::new(ScriptedProvider {
                name,
                batch,
                failures,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl MarketDataProvider for ScriptedProvider {
        fn name(&self) -> &'static str {
            self.name
        }

        fn batch_capable(&self) -> bool {
            self.batch
        }

        async fn fetch_quotes(&self, assets: &[Asset]) -> Result<Vec<PriceRecord>, FetchError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(kind) = self.failures.get(call) {
                return Err(FetchError::new(*kind, self.name, "scripted failure"));
            }
            Ok(assets.iter().map(|a| record(&a.symbol, self.name)).collect())
        }
    }

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_retries: 3,
            base_delay: Duration::from_millis(1),
            backoff_factor: 2.0,
            max_backoff: Duration::from_millis(10),
        }
    }

    fn acquirer(providers: Vec<Arc<dyn MarketDataProvider>>) -> PriceAcquirer {
        PriceAcquirer::new(providers, fast_policy(), Duration::ZERO)
    }

    #[tokio::test]
    async fn test_rate_limited_primary_recovers_within_retries() {
        // Primary returns 429 twice, then succeeds on the third attempt. The
        // record must come from the primary with two recorded backoff delays.
        let primary = ScriptedProvider::new(
            "primary",
            true,
            vec![FetchErrorKind::RateLimited, FetchErrorKind::RateLimited],
        );
        let fallback = ScriptedProvider::new("fallback", true, vec![]);

        let ctx = RunContext::new(100);
        let acq = acquirer(vec![primary.clone(), fallback.clone()]);
        let outcomes = acq.get_prices(&[asset("bitcoin")], &ctx).await;

        let quote = outcomes["bitcoin"].as_quote().expect("resolved");
        assert_eq!(quote.source, "primary");
        assert_eq!(primary.calls(), 3);
        assert_eq!(fallback.calls(), 0);

        let delays = ctx.backoff_delays();
        assert_eq!(delays.len(), 2);
        assert!(delays[1] >= delays[0]);
    }

    #[tokio::test]
    async fn test_auth_error_advances_to_fallback_without_retry() {
        let primary = ScriptedProvider::new("primary", true, vec![FetchErrorKind::Auth]);
        let fallback = ScriptedProvider::new("fallback", true, vec![]);

        let ctx = RunContext::new(100);
        let acq = acquirer(vec![primary.clone(), fallback.clone()]);
        let outcomes = acq.get_prices(&[asset("bitcoin")], &ctx).await;

        let quote = outcomes["bitcoin"].as_quote().expect("resolved");
        assert_eq!(quote.source, "fallback");
        // Exactly one call against the primary and no backoff recorded.
        assert_eq!(primary.calls(), 1);
        assert!(ctx.backoff_delays().is_empty());
    }

    #[tokio::test]
    async fn test_exhausted_chain_yields_failed_outcome() {
        let a = ScriptedProvider::new(
            "a",
            true,
            vec![FetchErrorKind::Network, FetchErrorKind::Network],
        );
        let b = ScriptedProvider::new(
            "b",
            true,
            vec![
                FetchErrorKind::InvalidResponse,
                FetchErrorKind::InvalidResponse,
            ],
        );

        let ctx = RunContext::new(100);
        let acq = acquirer(vec![a.clone(), b.clone()]);
        let outcomes = acq.get_prices(&[asset("bitcoin")], &ctx).await;

        assert!(outcomes["bitcoin"].as_quote().is_none());
    }

    #[tokio::test]
    async fn test_partial_success_mixes_providers() {
        /// Batch provider that only knows one symbol.
        struct OnlyBitcoin;

        #[async_trait]
        impl MarketDataProvider for OnlyBitcoin {
            fn name(&self) -> &'static str {
                "only-bitcoin"
            }
            fn batch_capable(&self) -> bool {
                true
            }
            async fn fetch_quotes(
                &self,
                assets: &[Asset],
            ) -> Result<Vec<PriceRecord>, FetchError> {
                Ok(assets
                    .iter()
                    .filter(|a| a.symbol == "bitcoin")
                    .map(|a| record(&a.symbol, "only-bitcoin"))
                    .collect())
            }
        }

        let fallback = ScriptedProvider::new("fallback", false, vec![]);
        let ctx = RunContext::new(100);
        let acq = acquirer(vec![Arc::new(OnlyBitcoin), fallback.clone()]);
        let outcomes = acq
            .get_prices(&[asset("bitcoin"), asset("solana")], &ctx)
            .await;

        assert_eq!(
            outcomes["bitcoin"].as_quote().unwrap().source,
            "only-bitcoin"
        );
        assert_eq!(outcomes["solana"].as_quote().unwrap().source, "fallback");
    }

    #[tokio::test]
    async fn test_guard_halts_new_calls_but_keeps_resolved_data() {
        let flaky = ScriptedProvider::new(
            "flaky",
            false,
            vec![
                FetchErrorKind::Network,
                FetchErrorKind::Network,
                FetchErrorKind::Network,
                FetchErrorKind::Network,
            ],
        );

        let ctx = RunContext::new(2);
        let acq = acquirer(vec![flaky.clone()]);
        let outcomes = acq
            .get_prices(&[asset("bitcoin"), asset("solana"), asset("cardano")], &ctx)
            .await;

        assert!(ctx.halted());
        // Two failed calls tripped the guard; the third asset never produced
        // a provider call.
        assert_eq!(flaky.calls(), 2);
        assert_eq!(outcomes.len(), 3);
        assert!(outcomes.values().all(|o| o.as_quote().is_none()));
    }
}
