//! Provider reachability checks behind the `status` subcommand. One cheap
//! request per configured endpoint, no retries, results as a table.

use anyhow::Result;
use comfy_table::Cell;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::config::AppConfig;
use crate::providers::http_client;
use crate::ui;

pub struct ProviderStatus {
    pub name: &'static str,
    pub reachable: bool,
    pub detail: String,
    pub latency: Option<Duration>,
}

/// Probe a single endpoint. Any 2xx counts as reachable; auth failures still
/// prove the host is up but are surfaced in the detail column.
async fn probe(client: &reqwest::Client, name: &'static str, url: &str) -> ProviderStatus {
    debug!("Probing {} at {}", name, url);
    let started = Instant::now();
    match client.get(url).send().await {
        Ok(response) => {
            let latency = started.elapsed();
            let status = response.status();
            ProviderStatus {
                name,
                reachable: status.is_success(),
                detail: format!("HTTP {}", status.as_u16()),
                latency: Some(latency),
            }
        }
        Err(err) => ProviderStatus {
            name,
            reachable: false,
            detail: err.to_string(),
            latency: None,
        },
    }
}

fn skipped(name: &'static str, reason: &str) -> ProviderStatus {
    ProviderStatus {
        name,
        reachable: false,
        detail: reason.to_string(),
        latency: None,
    }
}

pub async fn check_providers(config: &AppConfig) -> Result<Vec<ProviderStatus>> {
    let client = http_client(config.retry.timeout())?;
    let endpoints = &config.providers;
    let mut results = Vec::new();

    results.push(
        probe(
            &client,
            crate::providers::coingecko::NAME,
            &format!(
                "{}/api/v3/ping",
                endpoints.coingecko.base_url.trim_end_matches('/')
            ),
        )
        .await,
    );
    results.push(
        probe(
            &client,
            crate::providers::coincap::NAME,
            &format!(
                "{}/v2/assets?limit=1",
                endpoints.coincap.base_url.trim_end_matches('/')
            ),
        )
        .await,
    );
    results.push(
        probe(
            &client,
            crate::providers::cryptocompare::NAME,
            &format!(
                "{}/data/pricemultifull?fsyms=BTC&tsyms=USD",
                endpoints.cryptocompare.base_url.trim_end_matches('/')
            ),
        )
        .await,
    );

    match &endpoints.newsapi.api_key {
        Some(key) => {
            results.push(
                probe(
                    &client,
                    crate::providers::newsapi::NAME,
                    &format!(
                        "{}/v2/everything?q=bitcoin&pageSize=1&apiKey={key}",
                        endpoints.newsapi.base_url.trim_end_matches('/')
                    ),
                )
                .await,
            );
        }
        None => results.push(skipped(crate::providers::newsapi::NAME, "no API key")),
    }

    match &endpoints.guardian.api_key {
        Some(key) => {
            results.push(
                probe(
                    &client,
                    crate::providers::guardian::NAME,
                    &format!(
                        "{}/search?q=bitcoin&page-size=1&api-key={key}",
                        endpoints.guardian.base_url.trim_end_matches('/')
                    ),
                )
                .await,
            );
        }
        None => results.push(skipped(crate::providers::guardian::NAME, "no API key")),
    }

    match endpoints.rss.feeds.first() {
        Some(feed) => results.push(probe(&client, crate::providers::rss::NAME, feed).await),
        None => results.push(skipped(crate::providers::rss::NAME, "no feeds configured")),
    }

    Ok(results)
}

pub fn display_as_table(statuses: &[ProviderStatus]) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Provider"),
        ui::header_cell("Reachable"),
        ui::header_cell("Latency"),
        ui::header_cell("Detail"),
    ]);

    for status in statuses {
        let reachable = if status.reachable {
            Cell::new("yes").fg(comfy_table::Color::Green)
        } else {
            Cell::new("no").fg(comfy_table::Color::Red)
        };
        table.add_row(vec![
            Cell::new(status.name),
            reachable,
            ui::format_optional_cell(status.latency, |l| format!("{} ms", l.as_millis())),
            Cell::new(&status.detail),
        ]);
    }

    table.to_string()
}
