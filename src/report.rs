//! Report assembly and output: terminal table, HTML file, raw JSON snapshot.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use comfy_table::Cell;
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::config::Asset;
use crate::core::market::PriceOutcome;
use crate::core::news::Article;
use crate::core::sentiment::{AssetSentiment, SentimentLabel};
use crate::ui;

#[derive(Debug, Clone, Serialize)]
pub struct AssetReport {
    pub asset: Asset,
    pub price: PriceOutcome,
    pub sentiment: AssetSentiment,
    /// Articles that fed the sentiment, most recent first.
    pub headlines: Vec<Article>,
}

#[derive(Debug, Serialize)]
pub struct RunReport {
    pub generated_at: DateTime<Utc>,
    pub assets: Vec<AssetReport>,
}

impl RunReport {
    pub fn new(assets: Vec<AssetReport>) -> Self {
        RunReport {
            generated_at: Utc::now(),
            assets,
        }
    }

    pub fn display_as_table(&self) -> String {
        let mut table = ui::new_styled_table();

        table.set_header(vec![
            ui::header_cell("Asset"),
            ui::header_cell("Price (USD)"),
            ui::header_cell("24h Change"),
            ui::header_cell("Volume (USD)"),
            ui::header_cell("Source"),
            ui::header_cell("Sentiment"),
            ui::header_cell("Label"),
            ui::header_cell("Articles"),
        ]);

        for report in &self.assets {
            let (price_cell, change_cell, volume_cell, source_cell) = match &report.price {
                PriceOutcome::Quote(record) => (
                    ui::format_optional_cell(Some(record.price), format_price),
                    record
                        .change_pct_24h
                        .map_or(ui::na_cell(false), ui::change_cell),
                    ui::format_optional_cell(Some(record.volume_24h), format_volume),
                    Cell::new(&record.source),
                ),
                PriceOutcome::Failed { .. } => (
                    ui::na_cell(true),
                    ui::na_cell(true),
                    ui::na_cell(true),
                    ui::na_cell(true),
                ),
            };

            let sentiment = &report.sentiment;
            let (polarity_cell, label_text) = if sentiment.insufficient_data {
                (
                    ui::na_cell(false),
                    ui::style_text("no data", ui::StyleType::Subtle),
                )
            } else {
                (
                    ui::polarity_cell(sentiment.polarity),
                    sentiment.label.to_string(),
                )
            };

            table.add_row(vec![
                Cell::new(&report.asset.name),
                price_cell,
                change_cell,
                volume_cell,
                source_cell,
                polarity_cell,
                Cell::new(label_text),
                Cell::new(format!(
                    "{} used / {} excluded",
                    sentiment.articles_used, sentiment.articles_excluded
                )),
            ]);
        }

        let mut output = format!(
            "{}\n\n",
            ui::style_text("Crypto Market Sentiment", ui::StyleType::Title)
        );
        output.push_str(&table.to_string());
        output.push_str(&format!(
            "\n\nGenerated at {}",
            self.generated_at.format("%Y-%m-%d %H:%M UTC")
        ));
        output
    }

    /// Renders the report as a standalone HTML page and writes it under
    /// `output_dir` with a timestamped filename. Returns the written path.
    pub fn write_html(&self, output_dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(output_dir)
            .with_context(|| format!("Failed to create directory: {}", output_dir.display()))?;
        let path = output_dir.join(format!(
            "sentiment_report_{}.html",
            self.generated_at.format("%Y%m%d_%H%M%S")
        ));

        std::fs::write(&path, self.render_html())
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        Ok(path)
    }

    /// Dumps the full run, articles included, as pretty JSON under `data_dir`.
    pub fn write_snapshot(&self, data_dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("Failed to create directory: {}", data_dir.display()))?;
        let path = data_dir.join(format!(
            "snapshot_{}.json",
            self.generated_at.format("%Y%m%d_%H%M%S")
        ));

        let json = serde_json::to_string_pretty(self).context("Failed to serialize snapshot")?;
        std::fs::write(&path, json)
            .with_context(|| format!("Failed to write snapshot to {}", path.display()))?;
        Ok(path)
    }

    fn render_html(&self) -> String {
        let mut rows = String::new();
        for report in &self.assets {
            let (price, change, volume, source) = match &report.price {
                PriceOutcome::Quote(record) => (
                    format_price(record.price),
                    record
                        .change_pct_24h
                        .map_or("N/A".to_string(), |c| format!("{c:+.2}%")),
                    format_volume(record.volume_24h),
                    record.source.clone(),
                ),
                PriceOutcome::Failed { .. } => (
                    "N/A".to_string(),
                    "N/A".to_string(),
                    "N/A".to_string(),
                    "N/A".to_string(),
                ),
            };

            let sentiment = &report.sentiment;
            let (polarity, label, css_class) = if sentiment.insufficient_data {
                ("N/A".to_string(), "no data".to_string(), "neutral")
            } else {
                (
                    format!("{:+.2}", sentiment.polarity),
                    sentiment.label.to_string(),
                    label_class(sentiment.label),
                )
            };

            let mut headlines = String::new();
            for article in &report.headlines {
                headlines.push_str(&format!(
                    "<li><a href=\"{}\">{}</a> <span class=\"source\">({})</span></li>\n",
                    escape_html(&article.url),
                    escape_html(&article.title),
                    escape_html(&article.source),
                ));
            }

            rows.push_str(&format!(
                r#"<tr>
  <td>{name}</td>
  <td class="num">{price}</td>
  <td class="num">{change}</td>
  <td class="num">{volume}</td>
  <td>{source}</td>
  <td class="num {css_class}">{polarity}</td>
  <td class="{css_class}">{label}</td>
  <td class="num">{used}</td>
</tr>
<tr class="headlines"><td colspan="8"><ul>{headlines}</ul></td></tr>
"#,
                name = escape_html(&report.asset.name),
                used = sentiment.articles_used,
            ));
        }

        format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Crypto Market Sentiment</title>
<style>
body {{ font-family: sans-serif; margin: 2em; color: #222; }}
table {{ border-collapse: collapse; width: 100%; }}
th, td {{ border: 1px solid #ccc; padding: 0.5em 0.8em; text-align: left; }}
th {{ background: #f0f0f0; }}
td.num {{ text-align: right; }}
.positive {{ color: #1a7f37; }}
.negative {{ color: #b91c1c; }}
.neutral {{ color: #666; }}
tr.headlines td {{ border-top: none; font-size: 0.9em; }}
.source {{ color: #888; }}
footer {{ margin-top: 2em; color: #888; font-size: 0.85em; }}
</style>
</head>
<body>
<h1>Crypto Market Sentiment</h1>
<table>
<thead>
<tr><th>Asset</th><th>Price (USD)</th><th>24h Change</th><th>Volume (USD)</th><th>Source</th><th>Sentiment</th><th>Label</th><th>Articles</th></tr>
</thead>
<tbody>
{rows}
</tbody>
</table>
<footer>Generated at {timestamp}</footer>
</body>
</html>
"#,
            timestamp = self.generated_at.format("%Y-%m-%d %H:%M UTC"),
        )
    }
}

fn format_volume(volume: f64) -> String {
    if volume >= 1.0e9 {
        format!("{:.1}B", volume / 1.0e9)
    } else if volume >= 1.0e6 {
        format!("{:.1}M", volume / 1.0e6)
    } else {
        format!("{volume:.0}")
    }
}

fn format_price(price: f64) -> String {
    // Sub-dollar assets need more precision than majors.
    if price >= 1.0 {
        format!("{price:.2}")
    } else {
        format!("{price:.6}")
    }
}

fn label_class(label: SentimentLabel) -> &'static str {
    match label {
        SentimentLabel::Positive => "positive",
        SentimentLabel::Negative => "negative",
        SentimentLabel::Neutral => "neutral",
    }
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::market::{PriceRecord, QUOTE_CURRENCY};

    fn asset(symbol: &str, name: &str) -> Asset {
        Asset {
            symbol: symbol.to_string(),
            name: name.to_string(),
            ticker: symbol.to_uppercase(),
            search_terms: vec![],
        }
    }

    fn quote(symbol: &str, price: f64, change: f64) -> PriceOutcome {
        PriceOutcome::Quote(PriceRecord {
            symbol: symbol.to_string(),
            price,
            change_pct_24h: Some(change),
            volume_24h: 1.0e9,
            currency: QUOTE_CURRENCY.to_string(),
            source: "coingecko".to_string(),
            fetched_at: Utc::now(),
        })
    }

    fn sentiment(symbol: &str, polarity: f64, label: SentimentLabel) -> AssetSentiment {
        AssetSentiment {
            symbol: symbol.to_string(),
            polarity,
            confidence: 0.5,
            label,
            articles_used: 3,
            articles_excluded: 1,
            insufficient_data: false,
        }
    }

    fn headline(title: &str) -> Article {
        Article {
            title: title.to_string(),
            body: "body".to_string(),
            url: "https://example.com/a?x=1&y=2".to_string(),
            source: "Example Wire".to_string(),
            provider: "newsapi".to_string(),
            published_at: Utc::now(),
        }
    }

    fn sample_report() -> RunReport {
        RunReport::new(vec![
            AssetReport {
                asset: asset("bitcoin", "Bitcoin"),
                price: quote("bitcoin", 64_250.0, 2.4),
                sentiment: sentiment("bitcoin", 0.42, SentimentLabel::Positive),
                headlines: vec![headline("Bitcoin <rallies> hard")],
            },
            AssetReport {
                asset: asset("solana", "Solana"),
                price: PriceOutcome::Failed {
                    reason: "all providers exhausted".to_string(),
                },
                sentiment: AssetSentiment {
                    symbol: "solana".to_string(),
                    polarity: 0.0,
                    confidence: 0.0,
                    label: SentimentLabel::Neutral,
                    articles_used: 0,
                    articles_excluded: 0,
                    insufficient_data: true,
                },
                headlines: vec![],
            },
        ])
    }

    #[test]
    fn test_table_shows_quotes_and_failures_side_by_side() {
        let table = sample_report().display_as_table();
        assert!(table.contains("Bitcoin"));
        assert!(table.contains("64250.00"));
        assert!(table.contains("+2.40%"));
        assert!(table.contains("1.0B"));
        assert!(table.contains("coingecko"));
        assert!(table.contains("Solana"));
        assert!(table.contains("N/A"));
        assert!(table.contains("3 used / 1 excluded"));
    }

    #[test]
    fn test_html_report_is_written_and_escaped() {
        let dir = tempfile::tempdir().unwrap();
        let path = sample_report().write_html(dir.path()).unwrap();

        let html = std::fs::read_to_string(&path).unwrap();
        assert!(html.contains("<title>Crypto Market Sentiment</title>"));
        assert!(html.contains("Bitcoin &lt;rallies&gt; hard"));
        assert!(html.contains("x=1&amp;y=2"));
        assert!(html.contains("no data"));
    }

    #[test]
    fn test_snapshot_round_trips_as_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = sample_report().write_snapshot(dir.path()).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["assets"][0]["asset"]["symbol"], "bitcoin");
        assert_eq!(value["assets"][1]["price"]["status"], "failed");
        assert_eq!(value["assets"][1]["sentiment"]["insufficient_data"], true);
    }
}
