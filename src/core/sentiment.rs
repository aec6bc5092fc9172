//! Sentiment contract and aggregation.
//!
//! Scorers are deterministic, offline engines normalized to one shared scale:
//! polarity in [-1, 1] and confidence in [0, 1]. The aggregator combines the
//! scorers per article, gates on confidence, then folds the surviving
//! articles into one per-asset result.

use serde::Serialize;
use std::fmt::Display;

use crate::core::news::Article;

#[derive(Debug, Clone, Serialize)]
pub struct ScoreResult {
    pub scorer: &'static str,
    /// Signed direction/intensity in [-1, 1].
    pub polarity: f64,
    /// Reliability of the polarity estimate in [0, 1].
    pub confidence: f64,
}

pub trait SentimentScorer: Send + Sync {
    fn name(&self) -> &'static str;

    /// Same text must always yield the same result; no network access.
    fn score(&self, text: &str) -> ScoreResult;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SentimentLabel {
    Negative,
    Neutral,
    Positive,
}

impl Display for SentimentLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            SentimentLabel::Negative => "negative",
            SentimentLabel::Neutral => "neutral",
            SentimentLabel::Positive => "positive",
        };
        write!(f, "{text}")
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AssetSentiment {
    pub symbol: String,
    pub polarity: f64,
    pub confidence: f64,
    pub label: SentimentLabel,
    pub articles_used: usize,
    pub articles_excluded: usize,
    /// Set when no article survived filtering. Callers must distinguish this
    /// from a genuinely neutral high-confidence result.
    pub insufficient_data: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct AggregationSettings {
    /// Articles at or above this combined confidence are used (inclusive).
    pub confidence_threshold: f64,
    /// Polarity above `+label_bound` is positive, below `-label_bound`
    /// negative, neutral in between.
    pub label_bound: f64,
}

/// Combination rule for the scorers' per-article outputs. Arithmetic mean;
/// swap here if a weighted scheme is ever wanted.
fn combine(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub fn label_for(polarity: f64, bound: f64) -> SentimentLabel {
    if polarity > bound {
        SentimentLabel::Positive
    } else if polarity < -bound {
        SentimentLabel::Negative
    } else {
        SentimentLabel::Neutral
    }
}

/// Fold the articles for one asset into a single sentiment record.
///
/// Runs every scorer over every article, combines the per-article polarities
/// and confidences, discards articles below the confidence threshold and
/// averages the rest. Zero surviving articles is a valid state, flagged as
/// insufficient data rather than reported as neutral conviction.
pub fn aggregate(
    symbol: &str,
    articles: &[Article],
    scorers: &[Box<dyn SentimentScorer>],
    settings: &AggregationSettings,
) -> AssetSentiment {
    let mut kept_polarities = Vec::new();
    let mut kept_confidences = Vec::new();
    let mut excluded = 0usize;

    for article in articles {
        let text = format!("{} {}", article.title, article.body);
        let scores: Vec<ScoreResult> = scorers.iter().map(|s| s.score(&text)).collect();

        let polarities: Vec<f64> = scores.iter().map(|s| s.polarity).collect();
        let confidences: Vec<f64> = scores.iter().map(|s| s.confidence).collect();
        let polarity = combine(&polarities);
        let confidence = combine(&confidences);

        if confidence >= settings.confidence_threshold {
            kept_polarities.push(polarity);
            kept_confidences.push(confidence);
        } else {
            excluded += 1;
        }
    }

    if kept_polarities.is_empty() {
        return AssetSentiment {
            symbol: symbol.to_string(),
            polarity: 0.0,
            confidence: 0.0,
            label: SentimentLabel::Neutral,
            articles_used: 0,
            articles_excluded: excluded,
            insufficient_data: true,
        };
    }

    let polarity = combine(&kept_polarities);
    AssetSentiment {
        symbol: symbol.to_string(),
        polarity,
        confidence: combine(&kept_confidences),
        label: label_for(polarity, settings.label_bound),
        articles_used: kept_polarities.len(),
        articles_excluded: excluded,
        insufficient_data: false,
    }
}
