//! Word-set scorer.
//!
//! Counts positive and negative vocabulary hits, with a short negation
//! window flipping the class of the following term. Polarity is the signed
//! share of sentiment hits; subjectivity (the share of tokens that carried
//! sentiment at all) feeds the confidence signal, so factual price wires
//! score low-confidence even when mildly directional.

use crate::core::sentiment::{ScoreResult, SentimentScorer};

#[rustfmt::skip]
static POSITIVE: &[&str] = &[
    "adoption", "advance", "advances", "approval", "approved", "boom",
    "booming", "breakout", "breakthrough", "bull", "bullish", "celebrate",
    "climb", "climbs", "confident", "gain", "gained", "gains", "good",
    "great", "growth", "high", "highs", "hope", "hopeful", "impressive",
    "jump", "jumps", "milestone", "momentum", "optimism", "optimistic",
    "positive", "profit", "profits", "promising", "rally", "rallied",
    "rallies", "rebound", "rebounds", "record", "recover", "recovery",
    "soar", "soared", "soars", "stable", "strength", "strong", "success",
    "successful", "surge", "surged", "surges", "upgrade", "upside", "win",
    "wins",
];

#[rustfmt::skip]
static NEGATIVE: &[&str] = &[
    "bearish", "bust", "collapse", "collapsed", "concern", "concerns",
    "crash", "crashed", "crashes", "crisis", "decline", "declines",
    "default", "disappointing", "doubt", "doubts", "drop", "dropped",
    "drops", "dump", "dumped", "exploit", "exploited", "fail", "failed",
    "failure", "fall", "falls", "fear", "fears", "fraud", "hack", "hacked",
    "halt", "halted", "lawsuit", "liquidation", "liquidations", "lose",
    "loses", "loss", "losses", "low", "lows", "panic", "plummet",
    "plummets", "plunge", "plunged", "plunges", "rejected", "risk", "risks",
    "rout", "scam", "selloff", "sell-off", "sink", "sinks", "slide",
    "slides", "slump", "slumps", "theft", "tumble", "tumbles", "uncertain",
    "uncertainty", "volatile", "warning", "weak", "weakness", "worries",
    "worry",
];

static NEGATIONS: &[&str] = &["not", "no", "never", "none", "without", "neither", "nor"];

fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace()
        .filter(|raw| !raw.starts_with("http://") && !raw.starts_with("https://"))
        .map(|raw| {
            raw.chars()
                .filter(|c| c.is_alphanumeric() || *c == '-')
                .collect::<String>()
                .to_lowercase()
        })
        .filter(|t| !t.is_empty())
        .collect()
}

#[derive(Debug, Default)]
pub struct WordlistScorer;

impl WordlistScorer {
    pub fn new() -> Self {
        WordlistScorer
    }
}

impl SentimentScorer for WordlistScorer {
    fn name(&self) -> &'static str {
        "wordlist"
    }

    fn score(&self, text: &str) -> ScoreResult {
        let tokens = tokenize(text);
        if tokens.is_empty() {
            return ScoreResult {
                scorer: self.name(),
                polarity: 0.0,
                confidence: 0.0,
            };
        }

        let mut positive = 0usize;
        let mut negative = 0usize;
        for (i, token) in tokens.iter().enumerate() {
            let negated = tokens[i.saturating_sub(2)..i]
                .iter()
                .any(|t| NEGATIONS.contains(&t.as_str()));

            if POSITIVE.contains(&token.as_str()) {
                if negated {
                    negative += 1;
                } else {
                    positive += 1;
                }
            } else if NEGATIVE.contains(&token.as_str()) {
                if negated {
                    positive += 1;
                } else {
                    negative += 1;
                }
            }
        }

        let hits = positive + negative;
        if hits == 0 {
            return ScoreResult {
                scorer: self.name(),
                polarity: 0.0,
                confidence: 0.0,
            };
        }

        let polarity = (positive as f64 - negative as f64) / hits as f64;
        let subjectivity = (hits as f64 / tokens.len() as f64).clamp(0.0, 1.0);
        let confidence = (polarity.abs() + subjectivity).min(1.0);

        ScoreResult {
            scorer: self.name(),
            polarity,
            confidence,
        }
    }
}
