//! Weighted-lexicon scorer with rule-based modifiers.
//!
//! Each sentiment-bearing token carries a signed intensity. Booster words
//! scale the intensity of the term they precede, negations flip it, and
//! trailing exclamation marks amplify the total. The raw sum is squashed into
//! [-1, 1] with `x / sqrt(x^2 + alpha)`, and confidence is derived from how
//! much of the text carried sentiment at all.

use crate::core::sentiment::{ScoreResult, SentimentScorer};

/// Normalization constant for the compound squash. Larger alpha means longer
/// texts are needed to saturate the scale.
const ALPHA: f64 = 15.0;

/// Intensity multiplier applied when a negation precedes a sentiment term.
const NEGATION_FLIP: f64 = -0.74;

/// Per-exclamation-mark amplification of the raw sum, capped at four marks.
const EXCLAIM_BOOST: f64 = 0.292;

/// Signed intensities on a [-4, 4] scale, market vocabulary included.
#[rustfmt::skip]
static LEXICON: &[(&str, f64)] = &[
    ("adoption", 1.4), ("advance", 1.2), ("advances", 1.2), ("all-time", 1.5),
    ("approval", 1.6), ("approved", 1.6), ("bearish", -2.4), ("beat", 1.3),
    ("boom", 2.2), ("booming", 2.4), ("breakout", 1.8), ("breakthrough", 2.1),
    ("bull", 1.8), ("bullish", 2.4), ("bust", -2.2), ("celebrate", 2.2),
    ("climb", 1.3), ("climbs", 1.3), ("collapse", -2.9), ("collapsed", -2.9),
    ("concern", -1.3), ("concerns", -1.3), ("confident", 1.7), ("crash", -3.0),
    ("crashed", -3.0), ("crashes", -3.0), ("crisis", -2.6), ("decline", -1.5),
    ("declines", -1.5), ("default", -2.2), ("disappointing", -2.0),
    ("dominance", 1.1), ("doubt", -1.2), ("doubts", -1.2), ("drop", -1.4),
    ("dropped", -1.4), ("drops", -1.4), ("dump", -2.0), ("dumped", -2.0),
    ("exploit", -2.3), ("exploited", -2.3), ("fail", -2.1), ("failed", -2.1),
    ("failure", -2.1), ("fall", -1.4), ("falls", -1.4), ("fear", -2.0),
    ("fears", -2.0), ("fine", 0.8), ("fraud", -3.1), ("gain", 1.8),
    ("gained", 1.8), ("gains", 1.8), ("good", 1.9), ("great", 2.5),
    ("growth", 1.7), ("hack", -2.8), ("hacked", -2.8), ("halt", -1.6),
    ("halted", -1.6), ("high", 1.2), ("highs", 1.2), ("hope", 1.4),
    ("hopeful", 1.6), ("impressive", 2.1), ("institutional", 0.9),
    ("jump", 1.5), ("jumps", 1.5), ("lawsuit", -1.9), ("liquidation", -2.2),
    ("liquidations", -2.2), ("lose", -1.7), ("loses", -1.7), ("loss", -1.7),
    ("losses", -1.7), ("low", -1.1), ("lows", -1.1), ("milestone", 1.6),
    ("momentum", 0.8), ("optimism", 2.0), ("optimistic", 1.9), ("panic", -2.7),
    ("plummet", -2.8), ("plummets", -2.8), ("plunge", -2.6), ("plunged", -2.6),
    ("plunges", -2.6), ("positive", 1.8), ("profit", 1.7), ("profits", 1.7),
    ("promising", 1.8), ("rally", 1.9), ("rallied", 1.9), ("rallies", 1.9),
    ("rebound", 1.6), ("rebounds", 1.6), ("record", 1.3), ("recover", 1.5),
    ("recovery", 1.5), ("rejected", -1.8), ("risk", -1.2), ("risks", -1.2),
    ("rout", -2.4), ("rug", -2.5), ("scam", -3.2), ("selloff", -2.3),
    ("sell-off", -2.3), ("sink", -1.8), ("sinks", -1.8), ("slide", -1.4),
    ("slides", -1.4), ("slump", -1.9), ("slumps", -1.9), ("soar", 2.4),
    ("soared", 2.4), ("soars", 2.4), ("stable", 0.9), ("strength", 1.5),
    ("strong", 1.6), ("success", 2.0), ("successful", 2.0), ("surge", 2.2),
    ("surged", 2.2), ("surges", 2.2), ("theft", -2.7), ("tumble", -2.0),
    ("tumbles", -2.0), ("uncertain", -1.3), ("uncertainty", -1.3),
    ("upgrade", 1.5), ("upside", 1.4), ("volatile", -1.0), ("warning", -1.5),
    ("weak", -1.4), ("weakness", -1.4), ("win", 1.8), ("wins", 1.8),
    ("worry", -1.6), ("worries", -1.6),
];

/// Degree modifiers scanned up to two tokens before a sentiment term.
#[rustfmt::skip]
static BOOSTERS: &[(&str, f64)] = &[
    ("absolutely", 0.293), ("barely", -0.293), ("deeply", 0.293),
    ("extremely", 0.293), ("hardly", -0.293), ("highly", 0.293),
    ("hugely", 0.293), ("incredibly", 0.293), ("marginally", -0.293),
    ("massively", 0.293), ("mildly", -0.293), ("remarkably", 0.293),
    ("sharply", 0.293), ("significantly", 0.293), ("slightly", -0.293),
    ("somewhat", -0.293), ("strongly", 0.293), ("very", 0.293),
    ("wildly", 0.293),
];

static NEGATIONS: &[&str] = &[
    "not", "no", "never", "none", "neither", "nor", "without", "cannot",
    "isnt", "wasnt", "dont", "doesnt", "didnt", "wont", "couldnt", "shouldnt",
];

fn valence_of(token: &str) -> Option<f64> {
    LEXICON
        .iter()
        .find(|(word, _)| *word == token)
        .map(|(_, v)| *v)
}

fn booster_weight(token: &str) -> Option<f64> {
    BOOSTERS
        .iter()
        .find(|(word, _)| *word == token)
        .map(|(_, w)| *w)
}

fn is_negation(token: &str) -> bool {
    NEGATIONS.contains(&token)
}

/// Lowercased alphanumeric tokens, URLs dropped, apostrophes collapsed so
/// "isn't" matches the negation list.
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
pub struct ValenceScorer;

impl ValenceScorer {
    pub fn new() -> Self {
        ValenceScorer
    }
}

impl SentimentScorer for ValenceScorer {
    fn name(&self) -> &'static str {
        "valence"
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

        let mut sum = 0.0;
        let mut hits = 0usize;
        for (i, token) in tokens.iter().enumerate() {
            let Some(base) = valence_of(token) else {
                continue;
            };
            hits += 1;

            let mut value = base;
            // Look back two tokens for degree modifiers, the nearer one at
            // full weight.
            for (distance, prior) in tokens[i.saturating_sub(2)..i].iter().rev().enumerate() {
                if let Some(weight) = booster_weight(prior) {
                    let damp = if distance == 0 { 1.0 } else { 0.95 };
                    value += base.signum() * weight * damp;
                }
            }
            // Negation within the three preceding tokens flips and damps.
            if tokens[i.saturating_sub(3)..i].iter().any(|t| is_negation(t)) {
                value *= NEGATION_FLIP;
            }
            sum += value;
        }

        let exclaims = text.matches('!').count().min(4) as f64;
        if sum != 0.0 {
            sum += sum.signum() * exclaims * EXCLAIM_BOOST;
        }

        let polarity = (sum / (sum * sum + ALPHA).sqrt()).clamp(-1.0, 1.0);
        let neutral_ratio = (tokens.len() - hits) as f64 / tokens.len() as f64;
        let confidence = (polarity.abs() * (1.0 - neutral_ratio).max(0.15)).clamp(0.0, 1.0);

        ScoreResult {
            scorer: self.name(),
            polarity,
            confidence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positive_text_scores_positive() {
        let scorer = ValenceScorer::new();
        let result = scorer.score("Bitcoin surges to a record high as bullish momentum builds");
        assert!(result.polarity > 0.3, "polarity was {}", result.polarity);
        assert!(result.confidence > 0.0);
    }

    #[test]
    fn test_negative_text_scores_negative() {
        let scorer = ValenceScorer::new();
        let result = scorer.score("Exchange hack triggers panic selloff and heavy losses");
        assert!(result.polarity < -0.3, "polarity was {}", result.polarity);
    }

    #[test]
    fn test_empty_text_is_neutral_with_zero_confidence() {
        let scorer = ValenceScorer::new();
        let result = scorer.score("   ");
        assert_eq!(result.polarity, 0.0);
        assert_eq!(result.confidence, 0.0);
    }

    #[test]
    fn test_negation_flips_direction() {
        let scorer = ValenceScorer::new();
        let plain = scorer.score("the outlook is bullish");
        let negated = scorer.score("the outlook is not bullish");
        assert!(plain.polarity > 0.0);
        assert!(negated.polarity < 0.0);
    }

    #[test]
    fn test_booster_amplifies() {
        let scorer = ValenceScorer::new();
        let plain = scorer.score("prices surge after the upgrade");
        let boosted = scorer.score("prices sharply surge after the upgrade");
        assert!(boosted.polarity > plain.polarity);
    }

    #[test]
    fn test_exclamation_amplifies() {
        let scorer = ValenceScorer::new();
        let plain = scorer.score("bitcoin gains today");
        let excited = scorer.score("bitcoin gains today!!");
        assert!(excited.polarity > plain.polarity);
    }

    #[test]
    fn test_deterministic() {
        let scorer = ValenceScorer::new();
        let text = "Solana rallies while doubts about the lawsuit linger";
        let a = scorer.score(text);
        let b = scorer.score(text);
        assert_eq!(a.polarity, b.polarity);
        assert_eq!(a.confidence, b.confidence);
    }

    #[test]
    fn test_urls_do_not_contribute() {
        let scorer = ValenceScorer::new();
        let with_url = scorer.score("market update https://example.com/crash-course");
        assert_eq!(with_url.polarity, 0.0);
    }

    #[test]
    fn test_polarity_stays_in_range() {
        let scorer = ValenceScorer::new();
        let text = "surge surge surge soar soar rally rally gains gains boom boom \
                    bullish bullish breakout optimism celebrate impressive win win";
        let result = scorer.score(text);
        assert!(result.polarity <= 1.0);
        assert!(result.confidence <= 1.0);
    }
}
