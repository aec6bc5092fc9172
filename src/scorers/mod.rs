//! The two offline sentiment engines. Both normalize to the shared
//! polarity/confidence contract so the aggregator never special-cases one.

pub mod valence;
pub mod wordlist;

pub use valence::ValenceScorer;
pub use wordlist::WordlistScorer;

use crate::core::sentiment::SentimentScorer;

/// The default scorer pair used by a run.
pub fn default_scorers() -> Vec<Box<dyn SentimentScorer>> {
    vec![
        Box::new(ValenceScorer::new()),
        Box::new(WordlistScorer::new()),
    ]
}
