//! Core business logic abstractions

pub mod error;
pub mod market;
pub mod news;
pub mod retry;
pub mod sentiment;

// Re-export main types for cleaner imports
pub use error::{FetchError, FetchErrorKind};
pub use market::{MarketDataProvider, PriceOutcome, PriceRecord};
pub use news::{Article, NewsProvider, NewsQuery};
pub use retry::{RetryAction, RetryPolicy, RunContext};
pub use sentiment::{AssetSentiment, ScoreResult, SentimentLabel, SentimentScorer};
