use std::time::Duration;

use fxd_oracle::MarketFeatures;

/// The latest market observation for one symbol: step time (epoch seconds),
/// the close the engine acts on, and the full feature row for the oracle.
#[derive(Clone, Debug, PartialEq)]
pub struct Candle {
    pub time: i64,
    pub close: f64,
    pub features: MarketFeatures,
}

/// Errors a [`MarketFeed`] implementation may return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedError {
    /// No candle arrived within the bounded wait.
    Timeout { symbol: String, waited_ms: u128 },
    /// The data source could not be reached.
    Unavailable { detail: String },
}

impl std::fmt::Display for FeedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Timeout { symbol, waited_ms } => {
                write!(f, "feed timeout for {symbol} after {waited_ms}ms")
            }
            Self::Unavailable { detail } => write!(f, "feed unavailable: {detail}"),
        }
    }
}

impl std::error::Error for FeedError {}

/// Market-data boundary for the live loop.
///
/// Calls are synchronous and block the loop, so every implementation must
/// honor the caller-supplied bounded wait — return
/// [`FeedError::Timeout`] rather than blocking past it.
pub trait MarketFeed {
    fn poll_candle(&mut self, symbol: &str, timeout: Duration) -> Result<Candle, FeedError>;
}
