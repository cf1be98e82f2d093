//! Core data types for the TCA engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Timestamp in seconds since Unix epoch (UTC).
pub type TimestampSec = i64;

/// Truncate a datetime to whole seconds since epoch.
///
/// Sub-second precision is dropped, never rounded, so two callers handing
/// in the same instant always agree on the resulting timestamp.
#[inline]
pub fn ts_from_datetime(dt: DateTime<Utc>) -> TimestampSec {
    dt.timestamp()
}

/// A single market quote for one security.
///
/// `trade_price` and `volume` are optional; quotes without them still feed
/// the pre-trade and settlement benchmarks but contribute nothing to VWAP.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quote {
    /// Security identifier.
    pub security_id: String,
    /// Quote timestamp in seconds.
    pub ts: TimestampSec,
    /// Condition code, if the venue attached one.
    pub condition_code: Option<String>,
    /// Best bid price.
    pub bid_price: f64,
    /// Best ask price.
    pub ask_price: f64,
    /// Last trade price, if present in the feed.
    pub trade_price: Option<f64>,
    /// Trade volume, if present in the feed.
    pub volume: Option<f64>,
}

impl Quote {
    /// Calculate mid price.
    #[inline]
    pub fn mid(&self) -> f64 {
        (self.bid_price + self.ask_price) / 2.0
    }

    /// Calculate spread.
    #[inline]
    pub fn spread(&self) -> f64 {
        self.ask_price - self.bid_price
    }
}

/// A trade order with its execution window and realized execution price.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Security identifier.
    pub security_id: String,
    /// Exchange (MIC) the order was routed to.
    pub mic_exchange: String,
    /// Time the order was fulfilled.
    pub fulfill_time: TimestampSec,
    /// Start of the execution window.
    pub order_start_time: TimestampSec,
    /// End of the execution window.
    pub order_end_time: TimestampSec,
    /// Order size.
    pub order_size: f64,
    /// Realized execution price.
    pub execution_price: f64,
}

impl Order {
    /// Length of the execution window in seconds.
    #[inline]
    pub fn window_secs(&self) -> i64 {
        self.order_end_time - self.order_start_time
    }
}

/// An exclusion rule: quotes carrying `condition_code` are dropped for
/// orders routed to `mic_exchange`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionRule {
    /// Exchange (MIC) the rule applies to.
    pub mic_exchange: String,
    /// Condition code to drop.
    pub condition_code: String,
}

/// The pre-trade quote matched to an order by the as-of join.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchedQuote {
    /// Mid price of the matched quote (the pre-trade benchmark).
    pub mid: f64,
    /// Timestamp of the matched quote.
    pub ts: TimestampSec,
    /// Seconds between the order's fulfill time and the quote.
    pub time_diff: i64,
}

/// The post-trade quote observed near the settlement horizon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostTradeObservation {
    /// Mid price of the observed quote (the settlement benchmark).
    pub post_trade_price: f64,
    /// Timestamp of the observed quote.
    pub ts: TimestampSec,
    /// Seconds between order end and the quote.
    pub offset_secs: i64,
    /// Return of the post-trade mid over the execution price, in bps.
    pub return_bps: f64,
}

/// Per-order shortfall metrics against all three benchmarks.
///
/// Benchmark fields are `None` only when that benchmark is disabled for the
/// whole run. An order missing data for an enabled benchmark produces no
/// record at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShortfallRecord {
    /// Security identifier.
    pub security_id: String,
    /// Realized execution price.
    pub execution_price: f64,
    /// Pre-trade (arrival) benchmark price.
    pub pre_trade_price: Option<f64>,
    /// VWAP benchmark price.
    pub vwap_price: Option<f64>,
    /// Settlement benchmark price.
    pub post_trade_price: Option<f64>,
    /// Execution vs. pre-trade benchmark, in bps.
    pub arrival_shortfall_bps: Option<f64>,
    /// Execution vs. VWAP benchmark, in bps.
    pub vwap_shortfall_bps: Option<f64>,
    /// Execution vs. settlement benchmark, in bps.
    pub settlement_shortfall_bps: Option<f64>,
    /// Post-trade drift after execution, in bps.
    pub return_after_execution_bps: Option<f64>,
}
