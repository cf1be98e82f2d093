//! Per-order shortfall computation against the three benchmarks.
//!
//! A record is emitted only when every enabled benchmark resolved for the
//! order. Anything less drops the order and counts the first missing
//! benchmark; partially populated records are never produced.

use serde::{Deserialize, Serialize};
use tca_core::config::BenchmarkToggles;
use tca_core::{MatchedQuote, Order, PostTradeObservation, ShortfallRecord};

/// Ratio of execution price over a benchmark, in bps.
///
/// A zero or degenerate benchmark yields `None`, never infinity or NaN.
pub fn shortfall_bps(execution_price: f64, benchmark: f64) -> Option<f64> {
    if benchmark == 0.0 {
        return None;
    }
    let bps = (execution_price - benchmark) / benchmark * 100.0;
    bps.is_finite().then_some(bps)
}

/// Why an order produced no shortfall record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DropReason {
    /// No admitted quote inside the as-of tolerance window.
    MissingPreTrade,
    /// No VWAP for the order's security (zero-volume or empty window).
    MissingVwap,
    /// No admitted quote near the settlement horizon.
    MissingSettlement,
}

/// Counts of orders dropped per missing benchmark.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropCounts {
    /// Orders dropped for a missing pre-trade benchmark.
    pub missing_pre_trade: usize,
    /// Orders dropped for a missing VWAP benchmark.
    pub missing_vwap: usize,
    /// Orders dropped for a missing settlement benchmark.
    pub missing_settlement: usize,
}

impl DropCounts {
    /// Record one dropped order.
    pub fn record(&mut self, reason: DropReason) {
        match reason {
            DropReason::MissingPreTrade => self.missing_pre_trade += 1,
            DropReason::MissingVwap => self.missing_vwap += 1,
            DropReason::MissingSettlement => self.missing_settlement += 1,
        }
    }

    /// Total orders dropped.
    pub fn total(&self) -> usize {
        self.missing_pre_trade + self.missing_vwap + self.missing_settlement
    }
}

/// Combines benchmark outputs into shortfall records.
#[derive(Debug, Clone)]
pub struct ShortfallEngine {
    toggles: BenchmarkToggles,
}

impl ShortfallEngine {
    /// Create an engine honoring the given benchmark toggles.
    pub fn new(toggles: BenchmarkToggles) -> Self {
        Self { toggles }
    }

    /// Evaluate one order against its resolved benchmarks.
    ///
    /// Disabled benchmarks are exempt from the completeness requirement and
    /// stay `None` in the record.
    pub fn evaluate(
        &self,
        order: &Order,
        pre_trade: Option<&MatchedQuote>,
        vwap: Option<f64>,
        post_trade: Option<&PostTradeObservation>,
    ) -> Result<ShortfallRecord, DropReason> {
        let execution_price = order.execution_price;

        let (pre_trade_price, arrival_shortfall_bps) = if self.toggles.arrival {
            let matched = pre_trade.ok_or(DropReason::MissingPreTrade)?;
            let bps = shortfall_bps(execution_price, matched.mid)
                .ok_or(DropReason::MissingPreTrade)?;
            (Some(matched.mid), Some(bps))
        } else {
            (None, None)
        };

        let (vwap_price, vwap_shortfall_bps) = if self.toggles.vwap {
            let vwap = vwap.ok_or(DropReason::MissingVwap)?;
            let bps = shortfall_bps(execution_price, vwap).ok_or(DropReason::MissingVwap)?;
            (Some(vwap), Some(bps))
        } else {
            (None, None)
        };

        let (post_trade_price, settlement_shortfall_bps, return_after_execution_bps) =
            if self.toggles.settlement {
                let obs = post_trade.ok_or(DropReason::MissingSettlement)?;
                let bps = shortfall_bps(execution_price, obs.post_trade_price)
                    .ok_or(DropReason::MissingSettlement)?;
                (Some(obs.post_trade_price), Some(bps), Some(obs.return_bps))
            } else {
                (None, None, None)
            };

        Ok(ShortfallRecord {
            security_id: order.security_id.clone(),
            execution_price,
            pre_trade_price,
            vwap_price,
            post_trade_price,
            arrival_shortfall_bps,
            vwap_shortfall_bps,
            settlement_shortfall_bps,
            return_after_execution_bps,
        })
    }
}
