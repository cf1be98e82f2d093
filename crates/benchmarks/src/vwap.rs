//! Volume-weighted average price per security over the global order window.
//!
//! The window is the union span of all orders: [min(order_start_time),
//! max(order_end_time)]. A security whose window holds no volume gets no
//! entry — undefined propagates as absence, never as zero or NaN.

use crate::filter::{security_contexts, ConditionFilter};
use std::collections::BTreeMap;
use tca_core::Order;
use tca_ingestion::QuoteBook;

/// Windowed VWAP aggregator.
#[derive(Debug, Clone, Default)]
pub struct VwapAggregator;

impl VwapAggregator {
    /// Create a new aggregator.
    pub fn new() -> Self {
        Self
    }

    /// Compute VWAP per security appearing in the order set.
    ///
    /// Quotes are consumed in the book's sorted order, so the sum — and
    /// with it the result — does not depend on input row order. A quote is
    /// admitted if at least one of its security's order contexts admits it.
    pub fn compute(
        &self,
        book: &QuoteBook,
        filter: &ConditionFilter,
        orders: &[Order],
    ) -> BTreeMap<String, f64> {
        let mut table = BTreeMap::new();

        let window_start = orders.iter().map(|o| o.order_start_time).min();
        let window_end = orders.iter().map(|o| o.order_end_time).max();
        let (Some(start), Some(end)) = (window_start, window_end) else {
            return table;
        };

        for (security_id, mics) in security_contexts(orders) {
            let quotes = book.quotes(&security_id);
            let lo = quotes.partition_point(|q| q.ts < start);

            let mut notional = 0.0;
            let mut total_volume = 0.0;
            for quote in &quotes[lo..] {
                if quote.ts > end {
                    break;
                }
                let (Some(trade_price), Some(volume)) = (quote.trade_price, quote.volume) else {
                    continue;
                };
                if !filter.admits_any(mics.iter().map(String::as_str), quote) {
                    continue;
                }
                notional += trade_price * volume;
                total_volume += volume;
            }

            if total_volume > 0.0 {
                let vwap = notional / total_volume;
                if vwap.is_finite() {
                    table.insert(security_id, vwap);
                }
            }
        }

        table
    }
}
