//! Post-trade drift tracking at a fixed settlement horizon.
//!
//! For each order, the tracker reads the admitted quote whose offset from
//! the order's end time is closest to the configured horizon. Quotes before
//! order end never qualify; quotes whose offset deviates from the horizon
//! by more than the band are out of reach, and the settlement metrics for
//! that order are omitted rather than defaulted.

use crate::filter::ConditionFilter;
use tca_core::{Order, PostTradeObservation};
use tca_ingestion::QuoteBook;

/// Fixed-horizon post-trade return tracker.
#[derive(Debug, Clone)]
pub struct PostTradeTracker {
    horizon_secs: i64,
    horizon_band_secs: i64,
}

impl PostTradeTracker {
    /// Create a tracker reading quotes `horizon_secs` after order end,
    /// accepting offsets within `horizon_band_secs` of the horizon.
    pub fn new(horizon_secs: i64, horizon_band_secs: i64) -> Self {
        Self {
            horizon_secs,
            horizon_band_secs,
        }
    }

    /// Observe the settlement quote for one order.
    ///
    /// Ties on |offset − horizon| resolve to the lower timestamp, then the
    /// earlier arrival — the forward scan keeps the first candidate it saw.
    pub fn track(
        &self,
        book: &QuoteBook,
        filter: &ConditionFilter,
        order: &Order,
    ) -> Option<PostTradeObservation> {
        if order.execution_price == 0.0 {
            return None;
        }

        let quotes = book.quotes(&order.security_id);
        let start = quotes.partition_point(|q| q.ts < order.order_end_time);
        let max_offset = self.horizon_secs + self.horizon_band_secs;

        let mut best: Option<(i64, usize)> = None;
        for (i, quote) in quotes.iter().enumerate().skip(start) {
            let offset = quote.ts - order.order_end_time;
            if offset > max_offset {
                break;
            }
            let deviation = (offset - self.horizon_secs).abs();
            if deviation > self.horizon_band_secs {
                continue;
            }
            if !filter.admits(&order.mic_exchange, quote) {
                continue;
            }
            match best {
                Some((best_dev, _)) if deviation >= best_dev => {}
                _ => best = Some((deviation, i)),
            }
        }

        let (_, idx) = best?;
        let quote = &quotes[idx];
        let post_trade_price = quote.mid();
        let return_bps =
            (post_trade_price - order.execution_price) / order.execution_price * 100.0;
        if !return_bps.is_finite() {
            return None;
        }

        Some(PostTradeObservation {
            post_trade_price,
            ts: quote.ts,
            offset_secs: quote.ts - order.order_end_time,
            return_bps,
        })
    }
}
