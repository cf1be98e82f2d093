//! As-of matching of orders to their pre-trade quotes.
//!
//! For each order, the matcher returns the most recent admitted quote at or
//! before the order's fulfill time, no further back than the tolerance
//! window. Selection is fully deterministic: minimal time difference, then
//! lowest quote timestamp, then lowest arrival order (the book's stable
//! sort preserves input order among equal timestamps).

use crate::filter::ConditionFilter;
use tca_core::{MatchedQuote, Order};
use tca_ingestion::QuoteBook;

/// Bounded-lookback as-of matcher.
#[derive(Debug, Clone)]
pub struct AsOfMatcher {
    tolerance_secs: i64,
}

impl AsOfMatcher {
    /// Create a matcher with the given lookback tolerance in seconds.
    pub fn new(tolerance_secs: i64) -> Self {
        Self { tolerance_secs }
    }

    /// Find the pre-trade quote for one order.
    ///
    /// Binary search bounds the scan to quotes at or before the fulfill
    /// time; the backward walk stops at the tolerance boundary, so the cost
    /// per order is the window size, not the book size.
    pub fn match_order(
        &self,
        book: &QuoteBook,
        filter: &ConditionFilter,
        order: &Order,
    ) -> Option<MatchedQuote> {
        let quotes = book.quotes(&order.security_id);
        let end = quotes.partition_point(|q| q.ts <= order.fulfill_time);
        let min_ts = order.fulfill_time - self.tolerance_secs;

        // Latest admitted quote inside the window.
        let mut latest = None;
        for i in (0..end).rev() {
            if quotes[i].ts < min_ts {
                break;
            }
            if filter.admits(&order.mic_exchange, &quotes[i]) {
                latest = Some(i);
                break;
            }
        }
        let latest = latest?;
        let best_ts = quotes[latest].ts;

        // Among quotes sharing the winning timestamp, take the first
        // admitted one in arrival order.
        let run_start = quotes[..latest].partition_point(|q| q.ts < best_ts);
        let chosen = (run_start..=latest)
            .find(|&i| filter.admits(&order.mic_exchange, &quotes[i]))?;

        Some(MatchedQuote {
            mid: quotes[chosen].mid(),
            ts: quotes[chosen].ts,
            time_diff: order.fulfill_time - quotes[chosen].ts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tca_core::{ConditionRule, Quote};

    fn make_quote(ts: i64, bid: f64, condition: Option<&str>) -> Quote {
        Quote {
            security_id: "S1".to_string(),
            ts,
            condition_code: condition.map(str::to_string),
            bid_price: bid,
            ask_price: bid + 0.2,
            trade_price: None,
            volume: None,
        }
    }

    fn make_order(fulfill: i64, mic: &str) -> Order {
        Order {
            security_id: "S1".to_string(),
            mic_exchange: mic.to_string(),
            fulfill_time: fulfill,
            order_start_time: fulfill - 10,
            order_end_time: fulfill + 10,
            order_size: 100.0,
            execution_price: 10.3,
        }
    }

    fn no_rules() -> ConditionFilter {
        ConditionFilter::from_rules(&[])
    }

    #[test]
    fn test_matches_closest_quote_at_or_before() {
        let book = QuoteBook::from_quotes(vec![
            make_quote(98, 10.0, None),
            make_quote(100, 11.0, None),
            make_quote(105, 12.0, None),
        ]);
        let matcher = AsOfMatcher::new(3);

        let matched = matcher
            .match_order(&book, &no_rules(), &make_order(101, "XNYS"))
            .unwrap();
        assert_eq!(matched.ts, 100);
        assert_eq!(matched.time_diff, 1);
        assert!((matched.mid - 11.1).abs() < 1e-10);
    }

    #[test]
    fn test_quote_after_fulfill_never_selected() {
        // Only quote is 1s after fulfill time: no match.
        let book = QuoteBook::from_quotes(vec![make_quote(102, 10.0, None)]);
        let matcher = AsOfMatcher::new(3);

        assert!(matcher
            .match_order(&book, &no_rules(), &make_order(101, "XNYS"))
            .is_none());
    }

    #[test]
    fn test_quote_outside_tolerance_not_matched() {
        let book = QuoteBook::from_quotes(vec![make_quote(97, 10.0, None)]);
        let matcher = AsOfMatcher::new(3);

        // 101 - 97 = 4 > 3
        assert!(matcher
            .match_order(&book, &no_rules(), &make_order(101, "XNYS"))
            .is_none());
    }

    #[test]
    fn test_boundary_time_diff_equal_to_tolerance_matches() {
        let book = QuoteBook::from_quotes(vec![make_quote(98, 10.0, None)]);
        let matcher = AsOfMatcher::new(3);

        let matched = matcher
            .match_order(&book, &no_rules(), &make_order(101, "XNYS"))
            .unwrap();
        assert_eq!(matched.time_diff, 3);
    }

    #[test]
    fn test_widening_tolerance_only_adds_matches() {
        let book = QuoteBook::from_quotes(vec![make_quote(95, 10.0, None)]);
        let order = make_order(101, "XNYS");

        assert!(AsOfMatcher::new(3)
            .match_order(&book, &no_rules(), &order)
            .is_none());

        let narrow = AsOfMatcher::new(6).match_order(&book, &no_rules(), &order);
        let wide = AsOfMatcher::new(60).match_order(&book, &no_rules(), &order);
        assert!(narrow.is_some());
        // The previously valid match survives the wider window unchanged.
        assert_eq!(narrow.unwrap().ts, wide.unwrap().ts);
    }

    #[test]
    fn test_equidistant_quotes_pick_earlier_timestamp() {
        // Quotes at fulfill-1 and fulfill+1 are equidistant; the later one
        // is ineligible, so the earlier timestamp wins every run.
        let book = QuoteBook::from_quotes(vec![
            make_quote(100, 10.0, None),
            make_quote(102, 12.0, None),
        ]);
        let matcher = AsOfMatcher::new(3);

        let matched = matcher
            .match_order(&book, &no_rules(), &make_order(101, "XNYS"))
            .unwrap();
        assert_eq!(matched.ts, 100);
    }

    #[test]
    fn test_duplicate_timestamps_pick_first_arrival() {
        let book = QuoteBook::from_quotes(vec![
            make_quote(100, 10.0, None),
            make_quote(100, 12.0, None),
        ]);
        let matcher = AsOfMatcher::new(3);

        let matched = matcher
            .match_order(&book, &no_rules(), &make_order(101, "XNYS"))
            .unwrap();
        assert!((matched.mid - 10.1).abs() < 1e-10);
    }

    #[test]
    fn test_excluded_quote_skipped_for_earlier_one() {
        let rules = vec![ConditionRule {
            mic_exchange: "XNYS".to_string(),
            condition_code: "Z".to_string(),
        }];
        let filter = ConditionFilter::from_rules(&rules);
        let book = QuoteBook::from_quotes(vec![
            make_quote(99, 10.0, None),
            make_quote(100, 12.0, Some("Z")),
        ]);
        let matcher = AsOfMatcher::new(3);

        // The Z quote is excluded on XNYS, so the 99s quote matches.
        let matched = matcher
            .match_order(&book, &filter, &make_order(101, "XNYS"))
            .unwrap();
        assert_eq!(matched.ts, 99);

        // On an exchange without rules the Z quote wins.
        let matched = matcher
            .match_order(&book, &filter, &make_order(101, "XNAS"))
            .unwrap();
        assert_eq!(matched.ts, 100);
    }

    #[test]
    fn test_only_quote_excluded_yields_no_match() {
        let filter = ConditionFilter::from_rules(&[ConditionRule {
            mic_exchange: "XNYS".to_string(),
            condition_code: "Z".to_string(),
        }]);
        let book = QuoteBook::from_quotes(vec![make_quote(100, 10.0, Some("Z"))]);
        let matcher = AsOfMatcher::new(3);

        assert!(matcher
            .match_order(&book, &filter, &make_order(101, "XNYS"))
            .is_none());
    }

    #[test]
    fn test_duplicate_timestamp_run_skips_excluded_first() {
        let filter = ConditionFilter::from_rules(&[ConditionRule {
            mic_exchange: "XNYS".to_string(),
            condition_code: "Z".to_string(),
        }]);
        // Same timestamp: first arrival excluded, second admitted.
        let book = QuoteBook::from_quotes(vec![
            make_quote(100, 10.0, Some("Z")),
            make_quote(100, 12.0, None),
        ]);
        let matcher = AsOfMatcher::new(3);

        let matched = matcher
            .match_order(&book, &filter, &make_order(101, "XNYS"))
            .unwrap();
        assert!((matched.mid - 12.1).abs() < 1e-10);
    }
}
