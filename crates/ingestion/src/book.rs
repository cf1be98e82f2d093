//! Per-security quote storage for the synchronous analytics core.
//!
//! The book is a fully materialized, immutable-once-built snapshot: quotes
//! are grouped per security and stable-sorted by timestamp, so arrival
//! order survives among equal timestamps and every downstream scan is
//! deterministic.

use std::collections::{HashMap, HashSet};
use tca_core::Quote;

/// Quotes grouped per security, sorted by timestamp.
#[derive(Debug, Default)]
pub struct QuoteBook {
    by_security: HashMap<String, Vec<Quote>>,
}

impl QuoteBook {
    /// Create an empty book.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a book from a flat batch of quotes.
    pub fn from_quotes(quotes: Vec<Quote>) -> Self {
        let mut book = Self::new();
        book.append(quotes);
        book
    }

    /// Append a batch of quotes, re-sorting only the touched securities.
    ///
    /// The sort is stable: quotes sharing a timestamp keep their arrival
    /// order, which is the final tie-break for every downstream join.
    pub fn append(&mut self, quotes: Vec<Quote>) {
        let mut touched: HashSet<String> = HashSet::new();
        for quote in quotes {
            touched.insert(quote.security_id.clone());
            self.by_security
                .entry(quote.security_id.clone())
                .or_default()
                .push(quote);
        }
        for security_id in &touched {
            if let Some(quotes) = self.by_security.get_mut(security_id) {
                quotes.sort_by_key(|q| q.ts);
            }
        }
    }

    /// Quotes for a security, sorted by timestamp. Empty if unknown.
    pub fn quotes(&self, security_id: &str) -> &[Quote] {
        self.by_security
            .get(security_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Iterate over the securities with at least one quote.
    pub fn securities(&self) -> impl Iterator<Item = &str> {
        self.by_security.keys().map(String::as_str)
    }

    /// Total number of quotes across all securities.
    pub fn len(&self) -> usize {
        self.by_security.values().map(Vec::len).sum()
    }

    /// Whether the book holds no quotes.
    pub fn is_empty(&self) -> bool {
        self.by_security.is_empty()
    }

    /// Clear all state.
    pub fn clear(&mut self) {
        self.by_security.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_quote(security_id: &str, ts: i64, bid: f64) -> Quote {
        Quote {
            security_id: security_id.to_string(),
            ts,
            condition_code: None,
            bid_price: bid,
            ask_price: bid + 0.2,
            trade_price: None,
            volume: None,
        }
    }

    #[test]
    fn test_sorted_per_security() {
        let book = QuoteBook::from_quotes(vec![
            make_quote("S1", 300, 10.0),
            make_quote("S2", 100, 20.0),
            make_quote("S1", 100, 11.0),
            make_quote("S1", 200, 12.0),
        ]);

        let ts: Vec<i64> = book.quotes("S1").iter().map(|q| q.ts).collect();
        assert_eq!(ts, vec![100, 200, 300]);
        assert_eq!(book.quotes("S2").len(), 1);
        assert_eq!(book.len(), 4);
    }

    #[test]
    fn test_stable_sort_preserves_arrival_order() {
        // Two quotes at the same timestamp: the first one in keeps its slot.
        let book = QuoteBook::from_quotes(vec![
            make_quote("S1", 100, 11.0),
            make_quote("S1", 100, 12.0),
        ]);

        let bids: Vec<f64> = book.quotes("S1").iter().map(|q| q.bid_price).collect();
        assert_eq!(bids, vec![11.0, 12.0]);
    }

    #[test]
    fn test_unknown_security_is_empty() {
        let book = QuoteBook::from_quotes(vec![make_quote("S1", 100, 10.0)]);
        assert!(book.quotes("S9").is_empty());
    }

    #[test]
    fn test_append_keeps_order() {
        let mut book = QuoteBook::from_quotes(vec![make_quote("S1", 200, 10.0)]);
        book.append(vec![make_quote("S1", 100, 11.0)]);

        let ts: Vec<i64> = book.quotes("S1").iter().map(|q| q.ts).collect();
        assert_eq!(ts, vec![100, 200]);
    }
}
