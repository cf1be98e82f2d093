//! Condition-code filtering of quotes per exchange context.
//!
//! An exclusion rule names a (mic_exchange, condition_code) pair. Whether a
//! quote is admitted depends on the exchange context of the order looking
//! at it, so the same quote can be valid for one order and excluded for
//! another. Rules are indexed for O(1) admission checks inside the bounded
//! scans of the as-of and post-trade joins.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use tca_core::{ConditionRule, Order, Quote};
use tca_ingestion::QuoteBook;

/// Indexed exclusion rules: condition codes to drop, per exchange.
#[derive(Debug, Clone, Default)]
pub struct ConditionFilter {
    rules: HashMap<String, HashSet<String>>,
}

impl ConditionFilter {
    /// Build the filter from a rule set.
    pub fn from_rules(rules: &[ConditionRule]) -> Self {
        let mut index: HashMap<String, HashSet<String>> = HashMap::new();
        for rule in rules {
            index
                .entry(rule.mic_exchange.clone())
                .or_default()
                .insert(rule.condition_code.clone());
        }
        Self { rules: index }
    }

    /// Whether a rule excludes this condition code on this exchange.
    ///
    /// A quote without a condition code never matches a rule; an exchange
    /// without rules admits everything.
    pub fn excludes(&self, mic_exchange: &str, condition_code: Option<&str>) -> bool {
        match (self.rules.get(mic_exchange), condition_code) {
            (Some(codes), Some(code)) => codes.contains(code),
            _ => false,
        }
    }

    /// Whether a quote is admitted under the given exchange context.
    #[inline]
    pub fn admits(&self, mic_exchange: &str, quote: &Quote) -> bool {
        !self.excludes(mic_exchange, quote.condition_code.as_deref())
    }

    /// Whether any of the given exchange contexts admits the quote.
    pub fn admits_any<'a>(
        &self,
        mic_exchanges: impl IntoIterator<Item = &'a str>,
        quote: &Quote,
    ) -> bool {
        mic_exchanges.into_iter().any(|mic| self.admits(mic, quote))
    }

    /// Number of distinct (exchange, code) rules indexed.
    pub fn rule_count(&self) -> usize {
        self.rules.values().map(HashSet::len).sum()
    }
}

/// Exchange contexts per security, deduplicated and sorted.
///
/// The per-security stages (VWAP) admit a quote if at least one of its
/// security's order contexts admits it.
pub fn security_contexts(orders: &[Order]) -> BTreeMap<String, Vec<String>> {
    let mut contexts: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for order in orders {
        contexts
            .entry(order.security_id.clone())
            .or_default()
            .insert(order.mic_exchange.clone());
    }
    contexts
        .into_iter()
        .map(|(security_id, mics)| (security_id, mics.into_iter().collect()))
        .collect()
}

/// One row of the filtered-quotes debug table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilteredQuoteRow {
    /// Security identifier.
    pub security_id: String,
    /// Exchange context the quote survived under.
    pub mic_exchange: String,
    /// Quote timestamp.
    pub ts: i64,
    /// Condition code of the quote.
    pub condition_code: Option<String>,
    /// Mid price, computed once here.
    pub mid_price: f64,
    /// Last trade price, if present.
    pub trade_price: Option<f64>,
    /// Trade volume, if present.
    pub volume: Option<f64>,
}

/// Materialize the per-exchange-context filtered quote view.
///
/// Debug artifact only; the joins never build this table, they consult the
/// filter during their bounded scans.
pub fn filtered_table(
    book: &QuoteBook,
    orders: &[Order],
    filter: &ConditionFilter,
) -> Vec<FilteredQuoteRow> {
    let mut rows = Vec::new();
    for (security_id, mics) in security_contexts(orders) {
        for mic_exchange in mics {
            for quote in book.quotes(&security_id) {
                if filter.admits(&mic_exchange, quote) {
                    rows.push(FilteredQuoteRow {
                        security_id: security_id.clone(),
                        mic_exchange: mic_exchange.clone(),
                        ts: quote.ts,
                        condition_code: quote.condition_code.clone(),
                        mid_price: quote.mid(),
                        trade_price: quote.trade_price,
                        volume: quote.volume,
                    });
                }
            }
        }
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_quote(security_id: &str, ts: i64, condition: Option<&str>) -> Quote {
        Quote {
            security_id: security_id.to_string(),
            ts,
            condition_code: condition.map(str::to_string),
            bid_price: 10.0,
            ask_price: 10.2,
            trade_price: None,
            volume: None,
        }
    }

    fn make_order(security_id: &str, mic: &str) -> Order {
        Order {
            security_id: security_id.to_string(),
            mic_exchange: mic.to_string(),
            fulfill_time: 100,
            order_start_time: 90,
            order_end_time: 110,
            order_size: 100.0,
            execution_price: 10.3,
        }
    }

    fn make_rule(mic: &str, code: &str) -> ConditionRule {
        ConditionRule {
            mic_exchange: mic.to_string(),
            condition_code: code.to_string(),
        }
    }

    #[test]
    fn test_rule_excludes_matching_pair() {
        let filter = ConditionFilter::from_rules(&[make_rule("XNYS", "Z")]);

        assert!(!filter.admits("XNYS", &make_quote("S1", 100, Some("Z"))));
        assert!(filter.admits("XNYS", &make_quote("S1", 100, Some("R"))));
        // Same code on another exchange is fine.
        assert!(filter.admits("XNAS", &make_quote("S1", 100, Some("Z"))));
    }

    #[test]
    fn test_no_condition_code_always_admitted() {
        let filter = ConditionFilter::from_rules(&[make_rule("XNYS", "Z")]);
        assert!(filter.admits("XNYS", &make_quote("S1", 100, None)));
    }

    #[test]
    fn test_exchange_without_rules_admits_all() {
        let filter = ConditionFilter::from_rules(&[]);
        assert!(filter.admits("XNYS", &make_quote("S1", 100, Some("Z"))));
        assert_eq!(filter.rule_count(), 0);
    }

    #[test]
    fn test_admits_any_union_semantics() {
        let filter = ConditionFilter::from_rules(&[make_rule("XNYS", "Z")]);
        let quote = make_quote("S1", 100, Some("Z"));

        assert!(filter.admits_any(["XNYS", "XNAS"], &quote));
        assert!(!filter.admits_any(["XNYS"], &quote));
    }

    #[test]
    fn test_filtered_table_per_context() {
        let book = QuoteBook::from_quotes(vec![
            make_quote("S1", 100, Some("Z")),
            make_quote("S1", 101, Some("R")),
        ]);
        let orders = vec![make_order("S1", "XNYS"), make_order("S1", "XNAS")];
        let filter = ConditionFilter::from_rules(&[make_rule("XNYS", "Z")]);

        let rows = filtered_table(&book, &orders, &filter);

        // XNAS keeps both quotes, XNYS drops the Z quote.
        let xnas: Vec<_> = rows.iter().filter(|r| r.mic_exchange == "XNAS").collect();
        let xnys: Vec<_> = rows.iter().filter(|r| r.mic_exchange == "XNYS").collect();
        assert_eq!(xnas.len(), 2);
        assert_eq!(xnys.len(), 1);
        assert_eq!(xnys[0].ts, 101);
        assert!((xnys[0].mid_price - 10.1).abs() < 1e-10);
    }

    #[test]
    fn test_quote_without_orders_never_surfaces() {
        let book = QuoteBook::from_quotes(vec![make_quote("S9", 100, None)]);
        let orders = vec![make_order("S1", "XNYS")];
        let filter = ConditionFilter::from_rules(&[]);

        let rows = filtered_table(&book, &orders, &filter);
        assert!(rows.is_empty());
    }
}
