//! End-to-end TCA pipeline.
//!
//! Composes the condition filter, as-of matcher, VWAP aggregator, and
//! post-trade tracker into a single synchronous pass over fully
//! materialized snapshots, then folds the results through the shortfall
//! engine. The pipeline always completes: data-quality problems shrink the
//! output and bump the counters, they never abort the run.

use crate::shortfall::{DropCounts, ShortfallEngine};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tca_benchmarks::{
    filtered_table, AsOfMatcher, ConditionFilter, FilteredQuoteRow, PostTradeTracker,
    VwapAggregator,
};
use tca_core::{ConditionRule, Order, Quote, Result, ShortfallRecord, TcaConfig};
use tca_ingestion::{dataset, QuoteBook, RejectedRow};
use tracing::debug;

/// Output of one pipeline run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TcaReport {
    /// One record per order with all enabled benchmarks resolved, in input
    /// order.
    pub records: Vec<ShortfallRecord>,
    /// Per-security VWAP over the union execution window.
    pub vwap_table: BTreeMap<String, f64>,
    /// Filtered-quotes debug view, per exchange context.
    pub filtered_quotes: Vec<FilteredQuoteRow>,
    /// Orders dropped per missing benchmark.
    pub drops: DropCounts,
    /// Input rows that failed decoding (raw-row entry point only).
    pub rejected_rows: Vec<RejectedRow>,
}

/// The TCA pipeline, configured once and reusable across runs.
#[derive(Debug, Clone)]
pub struct TcaPipeline {
    config: TcaConfig,
}

impl TcaPipeline {
    /// Create a pipeline, validating the configuration up front.
    pub fn new(config: TcaConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The active configuration.
    pub fn config(&self) -> &TcaConfig {
        &self.config
    }

    /// Run over typed records.
    pub fn run(
        &self,
        quotes: Vec<Quote>,
        orders: &[Order],
        rules: &[ConditionRule],
    ) -> TcaReport {
        let book = QuoteBook::from_quotes(quotes);
        self.run_book(&book, orders, rules, Vec::new())
    }

    /// Run over raw tabular rows, decoding them first.
    ///
    /// Rows that fail decoding are skipped and carried in the report's
    /// rejection log; they never abort the batch.
    pub fn run_rows(
        &self,
        quote_rows: &[Value],
        order_rows: &[Value],
        rule_rows: &[Value],
    ) -> TcaReport {
        let (quotes, mut rejected) = dataset::decode_quotes(quote_rows);
        let (orders, rejected_orders) = dataset::decode_orders(order_rows);
        let (rules, rejected_rules) = dataset::decode_rules(rule_rows);
        rejected.extend(rejected_orders);
        rejected.extend(rejected_rules);

        let book = QuoteBook::from_quotes(quotes);
        self.run_book(&book, &orders, &rules, rejected)
    }

    /// Run over a prebuilt quote book (e.g. assembled by the fetch adapter).
    pub fn run_book(
        &self,
        book: &QuoteBook,
        orders: &[Order],
        rules: &[ConditionRule],
        rejected_rows: Vec<RejectedRow>,
    ) -> TcaReport {
        let toggles = &self.config.benchmarks;
        let filter = ConditionFilter::from_rules(rules);
        let filtered_quotes = filtered_table(book, orders, &filter);
        debug!(
            quotes = book.len(),
            orders = orders.len(),
            rules = filter.rule_count(),
            filtered = filtered_quotes.len(),
            "condition filter applied"
        );

        let matcher = AsOfMatcher::new(self.config.as_of.tolerance_secs);
        let tracker = PostTradeTracker::new(
            self.config.post_trade.horizon_secs,
            self.config.post_trade.horizon_band_secs,
        );
        let vwap_table = if toggles.vwap {
            VwapAggregator::new().compute(book, &filter, orders)
        } else {
            BTreeMap::new()
        };
        debug!(securities = vwap_table.len(), "vwap table computed");

        let engine = ShortfallEngine::new(toggles.clone());
        let mut records = Vec::with_capacity(orders.len());
        let mut drops = DropCounts::default();

        for order in orders {
            let pre_trade = toggles
                .arrival
                .then(|| matcher.match_order(book, &filter, order))
                .flatten();
            let vwap = toggles
                .vwap
                .then(|| vwap_table.get(&order.security_id).copied())
                .flatten();
            let post_trade = toggles
                .settlement
                .then(|| tracker.track(book, &filter, order))
                .flatten();

            match engine.evaluate(order, pre_trade.as_ref(), vwap, post_trade.as_ref()) {
                Ok(record) => records.push(record),
                Err(reason) => {
                    debug!(security = %order.security_id, ?reason, "order dropped");
                    drops.record(reason);
                }
            }
        }

        debug!(
            records = records.len(),
            dropped = drops.total(),
            rejected = rejected_rows.len(),
            "pipeline complete"
        );

        TcaReport {
            records,
            vwap_table,
            filtered_quotes,
            drops,
            rejected_rows,
        }
    }
}
