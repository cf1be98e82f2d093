//! Benchmark computations for the TCA engine.
//!
//! This crate implements the three benchmark stages that feed the
//! shortfall engine:
//! - Condition-code filtering per exchange context
//! - As-of matching of orders to pre-trade quotes
//! - Windowed VWAP aggregation per security
//! - Post-trade drift tracking at a fixed settlement horizon

pub mod asof;
pub mod filter;
pub mod post_trade;
pub mod vwap;

pub use asof::AsOfMatcher;
pub use filter::{ConditionFilter, FilteredQuoteRow, filtered_table, security_contexts};
pub use post_trade::PostTradeTracker;
pub use vwap::VwapAggregator;
