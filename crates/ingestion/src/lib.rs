//! Data ingestion for the TCA engine.
//!
//! This crate handles:
//! - Decoding raw tabular rows into typed records, with a rejection log
//! - Per-security quote book construction (the core's immutable snapshot)
//! - Asynchronous per-security retrieval from a polled remote source

pub mod book;
pub mod dataset;
pub mod fetch;

pub use book::QuoteBook;
pub use dataset::{RejectedRow, Table, decode_orders, decode_quotes, decode_rules};
pub use fetch::{FetchReport, FetchStatus, QueryHandle, QueryState, QuoteFetcher, QuoteSource, SecurityFetch};
