//! Core types and configuration for the TCA engine.
//!
//! This crate provides shared types used across all other crates:
//! - Market data types (quotes, orders, condition rules)
//! - Benchmark and shortfall record types
//! - Configuration structures
//! - Common error types

pub mod config;
pub mod error;
pub mod types;

pub use config::TcaConfig;
pub use error::{Error, Result};
pub use types::*;
