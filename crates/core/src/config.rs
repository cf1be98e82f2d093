//! Configuration structures for the TCA engine.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Main configuration for a TCA run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TcaConfig {
    /// As-of matcher configuration.
    pub as_of: AsOfConfig,
    /// Post-trade tracker configuration.
    pub post_trade: PostTradeConfig,
    /// Per-benchmark enable flags.
    pub benchmarks: BenchmarkToggles,
    /// Remote fetch configuration.
    pub fetch: FetchConfig,
}

impl Default for TcaConfig {
    fn default() -> Self {
        Self {
            as_of: AsOfConfig::default(),
            post_trade: PostTradeConfig::default(),
            benchmarks: BenchmarkToggles::default(),
            fetch: FetchConfig::default(),
        }
    }
}

impl TcaConfig {
    /// Validate the configuration.
    ///
    /// Structurally invalid values fail here, before any data is touched;
    /// data-quality problems downstream never do.
    pub fn validate(&self) -> Result<()> {
        if self.as_of.tolerance_secs < 0 {
            return Err(Error::config(format!(
                "as-of tolerance must be non-negative, got {}",
                self.as_of.tolerance_secs
            )));
        }
        if self.post_trade.horizon_secs < 0 {
            return Err(Error::config(format!(
                "post-trade horizon must be non-negative, got {}",
                self.post_trade.horizon_secs
            )));
        }
        if self.post_trade.horizon_band_secs < 0 {
            return Err(Error::config(format!(
                "post-trade horizon band must be non-negative, got {}",
                self.post_trade.horizon_band_secs
            )));
        }
        if self.fetch.poll_interval_ms == 0 {
            return Err(Error::config("fetch poll interval must be positive"));
        }
        if self.fetch.max_concurrent_fetches == 0 {
            return Err(Error::config("fetch concurrency must be at least 1"));
        }
        Ok(())
    }
}

/// As-of matcher configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AsOfConfig {
    /// Maximum lookback from an order's fulfill time to a quote (seconds).
    pub tolerance_secs: i64,
}

impl Default for AsOfConfig {
    fn default() -> Self {
        Self { tolerance_secs: 3 }
    }
}

/// Post-trade tracker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostTradeConfig {
    /// Horizon after order end at which the settlement price is read (seconds).
    pub horizon_secs: i64,
    /// Maximum deviation of a quote's offset from the horizon (seconds).
    pub horizon_band_secs: i64,
}

impl Default for PostTradeConfig {
    fn default() -> Self {
        Self {
            horizon_secs: 10,
            horizon_band_secs: 10,
        }
    }
}

/// Independent enable flags for the three benchmark computations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkToggles {
    /// Compute the pre-trade (arrival) benchmark.
    pub arrival: bool,
    /// Compute the VWAP benchmark.
    pub vwap: bool,
    /// Compute the settlement (post-trade) benchmark.
    pub settlement: bool,
}

impl Default for BenchmarkToggles {
    fn default() -> Self {
        Self {
            arrival: true,
            vwap: true,
            settlement: true,
        }
    }
}

/// Remote fetch configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Interval between status polls of a running remote query (ms).
    pub poll_interval_ms: u64,
    /// Deadline for a single security's query, submission to rows (seconds).
    pub query_timeout_secs: u64,
    /// Maximum securities fetched concurrently.
    pub max_concurrent_fetches: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 500,
            query_timeout_secs: 30,
            max_concurrent_fetches: 4,
        }
    }
}
