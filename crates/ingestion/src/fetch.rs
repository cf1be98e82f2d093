//! Asynchronous per-security quote retrieval.
//!
//! Models a remote query engine where a query is submitted, polled until it
//! reaches a terminal state, and only then read back. One cooperative task
//! runs per security under a concurrency cap; each security is an
//! independent failure domain, so one failed or timed-out fetch never
//! blocks or corrupts the others.

use crate::book::QuoteBook;
use crate::dataset::{self, RejectedRow};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tca_core::config::FetchConfig;
use tca_core::{Error, Quote, Result};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

/// Handle for a submitted remote query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryHandle(pub String);

/// State of a remote query as reported by the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryState {
    /// Still executing.
    Running,
    /// Finished; rows can be read.
    Complete,
    /// Terminally failed on the remote side.
    Failed(String),
}

/// A remote source of raw quote rows, queried per security.
///
/// Implementations own all connection state; the fetcher only drives the
/// submit/poll/read protocol.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    /// Submit the query for one security, returning a pollable handle.
    async fn submit(&self, security_id: &str) -> Result<QueryHandle>;

    /// Report the current state of a submitted query.
    async fn status(&self, handle: &QueryHandle) -> Result<QueryState>;

    /// Read the result rows of a completed query.
    async fn rows(&self, handle: &QueryHandle) -> Result<Vec<Value>>;
}

/// Terminal outcome of one security's fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FetchStatus {
    /// The full dataset was retrieved and decoded.
    Complete,
    /// The query or transport failed.
    Failed(String),
    /// The query did not finish within the configured deadline.
    TimedOut,
}

/// Result of one security's fetch: status flag plus decoded data.
#[derive(Debug, Clone)]
pub struct SecurityFetch {
    /// Security the fetch was for.
    pub security_id: String,
    /// Terminal status.
    pub status: FetchStatus,
    /// Decoded quotes (empty unless `Complete`).
    pub quotes: Vec<Quote>,
    /// Rows that failed decoding (empty unless `Complete`).
    pub rejected: Vec<RejectedRow>,
}

/// Summary of a fan-out fetch across securities, in input order.
#[derive(Debug, Default)]
pub struct FetchReport {
    /// One entry per requested security.
    pub fetches: Vec<SecurityFetch>,
}

impl FetchReport {
    /// Number of securities that completed.
    pub fn completed(&self) -> usize {
        self.fetches
            .iter()
            .filter(|f| f.status == FetchStatus::Complete)
            .count()
    }

    /// Securities that did not complete, with their status flags.
    pub fn failures(&self) -> Vec<(&str, &FetchStatus)> {
        self.fetches
            .iter()
            .filter(|f| f.status != FetchStatus::Complete)
            .map(|f| (f.security_id.as_str(), &f.status))
            .collect()
    }

    /// Build the quote book from completed fetches only.
    ///
    /// Partial or failed fetches contribute nothing; the returned rejection
    /// log covers the rows that completed fetches could not decode.
    pub fn into_book(self) -> (QuoteBook, Vec<RejectedRow>) {
        let mut book = QuoteBook::new();
        let mut rejected = Vec::new();
        for fetch in self.fetches {
            if fetch.status == FetchStatus::Complete {
                book.append(fetch.quotes);
                rejected.extend(fetch.rejected);
            }
        }
        (book, rejected)
    }
}

/// Drives the submit/poll/read protocol across securities.
pub struct QuoteFetcher {
    config: FetchConfig,
}

impl QuoteFetcher {
    /// Create a new fetcher.
    pub fn new(config: FetchConfig) -> Self {
        Self { config }
    }

    /// Fetch all securities, at most `max_concurrent_fetches` at a time.
    ///
    /// The report lists securities in input order regardless of completion
    /// order.
    pub async fn fetch_all(
        &self,
        source: Arc<dyn QuoteSource>,
        securities: &[String],
    ) -> FetchReport {
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_fetches));
        let mut tasks = JoinSet::new();
        let mut task_index = HashMap::new();

        for (idx, security_id) in securities.iter().cloned().enumerate() {
            let source = source.clone();
            let semaphore = semaphore.clone();
            let config = self.config.clone();
            let handle = tasks.spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        return (
                            idx,
                            SecurityFetch {
                                security_id,
                                status: FetchStatus::Failed("fetch pool closed".to_string()),
                                quotes: Vec::new(),
                                rejected: Vec::new(),
                            },
                        )
                    }
                };
                let fetch = fetch_one(source.as_ref(), &config, &security_id).await;
                (idx, fetch)
            });
            task_index.insert(handle.id(), idx);
        }

        let mut slots: Vec<Option<SecurityFetch>> = vec![None; securities.len()];
        while let Some(joined) = tasks.join_next_with_id().await {
            match joined {
                Ok((_, (idx, fetch))) => slots[idx] = Some(fetch),
                Err(join_err) => {
                    // A panicked task fails only its own security.
                    if let Some(&idx) = task_index.get(&join_err.id()) {
                        warn!(security = %securities[idx], error = %join_err, "fetch task aborted");
                        slots[idx] = Some(SecurityFetch {
                            security_id: securities[idx].clone(),
                            status: FetchStatus::Failed(join_err.to_string()),
                            quotes: Vec::new(),
                            rejected: Vec::new(),
                        });
                    }
                }
            }
        }

        let fetches = slots
            .into_iter()
            .enumerate()
            .map(|(idx, slot)| {
                slot.unwrap_or_else(|| SecurityFetch {
                    security_id: securities[idx].clone(),
                    status: FetchStatus::Failed("fetch task vanished".to_string()),
                    quotes: Vec::new(),
                    rejected: Vec::new(),
                })
            })
            .collect();

        FetchReport { fetches }
    }
}

/// Run one security's fetch to a terminal state.
async fn fetch_one(
    source: &dyn QuoteSource,
    config: &FetchConfig,
    security_id: &str,
) -> SecurityFetch {
    let deadline = Duration::from_secs(config.query_timeout_secs);
    match timeout(deadline, run_query(source, config, security_id)).await {
        Ok(Ok((quotes, rejected))) => {
            debug!(security = %security_id, quotes = quotes.len(), "fetch complete");
            SecurityFetch {
                security_id: security_id.to_string(),
                status: FetchStatus::Complete,
                quotes,
                rejected,
            }
        }
        Ok(Err(err)) => {
            warn!(security = %security_id, error = %err, "fetch failed");
            SecurityFetch {
                security_id: security_id.to_string(),
                status: FetchStatus::Failed(err.to_string()),
                quotes: Vec::new(),
                rejected: Vec::new(),
            }
        }
        Err(_) => {
            warn!(security = %security_id, "fetch timed out");
            SecurityFetch {
                security_id: security_id.to_string(),
                status: FetchStatus::TimedOut,
                quotes: Vec::new(),
                rejected: Vec::new(),
            }
        }
    }
}

/// Submit, poll to completion, then read and decode rows.
async fn run_query(
    source: &dyn QuoteSource,
    config: &FetchConfig,
    security_id: &str,
) -> Result<(Vec<Quote>, Vec<RejectedRow>)> {
    let handle = source.submit(security_id).await?;

    loop {
        match source.status(&handle).await? {
            QueryState::Complete => break,
            QueryState::Failed(reason) => {
                return Err(Error::ingestion(format!(
                    "query {} failed: {reason}",
                    handle.0
                )))
            }
            QueryState::Running => sleep(Duration::from_millis(config.poll_interval_ms)).await,
        }
    }

    let rows = source.rows(&handle).await?;
    Ok(dataset::decode_quotes(&rows))
}
