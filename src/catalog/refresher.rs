//! Catalog refresher: fetches `register.json` and publishes a new snapshot.
//!
//! Runs once at startup (bounded by a timeout) and then on a fixed interval in
//! a background tokio task. Only one refresh runs at a time; a refresh that
//! would overlap a running one is skipped, not queued. A failed refresh leaves
//! the current snapshot in place.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use reqwest::Client;
use serde_json::Value;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};
use url::Url;

use super::record::BuildingBlock;
use super::store::{CatalogSnapshot, CatalogStore};

/// Reasons a refresh did not publish.
#[derive(Error, Debug)]
pub enum RefreshError {
    #[error("failed to fetch {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("catalog payload is not valid JSON: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("catalog payload is not a JSON array")]
    NotAnArray,

    #[error("record {index} is malformed: {source}")]
    Record {
        index: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("initial fetch did not finish within {0:?}")]
    TimedOut(Duration),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// A new snapshot with this many records is now live.
    Published(usize),
    /// Another refresh was already running.
    Skipped,
}

pub struct CatalogRefresher {
    client: Client,
    catalog_url: Url,
    store: Arc<CatalogStore>,
    running: AtomicBool,
}

/// Clears the running flag when a refresh ends, however it ends.
struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl CatalogRefresher {
    pub fn new(client: Client, catalog_url: Url, store: Arc<CatalogStore>) -> Self {
        Self {
            client,
            catalog_url,
            store,
            running: AtomicBool::new(false),
        }
    }

    /// Fetch the catalog and publish it.
    pub async fn refresh(&self) -> Result<RefreshOutcome, RefreshError> {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Refresh already in progress, skipping");
            return Ok(RefreshOutcome::Skipped);
        }
        let _guard = RunningGuard(&self.running);

        info!(url = %self.catalog_url, "Updating building blocks");
        let records = self.fetch().await?;
        let snapshot = CatalogSnapshot::from_records(records, Utc::now());
        let count = snapshot.len();
        self.store.replace(snapshot);
        info!(count, "Catalog snapshot published");

        Ok(RefreshOutcome::Published(count))
    }

    async fn fetch(&self) -> Result<Vec<BuildingBlock>, RefreshError> {
        let url = self.catalog_url.as_str();
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| RefreshError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(RefreshError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|source| RefreshError::Transport {
                url: url.to_string(),
                source,
            })?;

        parse_catalog(&body)
    }

    /// Startup refresh, bounded by `timeout`. Failures are logged and leave the
    /// store as it was (empty at startup), so the service still comes up.
    pub async fn initial_refresh(&self, timeout: Duration) -> Result<RefreshOutcome, RefreshError> {
        let result = match tokio::time::timeout(timeout, self.refresh()).await {
            Ok(result) => result,
            Err(_) => Err(RefreshError::TimedOut(timeout)),
        };
        if let Err(e) = &result {
            warn!(error = %e, "Initial catalog fetch failed; starting with an empty catalog");
        }
        result
    }

    /// Spawn the periodic refresh task. The first tick is consumed immediately
    /// since startup already refreshed. Each refresh runs in its own task so a
    /// slow fetch never delays the timer; overlapping ticks are skipped by the
    /// running flag.
    pub fn spawn_periodic(self: Arc<Self>, period: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut timer = interval(period);
            timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
            timer.tick().await;

            info!(
                period_secs = period.as_secs(),
                "Catalog refresh task started"
            );

            loop {
                timer.tick().await;
                let refresher = Arc::clone(&self);
                tokio::spawn(async move {
                    match refresher.refresh().await {
                        Ok(RefreshOutcome::Published(_)) => {}
                        Ok(RefreshOutcome::Skipped) => {
                            warn!("Scheduled refresh skipped: previous refresh still running")
                        }
                        Err(e) => error!(error = %e, "Scheduled catalog refresh failed"),
                    }
                });
            }
        })
    }
}

/// HTTP client shared by the refresher and the schema proxy.
pub fn http_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// Parse a `register.json` body. Every element must be an object with a string
/// `itemIdentifier`.
pub fn parse_catalog(body: &[u8]) -> Result<Vec<BuildingBlock>, RefreshError> {
    let value: Value = serde_json::from_slice(body)?;
    let Value::Array(items) = value else {
        return Err(RefreshError::NotAnArray);
    };
    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            serde_json::from_value(item).map_err(|source| RefreshError::Record { index, source })
        })
        .collect()
}
