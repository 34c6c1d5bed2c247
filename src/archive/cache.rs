//! Archive handle cache.
//!
//! The cache provides:
//! - One open handle per chart, opened on first use and kept for the life of
//!   the process
//! - Singleflight opens: concurrent first requests for a chart share one open
//! - A bounded open time, so a wedged archive cannot hang requests forever
//! - Negative caching of failed opens for a retry backoff window; a missing
//!   archive is not cached, so unknown chart ids leave nothing behind
//!
//! # Example
//!
//! ```ignore
//! use sectional_tiles::archive::{HandleCache, MbtilesSource};
//!
//! let cache = HandleCache::new(MbtilesSource::new("/var/data/charts"));
//!
//! // Opens chicago.mbtiles on first access, reuses the handle afterwards
//! let handle = cache.get_or_open(&chart).await?;
//! let tile = handle.tile(coords).await?;
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, Notify};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::tile::ChartId;

use super::source::ArchiveSource;

// =============================================================================
// Configuration
// =============================================================================

/// Default upper bound on a single archive open.
pub const DEFAULT_OPEN_TIMEOUT: Duration = Duration::from_secs(10);

/// Default time a failed open is remembered before it is retried.
pub const DEFAULT_OPEN_RETRY_BACKOFF: Duration = Duration::from_secs(30);

// =============================================================================
// Slots
// =============================================================================

type OpenResult<H> = Result<Arc<H>, StoreError>;

/// Per-chart cache entry.
enum Slot<H> {
    /// Handle is open and shared
    Ready(Arc<H>),
    /// An open is running; callers wait on it
    Opening(Arc<InFlightOpen<H>>),
    /// The last open failed at `at`
    Failed { error: StoreError, at: Instant },
}

/// State for an in-flight archive open.
struct InFlightOpen<H> {
    /// Notification for waiters
    notify: Notify,
    /// Result of the open (set once, before waiters are notified)
    result: Mutex<Option<OpenResult<H>>>,
}

impl<H> InFlightOpen<H> {
    fn new() -> Self {
        Self {
            notify: Notify::new(),
            result: Mutex::new(None),
        }
    }

    async fn publish(&self, result: OpenResult<H>) {
        *self.result.lock().await = Some(result);
        self.notify.notify_waiters();
    }

    async fn wait(&self) -> OpenResult<H> {
        loop {
            // Register interest before checking, so a publish between the
            // check and the await cannot be missed
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(result) = self.result.lock().await.as_ref() {
                return result.clone();
            }

            notified.await;
        }
    }
}

// =============================================================================
// HandleCache
// =============================================================================

/// Owner of every open archive handle.
///
/// The cache is cheap to clone; clones share the same handles.
pub struct HandleCache<S: ArchiveSource> {
    inner: Arc<CacheInner<S>>,
}

struct CacheInner<S: ArchiveSource> {
    /// Source used to open archives
    source: S,

    /// Chart id to slot; check-then-insert happens under this one lock
    slots: Mutex<HashMap<ChartId, Slot<S::Handle>>>,

    open_timeout: Duration,

    /// Zero disables negative caching
    retry_backoff: Duration,
}

impl<S: ArchiveSource> Clone for HandleCache<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: ArchiveSource> HandleCache<S> {
    /// Create a cache with the default open timeout and retry backoff.
    pub fn new(source: S) -> Self {
        Self::with_settings(source, DEFAULT_OPEN_TIMEOUT, DEFAULT_OPEN_RETRY_BACKOFF)
    }

    /// Create a cache with custom settings.
    ///
    /// # Arguments
    /// * `source` - Source that opens archives by chart
    /// * `open_timeout` - Upper bound on one open
    /// * `retry_backoff` - How long a failed open is served from cache;
    ///   `Duration::ZERO` retries on every request
    pub fn with_settings(source: S, open_timeout: Duration, retry_backoff: Duration) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                source,
                slots: Mutex::new(HashMap::new()),
                open_timeout,
                retry_backoff,
            }),
        }
    }

    /// Get the handle for `chart`, opening it if needed.
    ///
    /// Concurrent callers for a chart that is not yet open all wait on the
    /// same open and receive the same result. The open itself runs on its own
    /// task, so it completes even if every caller goes away.
    pub async fn get_or_open(&self, chart: &ChartId) -> Result<Arc<S::Handle>, StoreError> {
        let flight = {
            let mut slots = self.inner.slots.lock().await;

            match slots.get(chart) {
                Some(Slot::Ready(handle)) => return Ok(Arc::clone(handle)),
                Some(Slot::Opening(flight)) => Arc::clone(flight),
                Some(Slot::Failed { error, at }) if at.elapsed() < self.inner.retry_backoff => {
                    debug!(chart = %chart, "Archive open failed recently, not retrying yet");
                    return Err(error.clone());
                }
                _ => {
                    self.inner.prune_expired(&mut slots);

                    let flight = Arc::new(InFlightOpen::new());
                    slots.insert(chart.clone(), Slot::Opening(Arc::clone(&flight)));

                    let inner = Arc::clone(&self.inner);
                    let leader = Arc::clone(&flight);
                    let chart = chart.clone();
                    tokio::spawn(async move {
                        // A panicking source must still settle the slot and
                        // wake the waiters
                        let opener = tokio::spawn({
                            let inner = Arc::clone(&inner);
                            let chart = chart.clone();
                            async move { inner.open(&chart).await }
                        });
                        let result = match opener.await {
                            Ok(result) => result,
                            Err(e) => Err(StoreError::Open {
                                chart: chart.to_string(),
                                message: format!("archive open task failed: {}", e),
                            }),
                        };

                        inner.settle(&chart, &result).await;
                        leader.publish(result).await;
                    });

                    flight
                }
            }
        };

        flight.wait().await
    }

    /// Whether a handle for `chart` is open.
    pub async fn contains(&self, chart: &ChartId) -> bool {
        matches!(
            self.inner.slots.lock().await.get(chart),
            Some(Slot::Ready(_))
        )
    }

    /// Number of open handles.
    pub async fn open_count(&self) -> usize {
        self.inner
            .slots
            .lock()
            .await
            .values()
            .filter(|slot| matches!(slot, Slot::Ready(_)))
            .count()
    }

    /// Get a reference to the archive source.
    pub fn source(&self) -> &S {
        &self.inner.source
    }
}

impl<S: ArchiveSource> CacheInner<S> {
    /// Open `chart` within the open timeout.
    async fn open(&self, chart: &ChartId) -> OpenResult<S::Handle> {
        match tokio::time::timeout(self.open_timeout, self.source.open(chart)).await {
            Ok(result) => result.map(Arc::new),
            Err(_) => Err(StoreError::OpenTimeout {
                chart: chart.to_string(),
                timeout: self.open_timeout,
            }),
        }
    }

    /// Replace the `Opening` slot for `chart` with the outcome of its open.
    ///
    /// A missing archive is never remembered: chart ids come from clients,
    /// and the slot map must not grow with every name they try.
    async fn settle(&self, chart: &ChartId, result: &OpenResult<S::Handle>) {
        let mut slots = self.slots.lock().await;
        match result {
            Ok(handle) => {
                info!(chart = %chart, "Opened chart archive");
                slots.insert(chart.clone(), Slot::Ready(Arc::clone(handle)));
            }
            Err(error @ StoreError::ArchiveNotFound { .. }) => {
                debug!(chart = %chart, error = %error, "No archive for chart");
                slots.remove(chart);
            }
            Err(error) => {
                warn!(chart = %chart, error = %error, "Failed to open chart archive");
                if self.retry_backoff.is_zero() {
                    slots.remove(chart);
                } else {
                    slots.insert(
                        chart.clone(),
                        Slot::Failed {
                            error: error.clone(),
                            at: Instant::now(),
                        },
                    );
                }
            }
        }
    }

    /// Drop failures whose backoff has run out.
    fn prune_expired(&self, slots: &mut HashMap<ChartId, Slot<S::Handle>>) {
        slots.retain(|_, slot| match slot {
            Slot::Failed { at, .. } => at.elapsed() < self.retry_backoff,
            _ => true,
        });
    }
}

// =============================================================================
// Tests
// =============================================================================
