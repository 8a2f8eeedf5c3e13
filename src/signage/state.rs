use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::watch;

use crate::config::MIN_REFRESH_INTERVAL;
use crate::feed::{collect_with, format_timestamp, CollectOptions, FeedFetcher, FetchError, NewsEntry};

/// What the display shows: the result of the latest completed refresh.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    /// Completion time of the refresh, `None` before the first one.
    pub updated_at: Option<String>,
    pub entries: Vec<NewsEntry>,
    pub errors: Vec<String>,
}

/// Snapshot slot shared between the refresh task and HTTP handlers.
///
/// Readers get the whole snapshot of one refresh, never a mix of two.
#[derive(Debug, Clone, Default)]
pub struct SharedSnapshot {
    inner: Arc<Mutex<Arc<Snapshot>>>,
}

impl SharedSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// The current snapshot.
    pub fn load(&self) -> Arc<Snapshot> {
        // A panic while holding the lock cannot leave a half-written
        // snapshot behind, so a poisoned lock is still safe to read.
        let current = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&*current)
    }

    /// Replaces the current snapshot.
    pub fn store(&self, snapshot: Snapshot) {
        let snapshot = Arc::new(snapshot);
        *self.inner.lock().unwrap_or_else(PoisonError::into_inner) = snapshot;
    }
}

/// Re-collects a fixed set of feeds into a [`SharedSnapshot`].
pub struct Refresher {
    fetcher: FeedFetcher,
    urls: Vec<String>,
    keyword: Option<String>,
    limit: i64,
    snapshot: SharedSnapshot,
}

impl Refresher {
    /// Builds the HTTP client once; it is reused by every cycle.
    pub fn new(
        urls: Vec<String>,
        options: &CollectOptions,
        snapshot: SharedSnapshot,
    ) -> Result<Self, FetchError> {
        Ok(Self {
            fetcher: FeedFetcher::new(options.timeout, options.verify_tls)?,
            urls,
            keyword: options.keyword.clone(),
            limit: options.limit,
            snapshot,
        })
    }

    /// Runs one collection and publishes the result.
    ///
    /// Per-feed failures end up in the snapshot's `errors`; the refresh
    /// itself always succeeds.
    pub async fn refresh_once(&self) -> Arc<Snapshot> {
        let collected =
            collect_with(&self.fetcher, &self.urls, self.keyword.as_deref(), self.limit).await;

        let snapshot = Snapshot {
            updated_at: format_timestamp(Some(Utc::now().fixed_offset())),
            entries: collected.entries,
            errors: collected.warnings,
        };
        tracing::info!(
            entries = snapshot.entries.len(),
            errors = snapshot.errors.len(),
            "Refreshed signage snapshot"
        );

        self.snapshot.store(snapshot);
        self.snapshot.load()
    }

    /// Refreshes every `interval` (at least [`MIN_REFRESH_INTERVAL`]) until
    /// `stop` turns `true` or its sender is dropped.
    ///
    /// The first refresh happens one interval after the call; callers do
    /// their initial refresh themselves. A stop request is honored between
    /// cycles, not in the middle of one.
    pub async fn run(self, interval: Duration, mut stop: watch::Receiver<bool>) {
        let interval = interval.max(MIN_REFRESH_INTERVAL);
        tracing::debug!(interval_secs = interval.as_secs_f64(), "Refresh loop started");

        loop {
            tokio::select! {
                biased;

                _ = stop.wait_for(|stopped| *stopped) => break,
                _ = tokio::time::sleep(interval) => {}
            }
            self.refresh_once().await;
        }

        tracing::debug!("Refresh loop stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn idle_refresher(snapshot: SharedSnapshot) -> Refresher {
        Refresher::new(Vec::new(), &CollectOptions::default(), snapshot).unwrap()
    }

    #[test]
    fn test_snapshot_starts_empty() {
        let shared = SharedSnapshot::new();
        assert_eq!(*shared.load(), Snapshot::default());
    }

    #[test]
    fn test_store_replaces_whole_snapshot() {
        let shared = SharedSnapshot::new();
        let before = shared.load();

        shared.store(Snapshot {
            updated_at: Some("2024-01-01T00:00:00Z".to_string()),
            entries: vec![NewsEntry::new("S", "T", "https://s/t").unwrap()],
            errors: vec!["Failed to read https://x/: boom".to_string()],
        });

        let after = shared.load();
        assert_eq!(before.updated_at, None);
        assert_eq!(after.updated_at.as_deref(), Some("2024-01-01T00:00:00Z"));
        assert_eq!(after.entries.len(), 1);
        assert_eq!(after.errors.len(), 1);
    }

    #[test]
    fn test_poisoned_lock_is_recovered() {
        let shared = SharedSnapshot::new();
        let clone = shared.clone();
        let _ = std::thread::spawn(move || {
            let _guard = clone.inner.lock().unwrap();
            panic!("poison the lock");
        })
        .join();

        assert!(shared.inner.is_poisoned());
        shared.store(Snapshot {
            updated_at: Some("t".to_string()),
            ..Snapshot::default()
        });
        assert_eq!(shared.load().updated_at.as_deref(), Some("t"));
    }

    #[test]
    fn test_snapshot_json_shape() {
        let value = serde_json::to_value(Snapshot::default()).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"updated_at": null, "entries": [], "errors": []})
        );
    }

    #[tokio::test]
    async fn test_refresh_once_sets_updated_at() {
        let shared = SharedSnapshot::new();
        let refresher = idle_refresher(shared.clone());

        let snapshot = refresher.refresh_once().await;
        let updated_at = snapshot.updated_at.as_deref().unwrap();
        assert!(updated_at.ends_with('Z'), "{updated_at}");
        assert_eq!(shared.load(), snapshot);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_loop_floors_interval() {
        let shared = SharedSnapshot::new();
        let (stop_tx, stop_rx) = watch::channel(false);
        let handle = tokio::spawn(idle_refresher(shared.clone()).run(Duration::from_secs(1), stop_rx));

        tokio::time::sleep(Duration::from_millis(4_900)).await;
        assert!(shared.load().updated_at.is_none(), "refreshed before the 5s floor");

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(shared.load().updated_at.is_some());

        stop_tx.send(true).unwrap();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_loop_waits_full_interval() {
        let shared = SharedSnapshot::new();
        let (stop_tx, stop_rx) = watch::channel(false);
        let handle = tokio::spawn(idle_refresher(shared.clone()).run(Duration::from_secs(300), stop_rx));

        tokio::time::sleep(Duration::from_secs(299)).await;
        assert!(shared.load().updated_at.is_none());

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(shared.load().updated_at.is_some());

        stop_tx.send(true).unwrap();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_before_first_cycle() {
        let shared = SharedSnapshot::new();
        let (stop_tx, stop_rx) = watch::channel(false);
        let handle = tokio::spawn(idle_refresher(shared.clone()).run(Duration::from_secs(60), stop_rx));

        stop_tx.send(true).unwrap();
        handle.await.unwrap();
        assert!(shared.load().updated_at.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_sender_stops_loop() {
        let (stop_tx, stop_rx) = watch::channel(false);
        let handle = tokio::spawn(idle_refresher(SharedSnapshot::new()).run(Duration::from_secs(60), stop_rx));

        drop(stop_tx);
        handle.await.unwrap();
    }
}
