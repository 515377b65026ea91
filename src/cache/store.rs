//! Keyed query cache with stale-while-revalidate semantics.
//!
//! Each `QueryKey` owns one entry that moves through
//! `Empty -> Fetching -> Fresh -> Stale -> Revalidating -> Fresh | Error`.
//! Values are stored as raw JSON; typed access deserializes at the edge, so a
//! mutation rollback can restore the exact previous bytes.
//!
//! Invariants:
//! - at most one fetch is in flight per key; concurrent callers attach to it
//! - a stale read returns the cached value immediately and triggers exactly
//!   one background refetch
//! - responses from fetches cancelled via `cancel_queries` are discarded
//! - an entry without subscribers is evicted after its policy's `gc_time`

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::api::ApiError;

use super::key::QueryKey;
use super::policy::{backoff_delay, QueryPolicy};

/// Fetcher registered per key. Boxed so heterogeneous endpoints share one
/// cache; each returns the raw JSON value to store.
pub type QueryFn = Arc<dyn Fn() -> BoxFuture<'static, Result<Value, ApiError>> + Send + Sync>;

/// Build a `QueryFn` from an async closure returning any serializable value.
pub fn query_fn<T, Fut, F>(f: F) -> QueryFn
where
    T: Serialize,
    Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    F: Fn() -> Fut + Send + Sync + 'static,
{
    Arc::new(move || {
        let fut = f();
        Box::pin(async move {
            let value = fut.await?;
            serde_json::to_value(value).map_err(|e| ApiError::InvalidResponse(e.to_string()))
        })
    })
}

#[derive(Debug, Clone, Error)]
pub enum QueryError {
    #[error("{0}")]
    Api(Arc<ApiError>),

    #[error("Query cancelled")]
    Cancelled,

    #[error("Cached value does not match requested type: {0}")]
    Decode(Arc<serde_json::Error>),
}

/// Observable position of an entry in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryState {
    Empty,
    Fetching,
    Fresh,
    Stale,
    Revalidating,
    Error,
}

/// A cached value and the instant it was fetched.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedValue {
    pub value: Value,
    pub fetched_at: DateTime<Utc>,
}

impl CachedValue {
    fn new(value: Value) -> Self {
        Self { value, fetched_at: Utc::now() }
    }

    /// How long ago this value was fetched.
    pub fn age(&self) -> chrono::Duration {
        Utc::now() - self.fetched_at
    }

    fn is_stale(&self, stale_time: std::time::Duration) -> bool {
        let stale_time = chrono::Duration::from_std(stale_time).unwrap_or(chrono::Duration::MAX);
        Utc::now() - self.fetched_at >= stale_time
    }
}

type FetchOutcome = Result<Value, QueryError>;

struct Entry {
    policy: QueryPolicy,
    value: Option<CachedValue>,
    error: Option<QueryError>,
    fetcher: Option<QueryFn>,
    in_flight: Option<broadcast::Sender<FetchOutcome>>,
    /// Bumped by `cancel_queries`; a completing fetch that was started under
    /// an older epoch is discarded.
    epoch: u64,
    invalidated: bool,
    subscribers: usize,
    idle_since: Option<DateTime<Utc>>,
    changed: watch::Sender<u64>,
    version: u64,
}

impl Entry {
    fn new(policy: QueryPolicy) -> Self {
        let (changed, _) = watch::channel(0);
        Self {
            policy,
            value: None,
            error: None,
            fetcher: None,
            in_flight: None,
            epoch: 0,
            invalidated: false,
            subscribers: 0,
            idle_since: Some(Utc::now()),
            changed,
            version: 0,
        }
    }

    fn publish(&mut self) {
        self.version += 1;
        let _ = self.changed.send(self.version);
    }

    fn is_stale(&self) -> bool {
        self.invalidated
            || self
                .value
                .as_ref()
                .is_some_and(|v| v.is_stale(self.policy.stale_time))
    }
}

/// Shared query cache.
///
/// Clone is cheap - the store is reference-counted. Construct one per
/// application (or per test) and pass it explicitly; there is no global
/// instance.
#[derive(Clone, Default)]
pub struct QueryCache {
    inner: Arc<Mutex<HashMap<QueryKey, Entry>>>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read through the cache.
    ///
    /// Fresh hits return immediately with no fetch. Stale hits return the
    /// cached value immediately and revalidate in the background. Misses
    /// await the (possibly shared) fetch. The fetcher is remembered for
    /// background refetches of this key.
    pub async fn query<T: DeserializeOwned>(
        &self,
        key: QueryKey,
        fetcher: QueryFn,
    ) -> Result<T, QueryError> {
        enum Plan {
            Hit(Value),
            StaleHit(Value),
            Miss,
        }

        let plan = {
            let mut map = self.inner.lock().unwrap();
            let entry = map
                .entry(key.clone())
                .or_insert_with(|| Entry::new(QueryPolicy::for_class(key.class())));
            entry.fetcher = Some(fetcher);
            if entry.subscribers == 0 {
                // Unsubscribed entries stay alive for gc_time past their
                // last read.
                entry.idle_since = Some(Utc::now());
            }

            match &entry.value {
                Some(cached) if !entry.is_stale() => Plan::Hit(cached.value.clone()),
                Some(cached) => Plan::StaleHit(cached.value.clone()),
                None => Plan::Miss,
            }
        };

        match plan {
            Plan::Hit(value) => decode(value),
            Plan::StaleHit(value) => {
                debug!(key = %key, "Serving stale value, revalidating in background");
                self.spawn_refetch(&key);
                decode(value)
            }
            Plan::Miss => {
                let value = self.fetch_or_join(&key).await?;
                decode(value)
            }
        }
    }

    /// Subscribe to a key. While the subscription is alive the entry is
    /// pinned (no eviction) and, if its policy has a refetch interval, a
    /// background loop keeps it warm. Dropping the subscription releases the
    /// entry and starts its garbage-collection window.
    pub fn watch(&self, key: QueryKey, fetcher: QueryFn) -> QuerySubscription {
        let (changed, interval) = {
            let mut map = self.inner.lock().unwrap();
            let entry = map
                .entry(key.clone())
                .or_insert_with(|| Entry::new(QueryPolicy::for_class(key.class())));
            entry.fetcher = Some(fetcher);
            entry.subscribers += 1;
            entry.idle_since = None;
            (entry.changed.subscribe(), entry.policy.refetch_interval)
        };

        let refresher = interval.and_then(|period| {
            let handle = tokio::runtime::Handle::try_current().ok()?;
            let cache = self.clone();
            let key = key.clone();
            Some(handle.spawn(async move {
                loop {
                    tokio::time::sleep(period).await;
                    let _ = cache.fetch_or_join(&key).await;
                }
            }))
        });

        QuerySubscription { cache: self.clone(), key, changed, refresher }
    }

    /// Last cached value for a key, regardless of staleness.
    pub fn peek<T: DeserializeOwned>(&self, key: &QueryKey) -> Option<T> {
        let map = self.inner.lock().unwrap();
        let cached = map.get(key)?.value.as_ref()?;
        serde_json::from_value(cached.value.clone()).ok()
    }

    /// Replace the cached value for a key, clearing any recorded error.
    pub fn set_value(&self, key: &QueryKey, value: Value) {
        let mut map = self.inner.lock().unwrap();
        let entry = map
            .entry(key.clone())
            .or_insert_with(|| Entry::new(QueryPolicy::for_class(key.class())));
        entry.value = Some(CachedValue::new(value));
        entry.error = None;
        entry.invalidated = false;
        entry.publish();
    }

    /// Mark a key stale so its next read revalidates. Keys with active
    /// subscribers refetch immediately.
    pub fn invalidate(&self, key: &QueryKey) {
        let refetch_now = {
            let mut map = self.inner.lock().unwrap();
            let Some(entry) = map.get_mut(key) else { return };
            entry.invalidated = true;
            entry.publish();
            entry.subscribers > 0 && entry.fetcher.is_some()
        };
        if refetch_now {
            self.spawn_refetch(key);
        }
    }

    /// Cancel any in-flight fetch for a key. Waiters resolve with
    /// `Cancelled`; the response, if it ever arrives, is discarded.
    pub fn cancel_queries(&self, key: &QueryKey) {
        let mut map = self.inner.lock().unwrap();
        let Some(entry) = map.get_mut(key) else { return };
        entry.epoch += 1;
        if let Some(tx) = entry.in_flight.take() {
            debug!(key = %key, "Cancelled in-flight fetch");
            let _ = tx.send(Err(QueryError::Cancelled));
            entry.publish();
        }
    }

    /// Revalidate every stale, subscribed key whose policy refetches on
    /// window focus.
    pub fn notify_focus(&self) {
        let keys: Vec<QueryKey> = {
            let map = self.inner.lock().unwrap();
            map.iter()
                .filter(|(_, e)| e.policy.refetch_on_focus && e.subscribers > 0 && e.is_stale())
                .map(|(k, _)| k.clone())
                .collect()
        };
        for key in keys {
            debug!(key = %key, "Focus refetch");
            self.spawn_refetch(&key);
        }
    }

    /// Current lifecycle state of a key.
    pub fn state(&self, key: &QueryKey) -> QueryState {
        let map = self.inner.lock().unwrap();
        let Some(entry) = map.get(key) else { return QueryState::Empty };
        if entry.in_flight.is_some() {
            if entry.value.is_some() {
                QueryState::Revalidating
            } else {
                QueryState::Fetching
            }
        } else if entry.value.is_some() {
            if entry.is_stale() {
                QueryState::Stale
            } else {
                QueryState::Fresh
            }
        } else if entry.error.is_some() {
            QueryState::Error
        } else {
            QueryState::Empty
        }
    }

    /// Error recorded by the most recent failed fetch, if the entry still
    /// holds one.
    pub fn last_error(&self, key: &QueryKey) -> Option<QueryError> {
        let map = self.inner.lock().unwrap();
        map.get(key)?.error.clone()
    }

    /// When the cached value for a key was fetched, if one exists. Lets the
    /// UI show a "last updated" hint next to cached data.
    pub fn fetched_at(&self, key: &QueryKey) -> Option<DateTime<Utc>> {
        let map = self.inner.lock().unwrap();
        Some(map.get(key)?.value.as_ref()?.fetched_at)
    }

    /// Remove entries that have been without subscribers for their policy's
    /// `gc_time`. Also runs from a timer whenever a subscription is dropped.
    pub fn evict_idle(&self) {
        let now = Utc::now();
        let mut map = self.inner.lock().unwrap();
        map.retain(|key, entry| {
            let gc_time =
                chrono::Duration::from_std(entry.policy.gc_time).unwrap_or(chrono::Duration::MAX);
            let expired = entry.subscribers == 0
                && entry.idle_since.is_some_and(|idle| now - idle >= gc_time);
            if expired {
                debug!(key = %key, "Evicting idle cache entry");
            }
            !expired
        });
    }

    pub(crate) fn snapshot(&self, key: &QueryKey) -> Option<CachedValue> {
        let map = self.inner.lock().unwrap();
        map.get(key)?.value.clone()
    }

    /// Restore a snapshot verbatim, including its original fetch timestamp.
    pub(crate) fn restore(&self, key: &QueryKey, snapshot: Option<CachedValue>) {
        let mut map = self.inner.lock().unwrap();
        let entry = map
            .entry(key.clone())
            .or_insert_with(|| Entry::new(QueryPolicy::for_class(key.class())));
        entry.value = snapshot;
        entry.publish();
    }

    /// Fetch a key, attaching to an already in-flight request if one exists.
    async fn fetch_or_join(&self, key: &QueryKey) -> FetchOutcome {
        let claim = {
            let mut map = self.inner.lock().unwrap();
            let Some(entry) = map.get_mut(key) else {
                return Err(QueryError::Cancelled);
            };
            if let Some(tx) = &entry.in_flight {
                Err(tx.subscribe())
            } else {
                let Some(fetcher) = entry.fetcher.clone() else {
                    debug!(key = %key, "No fetcher registered, skipping refetch");
                    return Err(QueryError::Cancelled);
                };
                let (tx, _rx) = broadcast::channel(1);
                entry.in_flight = Some(tx.clone());
                entry.publish();
                Ok((fetcher, tx, entry.epoch, entry.policy.retry_attempts))
            }
        };

        let (fetcher, tx, epoch, attempts) = match claim {
            Err(mut rx) => return rx.recv().await.unwrap_or(Err(QueryError::Cancelled)),
            Ok(claimed) => claimed,
        };

        let outcome = Self::run_with_retry(key, fetcher, attempts).await;

        let applied = {
            let mut map = self.inner.lock().unwrap();
            match map.get_mut(key) {
                Some(entry) if entry.epoch == epoch => {
                    entry.in_flight = None;
                    match &outcome {
                        Ok(value) => {
                            entry.value = Some(CachedValue::new(value.clone()));
                            entry.error = None;
                            entry.invalidated = false;
                        }
                        Err(e) => entry.error = Some(e.clone()),
                    }
                    entry.publish();
                    true
                }
                // Cancelled or evicted while in flight: discard the response.
                _ => false,
            }
        };

        if applied {
            let _ = tx.send(outcome.clone());
            outcome
        } else {
            Err(QueryError::Cancelled)
        }
    }

    /// One fetch execution: up to `attempts` tries with exponential backoff
    /// between them. Non-transient errors fail immediately.
    async fn run_with_retry(key: &QueryKey, fetcher: QueryFn, attempts: u32) -> FetchOutcome {
        let mut attempt = 0u32;
        loop {
            match fetcher().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    attempt += 1;
                    if attempt >= attempts || !err.is_transient() {
                        warn!(key = %key, error = %err, attempts = attempt, "Fetch failed");
                        return Err(QueryError::Api(Arc::new(err)));
                    }
                    let delay = backoff_delay(attempt - 1);
                    debug!(
                        key = %key,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "Retrying fetch after backoff"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    fn spawn_refetch(&self, key: &QueryKey) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            return;
        };
        let cache = self.clone();
        let key = key.clone();
        handle.spawn(async move {
            let _ = cache.fetch_or_join(&key).await;
        });
    }

    fn release(&self, key: &QueryKey) {
        let gc_time = {
            let mut map = self.inner.lock().unwrap();
            let Some(entry) = map.get_mut(key) else { return };
            entry.subscribers = entry.subscribers.saturating_sub(1);
            if entry.subscribers > 0 {
                return;
            }
            entry.idle_since = Some(Utc::now());
            entry.policy.gc_time
        };

        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            return;
        };
        let cache = self.clone();
        handle.spawn(async move {
            tokio::time::sleep(gc_time).await;
            cache.evict_idle();
        });
    }

    #[cfg(test)]
    pub(crate) fn backdate(&self, key: &QueryKey, age: chrono::Duration) {
        let mut map = self.inner.lock().unwrap();
        if let Some(entry) = map.get_mut(key) {
            if let Some(cached) = entry.value.as_mut() {
                cached.fetched_at = Utc::now() - age;
            }
            if let Some(idle) = entry.idle_since.as_mut() {
                *idle = Utc::now() - age;
            }
        }
    }
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, QueryError> {
    serde_json::from_value(value).map_err(|e| QueryError::Decode(Arc::new(e)))
}

/// Handle representing one active consumer of a key.
pub struct QuerySubscription {
    cache: QueryCache,
    key: QueryKey,
    changed: watch::Receiver<u64>,
    refresher: Option<JoinHandle<()>>,
}

impl QuerySubscription {
    pub fn key(&self) -> &QueryKey {
        &self.key
    }

    /// Wait until the entry is next published (value, error, or state
    /// change).
    pub async fn changed(&mut self) {
        let _ = self.changed.changed().await;
    }

    /// Last cached value for the subscribed key.
    pub fn value<T: DeserializeOwned>(&self) -> Option<T> {
        self.cache.peek(&self.key)
    }
}

impl Drop for QuerySubscription {
    fn drop(&mut self) {
        if let Some(refresher) = self.refresher.take() {
            refresher.abort();
        }
        self.cache.release(&self.key);
    }
}

// ============================================================================
// Tests
// ============================================================================
