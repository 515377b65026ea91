//! Optimistic mutations against the query cache.
//!
//! A mutation touches exactly one cache key. The protocol, in order:
//!
//! 1. cancel in-flight refetches for the key, so a late response cannot
//!    clobber the optimistic value
//! 2. snapshot the current cached value
//! 3. apply the optimistic transform and publish it, before the write is
//!    issued
//! 4. issue the write
//! 5. on success, invalidate the key and its related keys so the next read
//!    reconciles with server truth
//! 6. on failure, restore the snapshot verbatim and surface the error;
//!    writes are never retried
//!
//! After a failed mutation the cached value is identical to what it was
//! before step 3, down to the fetch timestamp.

use std::future::Future;

use serde_json::Value;
use tracing::{debug, warn};

use crate::api::ApiError;

use super::key::QueryKey;
use super::store::{CachedValue, QueryCache};

/// Resolution state of a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationState {
    Pending,
    Success,
    RolledBack,
}

/// One optimistic write attempt.
///
/// Holds the input it was created with and, while running, the snapshot of
/// the cache value it overwrote.
pub struct Mutation<I> {
    cache: QueryCache,
    key: QueryKey,
    input: I,
    snapshot: Option<CachedValue>,
    state: MutationState,
}

impl<I> Mutation<I> {
    pub fn new(cache: QueryCache, key: QueryKey, input: I) -> Self {
        Self {
            cache,
            key,
            input,
            snapshot: None,
            state: MutationState::Pending,
        }
    }

    pub fn input(&self) -> &I {
        &self.input
    }

    pub fn state(&self) -> MutationState {
        self.state
    }

    /// Run the mutation protocol.
    ///
    /// The optimistic transform is applied to the current cached value, if
    /// any, before `write` is first polled; subscribers observe the effect
    /// ahead of the network round trip. `related` keys are invalidated on
    /// success along with the touched key.
    pub async fn run<T, W>(
        &mut self,
        optimistic: impl FnOnce(Value) -> Value,
        write: W,
        related: &[QueryKey],
    ) -> Result<T, ApiError>
    where
        W: Future<Output = Result<T, ApiError>>,
    {
        self.cache.cancel_queries(&self.key);
        self.snapshot = self.cache.snapshot(&self.key);

        if let Some(current) = self.snapshot.as_ref().map(|s| s.value.clone()) {
            debug!(key = %self.key, "Applying optimistic update");
            self.cache.set_value(&self.key, optimistic(current));
        }

        match write.await {
            Ok(out) => {
                self.state = MutationState::Success;
                self.cache.invalidate(&self.key);
                for key in related {
                    self.cache.invalidate(key);
                }
                Ok(out)
            }
            Err(err) => {
                self.state = MutationState::RolledBack;
                self.cache.restore(&self.key, self.snapshot.clone());
                warn!(key = %self.key, error = %err, "Mutation failed, rolled back optimistic update");
                Err(err)
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
