use std::time::Duration;

use super::key::KeyClass;

/// Initial backoff delay in milliseconds between read retries
const INITIAL_BACKOFF_MS: u64 = 1000;

/// Ceiling for the exponential backoff delay
const MAX_BACKOFF_MS: u64 = 30_000;

/// Caching and refetch behavior for one key class.
///
/// `gc_time` is always at least `stale_time`: an entry may not be collected
/// while it would still be served without revalidation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryPolicy {
    /// Age after which a cached value is served stale and revalidated.
    pub stale_time: Duration,
    /// How long an entry without subscribers is kept before eviction.
    pub gc_time: Duration,
    /// Background refetch cadence while the key has subscribers.
    pub refetch_interval: Option<Duration>,
    /// Whether a window-focus notification revalidates this key.
    pub refetch_on_focus: bool,
    /// Total network attempts per fetch, including the first.
    pub retry_attempts: u32,
}

impl QueryPolicy {
    pub fn new(
        stale_time: Duration,
        gc_time: Duration,
        refetch_interval: Option<Duration>,
        refetch_on_focus: bool,
        retry_attempts: u32,
    ) -> Self {
        Self {
            stale_time,
            gc_time: gc_time.max(stale_time),
            refetch_interval,
            refetch_on_focus,
            retry_attempts: retry_attempts.max(1),
        }
    }

    pub fn for_class(class: KeyClass) -> Self {
        match class {
            // Event and blog lists change rarely; refresh on a 5 minute
            // cadence and leave focus changes alone.
            KeyClass::List => Self::new(
                Duration::from_secs(5 * 60),
                Duration::from_secs(15 * 60),
                Some(Duration::from_secs(5 * 60)),
                false,
                3,
            ),
            // Detail records only refresh on demand.
            KeyClass::Detail => Self::new(
                Duration::from_secs(10 * 60),
                Duration::from_secs(30 * 60),
                None,
                false,
                3,
            ),
            // Registration counters are volatile: short window, refetch on
            // interval and focus, and a single attempt so failures surface
            // quickly.
            KeyClass::Live => Self::new(
                Duration::from_secs(30),
                Duration::from_secs(5 * 60),
                Some(Duration::from_secs(30)),
                true,
                1,
            ),
        }
    }
}

/// Backoff delay before retry number `retry` (zero-based):
/// `min(1000 * 2^retry, 30000)` ms.
pub(crate) fn backoff_delay(retry: u32) -> Duration {
    let ms = INITIAL_BACKOFF_MS
        .saturating_mul(2u64.saturating_pow(retry))
        .min(MAX_BACKOFF_MS);
    Duration::from_millis(ms)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_table() {
        let list = QueryPolicy::for_class(KeyClass::List);
        assert_eq!(list.stale_time, Duration::from_secs(300));
        assert_eq!(list.refetch_interval, Some(Duration::from_secs(300)));
        assert!(!list.refetch_on_focus);
        assert_eq!(list.retry_attempts, 3);

        let detail = QueryPolicy::for_class(KeyClass::Detail);
        assert_eq!(detail.stale_time, Duration::from_secs(600));
        assert_eq!(detail.refetch_interval, None);
        assert_eq!(detail.retry_attempts, 3);

        let live = QueryPolicy::for_class(KeyClass::Live);
        assert_eq!(live.stale_time, Duration::from_secs(30));
        assert_eq!(live.refetch_interval, Some(Duration::from_secs(30)));
        assert!(live.refetch_on_focus);
        assert_eq!(live.retry_attempts, 1);
    }

    #[test]
    fn test_gc_time_never_below_stale_time() {
        let policy = QueryPolicy::new(
            Duration::from_secs(600),
            Duration::from_secs(60),
            None,
            false,
            3,
        );
        assert_eq!(policy.gc_time, Duration::from_secs(600));
    }

    #[test]
    fn test_backoff_delays() {
        assert_eq!(backoff_delay(0), Duration::from_millis(1000));
        assert_eq!(backoff_delay(1), Duration::from_millis(2000));
        assert_eq!(backoff_delay(2), Duration::from_millis(4000));
        assert_eq!(backoff_delay(5), Duration::from_millis(30_000));
        assert_eq!(backoff_delay(63), Duration::from_millis(30_000));
    }
}
