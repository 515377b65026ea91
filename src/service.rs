//! Cached site operations.
//!
//! `SiteService` is what page code talks to: it binds the `ApiClient` to the
//! `QueryCache` so every read goes through the appropriate cache policy, and
//! it implements the optimistic registration flow. Both collaborators are
//! passed in explicitly so tests can run against isolated instances.

use serde_json::Value;

use crate::api::{ApiClient, ApiError};
use crate::cache::{query_fn, Mutation, QueryCache, QueryError, QueryKey, QuerySubscription};
use crate::config::Config;
use crate::models::{
    Blog, Event, EventLiveStats, LeadPayload, LeadResponse, RegistrationPayload,
    RegistrationResponse,
};

pub struct SiteService {
    client: ApiClient,
    cache: QueryCache,
}

impl SiteService {
    pub fn new(client: ApiClient, cache: QueryCache) -> Self {
        Self { client, cache }
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Ok(Self::new(ApiClient::new(config.api_base_url())?, QueryCache::new()))
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    // ===== Cached reads =====

    pub async fn published_events(&self) -> Result<Vec<Event>, QueryError> {
        let client = self.client.clone();
        self.cache
            .query(
                QueryKey::EventsList,
                query_fn(move || {
                    let client = client.clone();
                    async move { client.list_published_events().await }
                }),
            )
            .await
    }

    pub async fn upcoming_events(&self) -> Result<Vec<Event>, QueryError> {
        let client = self.client.clone();
        self.cache
            .query(
                QueryKey::UpcomingEvents,
                query_fn(move || {
                    let client = client.clone();
                    async move { client.upcoming_events().await }
                }),
            )
            .await
    }

    pub async fn event(&self, id: i64) -> Result<Event, QueryError> {
        let client = self.client.clone();
        self.cache
            .query(
                QueryKey::EventDetail(id),
                query_fn(move || {
                    let client = client.clone();
                    async move { client.event_by_id(id).await }
                }),
            )
            .await
    }

    /// Volatile registration counters for an event, cached under the live
    /// policy (30 s window). The API has no separate live endpoint; the
    /// detail payload is re-fetched and projected down.
    pub async fn event_live(&self, id: i64) -> Result<EventLiveStats, QueryError> {
        self.cache.query(QueryKey::EventLive(id), Self::live_fetcher(&self.client, id)).await
    }

    /// Subscribe to an event's live counters. While the subscription is held
    /// the counters refresh every 30 seconds and on window focus
    /// (`QueryCache::notify_focus`).
    pub fn watch_event_live(&self, id: i64) -> QuerySubscription {
        self.cache.watch(QueryKey::EventLive(id), Self::live_fetcher(&self.client, id))
    }

    pub async fn blog(&self, slug: &str) -> Result<Blog, QueryError> {
        let client = self.client.clone();
        let owned = slug.to_string();
        self.cache
            .query(
                QueryKey::BlogDetail(owned.clone()),
                query_fn(move || {
                    let client = client.clone();
                    let slug = owned.clone();
                    async move { client.blog_by_slug(&slug).await }
                }),
            )
            .await
    }

    pub async fn published_blogs(&self) -> Result<Vec<Blog>, QueryError> {
        let client = self.client.clone();
        self.cache
            .query(
                QueryKey::BlogList,
                query_fn(move || {
                    let client = client.clone();
                    async move { client.list_published_blogs().await }
                }),
            )
            .await
    }

    // ===== Writes =====

    /// Register for an event.
    ///
    /// The registration counter for the event is bumped optimistically so
    /// the UI reacts before the network does; on failure the previous
    /// counter is restored exactly and the error is returned. On success the
    /// events list and the event detail are invalidated so the next read
    /// reconciles with the server.
    pub async fn register_for_event(
        &self,
        id: i64,
        payload: RegistrationPayload,
    ) -> Result<RegistrationResponse, ApiError> {
        let mut mutation =
            Mutation::new(self.cache.clone(), QueryKey::EventLive(id), payload.clone());

        let client = self.client.clone();
        let write = async move { client.register_for_event(id, &payload).await };

        mutation
            .run(
                apply_registration,
                write,
                &[QueryKey::EventsList, QueryKey::EventDetail(id)],
            )
            .await
    }

    /// Submit a lead. Uncached and never retried; failures surface
    /// immediately to the form.
    pub async fn submit_lead(&self, lead: &LeadPayload) -> Result<LeadResponse, ApiError> {
        self.client.submit_lead(lead).await
    }

    fn live_fetcher(client: &ApiClient, id: i64) -> crate::cache::QueryFn {
        let client = client.clone();
        query_fn(move || {
            let client = client.clone();
            async move {
                let event = client.event_by_id(id).await?;
                Ok(EventLiveStats::from_event(&event))
            }
        })
    }
}

/// Optimistic transform for a registration: one more registrant, one fewer
/// open spot. Values that do not look like live stats pass through
/// untouched.
fn apply_registration(value: Value) -> Value {
    match serde_json::from_value::<EventLiveStats>(value.clone()) {
        Ok(mut stats) => {
            stats.registration_count += 1;
            if let Some(spots) = stats.spots_left.as_mut() {
                *spots = (*spots - 1).max(0);
            }
            serde_json::to_value(&stats).unwrap_or(value)
        }
        Err(_) => value,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_apply_registration_bumps_counters() {
        let before = json!({"eventId": 7, "registrationCount": 37, "spotsLeft": 3});
        let after = apply_registration(before);
        assert_eq!(after["registrationCount"], 38);
        assert_eq!(after["spotsLeft"], 2);
    }

    #[test]
    fn test_apply_registration_floors_spots_at_zero() {
        let after = apply_registration(json!({"eventId": 7, "registrationCount": 40, "spotsLeft": 0}));
        assert_eq!(after["spotsLeft"], 0);
        assert_eq!(after["registrationCount"], 41);
    }

    #[test]
    fn test_apply_registration_ignores_foreign_shapes() {
        let odd = json!({"unexpected": true});
        assert_eq!(apply_registration(odd.clone()), odd);
    }

    /// The discovery-and-registration walk the site's pages take, minus the
    /// rendering: rating sort without a location, distance sort once one is
    /// saved, and an optimistic registration that fails and reverts.
    #[tokio::test(start_paused = true)]
    async fn test_discovery_and_registration_flow() {
        use crate::cache::MutationState;
        use crate::geo::{rank_by_distance, GeoPoint};
        use crate::location::{LocationStore, MemoryLocationStore};
        use crate::models::{Facility, FacilityKind};

        let gyms = vec![
            Facility {
                id: 1,
                name: "Whitefield".into(),
                kind: FacilityKind::Gym,
                city: Some("Bengaluru".into()),
                address: None,
                rating: 4.9,
                latitude: Some(12.9698),
                longitude: Some(77.7500),
                amenities: vec![],
            },
            Facility {
                id: 2,
                name: "HSR Layout".into(),
                kind: FacilityKind::Gym,
                city: Some("Bengaluru".into()),
                address: None,
                rating: 4.2,
                latitude: Some(12.9121),
                longitude: Some(77.6446),
                amenities: vec![],
            },
        ];

        // No saved location: rating order, no distances.
        let store = MemoryLocationStore::new();
        let ranked = rank_by_distance(gyms.clone(), store.load());
        assert_eq!(ranked[0].item.id, 1);
        assert!(ranked.iter().all(|l| l.distance_km.is_none()));

        // Location granted: saved, then distance order.
        store.save(GeoPoint::new(12.84, 77.66)).unwrap();
        let ranked = rank_by_distance(gyms, store.load());
        assert_eq!(ranked[0].item.id, 2);
        assert!(ranked[0].distance_km.unwrap() < ranked[1].distance_km.unwrap());

        // Registration: optimistic bump, failed write, exact revert.
        let cache = QueryCache::new();
        let key = QueryKey::EventLive(7);
        cache.set_value(&key, json!({"eventId": 7, "registrationCount": 37, "spotsLeft": 3}));

        let mut mutation = Mutation::new(cache.clone(), key.clone(), ());
        let write = async { Err::<Value, _>(ApiError::Network("connection reset".into())) };
        let result = mutation.run(apply_registration, write, &[]).await;

        assert!(result.is_err());
        assert_eq!(mutation.state(), MutationState::RolledBack);
        let reverted: EventLiveStats = cache.peek(&key).unwrap();
        assert_eq!(reverted.registration_count, 37);
        assert_eq!(reverted.spots_left, Some(3));
    }
}
