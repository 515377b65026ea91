//! API client for the brand's content API.
//!
//! This module provides the `ApiClient` struct for fetching events and blog
//! content and submitting registrations and leads. Every operation is a
//! single request: retry policy belongs to the query cache layer, and the two
//! write operations must never be retried automatically.

use std::time::Duration;

use anyhow::Result;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

use crate::models::{
    Blog, Event, LeadPayload, LeadResponse, RegistrationPayload, RegistrationResponse,
};

use super::ApiError;

/// HTTP request timeout in seconds.
/// 30s allows for slow API responses while failing fast enough for good UX.
const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Deserialize)]
struct EventsEnvelope {
    events: Vec<Event>,
}

#[derive(Debug, Deserialize)]
struct BlogsEnvelope {
    blogs: Vec<Blog>,
}

/// API client for the content API.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a new API client against the given base URL.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.url(path);
        debug!(url = %url, "GET");

        let response = self.client.get(&url).send().await?;
        let response = Self::check_response(response).await?;

        response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))
    }

    async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let url = self.url(path);
        debug!(url = %url, "POST");

        let response = self.client.post(&url).json(body).send().await?;
        let response = Self::check_response(response).await?;

        response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))
    }

    // ===== Events =====

    /// Fetch all published events
    pub async fn list_published_events(&self) -> Result<Vec<Event>, ApiError> {
        let envelope: EventsEnvelope = self.get("/events?status=published").await?;
        Ok(envelope.events)
    }

    /// Fetch events that have not started yet
    pub async fn upcoming_events(&self) -> Result<Vec<Event>, ApiError> {
        let envelope: EventsEnvelope = self.get("/events/upcoming").await?;
        Ok(envelope.events)
    }

    /// Fetch a single event by id
    pub async fn event_by_id(&self, id: i64) -> Result<Event, ApiError> {
        self.get(&format!("/events/{}", id)).await
    }

    /// Register for an event. Not idempotent: never retried.
    pub async fn register_for_event(
        &self,
        id: i64,
        payload: &RegistrationPayload,
    ) -> Result<RegistrationResponse, ApiError> {
        self.post(&format!("/events/{}/register", id), payload).await
    }

    // ===== Blogs =====

    /// Fetch a blog post by slug
    pub async fn blog_by_slug(&self, slug: &str) -> Result<Blog, ApiError> {
        self.get(&format!("/blogs/{}", slug)).await
    }

    /// Fetch all published blog posts
    pub async fn list_published_blogs(&self) -> Result<Vec<Blog>, ApiError> {
        let envelope: BlogsEnvelope = self.get("/blogs?status=published").await?;
        Ok(envelope.blogs)
    }

    // ===== Leads =====

    /// Submit a lead from one of the site's forms. Not idempotent: never
    /// retried.
    pub async fn submit_lead(&self, lead: &LeadPayload) -> Result<LeadResponse, ApiError> {
        self.post("/leads", lead).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_stripped() {
        let client = ApiClient::new("https://api.example.com/v1/").unwrap();
        assert_eq!(client.url("/events/7"), "https://api.example.com/v1/events/7");
    }

    #[test]
    fn test_parse_events_envelope() {
        let json = r#"{"events": [{"id": 1, "title": "Yoga in the Park"}]}"#;
        let envelope: EventsEnvelope =
            serde_json::from_str(json).expect("Failed to parse events envelope");
        assert_eq!(envelope.events.len(), 1);
        assert_eq!(envelope.events[0].title, "Yoga in the Park");
    }

    #[test]
    fn test_parse_blogs_envelope() {
        let json = r#"{"blogs": [{"slug": "rest-days", "title": "Why Rest Days Matter"}]}"#;
        let envelope: BlogsEnvelope =
            serde_json::from_str(json).expect("Failed to parse blogs envelope");
        assert_eq!(envelope.blogs[0].slug, "rest-days");
    }
}
