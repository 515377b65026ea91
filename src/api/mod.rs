//! REST API client module for the brand's content services.
//!
//! This module provides the `ApiClient` for communicating with the
//! content API to fetch event and blog data and to submit event
//! registrations and leads.
//!
//! The API is unauthenticated; the base URL is environment-configured
//! (see `crate::config`).

pub mod client;
pub mod error;

pub use client::ApiClient;
pub use error::ApiError;
