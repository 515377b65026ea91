//! Gymcache - client core for a fitness brand's content site.
//!
//! This crate owns everything between the pages and the network: a typed
//! client for the content API (events, blogs, leads), a keyed query cache
//! with stale-while-revalidate semantics and optimistic registration, and
//! the geo utilities behind the gym/club discovery pages.
//!
//! Typical wiring:
//!
//! ```no_run
//! use gymcache::{Config, FileLocationStore, SiteService};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = Config::load()?;
//! let service = SiteService::from_config(&config)?;
//! let location = FileLocationStore::new(config.data_dir()?);
//!
//! let events = service.published_events().await?;
//! # let _ = (events, location);
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod cache;
pub mod config;
pub mod geo;
pub mod location;
pub mod models;
pub mod service;
pub mod utils;

pub use api::{ApiClient, ApiError};
pub use cache::{
    Mutation, MutationState, QueryCache, QueryError, QueryKey, QueryState, QuerySubscription,
};
pub use config::Config;
pub use geo::{distance_km, rank_by_distance, GeoPoint, ListingWithDistance, Locatable};
pub use location::{FileLocationStore, LocationStore, MemoryLocationStore};
pub use models::{
    Blog, ContentBlock, Event, EventLiveStats, Facility, FacilityKind, LeadPayload, LeadResponse,
    RegistrationPayload, RegistrationResponse,
};
pub use service::SiteService;
