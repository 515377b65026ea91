//! Data models for the site's content.
//!
//! This module contains all the data structures used to represent
//! site content:
//!
//! - `Event`, `EventLiveStats`: scheduled events and their volatile counters
//! - `Blog`: articles served from the content API
//! - `Facility`: gyms and wellness clubs on the discovery pages
//! - `LeadPayload`, `RegistrationPayload`: the two write payloads
//! - `ContentBlock`: tagged rich-text blocks, resolved once at ingestion

pub mod blog;
pub mod content;
pub mod event;
pub mod facility;
pub mod lead;

pub use blog::Blog;
pub use content::{ContentBlock, StructuredBlock};
pub use event::{Event, EventLiveStats, EventStatus};
pub use facility::{Facility, FacilityKind};
pub use lead::{
    LeadInterest, LeadPayload, LeadResponse, LeadSource, RegistrationPayload, RegistrationResponse,
};
