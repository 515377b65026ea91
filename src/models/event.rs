use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::{format_date, truncate};

use super::content::{deserialize_blocks, ContentBlock};

/// Publication state of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Draft,
    #[default]
    Published,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    #[serde(default)]
    pub id: i64,
    pub title: String,
    #[serde(default, deserialize_with = "deserialize_blocks")]
    pub description: Vec<ContentBlock>,
    #[serde(rename = "startDate", default)]
    pub start_date: Option<String>,
    #[serde(rename = "endDate", default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub venue: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub capacity: Option<i64>,
    #[serde(rename = "registrationCount", default)]
    pub registration_count: i64,
    #[serde(default)]
    pub status: EventStatus,
    #[serde(rename = "coverImage", default)]
    pub cover_image: Option<String>,
}

impl Event {
    pub fn formatted_date(&self) -> String {
        match &self.start_date {
            Some(date) => format_date(date),
            None => "TBD".to_string(),
        }
    }

    pub fn formatted_time(&self) -> Option<String> {
        self.start_date.as_ref().and_then(|date| {
            DateTime::parse_from_rfc3339(date)
                .ok()
                .map(|dt| dt.format("%H:%M").to_string())
        })
    }

    /// Whether the event starts in the future. Events with an unparseable or
    /// missing start date count as upcoming so they stay visible.
    pub fn is_upcoming(&self) -> bool {
        match &self.start_date {
            Some(date) => match DateTime::parse_from_rfc3339(date) {
                Ok(dt) => dt.with_timezone(&Utc) > Utc::now(),
                Err(_) => true,
            },
            None => true,
        }
    }

    /// Remaining capacity, floored at zero. `None` for uncapped events.
    pub fn spots_left(&self) -> Option<i64> {
        self.capacity
            .map(|cap| (cap - self.registration_count).max(0))
    }

    pub fn is_full(&self) -> bool {
        self.spots_left() == Some(0)
    }

    /// Short flattened description for list cards.
    pub fn description_preview(&self, max_len: usize) -> String {
        let text = self
            .description
            .iter()
            .map(|b| b.plain_text())
            .collect::<Vec<_>>()
            .join(" ");
        truncate(&text, max_len)
    }
}

/// Volatile registration counters for an event.
///
/// Projected out of the event detail payload and cached on a much shorter
/// staleness window than the event itself; this is also the value an
/// optimistic registration touches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventLiveStats {
    #[serde(rename = "eventId")]
    pub event_id: i64,
    #[serde(rename = "registrationCount")]
    pub registration_count: i64,
    #[serde(rename = "spotsLeft", default, skip_serializing_if = "Option::is_none")]
    pub spots_left: Option<i64>,
}

impl EventLiveStats {
    pub fn from_event(event: &Event) -> Self {
        Self {
            event_id: event.id,
            registration_count: event.registration_count,
            spots_left: event.spots_left(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
