use serde::{Deserialize, Serialize};

use crate::geo::{GeoPoint, Locatable};
use crate::utils::contains_ignore_case;

/// Kind of facility shown on the discovery pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FacilityKind {
    Gym,
    WellnessClub,
}

impl std::fmt::Display for FacilityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FacilityKind::Gym => write!(f, "Gym"),
            FacilityKind::WellnessClub => write!(f, "Wellness Club"),
        }
    }
}

/// A gym or wellness club. Facility data ships with the site build rather
/// than the content API, so this type never goes through the query cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Facility {
    pub id: i64,
    pub name: String,
    pub kind: FacilityKind,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub amenities: Vec<String>,
}

impl Facility {
    /// Matches the discovery pages' filter box against name, city, and
    /// amenities.
    pub fn matches_query(&self, query: &str) -> bool {
        if query.trim().is_empty() {
            return true;
        }
        contains_ignore_case(&self.name, query)
            || self
                .city
                .as_deref()
                .is_some_and(|city| contains_ignore_case(city, query))
            || self
                .amenities
                .iter()
                .any(|a| contains_ignore_case(a, query))
    }
}

impl Locatable for Facility {
    fn geo(&self) -> Option<GeoPoint> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) => Some(GeoPoint::new(lat, lng)),
            _ => None,
        }
    }

    fn rating(&self) -> f64 {
        self.rating
    }
}

// ============================================================================
// Tests
// ============================================================================
