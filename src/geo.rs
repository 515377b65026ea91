//! Great-circle distance and distance-based ranking for facility discovery.
//!
//! The gyms and wellness-clubs pages rank listings by how far they are from
//! the viewer's saved location. When no location is known, ranking falls back
//! to rating and no distances are reported.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// Mean Earth radius in kilometers
const EARTH_RADIUS_KM: f64 = 6371.0;

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Haversine great-circle distance between two points, in kilometers.
///
/// Pure and total over finite inputs. Coordinates are not range-checked;
/// callers control the input domain.
pub fn distance_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_KM * c
}

/// Anything that can appear in a location-ranked list.
pub trait Locatable {
    /// Coordinates of the listing, if it has any.
    fn geo(&self) -> Option<GeoPoint>;
    /// Secondary sort key used when no viewer location is available.
    fn rating(&self) -> f64;
}

/// A listing annotated with its distance from the viewer, when known.
///
/// Recomputed per ranking pass; never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingWithDistance<T> {
    pub item: T,
    pub distance_km: Option<f64>,
}

/// Rank listings for display.
///
/// With a viewer location, listings sort ascending by computed distance, and
/// listings without coordinates sort after all located ones. Without a viewer
/// location, listings sort descending by rating and every `distance_km` is
/// `None`. This is a pure re-ranking: no entry is ever filtered out.
pub fn rank_by_distance<T: Locatable>(
    items: Vec<T>,
    origin: Option<GeoPoint>,
) -> Vec<ListingWithDistance<T>> {
    let mut listed: Vec<ListingWithDistance<T>> = items
        .into_iter()
        .map(|item| {
            let distance_km =
                origin.and_then(|from| item.geo().map(|to| distance_km(from, to)));
            ListingWithDistance { item, distance_km }
        })
        .collect();

    if origin.is_some() {
        listed.sort_by(|a, b| match (a.distance_km, b.distance_km) {
            (Some(x), Some(y)) => x.total_cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => b.item.rating().total_cmp(&a.item.rating()),
        });
    } else {
        listed.sort_by(|a, b| b.item.rating().total_cmp(&a.item.rating()));
    }

    listed
}

// ============================================================================
// Tests
// ============================================================================
