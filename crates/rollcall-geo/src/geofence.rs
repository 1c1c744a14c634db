//! Campus geofence as evaluated by the attendance server.
//!
//! The client never decides presence itself; this model backs the in-memory
//! service so development and tests see the same verdicts a server would give.

use geo::{Distance, Haversine, Point};
use rollcall_core::models::Coordinates;
use serde::{Deserialize, Serialize};

pub const DEFAULT_RADIUS_METERS: f64 = 500.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Geofence {
    /// Allowed sites as (latitude, longitude)
    sites: Vec<(f64, f64)>,
    radius_meters: f64,
}

impl Geofence {
    pub fn new(sites: Vec<(f64, f64)>, radius_meters: f64) -> Self {
        Self {
            sites,
            radius_meters,
        }
    }

    /// One site with the default 500 m radius
    pub fn around(latitude: f64, longitude: f64) -> Self {
        Self::new(vec![(latitude, longitude)], DEFAULT_RADIUS_METERS)
    }

    pub fn radius_meters(&self) -> f64 {
        self.radius_meters
    }

    /// Great-circle distance in meters to the closest site
    pub fn nearest_distance(&self, coordinates: &Coordinates) -> Option<f64> {
        let here = Point::new(coordinates.longitude(), coordinates.latitude());
        self.sites
            .iter()
            .map(|(lat, lon)| Haversine.distance(Point::new(*lon, *lat), here))
            .min_by(|a, b| a.total_cmp(b))
    }

    pub fn contains(&self, coordinates: &Coordinates) -> bool {
        self.nearest_distance(coordinates)
            .map(|distance| distance <= self.radius_meters)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_at_site_is_inside() {
        let fence = Geofence::around(12.97, 77.59);
        let here = Coordinates::new(12.97, 77.59).unwrap();
        assert!(fence.contains(&here));
        assert!(fence.nearest_distance(&here).unwrap() < 1.0);
    }

    #[test]
    fn test_point_far_away_is_outside() {
        let fence = Geofence::around(12.97, 77.59);
        // Roughly 1.1 km north
        let here = Coordinates::new(12.98, 77.59).unwrap();
        assert!(!fence.contains(&here));
    }

    #[test]
    fn test_nearest_of_many_sites() {
        let fence = Geofence::new(vec![(0.0, 0.0), (12.97, 77.59)], 500.0);
        let here = Coordinates::new(12.971, 77.59).unwrap();
        assert!(fence.contains(&here));
    }

    #[test]
    fn test_empty_fence_contains_nothing() {
        let fence = Geofence::new(Vec::new(), 500.0);
        assert!(!fence.contains(&Coordinates::new(0.0, 0.0).unwrap()));
    }
}
