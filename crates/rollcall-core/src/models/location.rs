use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AttendanceError, Result};

/// A latitude/longitude pair known to be inside the valid WGS 84 ranges
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    latitude: f64,
    longitude: f64,
}

impl Coordinates {
    pub const LATITUDE_RANGE: (f64, f64) = (-90.0, 90.0);
    pub const LONGITUDE_RANGE: (f64, f64) = (-180.0, 180.0);

    /// Validate and build a coordinate pair
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        check_range("latitude", latitude, Self::LATITUDE_RANGE)?;
        check_range("longitude", longitude, Self::LONGITUDE_RANGE)?;
        Ok(Self {
            latitude,
            longitude,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

fn check_range(field: &str, value: f64, (min, max): (f64, f64)) -> Result<()> {
    if !value.is_finite() {
        return Err(AttendanceError::validation(field, "must be a finite number"));
    }
    if value < min || value > max {
        return Err(AttendanceError::validation(
            field,
            format!("{} is outside [{}, {}]", value, min, max),
        ));
    }
    Ok(())
}

/// Where a location sample came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LocationSource {
    Device,
    Manual,
}

/// One location reading, alive for a single verification attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationSample {
    pub coordinates: Coordinates,
    pub source: LocationSource,
    pub captured_at: DateTime<Utc>,
}

impl LocationSample {
    pub fn new(coordinates: Coordinates, source: LocationSource) -> Self {
        Self {
            coordinates,
            source,
            captured_at: Utc::now(),
        }
    }

    pub fn latitude(&self) -> f64 {
        self.coordinates.latitude()
    }

    pub fn longitude(&self) -> f64 {
        self.coordinates.longitude()
    }
}

/// Server verdict on whether a sample lies inside an allowed area
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeofenceVerdict {
    Accepted,
    Rejected { reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_coordinates() {
        let coords = Coordinates::new(12.97, 77.59).unwrap();
        assert_eq!(coords.latitude(), 12.97);
        assert_eq!(coords.longitude(), 77.59);
    }

    #[test]
    fn test_range_edges_are_inclusive() {
        assert!(Coordinates::new(90.0, 180.0).is_ok());
        assert!(Coordinates::new(-90.0, -180.0).is_ok());
    }

    #[test]
    fn test_out_of_range_rejected() {
        let err = Coordinates::new(90.5, 0.0).unwrap_err();
        assert!(matches!(err, AttendanceError::Validation { ref field, .. } if field == "latitude"));

        let err = Coordinates::new(0.0, -180.01).unwrap_err();
        assert!(matches!(err, AttendanceError::Validation { ref field, .. } if field == "longitude"));
    }

    #[test]
    fn test_non_finite_rejected() {
        assert!(Coordinates::new(f64::NAN, 0.0).is_err());
        assert!(Coordinates::new(0.0, f64::INFINITY).is_err());
    }
}
