use rollcall_core::error::{AttendanceError, Result};
use rollcall_core::models::{Coordinates, LocationSample, LocationSource};
use rollcall_core::ports::LocationSensor;

use crate::validation::parse_manual_coordinates;

/// Produces location samples from the device sensor or from typed input
pub struct LocationProvider<L>
where
    L: LocationSensor,
{
    sensor: L,
}

impl<L> LocationProvider<L>
where
    L: LocationSensor,
{
    pub fn new(sensor: L) -> Self {
        Self { sensor }
    }

    /// Request permission, then take one fix from the device
    pub async fn acquire_device(&self) -> Result<LocationSample> {
        let permission = self.sensor.request_permission().await?;
        if !permission.is_granted() {
            tracing::info!("Location permission denied");
            return Err(AttendanceError::PermissionDenied {
                capability: "location".to_string(),
            });
        }

        let fix = self.sensor.current_position().await?;
        let coordinates = Coordinates::new(fix.latitude, fix.longitude)?;

        tracing::debug!(
            latitude = coordinates.latitude(),
            longitude = coordinates.longitude(),
            accuracy = ?fix.accuracy_meters,
            "Acquired device location"
        );

        Ok(LocationSample::new(coordinates, LocationSource::Device))
    }

    /// Build a sample from typed coordinates; never touches the sensor or network
    pub fn acquire_manual(&self, latitude: &str, longitude: &str) -> Result<LocationSample> {
        let coordinates = parse_manual_coordinates(latitude, longitude)?;
        Ok(LocationSample::new(coordinates, LocationSource::Manual))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixed::FixedLocationSensor;
    use rollcall_core::ports::PermissionStatus;

    #[tokio::test]
    async fn test_device_sample() {
        let provider = LocationProvider::new(FixedLocationSensor::new(12.97, 77.59));

        let sample = provider.acquire_device().await.unwrap();

        assert_eq!(sample.source, LocationSource::Device);
        assert_eq!(sample.latitude(), 12.97);
        assert_eq!(sample.longitude(), 77.59);
    }

    #[tokio::test]
    async fn test_permission_denied_is_typed() {
        let sensor =
            FixedLocationSensor::new(12.97, 77.59).with_permission(PermissionStatus::Denied);
        let provider = LocationProvider::new(sensor);

        let err = provider.acquire_device().await.unwrap_err();

        assert!(matches!(err, AttendanceError::PermissionDenied { ref capability } if capability == "location"));
    }

    #[tokio::test]
    async fn test_denied_permission_skips_fix() {
        let sensor =
            FixedLocationSensor::new(12.97, 77.59).with_permission(PermissionStatus::Denied);
        let provider = LocationProvider::new(sensor.clone());

        let _ = provider.acquire_device().await;

        assert_eq!(sensor.fix_count(), 0);
    }

    #[tokio::test]
    async fn test_bad_device_reading_rejected() {
        let provider = LocationProvider::new(FixedLocationSensor::new(123.0, 77.59));
        let err = provider.acquire_device().await.unwrap_err();
        assert!(matches!(err, AttendanceError::Validation { .. }));
    }

    #[test]
    fn test_manual_sample() {
        let sensor = FixedLocationSensor::new(0.0, 0.0);
        let provider = LocationProvider::new(sensor.clone());

        let sample = provider.acquire_manual("22.5605", "72.9232").unwrap();

        assert_eq!(sample.source, LocationSource::Manual);
        assert_eq!(sample.latitude(), 22.5605);
        assert_eq!(sensor.fix_count(), 0);
    }

    #[test]
    fn test_manual_out_of_range() {
        let provider = LocationProvider::new(FixedLocationSensor::new(0.0, 0.0));
        assert!(provider.acquire_manual("91", "0").is_err());
        assert!(provider.acquire_manual("0", "-181").is_err());
    }
}
