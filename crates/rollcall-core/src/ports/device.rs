use async_trait::async_trait;

use crate::error::Result;
use crate::models::{CameraFacing, Frame};

/// Outcome of a runtime permission request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
}

impl PermissionStatus {
    pub fn is_granted(&self) -> bool {
        matches!(self, PermissionStatus::Granted)
    }
}

/// Raw position reading from a location sensor, not yet range-checked
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionFix {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy_meters: Option<f64>,
}

/// Port for a device location sensor
#[async_trait]
pub trait LocationSensor: Send + Sync {
    /// Ask for foreground location permission
    async fn request_permission(&self) -> Result<PermissionStatus>;

    /// Take a single position fix
    async fn current_position(&self) -> Result<PositionFix>;
}

/// Port for a device camera
#[async_trait]
pub trait Camera: Send + Sync {
    /// Ask for camera permission
    async fn request_permission(&self) -> Result<PermissionStatus>;

    /// Capture one encoded frame from the given camera
    async fn take_picture(&self, facing: CameraFacing) -> Result<Frame>;
}
