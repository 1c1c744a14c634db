//! Location sensor that always reports the same position.
//!
//! Stands in for a phone GPS on desktops and in tests. The fix counter uses
//! atomics so clones share it.

use async_trait::async_trait;
use rollcall_core::error::Result;
use rollcall_core::ports::{LocationSensor, PermissionStatus, PositionFix};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct FixedLocationSensor {
    fix: PositionFix,
    permission: PermissionStatus,
    fixes_taken: Arc<AtomicUsize>,
}

impl FixedLocationSensor {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            fix: PositionFix {
                latitude,
                longitude,
                accuracy_meters: None,
            },
            permission: PermissionStatus::Granted,
            fixes_taken: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_permission(mut self, permission: PermissionStatus) -> Self {
        self.permission = permission;
        self
    }

    pub fn with_accuracy(mut self, meters: f64) -> Self {
        self.fix.accuracy_meters = Some(meters);
        self
    }

    /// Number of fixes handed out so far
    pub fn fix_count(&self) -> usize {
        self.fixes_taken.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LocationSensor for FixedLocationSensor {
    async fn request_permission(&self) -> Result<PermissionStatus> {
        Ok(self.permission)
    }

    async fn current_position(&self) -> Result<PositionFix> {
        self.fixes_taken.fetch_add(1, Ordering::SeqCst);
        Ok(self.fix)
    }
}
