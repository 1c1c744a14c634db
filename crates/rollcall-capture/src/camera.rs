//! Camera adapters for desktops and tests.

use async_trait::async_trait;
use rollcall_core::error::{AttendanceError, Result};
use rollcall_core::models::{CameraFacing, Frame};
use rollcall_core::ports::{Camera, PermissionStatus};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Camera that "captures" an image file from disk
#[derive(Debug, Clone)]
pub struct FileCamera {
    path: PathBuf,
    front_path: Option<PathBuf>,
}

impl FileCamera {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            front_path: None,
        }
    }

    /// Use a different file when the front camera is selected
    pub fn with_front(mut self, path: impl Into<PathBuf>) -> Self {
        self.front_path = Some(path.into());
        self
    }
}

#[async_trait]
impl Camera for FileCamera {
    async fn request_permission(&self) -> Result<PermissionStatus> {
        Ok(PermissionStatus::Granted)
    }

    async fn take_picture(&self, facing: CameraFacing) -> Result<Frame> {
        let path = match (facing, &self.front_path) {
            (CameraFacing::Front, Some(front)) => front,
            _ => &self.path,
        };

        let bytes = tokio::fs::read(path).await.map_err(|e| AttendanceError::CaptureFailed {
            reason: format!("Cannot read {}: {}", path.display(), e),
        })?;

        Ok(Frame::new(bytes, facing))
    }
}

/// Camera that returns fixed bytes, or fails when it has none
#[derive(Debug, Clone)]
pub struct StaticCamera {
    bytes: Option<Vec<u8>>,
    permission: PermissionStatus,
    shots: Arc<AtomicUsize>,
}

impl StaticCamera {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes: Some(bytes),
            permission: PermissionStatus::Granted,
            shots: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A camera whose hardware never produces a frame
    pub fn broken() -> Self {
        Self {
            bytes: None,
            permission: PermissionStatus::Granted,
            shots: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_permission(mut self, permission: PermissionStatus) -> Self {
        self.permission = permission;
        self
    }

    /// Number of take_picture calls so far
    pub fn shot_count(&self) -> usize {
        self.shots.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Camera for StaticCamera {
    async fn request_permission(&self) -> Result<PermissionStatus> {
        Ok(self.permission)
    }

    async fn take_picture(&self, facing: CameraFacing) -> Result<Frame> {
        self.shots.fetch_add(1, Ordering::SeqCst);
        match &self.bytes {
            Some(bytes) => Ok(Frame::new(bytes.clone(), facing)),
            None => Err(AttendanceError::CaptureFailed {
                reason: "Camera did not produce a frame".to_string(),
            }),
        }
    }
}
