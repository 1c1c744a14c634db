use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::session::StudentId;
use crate::error::{AttendanceError, Result};

/// Which camera a frame is taken with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraFacing {
    #[default]
    Back,
    Front,
}

impl CameraFacing {
    pub fn flipped(&self) -> Self {
        match self {
            CameraFacing::Back => CameraFacing::Front,
            CameraFacing::Front => CameraFacing::Back,
        }
    }
}

impl fmt::Display for CameraFacing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraFacing::Back => f.write_str("back"),
            CameraFacing::Front => f.write_str("front"),
        }
    }
}

impl FromStr for CameraFacing {
    type Err = AttendanceError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "back" | "rear" => Ok(CameraFacing::Back),
            "front" | "selfie" => Ok(CameraFacing::Front),
            other => Err(AttendanceError::ConfigInvalid {
                key: "camera".to_string(),
                reason: format!("Invalid camera '{}'. Use back or front", other),
            }),
        }
    }
}

/// Raw encoded image as delivered by a camera
#[derive(Debug, Clone)]
pub struct Frame {
    pub bytes: Vec<u8>,
    pub facing: CameraFacing,
    pub captured_at: DateTime<Utc>,
}

impl Frame {
    pub fn new(bytes: Vec<u8>, facing: CameraFacing) -> Self {
        Self {
            bytes,
            facing,
            captured_at: Utc::now(),
        }
    }
}

/// Normalized image payload ready for recognition upload.
///
/// Consumed by value on submission; never written to disk.
#[derive(Debug, Clone)]
pub struct CaptureArtifact {
    image: Vec<u8>,
    student_id: StudentId,
    course_name: String,
    orientation_normalized: bool,
}

impl CaptureArtifact {
    pub const FILE_NAME: &'static str = "attendance.jpg";
    pub const MIME_TYPE: &'static str = "image/jpeg";

    pub fn new(
        image: Vec<u8>,
        student_id: StudentId,
        course_name: impl Into<String>,
        orientation_normalized: bool,
    ) -> Self {
        Self {
            image,
            student_id,
            course_name: course_name.into(),
            orientation_normalized,
        }
    }

    pub fn image(&self) -> &[u8] {
        &self.image
    }

    pub fn into_image(self) -> Vec<u8> {
        self.image
    }

    pub fn student_id(&self) -> &StudentId {
        &self.student_id
    }

    pub fn course_name(&self) -> &str {
        &self.course_name
    }

    pub fn orientation_normalized(&self) -> bool {
        self.orientation_normalized
    }

    /// Refuse artifacts that skipped normalization
    pub fn ensure_normalized(&self) -> Result<()> {
        if self.orientation_normalized {
            Ok(())
        } else {
            Err(AttendanceError::ArtifactNotNormalized)
        }
    }
}

/// Server verdict on a recognition upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecognitionVerdict {
    Recognized { student_name: String },
    Rejected { reason: String },
}

/// One image in a tuning upload batch
#[derive(Debug, Clone)]
pub struct TrainingImage {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl TrainingImage {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let mime_type = mime_for(&file_name).to_string();
        Self {
            file_name,
            mime_type,
            bytes,
        }
    }
}

fn mime_for(file_name: &str) -> &'static str {
    let lower = file_name.to_lowercase();
    if lower.ends_with(".jpg") || lower.ends_with(".jpeg") {
        "image/jpeg"
    } else if lower.ends_with(".png") {
        "image/png"
    } else {
        "application/octet-stream"
    }
}
