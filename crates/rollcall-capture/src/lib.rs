//! Rollcall Capture - Photo capture and normalization
//!
//! Takes one frame from a camera port, corrects its orientation, recompresses
//! it to JPEG and hands out a single artifact for recognition upload.

pub mod camera;
pub mod normalize;
pub mod pipeline;

pub use camera::{FileCamera, StaticCamera};
pub use normalize::{normalize_frame, NormalizedImage};
pub use pipeline::{CapturePipeline, CaptureSettings, PipelineState};
