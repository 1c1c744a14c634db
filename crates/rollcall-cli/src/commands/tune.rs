//! Tune command implementation

use crate::backend::AttendanceBackend;
use crate::cli::{TuneArgs, TuneCommand};
use crate::errors;
use crate::output::OutputWriter;
use crate::output_types::TuneOutput;
use crate::progress::{finish_error, finish_success, spinner_for};
use anyhow::Result;
use rollcall_core::config::LayeredConfig;
use rollcall_core::models::{RecognitionVerdict, SessionContext, StudentId, TrainingImage};
use rollcall_session::{FeatureFlagBroadcast, TuningFlows};
use std::path::Path;
use std::sync::Arc;

pub async fn execute<B: AttendanceBackend>(
    args: TuneArgs,
    service: B,
    session: &SessionContext,
    config: &LayeredConfig,
    output: &OutputWriter,
) -> Result<()> {
    let timeout = config.request_timeout();
    let flags = Arc::new(FeatureFlagBroadcast::new(service.clone(), timeout));
    let flows = TuningFlows::new(flags, service, timeout);

    match args.command {
        TuneCommand::Upload(args) => {
            let student_id = StudentId::new(args.student);
            let images = args
                .images
                .iter()
                .map(|path| read_image(path))
                .collect::<Result<Vec<_>>>()?;

            let spinner =
                spinner_for(output.is_json(), &format!("Uploading {} image(s)...", images.len()));
            let message = match flows.upload(session, &student_id, images).await {
                Ok(message) => {
                    finish_success(&spinner, "Upload complete");
                    message
                }
                Err(e) => {
                    finish_error(&spinner, &e.to_string());
                    return Err(e.into());
                }
            };

            if output.is_json() {
                output.result(TuneOutput {
                    student_id: student_id.to_string(),
                    recognized: None,
                    message,
                })?;
            } else {
                output.success(message);
            }
        }
        TuneCommand::Test(args) => {
            let student_id = StudentId::new(args.student);
            let image = read_image(&args.image)?;

            let verdict = flows.test(session, &student_id, image).await?;
            let (recognized, message) = match verdict {
                RecognitionVerdict::Recognized { student_name } => {
                    (true, format!("Recognized as {}", student_name))
                }
                RecognitionVerdict::Rejected { reason } => (false, reason),
            };

            if output.is_json() {
                output.result(TuneOutput {
                    student_id: student_id.to_string(),
                    recognized: Some(recognized),
                    message,
                })?;
            } else if recognized {
                output.success(message);
            } else {
                output.warning(format!("Not recognized: {}", message));
            }
        }
    }

    Ok(())
}

fn read_image(path: &Path) -> Result<TrainingImage> {
    let bytes = std::fs::read(path)
        .map_err(|e| errors::image_unreadable(&path.display().to_string(), &e.to_string()))?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image.jpg".to_string());
    Ok(TrainingImage::new(file_name, bytes))
}
