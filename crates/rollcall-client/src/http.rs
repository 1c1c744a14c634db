use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, Response, StatusCode, Url};
use rollcall_core::config::{parse_server_url, LayeredConfig};
use rollcall_core::error::{AttendanceError, Result};
use rollcall_core::models::{
    CaptureArtifact, GeofenceVerdict, LocationSample, RecognitionVerdict, RosterStudent,
    ScheduleEntry, StudentId, TrainingImage, WindowKey, WindowSnapshot, WindowState,
};
use rollcall_core::ports::{
    FlagService, RosterService, TuningService, VerificationService, WindowService,
};
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::wire::{
    AttendanceStatusResponse, ErrorBody, LocationCheckRequest, LocationCheckResponse,
    ManualAllRequest, ManualSelectedRequest, ManualStatusResponse, ProcessAttendanceResponse,
    RecognitionMessage, StudentsResponse, ToggleAttendanceRequest, ToggleAttendanceResponse,
    TrainModelStatusResponse, TrainModelToggleResponse,
};

/// HTTP adapter for the attendance server
#[derive(Debug, Clone)]
pub struct HttpAttendanceClient {
    /// Base URL without a trailing slash (e.g., "http://127.0.0.1:5000")
    base_url: String,

    /// Per-request transport timeout
    timeout: Duration,

    client: reqwest::Client,
}

impl HttpAttendanceClient {
    /// Create a client for the server at `base_url`
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = parse_server_url(base_url)?;
        let client = reqwest::Client::builder().timeout(timeout).build().map_err(|e| {
            AttendanceError::ConfigInvalid {
                key: "server_url".to_string(),
                reason: format!("Failed to build HTTP client: {}", e),
            }
        })?;

        Ok(Self {
            base_url,
            timeout,
            client,
        })
    }

    pub fn from_config(config: &LayeredConfig) -> Result<Self> {
        Self::new(&config.server_url.value, config.request_timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn url_for_student(&self, path: &str, student_id: &StudentId) -> Result<Url> {
        let mut url = Url::parse(&self.url(path)).map_err(|e| AttendanceError::ConfigInvalid {
            key: "server_url".to_string(),
            reason: e.to_string(),
        })?;
        url.query_pairs_mut().append_pair("studentId", student_id.as_str());
        Ok(url)
    }

    async fn send(&self, operation: &str, request: RequestBuilder) -> Result<Response> {
        tracing::debug!(operation, "Sending request");
        request.send().await.map_err(|e| {
            if e.is_timeout() {
                AttendanceError::Timeout {
                    operation: operation.to_string(),
                    seconds: self.timeout.as_secs(),
                }
            } else {
                AttendanceError::network(operation, e)
            }
        })
    }

    async fn read_body(&self, operation: &str, response: Response) -> Result<(StatusCode, String)> {
        let status = response.status();
        let text = response.text().await.map_err(|e| {
            if e.is_timeout() {
                AttendanceError::Timeout {
                    operation: operation.to_string(),
                    seconds: self.timeout.as_secs(),
                }
            } else {
                AttendanceError::network(operation, e)
            }
        })?;
        Ok((status, text))
    }

    /// Send, require a 2xx status, and decode the JSON body
    async fn fetch_json<T: DeserializeOwned>(
        &self,
        operation: &str,
        request: RequestBuilder,
    ) -> Result<T> {
        let response = self.send(operation, request).await?;
        let (status, text) = self.read_body(operation, response).await?;
        if !status.is_success() {
            return Err(status_error(operation, status, &text));
        }
        decode(operation, &text)
    }

    /// Send, require a 2xx status, and ignore the body
    async fn expect_ok(&self, operation: &str, request: RequestBuilder) -> Result<()> {
        let response = self.send(operation, request).await?;
        let (status, text) = self.read_body(operation, response).await?;
        if !status.is_success() {
            return Err(status_error(operation, status, &text));
        }
        Ok(())
    }
}

fn decode<T: DeserializeOwned>(operation: &str, text: &str) -> Result<T> {
    serde_json::from_str(text).map_err(|e| {
        AttendanceError::Serialization(format!("Unexpected {} response: {}", operation, e))
    })
}

fn status_error(operation: &str, status: StatusCode, text: &str) -> AttendanceError {
    let body = ErrorBody::parse(text);
    let message = body
        .reason()
        .map(str::to_string)
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("no details").to_string());

    tracing::warn!(operation, status = status.as_u16(), %message, "Server refused request");

    if status == StatusCode::FORBIDDEN || status == StatusCode::UNAUTHORIZED {
        return AttendanceError::Unauthorized {
            role: "current session".to_string(),
            action: operation.to_string(),
        };
    }

    AttendanceError::Server {
        operation: operation.to_string(),
        status: status.as_u16(),
        message,
    }
}

fn image_part(bytes: Vec<u8>, file_name: &str, mime_type: &str) -> Result<Part> {
    Part::bytes(bytes)
        .file_name(file_name.to_string())
        .mime_str(mime_type)
        .map_err(|e| AttendanceError::validation("mime_type", e.to_string()))
}

#[async_trait]
impl WindowService for HttpAttendanceClient {
    async fn set_window(&self, key: &WindowKey, desired: WindowState) -> Result<WindowState> {
        let body = ToggleAttendanceRequest::new(key, desired);
        let request = self.client.post(self.url("/toggle_attendance")).json(&body);
        let response: ToggleAttendanceResponse =
            self.fetch_json("toggle attendance", request).await?;
        Ok(WindowState::from_open(response.status))
    }

    async fn window_snapshot(&self, student_id: &StudentId) -> Result<WindowSnapshot> {
        let url = self.url_for_student("/get_attendance_status", student_id)?;
        let response: AttendanceStatusResponse =
            self.fetch_json("read attendance status", self.client.get(url)).await?;
        Ok(WindowSnapshot::new(response.into_windows()))
    }
}

#[async_trait]
impl FlagService for HttpAttendanceClient {
    async fn manual_gps_enabled(&self, student_id: &StudentId) -> Result<bool> {
        let url = self.url_for_student("/get_student_manual_attendance_status", student_id)?;
        let response: ManualStatusResponse =
            self.fetch_json("read manual GPS flag", self.client.get(url)).await?;
        Ok(response.manual_attendance_enabled)
    }

    async fn set_manual_gps(&self, student_ids: &[StudentId], enabled: bool) -> Result<()> {
        let body = ManualSelectedRequest {
            student_ids: student_ids.to_vec(),
            enable: enabled,
        };
        let request = self
            .client
            .post(self.url("/toggle_manual_attendance_selected"))
            .json(&body);
        self.expect_ok("set manual GPS", request).await
    }

    async fn set_manual_gps_all(&self, enabled: bool) -> Result<()> {
        let body = ManualAllRequest {
            is_enabled: enabled,
        };
        let request = self
            .client
            .post(self.url("/toggle_manual_attendance_all"))
            .json(&body);
        self.expect_ok("set manual GPS for all", request).await
    }

    async fn tuning_enabled(&self) -> Result<bool> {
        let request = self.client.get(self.url("/get_train_model_status"));
        let response: TrainModelStatusResponse =
            self.fetch_json("read tuning flag", request).await?;
        Ok(response.is_enabled)
    }

    async fn toggle_tuning(&self) -> Result<bool> {
        let request = self.client.post(self.url("/toggle_train_model"));
        let response: TrainModelToggleResponse =
            self.fetch_json("toggle tuning", request).await?;
        Ok(response.is_enabled)
    }
}

#[async_trait]
impl VerificationService for HttpAttendanceClient {
    async fn verify_location(
        &self,
        student_id: &StudentId,
        sample: &LocationSample,
    ) -> Result<GeofenceVerdict> {
        let operation = "verify location";
        let body = LocationCheckRequest::new(student_id, sample);
        let request = self.client.post(self.url("/check_student_location")).json(&body);

        let response = self.send(operation, request).await?;
        let (status, text) = self.read_body(operation, response).await?;

        // Rejections come back as 200 with status "error"; a 5xx is a server fault
        if !status.is_success() {
            return Err(status_error(operation, status, &text));
        }

        let check: LocationCheckResponse = decode(operation, &text)?;
        if check.is_success() {
            Ok(GeofenceVerdict::Accepted)
        } else {
            Ok(GeofenceVerdict::Rejected {
                reason: check
                    .message
                    .unwrap_or_else(|| "You are not within the allowed area".to_string()),
            })
        }
    }

    async fn submit_capture(&self, artifact: CaptureArtifact) -> Result<RecognitionVerdict> {
        artifact.ensure_normalized()?;
        let operation = "submit attendance";

        let student_id = artifact.student_id().to_string();
        let course_name = artifact.course_name().to_string();
        let image = image_part(
            artifact.into_image(),
            CaptureArtifact::FILE_NAME,
            CaptureArtifact::MIME_TYPE,
        )?;
        let form = Form::new()
            .part("image_data", image)
            .text("student_id", student_id)
            .text("course_name", course_name);

        let request = self.client.post(self.url("/process_attendance")).multipart(form);
        let response = self.send(operation, request).await?;
        let (status, text) = self.read_body(operation, response).await?;

        if !(status.is_success() || status == StatusCode::BAD_REQUEST) {
            return Err(status_error(operation, status, &text));
        }

        let outcome: ProcessAttendanceResponse = decode(operation, &text)?;
        match (outcome.success, outcome.student_name) {
            (true, Some(student_name)) => Ok(RecognitionVerdict::Recognized { student_name }),
            (true, None) => Err(AttendanceError::Serialization(
                "Recognition succeeded without a student name".to_string(),
            )),
            (false, _) => Ok(RecognitionVerdict::Rejected {
                reason: outcome
                    .error
                    .unwrap_or_else(|| "Face not recognized".to_string()),
            }),
        }
    }
}

#[async_trait]
impl RosterService for HttpAttendanceClient {
    async fn student_schedule(&self, student_id: &StudentId) -> Result<Vec<ScheduleEntry>> {
        let url = self.url_for_student("/get_student_schedule", student_id)?;
        self.fetch_json("read schedule", self.client.get(url)).await
    }

    async fn list_students(&self) -> Result<Vec<RosterStudent>> {
        let request = self.client.get(self.url("/get_students"));
        let response: StudentsResponse = self.fetch_json("list students", request).await?;
        Ok(response.students)
    }
}

#[async_trait]
impl TuningService for HttpAttendanceClient {
    async fn upload_training_images(
        &self,
        student_id: &StudentId,
        images: Vec<TrainingImage>,
    ) -> Result<String> {
        if images.is_empty() {
            return Err(AttendanceError::validation("images", "at least one image is required"));
        }

        let mut form = Form::new().text("studentId", student_id.to_string());
        for image in images {
            form = form.part(
                "images",
                image_part(image.bytes, &image.file_name, &image.mime_type)?,
            );
        }

        let request = self
            .client
            .post(self.url("/api/facial-recognition/upload"))
            .multipart(form);
        let response: RecognitionMessage = self.fetch_json("upload training images", request).await?;
        Ok(response.message)
    }

    async fn test_recognition(
        &self,
        student_id: &StudentId,
        image: TrainingImage,
    ) -> Result<RecognitionVerdict> {
        let operation = "test recognition";
        let form = Form::new().text("studentId", student_id.to_string()).part(
            "imageData",
            image_part(image.bytes, &image.file_name, &image.mime_type)?,
        );

        let request = self
            .client
            .post(self.url("/api/facial-recognition/test"))
            .multipart(form);
        let response = self.send(operation, request).await?;
        let (status, text) = self.read_body(operation, response).await?;

        match status {
            s if s.is_success() => {
                let body: RecognitionMessage = decode(operation, &text)?;
                Ok(RecognitionVerdict::Recognized {
                    student_name: body.student_id.unwrap_or_else(|| student_id.to_string()),
                })
            }
            StatusCode::NOT_FOUND => Ok(RecognitionVerdict::Rejected {
                reason: ErrorBody::parse(&text)
                    .reason()
                    .unwrap_or("Face not recognized")
                    .to_string(),
            }),
            other => Err(status_error(operation, other, &text)),
        }
    }
}
