//! HTTP request handlers

use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use tracing::{error, info, warn};

use crate::notion::AccessToken;
use crate::pipeline::PipelineJob;
use crate::server::routes::AppContext;
use crate::transcription::{is_valid_audio_type, sniff_content_type};

/// Cookie carrying the caller's Notion token.
pub const TOKEN_COOKIE: &str = "notion_token";

pub const AUDIO_FIELD: &str = "audio-file";
pub const DATABASE_FIELD: &str = "notion-page-id";

pub const SUCCESS_PATH: &str = "/upload/success";

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    module: String,
    version: String,
}

/// Errors returned synchronously to the uploader.
#[derive(Debug)]
pub enum ApiError {
    Unauthorized,
    BadRequest(String),
    PayloadTooLarge,
    Unavailable(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "Missing Notion access token".to_string(),
            ),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::PayloadTooLarge => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "Upload exceeds the size limit".to_string(),
            ),
            ApiError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}

impl From<MultipartError> for ApiError {
    fn from(e: MultipartError) -> Self {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge
        } else {
            ApiError::BadRequest(format!("Invalid multipart form: {}", e.body_text()))
        }
    }
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        module: crate::APP_NAME.to_string(),
        version: crate::VERSION.to_string(),
    })
}

pub async fn upload_success() -> &'static str {
    "Upload received. The transcribed page will appear in Notion once processing finishes."
}

/// Find the caller's token in the cookie jar or an Authorization header.
pub fn extract_token(headers: &HeaderMap) -> Option<AccessToken> {
    let from_cookie = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == TOKEN_COOKIE)
        .map(|(_, value)| value.trim().to_string());

    let from_header = || {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(|value| value.trim().to_string())
    };

    from_cookie
        .or_else(from_header)
        .filter(|token| !token.is_empty())
        .map(AccessToken::new)
}

struct AudioUpload {
    filename: String,
    bytes: Vec<u8>,
}

/// Accept an upload, persist it and queue a pipeline run.
///
/// Responds with a redirect as soon as the job is queued; the pipeline
/// outcome is never reported back to this request.
pub async fn transcribe(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Redirect, ApiError> {
    let token = extract_token(&headers).ok_or(ApiError::Unauthorized)?;

    let mut database_id = None;
    let mut upload = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            DATABASE_FIELD => {
                database_id = Some(field.text().await?.trim().to_string());
            }
            AUDIO_FIELD => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await?.to_vec();
                upload = Some(AudioUpload { filename, bytes });
            }
            _ => {}
        }
    }

    let database_id = database_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::BadRequest("No Notion database id supplied".to_string()))?;
    let upload = upload
        .filter(|u| !u.filename.is_empty() && !u.bytes.is_empty())
        .ok_or_else(|| ApiError::BadRequest("No audio file supplied".to_string()))?;
    if upload.bytes.len() > ctx.max_upload_bytes {
        return Err(ApiError::PayloadTooLarge);
    }

    let content_type = sniff_content_type(&upload.bytes);
    if !is_valid_audio_type(content_type) {
        warn!(
            "Rejected upload {} with content type {}",
            upload.filename, content_type
        );
        return Err(ApiError::BadRequest(format!(
            "Unsupported file type: {}",
            content_type
        )));
    }

    let file = ctx
        .store
        .write(upload.bytes, &upload.filename, content_type)
        .await
        .map_err(|e| {
            error!("Failed to store upload {}: {}", upload.filename, e);
            ApiError::Internal("Failed to store upload".to_string())
        })?;

    let job = PipelineJob::new(file, upload.filename, database_id, token)
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let filename = job.filename.clone();

    match ctx.jobs.submit(job) {
        Ok(job_id) => {
            info!(job_id = %job_id, "Queued {} for transcription", filename);
            Ok(Redirect::to(SUCCESS_PATH))
        }
        Err(e) => {
            warn!("Could not queue {}: {}", filename, e);
            Err(ApiError::Unavailable(e.to_string()))
        }
    }
}
