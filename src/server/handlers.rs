use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use axum::body::Bytes;
use serde::Serialize;
use tracing::Instrument;

use super::{ApiError, AppState};
use crate::judge::Verdict;
use crate::logging::RequestSpan;

/// Name of the multipart field carrying the document image.
const FILE_FIELD: &str = "file";

/// Success body of `POST /upload`.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub tampered: bool,
    pub message: String,
}

impl From<Verdict> for UploadResponse {
    fn from(verdict: Verdict) -> Self {
        Self {
            tampered: verdict.tampered,
            message: verdict.message,
        }
    }
}

pub async fn serve_index() -> Html<&'static str> {
    Html(include_str!("frontend/index.html"))
}

pub async fn upload_file(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let request = RequestSpan::new();
    let result = process_upload(&state, multipart, &request)
        .instrument(request.span().clone())
        .await;

    let response = match result {
        Ok(verdict) => (StatusCode::OK, Json(UploadResponse::from(verdict))).into_response(),
        Err(e) => {
            let _entered = request.span().enter();
            e.into_response()
        }
    };
    request.finish(response.status().as_u16());
    response
}

async fn process_upload(
    state: &AppState,
    multipart: Result<Multipart, MultipartRejection>,
    request: &RequestSpan,
) -> Result<Verdict, ApiError> {
    // A body that is not multipart at all carries no file part.
    let mut multipart = multipart.map_err(|rejection| {
        tracing::debug!(reason = %rejection.body_text(), "Request is not multipart");
        ApiError::NoFilePart
    })?;

    let (filename, bytes) = read_file_field(&mut multipart)
        .await?
        .ok_or(ApiError::NoFilePart)?;
    request.record_filename(&filename);

    if filename.is_empty() {
        return Err(ApiError::NoSelectedFile);
    }
    if !state.gateway.is_allowed(&filename) {
        return Err(ApiError::InvalidFileType);
    }
    if bytes.is_empty() {
        return Err(ApiError::EmptyFile);
    }

    let staged = state.gateway.stage(&filename, &bytes).await?;
    drop(bytes);

    let _permit = state
        .comparison_permits
        .clone()
        .acquire_owned()
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    let judge = state.judge.clone();
    let request_id = request.request_id();

    // The staged file moves into the blocking task so it is removed only
    // after the comparison has finished with it, even if the client hangs up.
    let verdict = tokio::task::spawn_blocking(move || {
        let verdict = judge.judge_file(staged.path(), Some(request_id));
        drop(staged);
        verdict
    })
    .await
    .map_err(|e| ApiError::Internal(format!("comparison task failed: {}", e)))??;

    Ok(verdict)
}

/// First `file` field that carries a filename parameter. Parts without one
/// are plain form values, not files.
async fn read_file_field(multipart: &mut Multipart) -> Result<Option<(String, Bytes)>, ApiError> {
    let mut upload = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if upload.is_some() || field.name() != Some(FILE_FIELD) {
            continue;
        }
        let Some(filename) = field.file_name().map(str::to_string) else {
            continue;
        };
        let bytes = field.bytes().await.map_err(multipart_error)?;
        upload = Some((filename, bytes));
    }

    Ok(upload)
}

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge
    } else {
        ApiError::MalformedUpload(err.body_text())
    }
}
