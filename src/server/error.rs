//! HTTP error responses. Every error renders as `{"error": "<message>"}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::error::DetectorError;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("No file part")]
    NoFilePart,
    #[error("No selected file")]
    NoSelectedFile,
    #[error("Invalid file type")]
    InvalidFileType,
    #[error("Uploaded file is empty")]
    EmptyFile,
    #[error("Uploaded file is too large")]
    PayloadTooLarge,
    #[error("Malformed upload: {0}")]
    MalformedUpload(String),
    #[error("Reference PAN card image not found.")]
    ReferenceMissing,
    #[error("{0}")]
    Processing(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NoFilePart
            | ApiError::NoSelectedFile
            | ApiError::InvalidFileType
            | ApiError::EmptyFile
            | ApiError::MalformedUpload(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::ReferenceMissing | ApiError::Processing(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::Internal(detail) => {
                tracing::error!(detail = %detail, "Upload request failed");
                "An internal error occurred".to_string()
            }
            ApiError::ReferenceMissing => {
                tracing::error!("Reference image is not provisioned");
                self.to_string()
            }
            other => other.to_string(),
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}

impl From<DetectorError> for ApiError {
    fn from(err: DetectorError) -> Self {
        match err {
            DetectorError::ReferenceMissing => ApiError::ReferenceMissing,
            e if e.is_processing_error() => ApiError::Processing(e.to_string()),
            e => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        ApiError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ImageRole;
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> serde_json::Value {
        let body = to_bytes(response.into_body(), 1024).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn client_errors_return_400_with_message() {
        for (err, message) in [
            (ApiError::NoFilePart, "No file part"),
            (ApiError::NoSelectedFile, "No selected file"),
            (ApiError::InvalidFileType, "Invalid file type"),
        ] {
            let response = err.into_response();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            assert_eq!(body_json(response).await["error"], message);
        }
    }

    #[tokio::test]
    async fn reference_missing_returns_500() {
        let api_err: ApiError = DetectorError::ReferenceMissing.into();
        let response = api_err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await["error"],
            "Reference PAN card image not found."
        );
    }

    #[tokio::test]
    async fn processing_errors_keep_their_description() {
        let api_err: ApiError = DetectorError::EmptyImage {
            role: ImageRole::Uploaded,
        }
        .into();
        let response = api_err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await["error"], "The uploaded image is empty.");
    }

    #[tokio::test]
    async fn internal_errors_hide_details() {
        let api_err: ApiError =
            DetectorError::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk full")).into();
        let response = api_err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await["error"], "An internal error occurred");
    }
}
