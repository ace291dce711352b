use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use face_upscaler_core::detection::domain::face_locator::LocateError;
use face_upscaler_core::pipeline::upscale_face_use_case::PipelineError;

/// Failures a request can end in, each mapped to one status code.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("malformed upload: {0}")]
    Upload(#[from] MultipartError),
    #[error("request has no `file` field")]
    MissingFile,
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    #[error("worker task failed: {0}")]
    Worker(String),
}

#[derive(Serialize)]
struct ErrorBody {
    detail: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Upload(e) => e.status(),
            ApiError::MissingFile => StatusCode::BAD_REQUEST,
            ApiError::Pipeline(e) => match e {
                PipelineError::DecodeFailed(_) => StatusCode::BAD_REQUEST,
                PipelineError::Locate(LocateError::DetectorUnavailable) => {
                    StatusCode::SERVICE_UNAVAILABLE
                }
                PipelineError::Locate(_) => StatusCode::NOT_FOUND,
                PipelineError::Upscale(_) | PipelineError::EncodeFailed(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            ApiError::Worker(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing message. Tool output and paths stay in the server log.
    pub fn detail(&self) -> String {
        match self {
            ApiError::Upload(e) => e.body_text(),
            ApiError::MissingFile => "Missing form field 'file'.".into(),
            ApiError::Pipeline(e) => match e {
                PipelineError::DecodeFailed(_) => "Invalid image file. Could not decode.".into(),
                PipelineError::Locate(LocateError::DetectorUnavailable) => {
                    "Face detector is not available.".into()
                }
                PipelineError::Locate(_) => "No face detected in the uploaded image.".into(),
                PipelineError::Upscale(_) => "Face upscaling process failed on the server.".into(),
                PipelineError::EncodeFailed(_) => "Could not encode the upscaled image.".into(),
            },
            ApiError::Worker(_) => "Internal server error.".into(),
        }
    }

    fn log(&self) {
        match self {
            ApiError::Pipeline(PipelineError::Locate(LocateError::DetectionFailed(_))) => {
                log::warn!("Treating detection error as no face: {self}")
            }
            ApiError::Pipeline(PipelineError::Locate(LocateError::DetectorUnavailable)) => {
                log::error!("Rejected request: {self}")
            }
            e if e.status().is_server_error() => log::error!("Request failed: {e}"),
            e => log::info!("Rejected request: {e}"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.log();
        let body = ErrorBody {
            detail: self.detail(),
        };
        (self.status(), Json(body)).into_response()
    }
}
