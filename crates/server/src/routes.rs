use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use face_upscaler_core::pipeline::upscale_face_use_case::UpscaleFaceUseCase;

use crate::api_error::ApiError;

/// Multipart field carrying the uploaded image.
pub const UPLOAD_FIELD: &str = "file";

#[derive(Clone)]
pub struct AppState {
    pub use_case: Arc<UpscaleFaceUseCase>,
}

impl AppState {
    pub fn new(use_case: UpscaleFaceUseCase) -> Self {
        Self {
            use_case: Arc::new(use_case),
        }
    }
}

pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/", get(liveness))
        .route("/upscale-face", post(upscale_face))
        .route("/upscale-face/", post(upscale_face))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(state)
}

async fn liveness() -> Json<Value> {
    Json(json!({ "message": "Face upscaler is running." }))
}

async fn upscale_face(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let upload = read_upload(multipart).await?;
    log::info!("Received upload of {} bytes", upload.len());

    // Detection and the upscaler subprocess both block.
    let use_case = state.use_case.clone();
    let jpeg = tokio::task::spawn_blocking(move || use_case.execute(&upload))
        .await
        .map_err(|e| ApiError::Worker(e.to_string()))??;

    Ok(([(header::CONTENT_TYPE, "image/jpeg")], jpeg))
}

async fn read_upload(mut multipart: Multipart) -> Result<Bytes, ApiError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some(UPLOAD_FIELD) {
            return Ok(field.bytes().await?);
        }
    }
    Err(ApiError::MissingFile)
}
