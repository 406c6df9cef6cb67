use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::IntoResponse,
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use crate::{
    AppState,
    services::storage::object_key,
    utils::{error_codes, error_to_api_response, success_to_api_response},
};

#[derive(Debug, Deserialize)]
pub struct UploadRequest {
    pub file: Option<String>,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub folder: Option<String>,
}

#[axum::debug_handler]
pub async fn upload_media(
    State(state): State<AppState>,
    Json(req): Json<UploadRequest>,
) -> impl IntoResponse {
    let Some(encoded) = req.file.as_deref().filter(|f| !f.is_empty()) else {
        return (
            StatusCode::BAD_REQUEST,
            error_to_api_response(error_codes::VALIDATION_ERROR, "file required".to_string()),
        );
    };

    let bytes = match STANDARD.decode(encoded) {
        Ok(bytes) if !bytes.is_empty() => bytes,
        Ok(_) => {
            return (
                StatusCode::BAD_REQUEST,
                error_to_api_response(error_codes::VALIDATION_ERROR, "file is empty".to_string()),
            );
        }
        Err(_) => {
            return (
                StatusCode::BAD_REQUEST,
                error_to_api_response(
                    error_codes::VALIDATION_ERROR,
                    "file is not valid base64".to_string(),
                ),
            );
        }
    };

    let file_name = req.file_name.as_deref().unwrap_or("upload.jpg");
    let content_type = req.content_type.as_deref().unwrap_or("image/jpeg");
    let folder = req.folder.as_deref().unwrap_or("uploads");

    let key = object_key(folder, file_name, &bytes, Utc::now());
    let size = bytes.len();

    match state.storage.upload(&key, bytes, content_type).await {
        Ok(url) => (
            StatusCode::OK,
            success_to_api_response(json!({
                "url": url,
                "key": key,
                "size": size,
            })),
        ),
        Err(e) => {
            tracing::error!("Media upload failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(error_codes::INTERNAL_ERROR, "Upload failed".to_string()),
            )
        }
    }
}
