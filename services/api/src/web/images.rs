//! services/api/src/web/images.rs
//!
//! Photo upload. The completion endpoint only takes image URLs, so photos are
//! pushed to the image host and the hosted URL is handed back to the client.

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;

use crate::web::errors::{port_error_response, HandlerError};
use crate::web::state::AppState;

const DEFAULT_FILE_NAME: &str = "upload.jpg";

/// Multipart form accepted by `POST /images`.
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct ImageUpload {
    #[schema(value_type = String, format = Binary)]
    image: Vec<u8>,
}

#[derive(Serialize, ToSchema)]
pub struct ImageUploadResponse {
    pub url: String,
}

/// Uploads already-read image bytes and returns the hosted URL.
pub async fn host_image(
    state: &AppState,
    file_name: Option<&str>,
    image: Vec<u8>,
) -> Result<ImageUploadResponse, HandlerError> {
    if image.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "The uploaded image is empty".to_string()));
    }
    let file_name = file_name
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(DEFAULT_FILE_NAME);

    let url = state
        .images
        .upload_image(file_name, image)
        .await
        .map_err(|e| port_error_response("Failed to upload image", e))?;
    info!(%url, "Image hosted");
    Ok(ImageUploadResponse { url })
}

/// POST /images - Host a photo and get back its public URL
#[utoipa::path(
    post,
    path = "/images",
    request_body(content = ImageUpload, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Image hosted", body = ImageUploadResponse),
        (status = 400, description = "Missing or empty image field"),
        (status = 401, description = "Not logged in"),
        (status = 502, description = "The image host rejected the upload")
    )
)]
pub async fn upload_image_handler(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<ImageUploadResponse>, HandlerError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| (StatusCode::BAD_REQUEST, format!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some("image") {
            continue;
        }
        let file_name = field.file_name().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| (StatusCode::BAD_REQUEST, format!("Failed to read image: {}", e)))?;
        let hosted = host_image(&state, file_name.as_deref(), bytes.to_vec()).await?;
        return Ok(Json(hosted));
    }

    Err((StatusCode::BAD_REQUEST, "Missing `image` field".to_string()))
}
