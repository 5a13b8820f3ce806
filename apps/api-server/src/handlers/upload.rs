//! Image upload handler.

use actix_multipart::Multipart;
use actix_web::{HttpResponse, web};

use quill_shared::dto::UploadResponse;

use super::multipart;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// POST /api/upload/image
///
/// Rejected uploads never reach the image store.
pub async fn upload_image(
    state: web::Data<AppState>,
    payload: Multipart,
) -> AppResult<HttpResponse> {
    let form = multipart::read_form(payload, state.max_upload_bytes).await?;
    let image = form
        .image
        .ok_or_else(|| AppError::BadRequest("No file uploaded".to_string()))?;

    let stored = state
        .images
        .store(image.file_name.as_deref(), &image.bytes)
        .await?;

    Ok(HttpResponse::Ok().json(UploadResponse {
        message: "File uploaded successfully".to_string(),
        url: stored.url,
    }))
}
