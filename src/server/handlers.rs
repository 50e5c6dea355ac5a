// shrinkray/src/server/handlers.rs
use super::error::ApiError;
use super::AppState;
use crate::core::{CompressError, QualityHint, UploadedImage};
use crate::envelope::CompressResponse;
use crate::processors::Codec;
use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, State,
    },
    http::{StatusCode, Uri},
    Json,
};
use std::sync::Arc;

pub const IMAGE_FIELD: &str = "image";
pub const QUALITY_FIELD: &str = "quality";

#[derive(Debug, Default)]
struct CompressForm {
    image: Option<UploadedImage>,
    quality: Option<String>,
}

pub async fn compress<C: Codec + 'static>(
    State(state): State<AppState<C>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<CompressResponse>, ApiError> {
    let limit = state.compressor.config().max_file_size;

    // A body that is not multipart at all cannot carry the image field.
    let mut multipart = multipart.map_err(|rejection| {
        log::debug!("Multipart rejected: {}", rejection);
        CompressError::MissingInput
    })?;

    let form = read_form(&mut multipart, limit).await?;
    let upload = form.image.ok_or(CompressError::MissingInput)?;
    let quality = QualityHint::parse(form.quality.as_deref());

    // The permit travels with the blocking task so a dropped request cannot
    // free its slot while the encode is still running.
    let permit = Arc::clone(&state.permits)
        .acquire_owned()
        .await
        .map_err(|e| CompressError::ProcessingFailed(format!("limiter closed: {}", e)))?;

    let compressor = Arc::clone(&state.compressor);
    let result = tokio::task::spawn_blocking(move || {
        let _permit = permit;
        compressor.compress_upload(&upload, quality)
    })
    .await
    .map_err(|e| CompressError::ProcessingFailed(format!("compression task failed: {}", e)))??;

    log::info!(
        "Compressed {} image: {} -> {} bytes{}",
        result.format,
        result.original_size,
        result.output_size,
        if result.was_optimized { "" } else { " (already optimized)" }
    );

    Ok(Json(CompressResponse::from(&result)))
}

async fn read_form(multipart: &mut Multipart, limit: u64) -> Result<CompressForm, CompressError> {
    let mut form = CompressForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, limit))?
    {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            // Repeated fields are ignored; the first occurrence wins.
            Some(IMAGE_FIELD) if form.image.is_none() => {
                let bytes = field.bytes().await.map_err(|e| multipart_error(e, limit))?;
                form.image = Some(UploadedImage::new(bytes));
            }
            Some(QUALITY_FIELD) if form.quality.is_none() => {
                form.quality = Some(field.text().await.map_err(|e| multipart_error(e, limit))?);
            }
            _ => {}
        }
    }

    Ok(form)
}

fn multipart_error(err: MultipartError, limit: u64) -> CompressError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return CompressError::SizeLimitExceeded { limit };
    }
    CompressError::ProcessingFailed(err.body_text())
}

pub async fn health() -> &'static str {
    "ok"
}

pub async fn fallback(uri: Uri) -> (StatusCode, String) {
    (StatusCode::NOT_FOUND, format!("No route for {}", uri))
}
