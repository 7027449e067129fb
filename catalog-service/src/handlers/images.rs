use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, Path, State,
    },
    http::StatusCode,
    Json,
};
use serde_json::Value;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{ApiResponse, ImagePatch, ImageRecord, NewImage};
use crate::storage::derive_id;
use crate::AppState;

/// Multipart part carrying the image bytes
const IMAGE_FIELD: &str = "image";

/// Fields collected from an add-image form
#[derive(Debug)]
struct ImageUpload {
    blob: Bytes,
    name: Option<String>,
    price: Option<f64>,
}

/// List every image in the catalog
pub async fn list_images(
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<Vec<ImageRecord>>>> {
    let images = state.store.list_all().await?;
    tracing::debug!(count = images.len(), "Listed images");

    Ok(Json(ApiResponse::success(images)))
}

/// Upload an image to remote storage and record it
pub async fn add_image(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<Json<ApiResponse<()>>> {
    let multipart = multipart.map_err(|e| AppError::Validation(e.body_text()))?;
    let upload = read_upload(multipart).await?;
    let size = upload.blob.len();

    let img_url = state.storage.upload(upload.blob).await?;

    let record = state
        .store
        .create(NewImage {
            name: upload.name,
            price: upload.price,
            img_url: img_url.clone(),
        })
        .await
        .map_err(|e| {
            tracing::warn!(url = %img_url, "Uploaded image left orphaned: record could not be saved");
            e
        })?;

    tracing::info!(
        image_id = %record.id,
        url = %record.img_url,
        bytes = size,
        "Image added"
    );

    Ok(Json(ApiResponse::success_no_data("Image added")))
}

/// Delete an image from remote storage and from the catalog.
///
/// A failed remote delete does not stop the record from being removed; the
/// failure is returned in the response's `warning` field.
pub async fn remove_image(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<()>>> {
    let not_found = || AppError::NotFound("Image to remove doesn't exist".to_string());

    let id = Uuid::parse_str(&id).map_err(|_| not_found())?;
    let image = state.store.find_by_id(id).await?.ok_or_else(not_found)?;

    let storage_id = derive_id(&image.img_url);
    let warning = match state.storage.delete(&storage_id).await {
        Ok(()) => None,
        Err(e) => {
            tracing::warn!(image_id = %id, storage_id = %storage_id, "Remote delete failed: {}", e);
            Some(e.to_string())
        }
    };

    if !state.store.delete_by_url(&image.img_url).await? {
        return Err(not_found());
    }

    tracing::info!(image_id = %id, url = %image.img_url, "Image deleted");
    Ok(Json(ApiResponse::success_no_data("Image deleted").with_warning(warning)))
}

/// Set the out-of-stock flag; the body must be `{"isOutstock": <bool>}`
pub async fn update_isoutstock(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Bytes,
) -> AppResult<Json<ApiResponse<ImageRecord>>> {
    let payload: Option<Value> = serde_json::from_slice(&body).ok();
    let is_outstock = payload
        .as_ref()
        .and_then(|v| v.get("isOutstock"))
        .and_then(Value::as_bool)
        .ok_or_else(|| AppError::Validation("Invalid value for isOutstock".to_string()))?;

    let not_found = || AppError::NotFound("Image not found".to_string());
    let id = Uuid::parse_str(&id).map_err(|_| not_found())?;

    let updated = state
        .store
        .update_by_id(id, ImagePatch::stock(is_outstock))
        .await?
        .ok_or_else(not_found)?;

    Ok(Json(ApiResponse::success_with_message(updated, "Image updated")))
}

async fn read_upload(mut multipart: Multipart) -> AppResult<ImageUpload> {
    let mut blob: Option<Bytes> = None;
    let mut name: Option<String> = None;
    let mut price_raw: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error("Invalid multipart", e))?
    {
        let field_name = field.name().unwrap_or_default().to_string();

        match field_name.as_str() {
            IMAGE_FIELD => {
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| multipart_error("Failed to read file", e))?;
                if !data.is_empty() {
                    blob = Some(data);
                }
            }
            "name" | "price" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| multipart_error(&format!("Failed to read {}", field_name), e))?;
                let text = Some(text.trim().to_string()).filter(|t| !t.is_empty());
                if field_name == "name" {
                    name = text;
                } else {
                    price_raw = text;
                }
            }
            other => tracing::debug!("Ignoring multipart field: {}", other),
        }
    }

    let blob = blob.ok_or_else(|| AppError::Validation("No image file attached".to_string()))?;
    let price = price_raw.as_deref().map(parse_price).transpose()?;

    Ok(ImageUpload { blob, name, price })
}

/// A body cut off by the request size limit is reported as 413, anything else as a bad request
fn multipart_error(context: &str, err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(format!("{}: {}", context, err.body_text()))
    } else {
        AppError::Validation(format!("{}: {}", context, err))
    }
}

fn parse_price(raw: &str) -> AppResult<f64> {
    raw.parse::<f64>()
        .ok()
        .filter(|p| p.is_finite())
        .ok_or_else(|| AppError::Validation(format!("Invalid value for price: {}", raw)))
}
