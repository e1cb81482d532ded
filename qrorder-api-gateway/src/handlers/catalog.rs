use axum::{
    Extension, Router,
    body::Body,
    extract::{
        Multipart, Path, State,
        multipart::MultipartRejection,
        rejection::JsonRejection,
    },
    http::{HeaderValue, header},
    response::{IntoResponse, Json, Response},
    routing::{delete, get, patch, post},
};
use futures::TryStreamExt;
use qrorder_catalog_service::{blob::BlobUpload, models::ProductKind, service::ProductUpload};
use tracing::{debug, error, instrument};

use crate::error::ApiError;
use crate::models::*;

use super::AppState;

const OCTET_STREAM: &str = "application/octet-stream";

fn path_segment(kind: ProductKind) -> &'static str {
    match kind {
        ProductKind::Combo => "combos",
        ProductKind::MenuItem => "menu",
    }
}

fn label(kind: ProductKind) -> &'static str {
    match kind {
        ProductKind::Combo => "Combo",
        ProductKind::MenuItem => "Menu item",
    }
}

/// Routes for one kind of product, mounted under `/combos` or `/menu`.
/// Combos are also listed at `/combos/combo`.
pub fn router(kind: ProductKind) -> Router<AppState> {
    let base = format!("/{}", path_segment(kind));
    let mut router = Router::new().route(&base, get(list_products));
    if kind == ProductKind::Combo {
        router = router.route(&format!("{base}/combo"), get(list_products));
    }
    router
        .route(&format!("{base}/add"), post(create_product))
        .route(&format!("{base}/stocks/{{id}}"), patch(set_availability))
        .route(&format!("{base}/image/{{blob_id}}"), get(get_image))
        .route(&format!("{base}/{{id}}"), delete(delete_product))
        .layer(Extension(kind))
}

#[utoipa::path(
    get,
    path = "/{catalog}",
    responses(
        (status = 200, description = "All records of this kind", body = [ProductResponse]),
        (status = 500, description = "Storage error", body = ApiErrorResponse),
    ),
    params(
        ("catalog" = String, Path, description = "`combos` or `menu`"),
    ),
    tag = "catalog"
)]
#[instrument(skip(state))]
pub async fn list_products(
    State(state): State<AppState>,
    Extension(kind): Extension<ProductKind>,
) -> Result<Json<Vec<ProductResponse>>, ApiError> {
    let products = state.catalog.list_products(kind).await?;
    Ok(Json(products.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post,
    path = "/{catalog}/add",
    request_body(content = CreateProductForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Record and image stored", body = CreateProductResponse),
        (status = 400, description = "Missing or malformed fields", body = ApiErrorResponse),
        (status = 500, description = "Storage error", body = ApiErrorResponse),
    ),
    params(
        ("catalog" = String, Path, description = "`combos` or `menu`"),
    ),
    tag = "catalog"
)]
#[instrument(skip(state, multipart))]
pub async fn create_product(
    State(state): State<AppState>,
    Extension(kind): Extension<ProductKind>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<CreateProductResponse>, ApiError> {
    let upload = read_upload(multipart?).await?;

    let created = state.catalog.create_product(kind, upload).await?;

    Ok(Json(CreateProductResponse {
        message: format!("{} added successfully", label(kind)),
        id: created.id,
        blob_id: created.blob_id,
    }))
}

async fn read_upload(mut multipart: Multipart) -> Result<ProductUpload, ApiError> {
    let mut upload = ProductUpload::default();

    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        match name.as_str() {
            "name" | "comboName" => upload.name = Some(field.text().await?),
            "price" | "comboPrice" => upload.price = Some(field.text().await?),
            "type" | "comboType" => upload.product_type = Some(field.text().await?),
            "items" | "comboItems" => upload.items = Some(field.text().await?),
            "availability" => upload.availability = Some(field.text().await?),
            "image" | "comboImage" => {
                let filename = field.file_name().unwrap_or("image").to_string();
                let content_type = field.content_type().unwrap_or(OCTET_STREAM).to_string();
                let data = field.bytes().await?.to_vec();
                upload.image = Some(BlobUpload {
                    filename,
                    content_type,
                    data,
                });
            }
            other => debug!(field = other, "ignoring multipart field"),
        }
    }

    Ok(upload)
}

#[utoipa::path(
    patch,
    path = "/{catalog}/stocks/{id}",
    request_body = SetAvailabilityRequest,
    responses(
        (status = 200, description = "Availability changed", body = MessageResponse),
        (status = 400, description = "Malformed id or body", body = ApiErrorResponse),
        (status = 404, description = "Not found, or already set to this value", body = ApiErrorResponse),
        (status = 500, description = "Storage error", body = ApiErrorResponse),
    ),
    params(
        ("catalog" = String, Path, description = "`combos` or `menu`"),
        ("id" = String, Path, description = "Product ID"),
    ),
    tag = "catalog"
)]
#[instrument(skip(state, payload))]
pub async fn set_availability(
    State(state): State<AppState>,
    Extension(kind): Extension<ProductKind>,
    Path(id): Path<String>,
    payload: Result<Json<SetAvailabilityRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(payload) = payload?;

    state
        .catalog
        .set_availability(kind, &id, payload.availability.as_deref())
        .await?;

    Ok(Json(MessageResponse {
        message: "Updated successfully".to_string(),
    }))
}

/// Streams the image chunk by chunk. A store fault after the headers are
/// sent truncates the body.
#[utoipa::path(
    get,
    path = "/{catalog}/image/{blob_id}",
    responses(
        (status = 200, description = "Image bytes, with the stored Content-Type"),
        (status = 400, description = "Malformed id", body = ApiErrorResponse),
        (status = 404, description = "Image not found", body = ApiErrorResponse),
        (status = 500, description = "Storage error", body = ApiErrorResponse),
    ),
    params(
        ("catalog" = String, Path, description = "`combos` or `menu`"),
        ("blob_id" = String, Path, description = "Image blob ID"),
    ),
    tag = "catalog"
)]
#[instrument(skip(state))]
pub async fn get_image(
    State(state): State<AppState>,
    Path(blob_id): Path<String>,
) -> Result<Response, ApiError> {
    let download = state.catalog.fetch_blob(&blob_id).await?;

    let content_type = HeaderValue::from_str(&download.file.content_type)
        .unwrap_or(HeaderValue::from_static(OCTET_STREAM));
    let blob_id = download.file.id;
    let chunks = download.chunks.inspect_err(move |e| {
        error!(%blob_id, error = %e, "image stream interrupted");
    });

    Ok(([(header::CONTENT_TYPE, content_type)], Body::from_stream(chunks)).into_response())
}

#[utoipa::path(
    delete,
    path = "/{catalog}/{id}",
    responses(
        (status = 200, description = "Record and image deleted", body = MessageResponse),
        (status = 400, description = "Malformed id", body = ApiErrorResponse),
        (status = 404, description = "Not found", body = ApiErrorResponse),
        (status = 500, description = "Storage error", body = ApiErrorResponse),
    ),
    params(
        ("catalog" = String, Path, description = "`combos` or `menu`"),
        ("id" = String, Path, description = "Product ID"),
    ),
    tag = "catalog"
)]
#[instrument(skip(state))]
pub async fn delete_product(
    State(state): State<AppState>,
    Extension(kind): Extension<ProductKind>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.catalog.delete_product(kind, &id).await?;

    Ok(Json(MessageResponse {
        message: format!("{} deleted successfully", label(kind)),
    }))
}
