pub mod cart;
pub mod catalog;

use std::sync::Arc;

use axum::{Router, http::StatusCode, routing::get};
use diesel_async::{AsyncPgConnection, pooled_connection::deadpool::Pool};
use qrorder_catalog_service::{
    blob::PgBlobStore,
    memory::{MemoryBlobStore, MemoryProductStore},
    models::ProductKind,
    service::CatalogService,
    store::PgProductStore,
};
use qrorder_order_service::{memory::MemoryOrderStore, service::OrderService, store::PgOrderStore};
use utoipa::OpenApi;

#[derive(Clone)]
pub struct AppState {
    pub orders: OrderService,
    pub catalog: CatalogService,
}

impl AppState {
    pub fn postgres(pool: Pool<AsyncPgConnection>, blob_chunk_size: usize) -> Self {
        Self {
            orders: OrderService::new(Arc::new(PgOrderStore::new(pool.clone()))),
            catalog: CatalogService::new(
                Arc::new(PgProductStore::new(pool.clone())),
                Arc::new(PgBlobStore::new(pool, blob_chunk_size)),
            ),
        }
    }

    pub fn in_memory(blob_chunk_size: usize) -> Self {
        Self {
            orders: OrderService::new(Arc::new(MemoryOrderStore::new())),
            catalog: CatalogService::new(
                Arc::new(MemoryProductStore::new()),
                Arc::new(MemoryBlobStore::new(blob_chunk_size)),
            ),
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(cart::router())
        .merge(catalog::router(ProductKind::Combo))
        .merge(catalog::router(ProductKind::MenuItem))
        .route("/health", get(health))
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is up"),
    ),
    tag = "health"
)]
pub async fn health() -> StatusCode {
    StatusCode::OK
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        cart::list_orders,
        cart::create_order,
        cart::mark_entry_served,
        catalog::list_products,
        catalog::create_product,
        catalog::set_availability,
        catalog::get_image,
        catalog::delete_product,
    ),
    components(
        schemas(
            crate::models::CreateOrderRequest,
            crate::models::CreateOrderResponse,
            crate::models::OrderResponse,
            crate::models::EntryResponse,
            crate::models::ProductResponse,
            crate::models::CreateProductForm,
            crate::models::CreateProductResponse,
            crate::models::SetAvailabilityRequest,
            crate::models::MessageResponse,
            crate::models::ApiErrorResponse,
        )
    ),
    tags(
        (name = "cart", description = "Table orders and serving status"),
        (name = "catalog", description = "Combos and menu items with their images"),
        (name = "health", description = "Liveness"),
    ),
    info(
        title = "QR Order API",
        description = "Backend for QR-code table ordering",
        version = "1.0.0"
    )
)]
pub struct ApiDoc;
