use axum::{
    Router,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::Json,
    routing::{get, post, put},
};
use qrorder_order_service::document::NewOrder;
use serde_json::Value;
use tracing::instrument;

use crate::error::ApiError;
use crate::models::*;

use super::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/cart/items", get(list_orders))
        .route("/cart/cartitems", post(create_order))
        .route(
            "/cart/cartitems/{order_id}/entry/{entry_id}",
            put(mark_entry_served),
        )
        .route(
            "/cart/cartitems/{order_id}/item/{entry_id}",
            put(mark_entry_served),
        )
}

#[utoipa::path(
    get,
    path = "/cart/items",
    responses(
        (status = 200, description = "All orders", body = [OrderResponse]),
        (status = 500, description = "Storage error", body = ApiErrorResponse),
    ),
    tag = "cart"
)]
#[instrument(skip(state))]
pub async fn list_orders(
    State(state): State<AppState>,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let orders = state.orders.list_orders().await?;
    Ok(Json(orders.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post,
    path = "/cart/cartitems",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order saved", body = CreateOrderResponse),
        (status = 400, description = "Invalid or empty order", body = ApiErrorResponse),
        (status = 500, description = "Storage error", body = ApiErrorResponse),
    ),
    tag = "cart"
)]
#[instrument(skip(state, payload))]
pub async fn create_order(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateOrderResponse>), ApiError> {
    let Json(payload) = payload?;
    let new_order = NewOrder::from_json(&payload)?;

    let id = state.orders.create_order(new_order).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateOrderResponse {
            message: "Cart saved successfully".to_string(),
            id,
        }),
    ))
}

/// Also routed as `/cart/cartitems/{order_id}/item/{entry_id}`.
#[utoipa::path(
    put,
    path = "/cart/cartitems/{order_id}/entry/{entry_id}",
    responses(
        (status = 200, description = "Updated order", body = OrderResponse),
        (status = 400, description = "Malformed id", body = ApiErrorResponse),
        (status = 404, description = "Order or entry not found", body = ApiErrorResponse),
        (status = 500, description = "Storage error", body = ApiErrorResponse),
    ),
    params(
        ("order_id" = String, Path, description = "Order ID"),
        ("entry_id" = String, Path, description = "Item or combo ID within the order"),
    ),
    tag = "cart"
)]
#[instrument(skip(state))]
pub async fn mark_entry_served(
    State(state): State<AppState>,
    Path((order_id, entry_id)): Path<(String, String)>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order = state
        .orders
        .mark_entry_served(&order_id, &entry_id)
        .await?;
    Ok(Json(order.into()))
}
