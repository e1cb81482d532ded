use chrono::{DateTime, Utc};
use qrorder_catalog_service::models::Product;
use qrorder_order_service::document::{EntryDocument, OrderDocument};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    /// Table the order was placed from
    pub table_number: i32,
    /// Line items; any fields besides `status` are stored as given
    #[schema(value_type = Vec<Object>)]
    pub items: Vec<Value>,
    /// Combos; any fields besides `status` are stored as given
    #[schema(value_type = Vec<Object>)]
    pub combos: Vec<Value>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreateOrderResponse {
    pub message: String,
    /// Identifier of the new order
    pub id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EntryResponse {
    pub id: Uuid,
    /// `Not Served` or `Served`
    pub status: String,
    /// Caller-supplied fields, inlined into the entry
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub details: Map<String, Value>,
}

impl From<EntryDocument> for EntryResponse {
    fn from(entry: EntryDocument) -> Self {
        Self {
            id: entry.id,
            status: entry.status.as_str().to_string(),
            details: entry.details,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub id: Uuid,
    pub table_number: i32,
    pub items: Vec<EntryResponse>,
    pub combos: Vec<EntryResponse>,
    pub created_at: DateTime<Utc>,
}

impl From<OrderDocument> for OrderResponse {
    fn from(order: OrderDocument) -> Self {
        Self {
            id: order.id,
            table_number: order.table_number,
            items: order.items.into_iter().map(Into::into).collect(),
            combos: order.combos.into_iter().map(Into::into).collect(),
            created_at: order.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
    pub id: Uuid,
    pub name: String,
    /// Price as entered; not validated
    pub price: String,
    #[serde(rename = "type")]
    pub product_type: String,
    /// `combo` or `menu`
    pub category_name: String,
    #[schema(value_type = Option<Object>)]
    pub items: Option<Value>,
    pub availability: String,
    /// Image blob, served from `/{catalog}/image/{blobId}`
    pub blob_id: Uuid,
    pub filename: String,
    pub content_type: String,
    pub uploaded_at: DateTime<Utc>,
}

impl From<Product> for ProductResponse {
    fn from(product: Product) -> Self {
        Self {
            id: product.id,
            name: product.name,
            price: product.price,
            product_type: product.product_type,
            category_name: product.category_name,
            items: product.items,
            availability: product.availability,
            blob_id: product.blob_id,
            filename: product.filename,
            content_type: product.content_type,
            uploaded_at: product.uploaded_at,
        }
    }
}

/// Multipart form of `POST /{catalog}/add`. `comboName`, `comboPrice`,
/// `comboType`, `comboItems` and `comboImage` are accepted as well.
#[allow(dead_code)]
#[derive(ToSchema)]
pub struct CreateProductForm {
    pub name: String,
    pub price: String,
    #[schema(rename = "type")]
    pub product_type: String,
    /// JSON array, as text
    pub items: Option<String>,
    /// Defaults to `available`
    pub availability: Option<String>,
    #[schema(value_type = String, format = Binary)]
    pub image: Vec<u8>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductResponse {
    pub message: String,
    pub id: Uuid,
    pub blob_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SetAvailabilityRequest {
    /// Any value is accepted, usually `available` or `unavailable`
    pub availability: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ApiErrorResponse {
    /// Human-readable summary
    pub message: String,
    /// Error detail
    pub error: String,
}
