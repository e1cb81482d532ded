use axum::{
    extract::multipart::{MultipartError, MultipartRejection},
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::Json,
};
use qrorder_catalog_service::error::CatalogError;
use qrorder_order_service::error::OrderError;
use tracing::error;

use crate::models::ApiErrorResponse;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("{0}")]
    NotFound(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error(transparent)]
    Json(#[from] JsonRejection),
    #[error(transparent)]
    Multipart(#[from] MultipartError),
    #[error(transparent)]
    MultipartRejection(#[from] MultipartRejection),
}

impl From<OrderError> for ApiError {
    fn from(e: OrderError) -> Self {
        match e {
            OrderError::InvalidInput(msg) => ApiError::InvalidInput(msg),
            OrderError::NotFound(msg) => ApiError::NotFound(msg.to_string()),
            OrderError::Storage(e) => ApiError::Storage(e.to_string()),
        }
    }
}

impl From<CatalogError> for ApiError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::InvalidInput(msg) => ApiError::InvalidInput(msg),
            CatalogError::NotFound(msg) => ApiError::NotFound(msg.to_string()),
            CatalogError::Storage(e) => ApiError::Storage(e.to_string()),
        }
    }
}

impl axum::response::IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match &self {
            ApiError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::Storage(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
            ApiError::Json(e) => (e.status(), "Invalid input data".to_string()),
            ApiError::Multipart(e) => (e.status(), "Invalid multipart form".to_string()),
            ApiError::MultipartRejection(e) => (e.status(), "Invalid multipart form".to_string()),
        };

        if status.is_server_error() {
            error!(error = %self, "request failed");
        }

        let body = Json(ApiErrorResponse {
            message,
            error: self.to_string(),
        });

        (status, body).into_response()
    }
}
