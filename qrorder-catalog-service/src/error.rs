use thiserror::Error;

use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("{0}")]
    NotFound(&'static str),
    #[error("catalog store failed: {0}")]
    Storage(#[from] StoreError),
}
