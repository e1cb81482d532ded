use thiserror::Error;

use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum OrderError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("{0}")]
    NotFound(&'static str),
    #[error("order store failed: {0}")]
    Storage(#[from] StoreError),
}
