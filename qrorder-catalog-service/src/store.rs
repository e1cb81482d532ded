use async_trait::async_trait;
use diesel::{delete, insert_into, prelude::*, update};
use diesel_async::pooled_connection::deadpool::{Object, Pool, PoolError};
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Product, ProductKind};
use crate::schema::products;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),
    #[error("connection pool error: {0}")]
    Pool(#[from] PoolError),
    #[error("chunk {n} of blob {blob_id} is missing")]
    MissingChunk { blob_id: Uuid, n: i32 },
}

/// Persistence for product metadata records.
///
/// Every lookup is scoped by kind, so a combo id never resolves through the
/// menu item routes and vice versa.
#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn insert_product(&self, product: &Product) -> Result<(), StoreError>;

    async fn find_product(&self, kind: ProductKind, id: Uuid)
        -> Result<Option<Product>, StoreError>;

    async fn list_products(&self, kind: ProductKind) -> Result<Vec<Product>, StoreError>;

    /// Returns the number of records whose availability actually changed.
    async fn set_availability(
        &self,
        kind: ProductKind,
        id: Uuid,
        availability: &str,
    ) -> Result<usize, StoreError>;

    async fn delete_product(&self, kind: ProductKind, id: Uuid) -> Result<usize, StoreError>;
}

#[derive(Clone)]
pub struct PgProductStore {
    pool: Pool<AsyncPgConnection>,
}

impl PgProductStore {
    pub fn new(pool: Pool<AsyncPgConnection>) -> Self {
        Self { pool }
    }

    async fn connection(&self) -> Result<Object<AsyncPgConnection>, StoreError> {
        Ok(self.pool.get().await?)
    }
}

#[async_trait]
impl ProductStore for PgProductStore {
    async fn insert_product(&self, product: &Product) -> Result<(), StoreError> {
        let mut conn = self.connection().await?;
        insert_into(products::table)
            .values(product)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    async fn find_product(
        &self,
        kind: ProductKind,
        id: Uuid,
    ) -> Result<Option<Product>, StoreError> {
        let mut conn = self.connection().await?;
        Ok(products::table
            .find(id)
            .filter(products::kind.eq(kind))
            .select(Product::as_select())
            .first(&mut *conn)
            .await
            .optional()?)
    }

    async fn list_products(&self, kind: ProductKind) -> Result<Vec<Product>, StoreError> {
        let mut conn = self.connection().await?;
        Ok(products::table
            .filter(products::kind.eq(kind))
            .select(Product::as_select())
            .order_by((products::uploaded_at.asc(), products::id.asc()))
            .load(&mut *conn)
            .await?)
    }

    async fn set_availability(
        &self,
        kind: ProductKind,
        id: Uuid,
        availability: &str,
    ) -> Result<usize, StoreError> {
        let mut conn = self.connection().await?;
        Ok(update(products::table)
            .filter(products::id.eq(id))
            .filter(products::kind.eq(kind))
            .filter(products::availability.ne(availability))
            .set(products::availability.eq(availability))
            .execute(&mut *conn)
            .await?)
    }

    async fn delete_product(&self, kind: ProductKind, id: Uuid) -> Result<usize, StoreError> {
        let mut conn = self.connection().await?;
        Ok(delete(products::table)
            .filter(products::id.eq(id))
            .filter(products::kind.eq(kind))
            .execute(&mut *conn)
            .await?)
    }
}
