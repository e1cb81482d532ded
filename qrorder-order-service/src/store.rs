use async_trait::async_trait;
use diesel::{insert_into, prelude::*, update};
use diesel_async::pooled_connection::deadpool::{Object, Pool, PoolError};
use diesel_async::{
    scoped_futures::ScopedFutureExt, AsyncConnection, AsyncPgConnection, RunQueryDsl,
};
use thiserror::Error;
use uuid::Uuid;

use crate::document::{EntryLocation, OrderDocument};
use crate::models::{self, EntryKind, ServingStatus};
use crate::schema::{order_entries, orders};
use crate::serializer::{deserialize_order, serialize_order};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),
    #[error("connection pool error: {0}")]
    Pool(#[from] PoolError),
}

/// Persistence for order documents.
#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn insert_order(&self, document: &OrderDocument) -> Result<(), StoreError>;

    async fn find_order(&self, id: Uuid) -> Result<Option<OrderDocument>, StoreError>;

    async fn list_orders(&self) -> Result<Vec<OrderDocument>, StoreError>;

    /// Sets the status of the `kind` entry with `entry_id` inside order `order_id`.
    ///
    /// Returns where the entry sits when one matched, whether or not its status
    /// actually changed, and `None` when no entry of that kind has that id.
    async fn set_entry_status(
        &self,
        order_id: Uuid,
        kind: EntryKind,
        entry_id: Uuid,
        status: ServingStatus,
    ) -> Result<Option<EntryLocation>, StoreError>;
}

#[derive(Clone)]
pub struct PgOrderStore {
    pool: Pool<AsyncPgConnection>,
}

impl PgOrderStore {
    pub fn new(pool: Pool<AsyncPgConnection>) -> Self {
        Self { pool }
    }

    async fn connection(&self) -> Result<Object<AsyncPgConnection>, StoreError> {
        Ok(self.pool.get().await?)
    }
}

#[async_trait]
impl OrderStore for PgOrderStore {
    async fn insert_order(&self, document: &OrderDocument) -> Result<(), StoreError> {
        let (order, entries) = deserialize_order(document);

        let mut conn = self.connection().await?;
        let conn = &mut *conn;
        conn.transaction::<_, diesel::result::Error, _>(|conn| {
            async move {
                insert_into(orders::table)
                    .values(&order)
                    .execute(conn)
                    .await?;
                if !entries.is_empty() {
                    insert_into(order_entries::table)
                        .values(&entries)
                        .execute(conn)
                        .await?;
                }
                Ok(())
            }
            .scope_boxed()
        })
        .await?;
        Ok(())
    }

    async fn find_order(&self, id: Uuid) -> Result<Option<OrderDocument>, StoreError> {
        let mut conn = self.connection().await?;
        let conn = &mut *conn;

        let order = orders::table
            .find(id)
            .select(models::Order::as_select())
            .first(conn)
            .await
            .optional()?;
        let Some(order) = order else {
            return Ok(None);
        };
        let entries = models::OrderEntry::belonging_to(&order)
            .select(models::OrderEntry::as_select())
            .load(conn)
            .await?;

        Ok(Some(serialize_order(&order, &entries)))
    }

    async fn list_orders(&self) -> Result<Vec<OrderDocument>, StoreError> {
        let mut conn = self.connection().await?;
        let conn = &mut *conn;

        let results: Vec<models::Order> = orders::table
            .select(models::Order::as_select())
            .order_by((orders::created_at.asc(), orders::id.asc()))
            .load(conn)
            .await?;
        let entries = models::OrderEntry::belonging_to(&results)
            .select(models::OrderEntry::as_select())
            .load(conn)
            .await?
            .grouped_by(&results);

        Ok(results
            .iter()
            .zip(entries)
            .map(|(order, entries)| serialize_order(order, &entries))
            .collect())
    }

    async fn set_entry_status(
        &self,
        order_id: Uuid,
        kind: EntryKind,
        entry_id: Uuid,
        status: ServingStatus,
    ) -> Result<Option<EntryLocation>, StoreError> {
        let mut conn = self.connection().await?;
        let conn = &mut *conn;

        let position = update(order_entries::table)
            .filter(order_entries::order_id.eq(order_id))
            .filter(order_entries::kind.eq(kind))
            .filter(order_entries::id.eq(entry_id))
            .set(order_entries::status.eq(status))
            .returning(order_entries::position)
            .get_result::<i32>(conn)
            .await
            .optional()?;

        Ok(position.map(|p| EntryLocation {
            kind,
            index: p as usize,
        }))
    }
}
