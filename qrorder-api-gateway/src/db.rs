use diesel_async::{
    AsyncConnection, AsyncPgConnection,
    async_connection_wrapper::AsyncConnectionWrapper,
    pooled_connection::{
        AsyncDieselConnectionManager,
        deadpool::{BuildError, Pool},
    },
};
use diesel_migrations::MigrationHarness;
use tracing::info;

use crate::BoxError;

pub fn build_pool(database_url: &str, max_size: usize) -> Result<Pool<AsyncPgConnection>, BuildError> {
    let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(database_url);
    Pool::builder(manager).max_size(max_size).build()
}

/// Applies the embedded migrations of both service crates.
pub async fn run_migrations(database_url: &str) -> Result<(), BoxError> {
    let conn = AsyncPgConnection::establish(database_url).await?;
    let mut async_wrapper: AsyncConnectionWrapper<AsyncPgConnection> =
        AsyncConnectionWrapper::from(conn);

    let applied = tokio::task::spawn_blocking(move || -> Result<usize, BoxError> {
        let orders = async_wrapper
            .run_pending_migrations(qrorder_order_service::MIGRATIONS)?
            .len();
        let catalog = async_wrapper
            .run_pending_migrations(qrorder_catalog_service::MIGRATIONS)?
            .len();
        Ok(orders + catalog)
    })
    .await??;

    info!(applied, "migrations up to date");
    Ok(())
}
