use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::document::{EntryLocation, OrderDocument};
use crate::models::{EntryKind, ServingStatus};
use crate::store::{OrderStore, StoreError};

/// Process-local order store, used with `--storage memory` and in tests.
#[derive(Default)]
pub struct MemoryOrderStore {
    orders: RwLock<Vec<OrderDocument>>,
}

impl MemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderStore for MemoryOrderStore {
    async fn insert_order(&self, document: &OrderDocument) -> Result<(), StoreError> {
        self.orders.write().await.push(document.clone());
        Ok(())
    }

    async fn find_order(&self, id: Uuid) -> Result<Option<OrderDocument>, StoreError> {
        Ok(self
            .orders
            .read()
            .await
            .iter()
            .find(|o| o.id == id)
            .cloned())
    }

    async fn list_orders(&self) -> Result<Vec<OrderDocument>, StoreError> {
        Ok(self.orders.read().await.clone())
    }

    async fn set_entry_status(
        &self,
        order_id: Uuid,
        kind: EntryKind,
        entry_id: Uuid,
        status: ServingStatus,
    ) -> Result<Option<EntryLocation>, StoreError> {
        let mut orders = self.orders.write().await;
        let Some(order) = orders.iter_mut().find(|o| o.id == order_id) else {
            return Ok(None);
        };

        Ok(order
            .entries_mut(kind)
            .iter_mut()
            .enumerate()
            .find(|(_, e)| e.id == entry_id)
            .map(|(index, entry)| {
                entry.status = status;
                EntryLocation { kind, index }
            }))
    }
}
