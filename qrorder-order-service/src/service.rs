use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::document::{EntryDocument, NewEntry, NewOrder, OrderDocument};
use crate::error::OrderError;
use crate::models::ServingStatus;
use crate::store::OrderStore;

#[derive(Clone)]
pub struct OrderService {
    store: Arc<dyn OrderStore>,
}

impl OrderService {
    pub fn new(store: Arc<dyn OrderStore>) -> Self {
        Self { store }
    }

    /// Persists a new order and returns its id. Every entry gets a fresh id and
    /// starts `NotServed` unless the caller supplied a status.
    #[instrument(skip_all, fields(table_number = new_order.table_number))]
    pub async fn create_order(&self, new_order: NewOrder) -> Result<Uuid, OrderError> {
        if new_order.is_empty() {
            return Err(OrderError::InvalidInput(
                "No items or combos provided".to_string(),
            ));
        }

        let document = OrderDocument {
            id: Uuid::new_v4(),
            table_number: new_order.table_number,
            items: new_order.items.into_iter().map(issue_entry).collect(),
            combos: new_order.combos.into_iter().map(issue_entry).collect(),
            created_at: Utc::now(),
        };
        self.store.insert_order(&document).await?;

        info!(
            order_id = %document.id,
            items = document.items.len(),
            combos = document.combos.len(),
            "order created"
        );
        Ok(document.id)
    }

    /// Marks one entry of an order as served and returns the updated order.
    ///
    /// Items are searched before combos. Marking an entry that is already
    /// served succeeds without changing anything.
    #[instrument(skip(self))]
    pub async fn mark_entry_served(
        &self,
        order_id: &str,
        entry_id: &str,
    ) -> Result<OrderDocument, OrderError> {
        let order_id = parse_id(order_id, "order id")?;
        let entry_id = parse_id(entry_id, "entry id")?;

        let order = self.get_order(order_id).await?;
        let Some(location) = order.locate(entry_id) else {
            debug!("no item or combo matched");
            return Err(OrderError::NotFound("Item/Combo not found"));
        };

        let updated = self
            .store
            .set_entry_status(order_id, location.kind, entry_id, ServingStatus::Served)
            .await?;
        if updated.is_none() {
            return Err(OrderError::NotFound("Item/Combo not found"));
        }
        info!(kind = ?location.kind, index = location.index, "entry served");

        self.get_order(order_id).await
    }

    pub async fn get_order(&self, order_id: Uuid) -> Result<OrderDocument, OrderError> {
        self.store
            .find_order(order_id)
            .await?
            .ok_or(OrderError::NotFound("Order not found"))
    }

    pub async fn list_orders(&self) -> Result<Vec<OrderDocument>, OrderError> {
        Ok(self.store.list_orders().await?)
    }
}

fn issue_entry(entry: NewEntry) -> EntryDocument {
    EntryDocument {
        id: Uuid::new_v4(),
        status: entry.status.unwrap_or_default(),
        details: entry.details,
    }
}

fn parse_id(id: &str, what: &str) -> Result<Uuid, OrderError> {
    id.parse::<Uuid>()
        .map_err(|_| OrderError::InvalidInput(format!("Invalid {what}")))
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use serde_json::{json, Value};

    use super::*;
    use crate::memory::MemoryOrderStore;
    use crate::models::EntryKind;

    fn service() -> OrderService {
        OrderService::new(Arc::new(MemoryOrderStore::new()))
    }

    async fn create(service: &OrderService, payload: Value) -> OrderDocument {
        let id = service
            .create_order(NewOrder::from_json(&payload).unwrap())
            .await
            .unwrap();
        service.get_order(id).await.unwrap()
    }

    #[tokio::test]
    async fn test_create_order_assigns_ids_and_default_status() {
        let service = service();
        let order = create(
            &service,
            json!({"tableNumber": 5, "items": [{"name": "Soup", "qty": 1}], "combos": []}),
        )
        .await;

        assert_eq!(order.table_number, 5);
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.items[0].status, ServingStatus::NotServed);
        assert_eq!(order.items[0].details["name"], json!("Soup"));
        assert_eq!(order.items[0].details["qty"], json!(1));

        let listed = service.list_orders().await.unwrap();
        assert_eq!(listed, vec![order]);
    }

    #[tokio::test]
    async fn test_create_order_ids_are_unique() {
        let service = service();
        let order = create(
            &service,
            json!({
                "tableNumber": 1,
                "items": [{"name": "A"}, {"name": "B"}],
                "combos": [{"name": "C", "status": "Served"}, {"name": "D"}],
            }),
        )
        .await;

        let ids = order
            .items
            .iter()
            .chain(order.combos.iter())
            .map(|e| e.id)
            .collect::<HashSet<_>>();
        assert_eq!(ids.len(), 4);
        assert_eq!(order.combos[0].status, ServingStatus::Served);
        assert_eq!(order.combos[1].status, ServingStatus::NotServed);
    }

    #[tokio::test]
    async fn test_create_order_rejects_empty() {
        let service = service();
        let new_order =
            NewOrder::from_json(&json!({"tableNumber": 3, "items": [], "combos": []})).unwrap();

        let result = service.create_order(new_order).await;

        assert!(matches!(result, Err(OrderError::InvalidInput(_))));
        assert!(service.list_orders().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_mark_combo_served_leaves_items_untouched() {
        let service = service();
        let order = create(
            &service,
            json!({"tableNumber": 2, "items": [{"name": "Soup"}], "combos": [{"name": "Family"}]}),
        )
        .await;
        let combo_id = order.combos[0].id;

        let updated = service
            .mark_entry_served(&order.id.to_string(), &combo_id.to_string())
            .await
            .unwrap();

        assert_eq!(updated.combos[0].status, ServingStatus::Served);
        assert_eq!(updated.items, order.items);
        assert_eq!(
            updated.locate(combo_id).map(|location| location.kind),
            Some(EntryKind::Combo)
        );
    }

    #[tokio::test]
    async fn test_mark_served_prefers_item_over_combo_with_same_id() {
        let store = Arc::new(MemoryOrderStore::new());
        let service = OrderService::new(store.clone());
        let shared = Uuid::new_v4();
        let entry = |name: &str| EntryDocument {
            id: shared,
            status: ServingStatus::NotServed,
            details: json!({ "name": name }).as_object().unwrap().clone(),
        };
        let order = OrderDocument {
            id: Uuid::new_v4(),
            table_number: 4,
            items: vec![entry("Soup")],
            combos: vec![entry("Family")],
            created_at: Utc::now(),
        };
        store.insert_order(&order).await.unwrap();

        let updated = service
            .mark_entry_served(&order.id.to_string(), &shared.to_string())
            .await
            .unwrap();

        assert_eq!(updated.items[0].status, ServingStatus::Served);
        assert_eq!(updated.combos[0].status, ServingStatus::NotServed);
    }

    #[tokio::test]
    async fn test_mark_item_served() {
        let service = service();
        let order = create(
            &service,
            json!({"tableNumber": 2, "items": [{"name": "Soup"}, {"name": "Rice"}], "combos": []}),
        )
        .await;

        let updated = service
            .mark_entry_served(&order.id.to_string(), &order.items[1].id.to_string())
            .await
            .unwrap();

        assert_eq!(updated.items[0].status, ServingStatus::NotServed);
        assert_eq!(updated.items[1].status, ServingStatus::Served);
    }

    #[tokio::test]
    async fn test_mark_entry_served_is_idempotent() {
        let service = service();
        let order = create(
            &service,
            json!({"tableNumber": 7, "items": [{"name": "Soup"}], "combos": []}),
        )
        .await;
        let (order_id, entry_id) = (order.id.to_string(), order.items[0].id.to_string());

        let first = service.mark_entry_served(&order_id, &entry_id).await.unwrap();
        let second = service.mark_entry_served(&order_id, &entry_id).await.unwrap();

        assert_eq!(first.items[0].status, ServingStatus::Served);
        assert_eq!(second.items[0].status, ServingStatus::Served);
    }

    #[tokio::test]
    async fn test_mark_unknown_entry_not_found() {
        let service = service();
        let order = create(
            &service,
            json!({"tableNumber": 7, "items": [{"name": "Soup"}], "combos": [{"name": "Family"}]}),
        )
        .await;

        let result = service
            .mark_entry_served(&order.id.to_string(), &Uuid::new_v4().to_string())
            .await;

        assert!(matches!(result, Err(OrderError::NotFound("Item/Combo not found"))));
    }

    #[tokio::test]
    async fn test_mark_entry_in_unknown_order_not_found() {
        let service = service();

        let result = service
            .mark_entry_served(&Uuid::new_v4().to_string(), &Uuid::new_v4().to_string())
            .await;

        assert!(matches!(result, Err(OrderError::NotFound("Order not found"))));
    }

    #[tokio::test]
    async fn test_mark_entry_served_rejects_malformed_ids() {
        let service = service();

        let result = service
            .mark_entry_served("not-an-id", &Uuid::new_v4().to_string())
            .await;
        assert!(matches!(result, Err(OrderError::InvalidInput(_))));

        let result = service
            .mark_entry_served(&Uuid::new_v4().to_string(), "12")
            .await;
        assert!(matches!(result, Err(OrderError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_entry_of_other_order_not_found() {
        let service = service();
        let first = create(
            &service,
            json!({"tableNumber": 1, "items": [{"name": "Soup"}], "combos": []}),
        )
        .await;
        let second = create(
            &service,
            json!({"tableNumber": 2, "items": [{"name": "Rice"}], "combos": []}),
        )
        .await;

        let result = service
            .mark_entry_served(&second.id.to_string(), &first.items[0].id.to_string())
            .await;

        assert!(matches!(result, Err(OrderError::NotFound(_))));
    }
}
