use serde_json::{Map, Value};

use crate::document::{EntryDocument, OrderDocument};
use crate::models::{self, EntryKind};

pub fn serialize_order(order: &models::Order, entries: &[models::OrderEntry]) -> OrderDocument {
    let collect = |kind: EntryKind| {
        let mut selected = entries
            .iter()
            .filter(|e| e.kind == kind)
            .collect::<Vec<_>>();
        selected.sort_by_key(|e| e.position);
        selected
            .into_iter()
            .map(|e| EntryDocument {
                id: e.id,
                status: e.status,
                details: match &e.details {
                    Value::Object(fields) => fields.clone(),
                    _ => Map::new(),
                },
            })
            .collect()
    };

    OrderDocument {
        id: order.id,
        table_number: order.table_number,
        items: collect(EntryKind::Item),
        combos: collect(EntryKind::Combo),
        created_at: order.created_at,
    }
}

/// Splits a document into the rows stored in `orders` and `order_entries`.
pub fn deserialize_order(document: &OrderDocument) -> (models::Order, Vec<models::OrderEntry>) {
    let order = models::Order {
        id: document.id,
        table_number: document.table_number,
        created_at: document.created_at,
    };
    let entries = EntryKind::SEARCH_ORDER
        .into_iter()
        .flat_map(|kind| {
            document
                .entries(kind)
                .iter()
                .enumerate()
                .map(move |(position, e)| models::OrderEntry {
                    id: e.id,
                    order_id: document.id,
                    kind,
                    position: position as i32,
                    status: e.status,
                    details: Value::Object(e.details.clone()),
                })
        })
        .collect();
    (order, entries)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use serde_json::json;
    use uuid::Uuid;

    use super::*;
    use crate::models::ServingStatus;

    #[test]
    fn test_serialize_order_groups_and_sorts_entries() {
        let order = models::Order {
            id: Uuid::new_v4(),
            table_number: 4,
            created_at: Utc::now(),
        };
        let row = |kind, position, name: &str| models::OrderEntry {
            id: Uuid::new_v4(),
            order_id: order.id,
            kind,
            position,
            status: ServingStatus::NotServed,
            details: json!({ "name": name }),
        };
        let entries = vec![
            row(EntryKind::Combo, 0, "Family"),
            row(EntryKind::Item, 1, "Rice"),
            row(EntryKind::Item, 0, "Soup"),
        ];

        let document = serialize_order(&order, &entries);

        assert_eq!(document.table_number, 4);
        let names = |entries: &[EntryDocument]| {
            entries
                .iter()
                .map(|e| e.details["name"].as_str().unwrap().to_string())
                .collect::<Vec<_>>()
        };
        assert_eq!(names(&document.items), vec!["Soup", "Rice"]);
        assert_eq!(names(&document.combos), vec!["Family"]);

        let (order_row, entry_rows) = deserialize_order(&document);
        assert_eq!(order_row, order);
        assert_eq!(entry_rows.len(), 3);
        assert_eq!(entry_rows[0].kind, EntryKind::Item);
        assert_eq!(entry_rows[0].position, 0);
        assert_eq!(entry_rows[2].kind, EntryKind::Combo);
    }
}
