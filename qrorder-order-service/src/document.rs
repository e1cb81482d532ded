//! Order documents as callers see them: one order with its `items` and
//! `combos` collections, plus the validated input used to create one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::OrderError;
use crate::models::{EntryKind, ServingStatus};

/// Keys owned by the service; callers cannot smuggle them in through entry details.
const RESERVED_KEYS: [&str; 3] = ["_id", "id", "status"];

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderDocument {
    pub id: Uuid,
    pub table_number: i32,
    pub items: Vec<EntryDocument>,
    pub combos: Vec<EntryDocument>,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct EntryDocument {
    pub id: Uuid,
    pub status: ServingStatus,
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

/// Where an entry was found: its collection and its index inside that collection.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct EntryLocation {
    pub kind: EntryKind,
    pub index: usize,
}

impl OrderDocument {
    pub fn entries(&self, kind: EntryKind) -> &[EntryDocument] {
        match kind {
            EntryKind::Item => &self.items,
            EntryKind::Combo => &self.combos,
        }
    }

    pub fn entries_mut(&mut self, kind: EntryKind) -> &mut Vec<EntryDocument> {
        match kind {
            EntryKind::Item => &mut self.items,
            EntryKind::Combo => &mut self.combos,
        }
    }

    /// Finds an entry by id, searching collections in [`EntryKind::SEARCH_ORDER`].
    pub fn locate(&self, entry_id: Uuid) -> Option<EntryLocation> {
        EntryKind::SEARCH_ORDER.into_iter().find_map(|kind| {
            self.entries(kind)
                .iter()
                .position(|e| e.id == entry_id)
                .map(|index| EntryLocation { kind, index })
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct NewEntry {
    pub status: Option<ServingStatus>,
    pub details: Map<String, Value>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NewOrder {
    pub table_number: i32,
    pub items: Vec<NewEntry>,
    pub combos: Vec<NewEntry>,
}

impl NewOrder {
    /// Validates a checkout payload of the form
    /// `{"tableNumber": 5, "items": [...], "combos": [...]}`.
    ///
    /// Emptiness of both collections is checked by the service, not here.
    pub fn from_json(payload: &Value) -> Result<Self, OrderError> {
        let table_number = payload
            .get("tableNumber")
            .and_then(parse_table_number)
            .ok_or_else(|| {
                OrderError::InvalidInput("tableNumber must be a positive integer".to_string())
            })?;

        Ok(Self {
            table_number,
            items: parse_entries(payload.get("items"), "items")?,
            combos: parse_entries(payload.get("combos"), "combos")?,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty() && self.combos.is_empty()
    }
}

fn parse_table_number(value: &Value) -> Option<i32> {
    let number = match value.as_i64() {
        Some(n) => n,
        None => {
            let f = value.as_f64()?;
            if f.fract() != 0.0 {
                return None;
            }
            f as i64
        }
    };
    i32::try_from(number).ok().filter(|n| *n > 0)
}

fn parse_entries(value: Option<&Value>, field: &str) -> Result<Vec<NewEntry>, OrderError> {
    let Some(Value::Array(elements)) = value else {
        return Err(OrderError::InvalidInput(format!("{field} must be an array")));
    };

    elements
        .iter()
        .enumerate()
        .map(|(i, element)| {
            let Value::Object(fields) = element else {
                return Err(OrderError::InvalidInput(format!(
                    "{field}[{i}] must be an object"
                )));
            };

            let status = match fields.get("status") {
                None | Some(Value::Null) => None,
                Some(Value::String(s)) if s.is_empty() => None,
                Some(v) => Some(serde_json::from_value(v.clone()).map_err(|_| {
                    OrderError::InvalidInput(format!("{field}[{i}].status is not a serving status"))
                })?),
            };

            let mut details = fields.clone();
            for key in RESERVED_KEYS {
                details.remove(key);
            }

            Ok(NewEntry { status, details })
        })
        .collect()
}
