use std::io::Write;

use chrono::{DateTime, Utc};
use diesel::{
    deserialize::{self, FromSql, FromSqlRow},
    expression::AsExpression,
    pg::{Pg, PgValue},
    prelude::*,
    serialize::{self, IsNull, Output, ToSql},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::schema::{order_entries, orders};

/// Serving status of a single entry. The only transition is `NotServed` to `Served`.
#[derive(
    FromSqlRow, AsExpression, Serialize, Deserialize, PartialEq, Eq, Copy, Clone, Debug, Default,
)]
#[diesel(sql_type = crate::schema::sql_types::ServingStatus)]
pub enum ServingStatus {
    #[default]
    #[serde(rename = "Not Served", alias = "NotServed")]
    NotServed,
    #[serde(rename = "Served")]
    Served,
}

impl ServingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServingStatus::NotServed => "Not Served",
            ServingStatus::Served => "Served",
        }
    }
}

impl ToSql<crate::schema::sql_types::ServingStatus, Pg> for ServingStatus {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        match *self {
            ServingStatus::NotServed => out.write_all(b"NOT_SERVED")?,
            ServingStatus::Served => out.write_all(b"SERVED")?,
        }
        Ok(IsNull::No)
    }
}

impl FromSql<crate::schema::sql_types::ServingStatus, Pg> for ServingStatus {
    fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
        match bytes.as_bytes() {
            b"NOT_SERVED" => Ok(ServingStatus::NotServed),
            b"SERVED" => Ok(ServingStatus::Served),
            _ => Err("Unrecognized enum variant".into()),
        }
    }
}

/// Which collection of an order an entry belongs to.
#[derive(FromSqlRow, AsExpression, Serialize, Deserialize, PartialEq, Eq, Copy, Clone, Debug)]
#[diesel(sql_type = crate::schema::sql_types::EntryKind)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Item,
    Combo,
}

impl EntryKind {
    /// Order in which collections are searched when an entry is looked up by id alone.
    pub const SEARCH_ORDER: [EntryKind; 2] = [EntryKind::Item, EntryKind::Combo];
}

impl ToSql<crate::schema::sql_types::EntryKind, Pg> for EntryKind {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        match *self {
            EntryKind::Item => out.write_all(b"ITEM")?,
            EntryKind::Combo => out.write_all(b"COMBO")?,
        }
        Ok(IsNull::No)
    }
}

impl FromSql<crate::schema::sql_types::EntryKind, Pg> for EntryKind {
    fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
        match bytes.as_bytes() {
            b"ITEM" => Ok(EntryKind::Item),
            b"COMBO" => Ok(EntryKind::Combo),
            _ => Err("Unrecognized enum variant".into()),
        }
    }
}

#[derive(Queryable, Selectable, Identifiable, Insertable, Clone, Debug, PartialEq)]
#[diesel(table_name = orders)]
pub struct Order {
    pub id: Uuid,
    pub table_number: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Queryable, Selectable, Identifiable, Associations, Insertable, Clone, Debug, PartialEq)]
#[diesel(belongs_to(Order))]
#[diesel(table_name = order_entries)]
pub struct OrderEntry {
    pub id: Uuid,
    pub order_id: Uuid,
    pub kind: EntryKind,
    pub position: i32,
    pub status: ServingStatus,
    pub details: Value,
}
