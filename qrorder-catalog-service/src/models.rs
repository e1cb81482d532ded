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

use crate::schema::{blob_chunks, blob_files, products};

pub const AVAILABLE: &str = "available";

#[derive(FromSqlRow, AsExpression, Serialize, Deserialize, PartialEq, Eq, Copy, Clone, Debug)]
#[diesel(sql_type = crate::schema::sql_types::ProductKind)]
#[serde(rename_all = "camelCase")]
pub enum ProductKind {
    Combo,
    MenuItem,
}

impl ProductKind {
    pub fn category_name(&self) -> &'static str {
        match self {
            ProductKind::Combo => "combo",
            ProductKind::MenuItem => "menu",
        }
    }
}

impl ToSql<crate::schema::sql_types::ProductKind, Pg> for ProductKind {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        match *self {
            ProductKind::Combo => out.write_all(b"COMBO")?,
            ProductKind::MenuItem => out.write_all(b"MENU_ITEM")?,
        }
        Ok(IsNull::No)
    }
}

impl FromSql<crate::schema::sql_types::ProductKind, Pg> for ProductKind {
    fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
        match bytes.as_bytes() {
            b"COMBO" => Ok(ProductKind::Combo),
            b"MENU_ITEM" => Ok(ProductKind::MenuItem),
            _ => Err("Unrecognized enum variant".into()),
        }
    }
}

/// Metadata record of a combo or menu item. `blob_id` points at the image.
#[derive(
    Queryable, Selectable, Identifiable, Insertable, Serialize, Deserialize, Clone, Debug, PartialEq,
)]
#[diesel(table_name = products)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub kind: ProductKind,
    pub name: String,
    pub price: String,
    #[serde(rename = "type")]
    pub product_type: String,
    pub category_name: String,
    pub items: Option<Value>,
    pub availability: String,
    pub blob_id: Uuid,
    pub filename: String,
    pub content_type: String,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Queryable, Selectable, Identifiable, Insertable, Clone, Debug, PartialEq)]
#[diesel(table_name = blob_files)]
pub struct BlobFile {
    pub id: Uuid,
    pub filename: String,
    pub content_type: String,
    pub length: i64,
    pub chunk_size: i32,
    pub uploaded_at: DateTime<Utc>,
}

impl BlobFile {
    pub fn chunk_count(&self) -> i32 {
        if self.length == 0 {
            return 0;
        }
        let chunk_size = i64::from(self.chunk_size.max(1));
        ((self.length + chunk_size - 1) / chunk_size) as i32
    }
}

#[derive(Queryable, Selectable, Identifiable, Associations, Insertable, Debug, PartialEq)]
#[diesel(belongs_to(BlobFile, foreign_key = blob_id))]
#[diesel(table_name = blob_chunks, primary_key(blob_id, n))]
pub struct BlobChunk {
    pub blob_id: Uuid,
    pub n: i32,
    pub data: Vec<u8>,
}
