use diesel_migrations::{embed_migrations, EmbeddedMigrations};

pub mod blob;
pub mod error;
pub mod memory;
pub mod models;
pub mod schema;
pub mod service;
pub mod store;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("./migrations");
