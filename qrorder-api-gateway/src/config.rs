use std::net::SocketAddr;

use clap::{Args, ValueEnum};
use qrorder_catalog_service::blob::DEFAULT_CHUNK_SIZE;

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Storage {
    Postgres,
    /// Process-local stores; everything is lost on exit.
    Memory,
}

#[derive(Args, Debug, Clone)]
pub struct DatabaseArgs {
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,
}

impl DatabaseArgs {
    pub fn require_url(&self) -> Result<&str, &'static str> {
        self.database_url
            .as_deref()
            .ok_or("DATABASE_URL must be set")
    }
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub database: DatabaseArgs,

    #[arg(long, env = "LISTEN_ADDR", default_value = "0.0.0.0:3500")]
    pub listen_addr: SocketAddr,

    #[arg(long, env = "DATABASE_POOL_SIZE", default_value_t = 8)]
    pub pool_size: usize,

    /// Largest accepted request body, images included
    #[arg(long, env = "MAX_UPLOAD_BYTES", default_value_t = 10 * 1024 * 1024)]
    pub max_upload_bytes: usize,

    #[arg(long, env = "BLOB_CHUNK_SIZE", default_value_t = DEFAULT_CHUNK_SIZE)]
    pub blob_chunk_size: usize,

    #[arg(long, env = "STORAGE", value_enum, default_value_t = Storage::Postgres)]
    pub storage: Storage,
}
