//! Chunked binary storage for product images.
//!
//! A blob is one `blob_files` row plus `ceil(length / chunk_size)` rows in
//! `blob_chunks`, numbered from zero. Reads fetch one chunk per query so large
//! images are streamed to the client instead of buffered.

use async_trait::async_trait;
use chrono::Utc;
use diesel::{delete, insert_into, prelude::*};
use diesel_async::pooled_connection::deadpool::Pool;
use diesel_async::{
    scoped_futures::ScopedFutureExt, AsyncConnection, AsyncPgConnection, RunQueryDsl,
};
use futures::stream::{self, BoxStream, StreamExt};
use uuid::Uuid;

use crate::models::{BlobChunk, BlobFile};
use crate::schema::{blob_chunks, blob_files};
use crate::store::StoreError;

pub const DEFAULT_CHUNK_SIZE: usize = 255 * 1024;

pub struct BlobUpload {
    pub filename: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

pub struct BlobDownload {
    pub file: BlobFile,
    /// Chunks in order. An `Err` ends the stream early.
    pub chunks: BoxStream<'static, Result<Vec<u8>, StoreError>>,
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(&self, upload: BlobUpload) -> Result<BlobFile, StoreError>;

    async fn open(&self, id: Uuid) -> Result<Option<BlobDownload>, StoreError>;

    /// Returns `false` when there was no blob with that id.
    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;
}

pub fn split_chunks(blob_id: Uuid, data: &[u8], chunk_size: usize) -> Vec<BlobChunk> {
    data.chunks(chunk_size.max(1))
        .enumerate()
        .map(|(n, data)| BlobChunk {
            blob_id,
            n: n as i32,
            data: data.to_vec(),
        })
        .collect()
}

#[derive(Clone)]
pub struct PgBlobStore {
    pool: Pool<AsyncPgConnection>,
    chunk_size: usize,
}

impl PgBlobStore {
    pub fn new(pool: Pool<AsyncPgConnection>, chunk_size: usize) -> Self {
        Self {
            pool,
            chunk_size: chunk_size.max(1),
        }
    }
}

async fn read_chunk(
    pool: Pool<AsyncPgConnection>,
    blob_id: Uuid,
    chunk_count: i32,
    n: i32,
) -> Result<Option<(Vec<u8>, i32)>, StoreError> {
    if n >= chunk_count {
        return Ok(None);
    }

    let mut conn = pool.get().await?;
    let data = blob_chunks::table
        .find((blob_id, n))
        .select(blob_chunks::data)
        .first::<Vec<u8>>(&mut *conn)
        .await
        .optional()?;

    match data {
        Some(data) => Ok(Some((data, n + 1))),
        None => Err(StoreError::MissingChunk { blob_id, n }),
    }
}

#[async_trait]
impl BlobStore for PgBlobStore {
    async fn put(&self, upload: BlobUpload) -> Result<BlobFile, StoreError> {
        let file = BlobFile {
            id: Uuid::new_v4(),
            filename: upload.filename,
            content_type: upload.content_type,
            length: upload.data.len() as i64,
            chunk_size: self.chunk_size as i32,
            uploaded_at: Utc::now(),
        };
        let chunks = split_chunks(file.id, &upload.data, self.chunk_size);

        let mut conn = self.pool.get().await?;
        let (file_ref, chunks_ref) = (&file, &chunks);
        conn.transaction::<_, diesel::result::Error, _>(|conn| {
            async move {
                insert_into(blob_files::table)
                    .values(file_ref)
                    .execute(conn)
                    .await?;
                for chunk in chunks_ref {
                    insert_into(blob_chunks::table)
                        .values(chunk)
                        .execute(conn)
                        .await?;
                }
                Ok(())
            }
            .scope_boxed()
        })
        .await?;

        Ok(file)
    }

    async fn open(&self, id: Uuid) -> Result<Option<BlobDownload>, StoreError> {
        let file = {
            let mut conn = self.pool.get().await?;
            blob_files::table
                .find(id)
                .select(BlobFile::as_select())
                .first(&mut *conn)
                .await
                .optional()?
        };
        let Some(file) = file else {
            return Ok(None);
        };

        let pool = self.pool.clone();
        let (blob_id, chunk_count) = (file.id, file.chunk_count());
        let chunks = stream::try_unfold(0, move |n| {
            read_chunk(pool.clone(), blob_id, chunk_count, n)
        })
        .boxed();

        Ok(Some(BlobDownload { file, chunks }))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut conn = self.pool.get().await?;
        let removed = conn
            .transaction::<_, diesel::result::Error, _>(|conn| {
                async move {
                    delete(blob_chunks::table.filter(blob_chunks::blob_id.eq(id)))
                        .execute(conn)
                        .await?;
                    delete(blob_files::table.find(id)).execute(conn).await
                }
                .scope_boxed()
            })
            .await?;
        Ok(removed > 0)
    }
}
