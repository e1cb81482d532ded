use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use futures::stream::{self, StreamExt};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::blob::{split_chunks, BlobDownload, BlobStore, BlobUpload, DEFAULT_CHUNK_SIZE};
use crate::models::{BlobFile, Product, ProductKind};
use crate::store::{ProductStore, StoreError};

/// Process-local product store, used with `--storage memory` and in tests.
#[derive(Default)]
pub struct MemoryProductStore {
    products: RwLock<Vec<Product>>,
}

impl MemoryProductStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProductStore for MemoryProductStore {
    async fn insert_product(&self, product: &Product) -> Result<(), StoreError> {
        self.products.write().await.push(product.clone());
        Ok(())
    }

    async fn find_product(
        &self,
        kind: ProductKind,
        id: Uuid,
    ) -> Result<Option<Product>, StoreError> {
        Ok(self
            .products
            .read()
            .await
            .iter()
            .find(|p| p.kind == kind && p.id == id)
            .cloned())
    }

    async fn list_products(&self, kind: ProductKind) -> Result<Vec<Product>, StoreError> {
        Ok(self
            .products
            .read()
            .await
            .iter()
            .filter(|p| p.kind == kind)
            .cloned()
            .collect())
    }

    async fn set_availability(
        &self,
        kind: ProductKind,
        id: Uuid,
        availability: &str,
    ) -> Result<usize, StoreError> {
        let mut changed = 0;
        for product in self.products.write().await.iter_mut() {
            if product.kind == kind && product.id == id && product.availability != availability {
                product.availability = availability.to_string();
                changed += 1;
            }
        }
        Ok(changed)
    }

    async fn delete_product(&self, kind: ProductKind, id: Uuid) -> Result<usize, StoreError> {
        let mut products = self.products.write().await;
        let before = products.len();
        products.retain(|p| !(p.kind == kind && p.id == id));
        Ok(before - products.len())
    }
}

/// Process-local blob store. Blobs are kept split into chunks so downloads
/// stream the same way the Postgres store does.
pub struct MemoryBlobStore {
    blobs: RwLock<HashMap<Uuid, (BlobFile, Vec<Vec<u8>>)>>,
    chunk_size: usize,
}

impl Default for MemoryBlobStore {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE)
    }
}

impl MemoryBlobStore {
    pub fn new(chunk_size: usize) -> Self {
        Self {
            blobs: RwLock::new(HashMap::new()),
            chunk_size: chunk_size.max(1),
        }
    }

    pub async fn len(&self) -> usize {
        self.blobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, upload: BlobUpload) -> Result<BlobFile, StoreError> {
        let file = BlobFile {
            id: Uuid::new_v4(),
            filename: upload.filename,
            content_type: upload.content_type,
            length: upload.data.len() as i64,
            chunk_size: self.chunk_size as i32,
            uploaded_at: Utc::now(),
        };
        let chunks = split_chunks(file.id, &upload.data, self.chunk_size)
            .into_iter()
            .map(|c| c.data)
            .collect();

        self.blobs
            .write()
            .await
            .insert(file.id, (file.clone(), chunks));
        Ok(file)
    }

    async fn open(&self, id: Uuid) -> Result<Option<BlobDownload>, StoreError> {
        let blobs = self.blobs.read().await;
        let Some((file, chunks)) = blobs.get(&id) else {
            return Ok(None);
        };

        let chunks = stream::iter(chunks.clone().into_iter().map(Ok)).boxed();
        Ok(Some(BlobDownload {
            file: file.clone(),
            chunks,
        }))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.blobs.write().await.remove(&id).is_some())
    }
}
