use std::sync::Arc;

use serde_json::Value;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::blob::{BlobDownload, BlobStore, BlobUpload};
use crate::error::CatalogError;
use crate::models::{Product, ProductKind, AVAILABLE};
use crate::store::ProductStore;

/// Multipart fields of a create request, before the presence check.
/// Empty strings and empty images count as missing.
#[derive(Default)]
pub struct ProductUpload {
    pub name: Option<String>,
    pub price: Option<String>,
    pub product_type: Option<String>,
    /// Raw JSON text of the item list.
    pub items: Option<String>,
    pub availability: Option<String>,
    pub image: Option<BlobUpload>,
}

struct ProductDraft {
    name: String,
    price: String,
    product_type: String,
    items: Option<Value>,
    availability: String,
    image: BlobUpload,
}

impl ProductUpload {
    fn validate(self) -> Result<ProductDraft, CatalogError> {
        let name = present(self.name);
        let price = present(self.price);
        let product_type = present(self.product_type);
        let image = self.image.filter(|i| !i.data.is_empty());

        let (name, price, product_type, image) = match (name, price, product_type, image) {
            (Some(name), Some(price), Some(product_type), Some(image)) => {
                (name, price, product_type, image)
            }
            (name, price, product_type, image) => {
                let missing = [
                    ("name", name.is_none()),
                    ("price", price.is_none()),
                    ("type", product_type.is_none()),
                    ("image", image.is_none()),
                ]
                .into_iter()
                .filter_map(|(field, missing)| missing.then_some(field))
                .collect::<Vec<_>>();
                return Err(CatalogError::InvalidInput(format!(
                    "Missing required fields: {}",
                    missing.join(", ")
                )));
            }
        };

        let items = present(self.items)
            .map(|raw| serde_json::from_str::<Value>(&raw))
            .transpose()
            .map_err(|e| CatalogError::InvalidInput(format!("Invalid items: {e}")))?;

        Ok(ProductDraft {
            name,
            price,
            product_type,
            items,
            availability: present(self.availability).unwrap_or_else(|| AVAILABLE.to_string()),
            image,
        })
    }
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CreatedProduct {
    pub id: Uuid,
    pub blob_id: Uuid,
}

/// Pairs product records with their image blobs.
///
/// Writes go blob first, record second; deletes go record first, blob second.
/// Neither pair is transactional. A failure between the two steps leaves an
/// orphaned blob, which is logged with its id and left in place.
#[derive(Clone)]
pub struct CatalogService {
    products: Arc<dyn ProductStore>,
    blobs: Arc<dyn BlobStore>,
}

impl CatalogService {
    pub fn new(products: Arc<dyn ProductStore>, blobs: Arc<dyn BlobStore>) -> Self {
        Self { products, blobs }
    }

    #[instrument(skip(self, upload))]
    pub async fn create_product(
        &self,
        kind: ProductKind,
        upload: ProductUpload,
    ) -> Result<CreatedProduct, CatalogError> {
        let draft = upload.validate()?;

        let file = self.blobs.put(draft.image).await?;

        let product = Product {
            id: Uuid::new_v4(),
            kind,
            name: draft.name,
            price: draft.price,
            product_type: draft.product_type,
            category_name: kind.category_name().to_string(),
            items: draft.items,
            availability: draft.availability,
            blob_id: file.id,
            filename: file.filename,
            content_type: file.content_type,
            uploaded_at: file.uploaded_at,
        };
        if let Err(e) = self.products.insert_product(&product).await {
            error!(blob_id = %file.id, error = %e, "product insert failed, blob orphaned");
            return Err(e.into());
        }

        info!(product_id = %product.id, blob_id = %product.blob_id, "product created");
        Ok(CreatedProduct {
            id: product.id,
            blob_id: product.blob_id,
        })
    }

    pub async fn list_products(&self, kind: ProductKind) -> Result<Vec<Product>, CatalogError> {
        Ok(self.products.list_products(kind).await?)
    }

    /// Any string is accepted. Setting the value a record already has is
    /// reported as `NotFound`, the same as a missing record.
    #[instrument(skip(self))]
    pub async fn set_availability(
        &self,
        kind: ProductKind,
        id: &str,
        availability: Option<&str>,
    ) -> Result<(), CatalogError> {
        let id = parse_id(id, "product id")?;
        let Some(availability) = availability else {
            return Err(CatalogError::InvalidInput(
                "Field availability is required".to_string(),
            ));
        };

        let changed = self
            .products
            .set_availability(kind, id, availability)
            .await?;
        if changed == 0 {
            return Err(CatalogError::NotFound("Product not found or no changes made"));
        }

        info!(product_id = %id, availability, "availability updated");
        Ok(())
    }

    pub async fn fetch_blob(&self, blob_id: &str) -> Result<BlobDownload, CatalogError> {
        let blob_id = parse_id(blob_id, "image id")?;
        self.blobs
            .open(blob_id)
            .await?
            .ok_or(CatalogError::NotFound("Image not found"))
    }

    #[instrument(skip(self))]
    pub async fn delete_product(&self, kind: ProductKind, id: &str) -> Result<(), CatalogError> {
        let id = parse_id(id, "product id")?;
        let product = self
            .products
            .find_product(kind, id)
            .await?
            .ok_or(CatalogError::NotFound("Product not found"))?;

        if self.products.delete_product(kind, id).await? == 0 {
            return Err(CatalogError::NotFound("Product not found"));
        }

        match self.blobs.delete(product.blob_id).await {
            Ok(true) => {}
            Ok(false) => warn!(blob_id = %product.blob_id, "blob already missing"),
            Err(e) => {
                error!(blob_id = %product.blob_id, error = %e, "blob delete failed, blob orphaned");
                return Err(e.into());
            }
        }

        info!(product_id = %id, blob_id = %product.blob_id, "product deleted");
        Ok(())
    }
}

fn parse_id(id: &str, what: &str) -> Result<Uuid, CatalogError> {
    id.parse::<Uuid>()
        .map_err(|_| CatalogError::InvalidInput(format!("Invalid {what}")))
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use futures::TryStreamExt;
    use serde_json::json;

    use super::*;
    use crate::memory::{MemoryBlobStore, MemoryProductStore};
    use crate::store::StoreError;

    fn broken() -> StoreError {
        StoreError::Database(diesel::result::Error::BrokenTransactionManager)
    }

    struct RejectingProductStore;

    #[async_trait]
    impl ProductStore for RejectingProductStore {
        async fn insert_product(&self, _: &Product) -> Result<(), StoreError> {
            Err(broken())
        }

        async fn find_product(
            &self,
            _: ProductKind,
            _: Uuid,
        ) -> Result<Option<Product>, StoreError> {
            Err(broken())
        }

        async fn list_products(&self, _: ProductKind) -> Result<Vec<Product>, StoreError> {
            Err(broken())
        }

        async fn set_availability(
            &self,
            _: ProductKind,
            _: Uuid,
            _: &str,
        ) -> Result<usize, StoreError> {
            Err(broken())
        }

        async fn delete_product(&self, _: ProductKind, _: Uuid) -> Result<usize, StoreError> {
            Err(broken())
        }
    }

    /// Keeps blobs but refuses to delete them.
    #[derive(Default)]
    struct UndeletableBlobStore {
        inner: MemoryBlobStore,
    }

    #[async_trait]
    impl BlobStore for UndeletableBlobStore {
        async fn put(
            &self,
            upload: BlobUpload,
        ) -> Result<crate::models::BlobFile, StoreError> {
            self.inner.put(upload).await
        }

        async fn open(&self, id: Uuid) -> Result<Option<BlobDownload>, StoreError> {
            self.inner.open(id).await
        }

        async fn delete(&self, _: Uuid) -> Result<bool, StoreError> {
            Err(broken())
        }
    }

    fn upload() -> ProductUpload {
        ProductUpload {
            name: Some("Family Feast".to_string()),
            price: Some("24.50".to_string()),
            product_type: Some("veg".to_string()),
            items: Some(r#"[{"name": "Soup"}, {"name": "Rice"}]"#.to_string()),
            availability: None,
            image: Some(BlobUpload {
                filename: "feast.png".to_string(),
                content_type: "image/png".to_string(),
                data: vec![7; 10],
            }),
        }
    }

    fn service_with(blobs: Arc<MemoryBlobStore>) -> CatalogService {
        CatalogService::new(Arc::new(MemoryProductStore::new()), blobs)
    }

    #[tokio::test]
    async fn test_create_product() {
        let blobs = Arc::new(MemoryBlobStore::new(4));
        let service = service_with(blobs.clone());

        let created = service
            .create_product(ProductKind::Combo, upload())
            .await
            .unwrap();

        let products = service.list_products(ProductKind::Combo).await.unwrap();
        assert_eq!(products.len(), 1);
        let product = &products[0];
        assert_eq!(product.id, created.id);
        assert_eq!(product.blob_id, created.blob_id);
        assert_eq!(product.availability, AVAILABLE);
        assert_eq!(product.category_name, "combo");
        assert_eq!(product.content_type, "image/png");
        assert_eq!(product.items, Some(json!([{"name": "Soup"}, {"name": "Rice"}])));

        let download = service
            .fetch_blob(&created.blob_id.to_string())
            .await
            .unwrap();
        let bytes = download.chunks.try_concat().await.unwrap();
        assert_eq!(bytes, vec![7; 10]);
        assert_eq!(download.file.content_type, "image/png");
    }

    #[tokio::test]
    async fn test_create_product_missing_price_writes_no_blob() {
        let blobs = Arc::new(MemoryBlobStore::default());
        let service = service_with(blobs.clone());

        let result = service
            .create_product(
                ProductKind::Combo,
                ProductUpload {
                    price: None,
                    ..upload()
                },
            )
            .await;

        match result {
            Err(CatalogError::InvalidInput(message)) => assert!(message.contains("price")),
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(blobs.is_empty().await);
    }

    #[tokio::test]
    async fn test_create_product_names_all_missing_fields() {
        let service = service_with(Arc::new(MemoryBlobStore::default()));

        let result = service
            .create_product(ProductKind::MenuItem, ProductUpload::default())
            .await;

        match result {
            Err(CatalogError::InvalidInput(message)) => {
                assert_eq!(message, "Missing required fields: name, price, type, image")
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_create_product_rejects_bad_items() {
        let blobs = Arc::new(MemoryBlobStore::default());
        let service = service_with(blobs.clone());

        let result = service
            .create_product(
                ProductKind::Combo,
                ProductUpload {
                    items: Some("[not json".to_string()),
                    ..upload()
                },
            )
            .await;

        assert!(matches!(result, Err(CatalogError::InvalidInput(_))));
        assert!(blobs.is_empty().await);
    }

    #[tokio::test]
    async fn test_failed_insert_leaves_blob() {
        let blobs = Arc::new(MemoryBlobStore::default());
        let service = CatalogService::new(Arc::new(RejectingProductStore), blobs.clone());

        let result = service.create_product(ProductKind::Combo, upload()).await;

        assert!(matches!(result, Err(CatalogError::Storage(_))));
        assert_eq!(blobs.len().await, 1);
    }

    #[tokio::test]
    async fn test_set_availability() {
        let service = service_with(Arc::new(MemoryBlobStore::default()));
        let created = service
            .create_product(ProductKind::Combo, upload())
            .await
            .unwrap();
        let id = created.id.to_string();

        service
            .set_availability(ProductKind::Combo, &id, Some("unavailable"))
            .await
            .unwrap();
        let products = service.list_products(ProductKind::Combo).await.unwrap();
        assert_eq!(products[0].availability, "unavailable");

        let unchanged = service
            .set_availability(ProductKind::Combo, &id, Some("unavailable"))
            .await;
        assert!(matches!(unchanged, Err(CatalogError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_set_availability_requires_value() {
        let service = service_with(Arc::new(MemoryBlobStore::default()));
        let created = service
            .create_product(ProductKind::Combo, upload())
            .await
            .unwrap();

        let result = service
            .set_availability(ProductKind::Combo, &created.id.to_string(), None)
            .await;

        match result {
            Err(CatalogError::InvalidInput(message)) => {
                assert_eq!(message, "Field availability is required")
            }
            other => panic!("unexpected result: {other:?}"),
        }
        let products = service.list_products(ProductKind::Combo).await.unwrap();
        assert_eq!(products[0].availability, AVAILABLE);
    }

    #[tokio::test]
    async fn test_set_availability_unknown_product() {
        let service = service_with(Arc::new(MemoryBlobStore::default()));

        let result = service
            .set_availability(
                ProductKind::Combo,
                &Uuid::new_v4().to_string(),
                Some("unavailable"),
            )
            .await;
        assert!(matches!(result, Err(CatalogError::NotFound(_))));

        let result = service
            .set_availability(ProductKind::Combo, "X", Some("unavailable"))
            .await;
        assert!(matches!(result, Err(CatalogError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_delete_product_removes_blob() {
        let blobs = Arc::new(MemoryBlobStore::default());
        let service = service_with(blobs.clone());
        let created = service
            .create_product(ProductKind::Combo, upload())
            .await
            .unwrap();

        service
            .delete_product(ProductKind::Combo, &created.id.to_string())
            .await
            .unwrap();

        assert!(service
            .list_products(ProductKind::Combo)
            .await
            .unwrap()
            .is_empty());
        let fetched = service.fetch_blob(&created.blob_id.to_string()).await;
        assert!(matches!(fetched, Err(CatalogError::NotFound(_))));
        assert!(blobs.is_empty().await);

        let again = service
            .delete_product(ProductKind::Combo, &created.id.to_string())
            .await;
        assert!(matches!(again, Err(CatalogError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_product_rejects_malformed_id() {
        let service = service_with(Arc::new(MemoryBlobStore::default()));

        let result = service.delete_product(ProductKind::Combo, "abc").await;

        assert!(matches!(result, Err(CatalogError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_failed_blob_delete_after_record_removed() {
        let service = CatalogService::new(
            Arc::new(MemoryProductStore::new()),
            Arc::new(UndeletableBlobStore::default()),
        );
        let created = service
            .create_product(ProductKind::MenuItem, upload())
            .await
            .unwrap();

        let result = service
            .delete_product(ProductKind::MenuItem, &created.id.to_string())
            .await;

        assert!(matches!(result, Err(CatalogError::Storage(_))));
        assert!(service
            .list_products(ProductKind::MenuItem)
            .await
            .unwrap()
            .is_empty());
        assert!(service
            .fetch_blob(&created.blob_id.to_string())
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_kinds_are_separate() {
        let service = service_with(Arc::new(MemoryBlobStore::default()));
        let created = service
            .create_product(ProductKind::MenuItem, upload())
            .await
            .unwrap();
        let id = created.id.to_string();

        assert!(service
            .list_products(ProductKind::Combo)
            .await
            .unwrap()
            .is_empty());
        let result = service.delete_product(ProductKind::Combo, &id).await;
        assert!(matches!(result, Err(CatalogError::NotFound(_))));
        let result = service
            .set_availability(ProductKind::Combo, &id, Some("unavailable"))
            .await;
        assert!(matches!(result, Err(CatalogError::NotFound(_))));

        let menu = service.list_products(ProductKind::MenuItem).await.unwrap();
        assert_eq!(menu[0].category_name, "menu");
    }

    #[tokio::test]
    async fn test_fetch_unknown_blob() {
        let service = service_with(Arc::new(MemoryBlobStore::default()));

        let result = service.fetch_blob(&Uuid::new_v4().to_string()).await;

        assert!(matches!(result, Err(CatalogError::NotFound(_))));
    }
}
