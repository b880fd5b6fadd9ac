use std::collections::HashMap;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::RwLock;

use super::{BlobStore, BlobStoreError};

/// Process-local object store.
#[derive(Default)]
pub struct MemoryBlobStore {
    objects: RwLock<HashMap<String, Bytes>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put_object(&self, key: &str, bytes: Bytes) -> Result<(), BlobStoreError> {
        self.objects.write().await.insert(key.to_owned(), bytes);
        Ok(())
    }

    async fn get_object(&self, key: &str) -> Result<Bytes, BlobStoreError> {
        self.objects
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or(BlobStoreError::NotFound)
    }

    async fn remove_object(&self, key: &str) -> Result<(), BlobStoreError> {
        self.objects.write().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_get_remove() {
        let store = MemoryBlobStore::new();
        store
            .put_object("owner/a", Bytes::from_static(b"sealed"))
            .await
            .unwrap();
        assert_eq!(store.get_object("owner/a").await.unwrap(), "sealed");

        store.remove_object("owner/a").await.unwrap();
        assert!(matches!(
            store.get_object("owner/a").await,
            Err(BlobStoreError::NotFound)
        ));
        // Removing again is not an error, matching S3 semantics.
        store.remove_object("owner/a").await.unwrap();
        assert!(store.objects.read().await.is_empty());
    }
}
