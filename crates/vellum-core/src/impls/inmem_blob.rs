//! InMemoryBlobStore - 揮発性の BlobStore
//!
//! プロセス終了で消えるので、テストと `--ephemeral` モード専用です。

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::domain::ImageId;
use crate::ports::{BlobStore, StoreError};

/// InMemoryBlobStore は HashMap ベースの BlobStore
///
/// # 実装詳細
/// - `RwLock<HashMap<ImageId, Bytes>>` で管理
/// - ロックは各操作の中で完結する（await をまたがない）
#[derive(Default)]
pub struct InMemoryBlobStore {
    blobs: RwLock<HashMap<ImageId, Bytes>>,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.blobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.blobs.read().await.is_empty()
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn put(&self, id: &ImageId, bytes: Bytes) -> Result<(), StoreError> {
        self.blobs.write().await.insert(id.clone(), bytes);
        Ok(())
    }

    async fn get(&self, id: &ImageId) -> Result<Option<Bytes>, StoreError> {
        Ok(self.blobs.read().await.get(id).cloned())
    }

    async fn delete(&self, id: &ImageId) -> Result<bool, StoreError> {
        Ok(self.blobs.write().await.remove(id).is_some())
    }

    async fn list_keys(&self) -> Result<Vec<ImageId>, StoreError> {
        Ok(self.blobs.read().await.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> ImageId {
        ImageId::parse(s).unwrap()
    }

    #[tokio::test]
    async fn put_get_delete() {
        let store = InMemoryBlobStore::new();
        let key = id("1-a.webp");

        store.put(&key, Bytes::from_static(b"abc")).await.unwrap();
        assert_eq!(store.get(&key).await.unwrap(), Some(Bytes::from_static(b"abc")));

        assert!(store.delete(&key).await.unwrap());
        assert!(!store.delete(&key).await.unwrap());
        assert_eq!(store.get(&key).await.unwrap(), None);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn put_overwrites() {
        let store = InMemoryBlobStore::new();
        let key = id("1-a.webp");
        store.put(&key, Bytes::from_static(b"old")).await.unwrap();
        store.put(&key, Bytes::from_static(b"new")).await.unwrap();

        assert_eq!(store.get(&key).await.unwrap(), Some(Bytes::from_static(b"new")));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn list_keys_is_duplicate_free() {
        let store = InMemoryBlobStore::new();
        for name in ["1-a.webp", "2-b.gif", "1-a.webp"] {
            store.put(&id(name), Bytes::from_static(b"x")).await.unwrap();
        }

        let mut keys = store.list_keys().await.unwrap();
        keys.sort();
        assert_eq!(keys, vec![id("1-a.webp"), id("2-b.gif")]);
    }
}
