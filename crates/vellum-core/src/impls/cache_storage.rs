//! CacheStorage - 名前付きレスポンスキャッシュの集合
//!
//! キャッシュ名がバージョントークンを兼ねます（例: `image-cache-v1`）。
//! フォーマットを変えたときは名前を切り替えるだけで、古いエントリは参照されなくなり、
//! `delete(old_name)` でまとめて捨てられます。BlobStore には一切触れません。
//!
//! # 学習ポイント
//! - 外側の RwLock は名前 → ハンドルの対応だけを守る
//! - エントリ本体は各 NamedCache の RwLock が守る（キャッシュ同士は独立）
//! - Response は Bytes を持つので clone が安い

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, trace};

use crate::fetch::Response;
use crate::ports::{CacheError, ResponseCache};

/// 名前付きキャッシュの集合
#[derive(Default)]
pub struct CacheStorage {
    caches: RwLock<HashMap<String, Arc<NamedCache>>>,
}

impl CacheStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// 名前でキャッシュを開く（なければ作る）
    pub async fn open(&self, name: &str) -> Arc<NamedCache> {
        if let Some(cache) = self.caches.read().await.get(name) {
            return cache.clone();
        }
        self.caches
            .write()
            .await
            .entry(name.to_string())
            .or_insert_with(|| {
                debug!(cache = name, "created response cache");
                Arc::new(NamedCache::new(name))
            })
            .clone()
    }

    pub async fn has(&self, name: &str) -> bool {
        self.caches.read().await.contains_key(name)
    }

    /// キャッシュを丸ごと捨てる
    ///
    /// 既に配られたハンドルは使い続けられるが、以後 `open` しても別物になる。
    pub async fn delete(&self, name: &str) -> bool {
        let removed = self.caches.write().await.remove(name).is_some();
        if removed {
            debug!(cache = name, "deleted response cache");
        }
        removed
    }

    pub async fn names(&self) -> Vec<String> {
        self.caches.read().await.keys().cloned().collect()
    }
}

/// URL → Response のキャッシュ 1 つ分
pub struct NamedCache {
    name: String,
    entries: RwLock<HashMap<String, Response>>,
}

impl NamedCache {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    pub async fn keys(&self) -> Vec<String> {
        self.entries.read().await.keys().cloned().collect()
    }
}

#[async_trait]
impl ResponseCache for NamedCache {
    async fn lookup(&self, url: &str) -> Result<Option<Response>, CacheError> {
        let hit = self.entries.read().await.get(url).cloned();
        trace!(cache = %self.name, url, hit = hit.is_some(), "cache lookup");
        Ok(hit)
    }

    async fn store(&self, url: &str, response: Response) -> Result<(), CacheError> {
        self.entries.write().await.insert(url.to_string(), response);
        trace!(cache = %self.name, url, "cache store");
        Ok(())
    }

    async fn evict(&self, url: &str) -> Result<bool, CacheError> {
        Ok(self.entries.write().await.remove(url).is_some())
    }
}
