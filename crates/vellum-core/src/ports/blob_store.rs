//! BlobStore port - 画像バイト列の永続化（正本）
//!
//! BlobStore は ImageId → bytes のフラットな名前空間です。
//!
//! # 設計原則
//! - BlobStore が source of truth（正本）。ResponseCache はいつでも再構築できる
//! - TTL や暗黙の削除はない（明示的な delete まで残る）
//! - キーごとの操作は独立（キーをまたぐトランザクションは持たない）
//! - 同じキーへの put は last-write-wins
//!
//! # 実装
//! - **InMemoryBlobStore**: テスト / 揮発モード用
//! - **FsBlobStore**: 1 キー 1 ファイルのローカル永続化

use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;

use crate::domain::ImageId;

/// BlobStore の操作エラー
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("blob store I/O failed for {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("blob store unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// 書き込み（既存なら上書き）
    async fn put(&self, id: &ImageId, bytes: Bytes) -> Result<(), StoreError>;

    /// 読み込み（存在しなければ None）
    async fn get(&self, id: &ImageId) -> Result<Option<Bytes>, StoreError>;

    /// 削除（何か消えたら true）
    async fn delete(&self, id: &ImageId) -> Result<bool, StoreError>;

    /// 現在のキー集合（順序は保証しない、重複なし）
    async fn list_keys(&self) -> Result<Vec<ImageId>, StoreError>;
}

#[async_trait]
impl<T: BlobStore + ?Sized> BlobStore for Arc<T> {
    async fn put(&self, id: &ImageId, bytes: Bytes) -> Result<(), StoreError> {
        (**self).put(id, bytes).await
    }

    async fn get(&self, id: &ImageId) -> Result<Option<Bytes>, StoreError> {
        (**self).get(id).await
    }

    async fn delete(&self, id: &ImageId) -> Result<bool, StoreError> {
        (**self).delete(id).await
    }

    async fn list_keys(&self) -> Result<Vec<ImageId>, StoreError> {
        (**self).list_keys().await
    }
}
