//! ResponseCache port - 画像取得パス専用の read-through キャッシュ
//!
//! キーはリクエスト URL の文字列そのもの（ImageId ではない）。
//! 値は構築済みの Response（body + Content-Type + Cache-Control）。
//!
//! # 設計原則
//! - 正本ではない（BlobStore からいつでも作り直せる）
//! - 同じ URL への同時 store は last-write-wins（同じバイト列なので冪等）
//! - Delete 時の evict は best-effort（失敗してもログに残すだけ）

use async_trait::async_trait;
use std::sync::Arc;

use crate::fetch::Response;

/// ResponseCache の操作エラー
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("response cache operation failed: {0}")]
    OperationFailed(String),
}

#[async_trait]
pub trait ResponseCache: Send + Sync {
    async fn lookup(&self, url: &str) -> Result<Option<Response>, CacheError>;

    async fn store(&self, url: &str, response: Response) -> Result<(), CacheError>;

    /// 何か消えたら true
    async fn evict(&self, url: &str) -> Result<bool, CacheError>;
}

#[async_trait]
impl<T: ResponseCache + ?Sized> ResponseCache for Arc<T> {
    async fn lookup(&self, url: &str) -> Result<Option<Response>, CacheError> {
        (**self).lookup(url).await
    }

    async fn store(&self, url: &str, response: Response) -> Result<(), CacheError> {
        (**self).store(url, response).await
    }

    async fn evict(&self, url: &str) -> Result<bool, CacheError> {
        (**self).evict(url).await
    }
}
