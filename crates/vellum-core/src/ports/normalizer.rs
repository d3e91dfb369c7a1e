//! ContentNormalizer port - アップロードされたバイト列の正規化
//!
//! # 契約
//! - 失敗しない（エラーは境界で捕まえて `Normalized::Unchanged` に畳み込む）
//! - 許可リストにない拡張子は常にそのまま返す
//! - 出力は入力バイト列とコーデック設定の純関数（同じバージョン内で再現可能）

use async_trait::async_trait;
use bytes::Bytes;

use crate::domain::Normalized;

#[async_trait]
pub trait ContentNormalizer: Send + Sync {
    async fn normalize(&self, bytes: Bytes, filename: &str) -> Normalized;
}
