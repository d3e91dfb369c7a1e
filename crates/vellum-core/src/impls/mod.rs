//! Impls - ports の実装
//!
//! # 含まれる実装
//! - **InMemoryBlobStore**: テスト / 揮発モード用の BlobStore
//! - **FsBlobStore**: ローカルディスクに永続化する BlobStore
//! - **CacheStorage / NamedCache**: 名前（バージョン）付きレスポンスキャッシュ
//! - **WebpNormalizer**: PNG / JPEG → WebP の ContentNormalizer

pub mod inmem_blob;
pub mod fs_blob;
pub mod cache_storage;
pub mod webp_normalizer;

// 主要な型を再エクスポート
pub use self::inmem_blob::InMemoryBlobStore;
pub use self::fs_blob::FsBlobStore;
pub use self::cache_storage::{CacheStorage, NamedCache};
pub use self::webp_normalizer::{ConversionError, WebpNormalizer};
