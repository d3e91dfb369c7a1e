//! Ports - 抽象化レイヤー
//!
//! このモジュールは Hexagonal Architecture の「ポート」を定義します。
//! 各 trait は永続化・キャッシュ・コーデック・時刻への
//! インターフェースを提供し、実装の詳細を隠蔽します。
//!
//! # 設計原則
//! - BlobStore が source of truth（正本）
//! - ResponseCache は画像取得パス専用、いつでも捨てられる
//! - ContentNormalizer は失敗を外に出さない

pub mod blob_store;
pub mod response_cache;
pub mod normalizer;
pub mod clock;
pub mod id_generator;

// 主要な trait を再エクスポート
pub use self::blob_store::{BlobStore, StoreError};
pub use self::response_cache::{CacheError, ResponseCache};
pub use self::normalizer::ContentNormalizer;
pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::id_generator::{IdGenerator, TimestampIdGenerator};
