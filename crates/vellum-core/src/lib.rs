//! vellum-core
//!
//! Core building blocks for the Vellum image gallery.
//!
//! リクエストはすべてプロセス内で完結します（ネットワークのバックエンドは持たない）。
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, media, normalized）
//! - **ports**: 抽象化レイヤー（BlobStore, ResponseCache, ContentNormalizer, Clock, IdGenerator）
//! - **impls**: ports の実装（InMemoryBlobStore, FsBlobStore, CacheStorage, WebpNormalizer）
//! - **app**: アプリケーションロジック（router, handlers, builder, lifecycle, gallery）
//! - **fetch**: HTTP 風のリクエスト / レスポンス型
//! - **config**: GalleryConfig
//! - **error**: GalleryError（ハンドラのエラー → `{"error": ...}` レスポンス）

pub mod config;
pub mod error;
pub mod fetch;
pub mod domain;
pub mod ports;
pub mod impls;
pub mod app;

pub use self::app::{BuildError, Gallery, GalleryBuilder, LifecycleState};
pub use self::config::GalleryConfig;
pub use self::error::GalleryError;
pub use self::fetch::{Body, FilePart, FormData, FormField, FormValue, Request, Response};
