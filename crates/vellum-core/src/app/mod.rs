//! App - アプリケーション層
//!
//! このモジュールは、ports を組み合わせてアプリケーションロジックを実装します。
//!
//! # 主要コンポーネント
//! - **GalleryBuilder**: Gallery の構築とワイヤリング
//! - **Gallery**: リクエストの入口（Lifecycle + Router）
//! - **Router**: (method, path) → handler の静的な対応表
//! - **handlers**: Upload / List / Get / Delete

pub mod builder;
pub mod gallery;
pub mod handlers;
pub mod lifecycle;
pub mod router;

// 主要な型を再エクスポート
pub use self::builder::{BuildError, GalleryBuilder};
pub use self::gallery::Gallery;
pub use self::handlers::GalleryServices;
pub use self::lifecycle::LifecycleState;
pub use self::router::{PathParams, RouteError, RouteHandler, Router};
