//! GalleryBuilder - Gallery の構築とワイヤリング
//!
//! # 学習ポイント
//! - Builder パターンの実装
//! - 起動時検証（Fail-fast 設計）
//! - 省略した依存はデフォルト実装で埋める

use http::header::InvalidHeaderValue;
use http::{HeaderValue, Method};
use std::sync::Arc;
use tracing::debug;

use crate::app::gallery::Gallery;
use crate::app::handlers::{
    DeleteHandler, GalleryServices, GetImageHandler, ListHandler, UploadHandler,
};
use crate::app::router::{RouteError, Router};
use crate::config::{ConfigError, GalleryConfig};
use crate::impls::{CacheStorage, InMemoryBlobStore, WebpNormalizer};
use crate::ports::{BlobStore, Clock, ContentNormalizer, IdGenerator, SystemClock, TimestampIdGenerator};

/// GalleryBuilder は Gallery を構築
///
/// # 使用例
/// ```ignore
/// let gallery = GalleryBuilder::new(GalleryConfig::default())
///     .store(FsBlobStore::open("./data").await?)
///     .build()
///     .await?;
/// ```
///
/// # デフォルト
/// - store: InMemoryBlobStore
/// - cache_storage: 新しい CacheStorage
/// - normalizer: WebpNormalizer
/// - id_generator: SystemClock を使う TimestampIdGenerator
pub struct GalleryBuilder {
    config: GalleryConfig,
    store: Option<Arc<dyn BlobStore>>,
    caches: Option<Arc<CacheStorage>>,
    normalizer: Option<Arc<dyn ContentNormalizer>>,
    ids: Option<Arc<dyn IdGenerator>>,
}

/// BuildError は Gallery 構築時のエラー
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("invalid Cache-Control value: {0}")]
    CacheControl(#[from] InvalidHeaderValue),

    #[error("route table: {0}")]
    Route(#[from] RouteError),
}

impl GalleryBuilder {
    pub fn new(config: GalleryConfig) -> Self {
        Self {
            config,
            store: None,
            caches: None,
            normalizer: None,
            ids: None,
        }
    }

    pub fn store(mut self, store: impl BlobStore + 'static) -> Self {
        self.store = Some(Arc::new(store));
        self
    }

    pub fn shared_store(mut self, store: Arc<dyn BlobStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// 複数の Gallery で CacheStorage を共有する場合に使う
    pub fn cache_storage(mut self, caches: Arc<CacheStorage>) -> Self {
        self.caches = Some(caches);
        self
    }

    pub fn normalizer(mut self, normalizer: impl ContentNormalizer + 'static) -> Self {
        self.normalizer = Some(Arc::new(normalizer));
        self
    }

    pub fn id_generator(mut self, ids: impl IdGenerator + 'static) -> Self {
        self.ids = Some(Arc::new(ids));
        self
    }

    /// `TimestampIdGenerator` の時計を差し替える
    pub fn clock(self, clock: impl Clock + 'static) -> Self {
        self.id_generator(TimestampIdGenerator::new(clock))
    }

    /// Gallery を構築
    ///
    /// # 検証
    /// - GalleryConfig::validate() を通らなければ BuildError::Config
    /// - ルート表の組み立てに失敗すれば BuildError::Route
    pub async fn build(self) -> Result<Gallery, BuildError> {
        self.config.validate()?;
        let cache_control = HeaderValue::from_str(&self.config.cache_control())?;

        let caches = self.caches.unwrap_or_default();
        let cache = caches.open(&self.config.cache_name).await;

        let services = Arc::new(GalleryServices {
            cache_control,
            store: self
                .store
                .unwrap_or_else(|| Arc::new(InMemoryBlobStore::new())),
            cache,
            normalizer: self
                .normalizer
                .unwrap_or_else(|| Arc::new(WebpNormalizer::new())),
            ids: self
                .ids
                .unwrap_or_else(|| Arc::new(TimestampIdGenerator::new(SystemClock))),
            config: self.config,
        });

        let router = mount(services.clone())?;
        debug!(base_path = %router.base_path(), routes = ?router.routes(), "route table ready");

        Ok(Gallery::new(router, services, caches))
    }
}

impl Default for GalleryBuilder {
    fn default() -> Self {
        Self::new(GalleryConfig::default())
    }
}

/// ルート表（登録順 = 評価順）
fn mount(services: Arc<GalleryServices>) -> Result<Router, RouteError> {
    Router::new(services.config.base_path.clone())
        .route(
            Method::GET,
            "/image/:id",
            Arc::new(GetImageHandler::new(services.clone())),
        )?
        .route(
            Method::GET,
            "/images",
            Arc::new(ListHandler::new(services.clone())),
        )?
        .route(
            Method::POST,
            "/upload",
            Arc::new(UploadHandler::new(services.clone())),
        )?
        .route(
            Method::DELETE,
            "/image/:id",
            Arc::new(DeleteHandler::new(services)),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn build_with_defaults() {
        let gallery = GalleryBuilder::default().build().await.unwrap();
        assert_eq!(
            gallery.routes(),
            vec![
                (Method::GET, "/sw/image/:id".to_string()),
                (Method::GET, "/sw/images".to_string()),
                (Method::POST, "/sw/upload".to_string()),
                (Method::DELETE, "/sw/image/:id".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn build_rejects_invalid_config() {
        let config = GalleryConfig {
            base_path: "gallery".into(),
            ..Default::default()
        };
        let result = GalleryBuilder::new(config).build().await;
        assert!(matches!(
            result,
            Err(BuildError::Config(ConfigError::InvalidBasePath(p))) if p == "gallery"
        ));
    }

    #[tokio::test]
    async fn build_opens_the_configured_cache() {
        let caches = Arc::new(CacheStorage::new());
        let config = GalleryConfig {
            cache_name: "image-cache-v2".into(),
            ..Default::default()
        };
        GalleryBuilder::new(config)
            .cache_storage(caches.clone())
            .build()
            .await
            .unwrap();
        assert_eq!(caches.names().await, vec!["image-cache-v2".to_string()]);
    }
}
