//! Gallery - Router と Lifecycle をまとめた入口
//!
//! # 実装
//! - `handle`: 状態に関係なくルーティングする（テスト・組み込み用）
//! - `fetch`: Activated かつ base path 配下のときだけ横取りする。
//!   `None` は「横取りしない」なので、呼び出し側は自前の経路にフォールバックする

use http::Method;
use std::sync::Arc;
use tracing::info;

use crate::app::handlers::GalleryServices;
use crate::app::lifecycle::{Lifecycle, LifecycleState};
use crate::app::router::Router;
use crate::config::GalleryConfig;
use crate::fetch::{Request, Response};
use crate::impls::CacheStorage;

pub struct Gallery {
    router: Router,
    services: Arc<GalleryServices>,
    caches: Arc<CacheStorage>,
    lifecycle: Lifecycle,
}

impl Gallery {
    pub(crate) fn new(
        router: Router,
        services: Arc<GalleryServices>,
        caches: Arc<CacheStorage>,
    ) -> Self {
        Self {
            router,
            services,
            caches,
            lifecycle: Lifecycle::new(),
        }
    }

    pub fn config(&self) -> &GalleryConfig {
        &self.services.config
    }

    /// クライアントに伝えるアップロード上限の目安（強制はしない）
    pub fn upload_size_hint(&self) -> u64 {
        self.services.config.upload_size_hint_bytes
    }

    pub fn routes(&self) -> Vec<(Method, String)> {
        self.router.routes()
    }

    pub fn cache_storage(&self) -> &Arc<CacheStorage> {
        &self.caches
    }

    pub fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    /// 待機せずに Installed へ進む
    pub fn install(&self) {
        if self.lifecycle.advance(LifecycleState::Installed).is_some() {
            info!(base_path = %self.config().base_path, "gallery installed");
        }
    }

    /// 以後のリクエストを引き受ける
    ///
    /// 現行名以外のキャッシュはここで捨てる。
    pub async fn activate(&self) {
        self.install();
        if self.lifecycle.advance(LifecycleState::Activated).is_none() {
            return;
        }

        let current = &self.config().cache_name;
        for name in self.caches.names().await {
            if &name != current && self.caches.delete(&name).await {
                info!(cache = %name, "dropped stale response cache");
            }
        }
        info!(cache = %current, "gallery activated");
    }

    pub async fn handle(&self, request: Request) -> Response {
        self.router.dispatch(request).await
    }

    pub async fn fetch(&self, request: Request) -> Option<Response> {
        if !self.lifecycle.is_active() || !self.owns(request.path()) {
            return None;
        }
        Some(self.handle(request).await)
    }

    fn owns(&self, path: &str) -> bool {
        path.strip_prefix(self.router.base_path())
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
    }
}
