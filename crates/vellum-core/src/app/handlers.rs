//! Handlers - エンドポイントごとの処理
//!
//! 各ハンドラは `GalleryServices`（ports の束）を共有し、
//! Normalizer / IdGenerator / BlobStore / ResponseCache を組み合わせます。
//!
//! | ハンドラ       | ルート                   |
//! |----------------|--------------------------|
//! | UploadHandler  | `POST   {base}/upload`    |
//! | ListHandler    | `GET    {base}/images`    |
//! | GetImageHandler| `GET    {base}/image/:id` |
//! | DeleteHandler  | `DELETE {base}/image/:id` |

use async_trait::async_trait;
use http::header::CACHE_CONTROL;
use http::{HeaderValue, StatusCode};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

use crate::app::router::{PathParams, RouteHandler};
use crate::config::GalleryConfig;
use crate::domain::{ImageId, content_type_for};
use crate::error::GalleryError;
use crate::fetch::{Body, FilePart, FormValue, Request, Response};
use crate::ports::{BlobStore, ContentNormalizer, IdGenerator, ResponseCache};

/// アップロードで受け付けるフォームフィールド名
pub const FILE_FIELD: &str = "file";

/// ハンドラが共有する依存の束
///
/// プロセス起動時に 1 度だけ組み立てて、Router 経由で各ハンドラに渡す。
pub struct GalleryServices {
    pub config: GalleryConfig,
    pub cache_control: HeaderValue,
    pub store: Arc<dyn BlobStore>,
    pub cache: Arc<dyn ResponseCache>,
    pub normalizer: Arc<dyn ContentNormalizer>,
    pub ids: Arc<dyn IdGenerator>,
}

impl GalleryServices {
    fn image_path(&self, id: &ImageId) -> String {
        self.config.image_path(id.as_str())
    }
}

/// `:id` を ImageId として解釈する。キーとして無効なら存在し得ないので NotFound。
fn image_id(params: &PathParams) -> Result<ImageId, GalleryError> {
    params
        .get("id")
        .and_then(|raw| ImageId::parse(raw).ok())
        .ok_or_else(GalleryError::image_not_found)
}

// ========================================
// Upload
// ========================================

#[derive(Debug, Serialize)]
struct UploadBody {
    path: String,
}

pub struct UploadHandler {
    services: Arc<GalleryServices>,
}

impl UploadHandler {
    pub fn new(services: Arc<GalleryServices>) -> Self {
        Self { services }
    }
}

/// フォームからちょうど 1 つのファイルフィールドを取り出す
fn single_file(body: Body) -> Result<FilePart, GalleryError> {
    let Body::Form(form) = body else {
        return Err(GalleryError::Validation(format!(
            "expected form data with a '{FILE_FIELD}' field"
        )));
    };

    let mut values = form
        .into_fields()
        .into_iter()
        .filter(|f| f.name == FILE_FIELD)
        .map(|f| f.value);

    let value = values
        .next()
        .ok_or_else(|| GalleryError::Validation(format!("missing form field '{FILE_FIELD}'")))?;
    if values.next().is_some() {
        return Err(GalleryError::Validation(format!(
            "expected exactly one '{FILE_FIELD}' field"
        )));
    }

    match value {
        FormValue::File(part) => Ok(part),
        FormValue::Text(_) => Err(GalleryError::Validation(format!(
            "form field '{FILE_FIELD}' must be a file"
        ))),
    }
}

#[async_trait]
impl RouteHandler for UploadHandler {
    async fn handle(&self, request: Request, _params: PathParams) -> Result<Response, GalleryError> {
        let part = single_file(request.into_body())?;
        let original_len = part.bytes.len();

        let normalized = self
            .services
            .normalizer
            .normalize(part.bytes, &part.filename)
            .await;
        let converted = normalized.is_converted();

        let id = self
            .services
            .ids
            .generate(&part.filename, normalized.extension())
            .map_err(|e| GalleryError::Validation(format!("unusable file name: {e}")))?;

        let bytes = normalized.into_bytes();
        let stored_len = bytes.len();
        self.services.store.put(&id, bytes).await?;

        info!(
            id = %id,
            filename = %part.filename,
            original_bytes = original_len,
            stored_bytes = stored_len,
            converted,
            "image uploaded"
        );

        Ok(Response::json(
            StatusCode::OK,
            &UploadBody {
                path: self.services.image_path(&id),
            },
        ))
    }
}

// ========================================
// List
// ========================================

pub struct ListHandler {
    services: Arc<GalleryServices>,
}

impl ListHandler {
    pub fn new(services: Arc<GalleryServices>) -> Self {
        Self { services }
    }
}

#[async_trait]
impl RouteHandler for ListHandler {
    async fn handle(&self, _request: Request, _params: PathParams) -> Result<Response, GalleryError> {
        let mut keys = self.services.store.list_keys().await?;
        keys.sort();
        keys.dedup();

        let paths: Vec<String> = keys.iter().map(|id| self.services.image_path(id)).collect();
        debug!(count = paths.len(), "listed images");
        Ok(Response::json(StatusCode::OK, &paths))
    }
}

// ========================================
// Get
// ========================================

pub struct GetImageHandler {
    services: Arc<GalleryServices>,
}

impl GetImageHandler {
    pub fn new(services: Arc<GalleryServices>) -> Self {
        Self { services }
    }
}

#[async_trait]
impl RouteHandler for GetImageHandler {
    async fn handle(&self, request: Request, params: PathParams) -> Result<Response, GalleryError> {
        let id = image_id(&params)?;
        let url = request.url();

        match self.services.cache.lookup(&url).await {
            Ok(Some(cached)) => {
                trace!(id = %id, "served from response cache");
                return Ok(cached);
            }
            Ok(None) => {}
            Err(e) => warn!(id = %id, error = %e, "response cache lookup failed, reading store"),
        }

        let bytes = self
            .services
            .store
            .get(&id)
            .await?
            .ok_or_else(GalleryError::image_not_found)?;

        let response = Response::bytes(StatusCode::OK, content_type_for(&id), bytes)
            .with_header(CACHE_CONTROL, self.services.cache_control.clone());

        if let Err(e) = self.services.cache.store(&url, response.clone()).await {
            warn!(id = %id, error = %e, "failed to populate response cache");
        }

        Ok(response)
    }
}

// ========================================
// Delete
// ========================================

#[derive(Debug, Serialize)]
struct DeleteBody {
    success: bool,
    message: &'static str,
}

pub struct DeleteHandler {
    services: Arc<GalleryServices>,
}

impl DeleteHandler {
    pub fn new(services: Arc<GalleryServices>) -> Self {
        Self { services }
    }
}

#[async_trait]
impl RouteHandler for DeleteHandler {
    async fn handle(&self, request: Request, params: PathParams) -> Result<Response, GalleryError> {
        let id = image_id(&params)?;

        if !self.services.store.delete(&id).await? {
            return Err(GalleryError::image_not_found());
        }
        info!(id = %id, "image deleted");

        // The retrieval URL shares its path with this DELETE request.
        let url = request.url_without_query();
        match self.services.cache.evict(&url).await {
            Ok(evicted) => debug!(id = %id, evicted, "response cache cleanup"),
            Err(e) => warn!(id = %id, url = %url, error = %e, "failed to delete from response cache"),
        }

        Ok(Response::json(
            StatusCode::OK,
            &DeleteBody {
                success: true,
                message: "Image deleted",
            },
        ))
    }
}
