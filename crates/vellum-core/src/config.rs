//! Gallery configuration.

use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_PATH: &str = "/sw";
pub const DEFAULT_CACHE_NAME: &str = "image-cache-v1";
pub const DEFAULT_CACHE_MAX_AGE_SECS: u64 = 31_536_000;
pub const DEFAULT_UPLOAD_SIZE_HINT_BYTES: u64 = 10 * 1024 * 1024;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("base_path must start with '/' and must not end with '/': {0:?}")]
    InvalidBasePath(String),

    #[error("cache_name must not be empty")]
    EmptyCacheName,
}

/// Gallery settings. Every field has a default, so an empty TOML table is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GalleryConfig {
    /// Prefix every route is mounted under.
    pub base_path: String,

    /// Response cache name; rotating it invalidates every cached response.
    pub cache_name: String,

    /// `max-age` of the `Cache-Control` header on served images.
    pub cache_max_age_secs: u64,

    /// Upload size advertised to clients. Never enforced by the core.
    pub upload_size_hint_bytes: u64,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            base_path: DEFAULT_BASE_PATH.to_string(),
            cache_name: DEFAULT_CACHE_NAME.to_string(),
            cache_max_age_secs: DEFAULT_CACHE_MAX_AGE_SECS,
            upload_size_hint_bytes: DEFAULT_UPLOAD_SIZE_HINT_BYTES,
        }
    }
}

impl GalleryConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let base = &self.base_path;
        if !base.starts_with('/') || base.len() < 2 || base.ends_with('/') {
            return Err(ConfigError::InvalidBasePath(base.clone()));
        }
        if self.cache_name.trim().is_empty() {
            return Err(ConfigError::EmptyCacheName);
        }
        Ok(())
    }

    /// `Cache-Control` value for served images.
    pub fn cache_control(&self) -> String {
        format!("public, max-age={}", self.cache_max_age_secs)
    }

    /// Retrieval path of a stored image, e.g. `/sw/image/1700000000000-photo.webp`.
    ///
    /// The id is percent-encoded as one path segment; the router decodes it again.
    pub fn image_path(&self, id: &str) -> String {
        format!("{}/image/{}", self.base_path, urlencoding::encode(id))
    }
}
