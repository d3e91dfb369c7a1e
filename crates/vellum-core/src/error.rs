use http::StatusCode;
use serde::Serialize;
use thiserror::Error;

use crate::fetch::Response;
use crate::ports::StoreError;

/// Handler-level error.
///
/// Conversion failures never show up here (the normalizer folds them into
/// `Normalized::Unchanged`). Response cache failures don't either: the cache
/// is not authoritative, so handlers log them and carry on.
#[derive(Debug, Error)]
pub enum GalleryError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Storage(#[from] StoreError),
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

impl GalleryError {
    pub fn image_not_found() -> Self {
        Self::NotFound("Image not found".to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Structured `{"error": ...}` response. Internal details stay in the logs.
    pub fn to_response(&self) -> Response {
        let message = match self {
            Self::NotFound(msg) | Self::Validation(msg) => msg.as_str(),
            Self::Storage(_) => "Internal Server Error",
        };
        Response::json(self.status(), &ErrorBody { error: message })
    }
}
