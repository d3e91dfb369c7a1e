//! Domain model (IDs, media types, normalization outcome).

pub mod ids;
pub mod media;
pub mod normalized;

pub use ids::{ImageId, InvalidImageId};
pub use media::{CANONICAL_CONTENT_TYPE, CANONICAL_EXTENSION, MediaKind, content_type_for};
pub use normalized::Normalized;
