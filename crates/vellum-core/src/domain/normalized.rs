//! Outcome of content normalization.
//!
//! A normalizer never fails: a decode or encode error is folded into
//! [`Normalized::Unchanged`] at the normalizer boundary.

use bytes::Bytes;

use super::media::CANONICAL_EXTENSION;

/// Bytes to persist, plus the extension the identifier should carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Normalized {
    /// Re-encoded into the canonical format.
    Converted { bytes: Bytes },

    /// Original bytes, original (lower-cased) extension if the file had one.
    Unchanged {
        bytes: Bytes,
        extension: Option<String>,
    },
}

impl Normalized {
    pub fn converted(bytes: impl Into<Bytes>) -> Self {
        Self::Converted {
            bytes: bytes.into(),
        }
    }

    pub fn unchanged(bytes: impl Into<Bytes>, extension: Option<&str>) -> Self {
        Self::Unchanged {
            bytes: bytes.into(),
            extension: extension.map(str::to_ascii_lowercase),
        }
    }

    pub fn is_converted(&self) -> bool {
        matches!(self, Self::Converted { .. })
    }

    pub fn bytes(&self) -> &Bytes {
        match self {
            Self::Converted { bytes } | Self::Unchanged { bytes, .. } => bytes,
        }
    }

    pub fn extension(&self) -> Option<&str> {
        match self {
            Self::Converted { .. } => Some(CANONICAL_EXTENSION),
            Self::Unchanged { extension, .. } => extension.as_deref(),
        }
    }

    pub fn into_bytes(self) -> Bytes {
        match self {
            Self::Converted { bytes } | Self::Unchanged { bytes, .. } => bytes,
        }
    }
}
