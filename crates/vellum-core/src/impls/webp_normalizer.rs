//! WebpNormalizer - PNG / JPEG を WebP に変換する ContentNormalizer
//!
//! - 許可リスト（png, jpg, jpeg）に入る拡張子だけ decode → encode
//! - エンコードは lossless 固定（`image` クレートの pure-Rust エンコーダ）
//! - デコード / エンコードは blocking pool で実行
//! - どの段階で失敗しても元のバイト列を返す

use async_trait::async_trait;
use bytes::Bytes;
use image::ColorType;
use image::codecs::webp::WebPEncoder;
use tracing::{debug, warn};

use crate::domain::Normalized;
use crate::domain::media::{is_convertible_filename, split_extension};
use crate::ports::ContentNormalizer;

/// 変換失敗（外には出さず、ログに残すだけ）
#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    #[error("decode failed: {0}")]
    Decode(#[source] image::ImageError),

    #[error("webp encode failed: {0}")]
    Encode(#[source] image::ImageError),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct WebpNormalizer;

impl WebpNormalizer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ContentNormalizer for WebpNormalizer {
    async fn normalize(&self, bytes: Bytes, filename: &str) -> Normalized {
        let (_, extension) = split_extension(filename);
        if !is_convertible_filename(filename) {
            return Normalized::unchanged(bytes, extension);
        }

        let input = bytes.clone();
        match tokio::task::spawn_blocking(move || encode_webp(&input)).await {
            Ok(Ok(webp)) => {
                debug!(
                    filename,
                    original_bytes = bytes.len(),
                    webp_bytes = webp.len(),
                    "converted upload to webp"
                );
                Normalized::converted(webp)
            }
            Ok(Err(e)) => {
                warn!(filename, error = %e, "failed to convert image to webp, storing original");
                Normalized::unchanged(bytes, extension)
            }
            Err(e) => {
                warn!(filename, error = %e, "conversion task did not complete, storing original");
                Normalized::unchanged(bytes, extension)
            }
        }
    }
}

/// 任意の（対応済み）画像バイト列を lossless WebP に再エンコード
pub fn encode_webp(bytes: &[u8]) -> Result<Vec<u8>, ConversionError> {
    let decoded = image::load_from_memory(bytes).map_err(ConversionError::Decode)?;
    let rgba = decoded.to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut out = Vec::new();
    WebPEncoder::new_lossless(&mut out)
        .encode(rgba.as_raw(), width, height, ColorType::Rgba8.into())
        .map_err(ConversionError::Encode)?;
    Ok(out)
}
