//! ImageId - 保存された画像を指すキー
//!
//! 形式は `{timestamp}-{stem}.{extension}`（拡張子なしの場合は `{timestamp}-{stem}`）。
//! 生成は `ports::IdGenerator` が担当し、ここでは「キーとして安全か」だけを検証します。
//!
//! # 検証ルール
//! - 空文字列ではない
//! - パス区切り文字（`/`, `\`）と制御文字を含まない
//! - `.` で始まらない（`.`, `..`, 隠しファイルを排除）
//! - `MAX_LEN` バイト以下（ファイル名の上限 255 バイトに収まる）
//!
//! BlobStore 実装（特に FsBlobStore）はこの検証済みの値だけを受け取るので、
//! キーがファイルシステム上のパスとして外に逃げることはありません。

use serde::{Deserialize, Serialize};
use std::fmt;

/// ImageId の最大バイト数。生成される ID は高々 160 バイト程度。
pub const MAX_LEN: usize = 200;

/// 検証済みの画像 ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ImageId(String);

/// ImageId として受け付けられない文字列
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidImageId {
    #[error("image id is empty")]
    Empty,

    #[error("image id must not start with '.': {0:?}")]
    Hidden(String),

    #[error("image id contains a forbidden character: {0:?}")]
    ForbiddenChar(String),

    #[error("image id is {0} bytes long (max {max})", max = MAX_LEN)]
    TooLong(usize),
}

impl ImageId {
    /// 文字列を検証して ImageId を作成
    pub fn parse(value: impl Into<String>) -> Result<Self, InvalidImageId> {
        let value = value.into();
        if value.is_empty() {
            return Err(InvalidImageId::Empty);
        }
        if value.len() > MAX_LEN {
            return Err(InvalidImageId::TooLong(value.len()));
        }
        if value.starts_with('.') {
            return Err(InvalidImageId::Hidden(value));
        }
        if value
            .chars()
            .any(|c| c == '/' || c == '\\' || c.is_control())
        {
            return Err(InvalidImageId::ForbiddenChar(value));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 最後の `.` 以降（小文字化はしない）
    pub fn extension(&self) -> Option<&str> {
        self.0
            .rsplit_once('.')
            .map(|(_, ext)| ext)
            .filter(|ext| !ext.is_empty())
    }
}

impl TryFrom<String> for ImageId {
    type Error = InvalidImageId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<ImageId> for String {
    fn from(id: ImageId) -> Self {
        id.0
    }
}

impl AsRef<str> for ImageId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn accepts_generated_shape() {
        let id = ImageId::parse("1700000000000-photo.webp").unwrap();
        assert_eq!(id.as_str(), "1700000000000-photo.webp");
        assert_eq!(id.extension(), Some("webp"));
        assert_eq!(id.to_string(), "1700000000000-photo.webp");
    }

    #[test]
    fn spaces_and_unicode_are_allowed() {
        let id = ImageId::parse("1700000000000-my photo 写真.gif").unwrap();
        assert_eq!(id.extension(), Some("gif"));
    }

    #[test]
    fn id_without_extension() {
        let id = ImageId::parse("1700000000000-README").unwrap();
        assert_eq!(id.extension(), None);

        let trailing_dot = ImageId::parse("1700000000000-README.").unwrap();
        assert_eq!(trailing_dot.extension(), None);
    }

    #[rstest]
    #[case::empty("", InvalidImageId::Empty)]
    #[case::dot(".", InvalidImageId::Hidden(".".into()))]
    #[case::dotdot("..", InvalidImageId::Hidden("..".into()))]
    #[case::hidden(".secret", InvalidImageId::Hidden(".secret".into()))]
    #[case::slash("a/b.webp", InvalidImageId::ForbiddenChar("a/b.webp".into()))]
    #[case::backslash("a\\b.webp", InvalidImageId::ForbiddenChar("a\\b.webp".into()))]
    #[case::newline("a\nb.webp", InvalidImageId::ForbiddenChar("a\nb.webp".into()))]
    fn rejects_unsafe_keys(#[case] raw: &str, #[case] expected: InvalidImageId) {
        assert_eq!(ImageId::parse(raw), Err(expected));
    }

    #[test]
    fn length_is_capped() {
        let id = ImageId::parse("a".repeat(MAX_LEN)).unwrap();
        assert_eq!(id.as_str().len(), MAX_LEN);

        assert_eq!(
            ImageId::parse("a".repeat(MAX_LEN + 1)),
            Err(InvalidImageId::TooLong(MAX_LEN + 1))
        );
    }

    #[test]
    fn serde_goes_through_validation() {
        let id: ImageId = serde_json::from_str("\"1-a.webp\"").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"1-a.webp\"");

        let bad = serde_json::from_str::<ImageId>("\"../etc/passwd\"");
        assert!(bad.is_err());
    }
}
