//! Image media types and the extension → content-type mapping.

use super::ids::ImageId;

/// Extension of the canonical (normalized) encoding.
pub const CANONICAL_EXTENSION: &str = "webp";

/// Content type of the canonical encoding; also the fallback for unknown extensions.
pub const CANONICAL_CONTENT_TYPE: &str = "image/webp";

/// Image kinds the gallery knows by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Webp,
    Gif,
    Png,
    Jpeg,
}

impl MediaKind {
    /// Case-insensitive lookup by file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "webp" => Some(Self::Webp),
            "gif" => Some(Self::Gif),
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            _ => None,
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Self::Webp => CANONICAL_CONTENT_TYPE,
            Self::Gif => "image/gif",
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
        }
    }

    /// Raster formats the normalizer re-encodes. Animated formats never are.
    pub fn is_convertible(self) -> bool {
        matches!(self, Self::Png | Self::Jpeg)
    }
}

/// Content type served for a stored image, inferred from its id.
pub fn content_type_for(id: &ImageId) -> &'static str {
    id.extension()
        .and_then(MediaKind::from_extension)
        .map_or(CANONICAL_CONTENT_TYPE, MediaKind::content_type)
}

/// Whether a file with this name goes through decode → re-encode.
pub fn is_convertible_filename(filename: &str) -> bool {
    split_extension(filename)
        .1
        .and_then(MediaKind::from_extension)
        .is_some_and(MediaKind::is_convertible)
}

/// Splits `name.ext` at the last dot. A leading dot (`.hidden`) or a trailing
/// dot (`name.`) does not count as an extension.
pub fn split_extension(filename: &str) -> (&str, Option<&str>) {
    match filename.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => (stem, Some(ext)),
        _ => (filename, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::webp("1-a.webp", "image/webp")]
    #[case::gif("1-a.gif", "image/gif")]
    #[case::gif_upper("1-a.GIF", "image/gif")]
    #[case::png("1-a.png", "image/png")]
    #[case::jpg("1-a.jpg", "image/jpeg")]
    #[case::jpeg("1-a.jpeg", "image/jpeg")]
    #[case::unknown("1-a.bmp", "image/webp")]
    #[case::no_extension("1-a", "image/webp")]
    fn infers_content_type_from_id(#[case] id: &str, #[case] expected: &str) {
        let id = ImageId::parse(id).unwrap();
        assert_eq!(content_type_for(&id), expected);
    }

    #[rstest]
    #[case("photo.png", true)]
    #[case("photo.JPG", true)]
    #[case("photo.jpeg", true)]
    #[case("anim.gif", false)]
    #[case("already.webp", false)]
    #[case("notes.txt", false)]
    #[case("png", false)]
    fn convertible_allow_list(#[case] filename: &str, #[case] expected: bool) {
        assert_eq!(is_convertible_filename(filename), expected);
    }

    #[rstest]
    #[case("photo.png", ("photo", Some("png")))]
    #[case("archive.tar.gz", ("archive.tar", Some("gz")))]
    #[case("README", ("README", None))]
    #[case(".hidden", (".hidden", None))]
    #[case("trailing.", ("trailing.", None))]
    fn splits_last_extension(#[case] filename: &str, #[case] expected: (&str, Option<&str>)) {
        assert_eq!(split_extension(filename), expected);
    }
}
