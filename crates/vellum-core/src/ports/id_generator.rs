//! IdGenerator port - 画像 ID 生成の抽象化
//!
//! アップロードごとに BlobStore のキーを 1 つ生成します。
//! テスト容易性のために、trait として抽象化しています。
//!
//! # 実装
//! - **TimestampIdGenerator**: `{timestamp_ms}-{stem}.{extension}`（本番用）

use crate::domain::ids::{ImageId, InvalidImageId};
use crate::domain::media::split_extension;
use crate::ports::Clock;
use std::sync::atomic::{AtomicI64, Ordering};

/// stem が空になったときの代替名
const FALLBACK_STEM: &str = "image";

/// stem の最大バイト数（ファイル名として使える長さに収める）
const MAX_STEM_BYTES: usize = 120;

const MAX_EXTENSION_BYTES: usize = 16;

/// IdGenerator は画像 ID を生成
///
/// # Thread Safety
/// - `Send + Sync` を要求（複数リクエストから同時に呼ばれる）
pub trait IdGenerator: Send + Sync {
    /// `original_filename` はアップロード時のファイル名、
    /// `extension` は正規化後に付ける拡張子（変換されなかった場合は元の拡張子）
    fn generate(
        &self,
        original_filename: &str,
        extension: Option<&str>,
    ) -> Result<ImageId, InvalidImageId>;
}

/// TimestampIdGenerator は時刻ベースの ID 生成器
///
/// Clock を使って現在時刻（ミリ秒）を先頭に付けます。
/// FixedClock を使えばテストで決定的な ID を生成できます。
///
/// # 単調性
/// - 直前に発行した timestamp を保持
/// - Clock が同じ値（または過去の値）を返した場合は `直前 + 1` を使う
/// - 同一プロセス内では同名ファイルを同じミリ秒に受け付けても衝突しない
pub struct TimestampIdGenerator<C> {
    clock: C,
    last_issued: AtomicI64,
}

impl<C: Clock> TimestampIdGenerator<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            last_issued: AtomicI64::new(i64::MIN),
        }
    }

    fn next_timestamp(&self) -> i64 {
        let now = self.clock.now().timestamp_millis();
        let mut last = self.last_issued.load(Ordering::Acquire);
        loop {
            let next = if now > last { now } else { last.saturating_add(1) };
            match self.last_issued.compare_exchange_weak(
                last,
                next,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return next,
                Err(actual) => last = actual,
            }
        }
    }
}

impl<C: Clock> IdGenerator for TimestampIdGenerator<C> {
    /// Any final extension is dropped from the stem, image or not
    /// (`notes.txt` → `notes`); `extension` alone decides the suffix.
    fn generate(
        &self,
        original_filename: &str,
        extension: Option<&str>,
    ) -> Result<ImageId, InvalidImageId> {
        let (stem, _) = split_extension(original_filename);
        let stem = truncate_to_char_boundary(sanitize(stem), MAX_STEM_BYTES);
        let stem = if stem.is_empty() { FALLBACK_STEM.to_string() } else { stem };

        let timestamp = self.next_timestamp();
        let extension = extension
            .map(|ext| truncate_to_char_boundary(sanitize(ext), MAX_EXTENSION_BYTES))
            .filter(|ext| !ext.is_empty());
        let id = match extension {
            Some(ext) => format!("{timestamp}-{stem}.{ext}"),
            None => format!("{timestamp}-{stem}"),
        };
        ImageId::parse(id)
    }
}

/// パス区切り文字と制御文字を `_` に置き換える
fn sanitize(value: &str) -> String {
    value
        .trim()
        .chars()
        .map(|c| {
            if c == '/' || c == '\\' || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect()
}

fn truncate_to_char_boundary(mut value: String, max_bytes: usize) -> String {
    if value.len() > max_bytes {
        let mut end = max_bytes;
        while !value.is_char_boundary(end) {
            end -= 1;
        }
        value.truncate(end);
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{FixedClock, SystemClock};
    use rstest::rstest;

    #[test]
    fn converted_upload_gets_canonical_extension() {
        let id_gen = TimestampIdGenerator::new(FixedClock::from_millis(1_700_000_000_000));
        let id = id_gen.generate("photo.png", Some("webp")).unwrap();
        assert_eq!(id.as_str(), "1700000000000-photo.webp");
    }

    #[rstest]
    #[case::gif("anim.gif", Some("gif"), "1700000000000-anim.gif")]
    #[case::other_extension("notes.txt", Some("txt"), "1700000000000-notes.txt")]
    #[case::double_extension("archive.tar.gz", Some("gz"), "1700000000000-archive.tar.gz")]
    #[case::no_extension("README", None, "1700000000000-README")]
    #[case::extension_dropped_without_suffix("notes.txt", None, "1700000000000-notes")]
    #[case::suffix_from_argument("scan.tiff", Some("webp"), "1700000000000-scan.webp")]
    #[case::separators("a/b\\c.gif", Some("gif"), "1700000000000-a_b_c.gif")]
    #[case::empty_stem(" .gif", Some("gif"), "1700000000000-image.gif")]
    #[case::empty_name("", None, "1700000000000-image")]
    #[case::long_extension("x.abcdefghijklmnopqrst", Some("abcdefghijklmnopqrst"), "1700000000000-x.abcdefghijklmnop")]
    fn builds_ids_from_filename(
        #[case] filename: &str,
        #[case] extension: Option<&str>,
        #[case] expected: &str,
    ) {
        let id_gen = TimestampIdGenerator::new(FixedClock::from_millis(1_700_000_000_000));
        let id = id_gen.generate(filename, extension).unwrap();
        assert_eq!(id.as_str(), expected);
    }

    #[test]
    fn long_names_are_truncated_on_char_boundary() {
        let id_gen = TimestampIdGenerator::new(FixedClock::from_millis(1));
        let name = format!("{}.png", "写".repeat(100));
        let id = id_gen.generate(&name, Some("webp")).unwrap();

        let stem = id
            .as_str()
            .strip_prefix("1-")
            .and_then(|s| s.strip_suffix(".webp"))
            .unwrap();
        assert_eq!(stem, "写".repeat(40));
    }

    #[test]
    fn same_tick_same_name_does_not_collide() {
        let id_gen = TimestampIdGenerator::new(FixedClock::from_millis(1_700_000_000_000));

        let id1 = id_gen.generate("photo.png", Some("webp")).unwrap();
        let id2 = id_gen.generate("photo.png", Some("webp")).unwrap();
        let id3 = id_gen.generate("photo.png", Some("webp")).unwrap();

        assert_eq!(id1.as_str(), "1700000000000-photo.webp");
        assert_eq!(id2.as_str(), "1700000000001-photo.webp");
        assert_eq!(id3.as_str(), "1700000000002-photo.webp");
    }

    #[test]
    fn clock_going_backwards_still_yields_increasing_timestamps() {
        let clock = FixedClock::from_millis(2_000);
        let id_gen = TimestampIdGenerator::new(clock);
        let first = id_gen.generate("a.gif", Some("gif")).unwrap();

        id_gen.clock.set(chrono::DateTime::<chrono::Utc>::UNIX_EPOCH);
        let second = id_gen.generate("a.gif", Some("gif")).unwrap();

        assert_eq!(first.as_str(), "2000-a.gif");
        assert_eq!(second.as_str(), "2001-a.gif");
    }

    #[test]
    fn concurrent_generation_is_unique() {
        let id_gen = std::sync::Arc::new(TimestampIdGenerator::new(SystemClock));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let id_gen = id_gen.clone();
                std::thread::spawn(move || {
                    (0..100)
                        .map(|_| id_gen.generate("same.png", Some("webp")).unwrap())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut all = std::collections::HashSet::new();
        for h in handles {
            for id in h.join().unwrap() {
                assert!(all.insert(id));
            }
        }
        assert_eq!(all.len(), 800);
    }
}
