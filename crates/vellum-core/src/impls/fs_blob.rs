//! FsBlobStore - ローカルファイルシステム上の永続 BlobStore
//!
//! レイアウト: `<root>/blobs/<image_id>`（1 キー 1 ファイル、メタデータなし）
//!
//! # 書き込みの原子性
//! 1. 同じディレクトリに `.<image_id>.<ulid>.tmp` を書く
//! 2. `rename` で本来の名前に置き換える
//!
//! 読み手は常に「古い内容」か「新しい内容」のどちらかを見ます。
//! `.` で始まる名前は ImageId として無効なので、一時ファイルが list_keys に出ることはありません。

use async_trait::async_trait;
use bytes::Bytes;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};
use ulid::Ulid;

use crate::domain::ImageId;
use crate::ports::{BlobStore, StoreError};

const BLOBS_DIR: &str = "blobs";

pub struct FsBlobStore {
    dir: PathBuf,
}

impl FsBlobStore {
    /// `<root>/blobs` を作成して FsBlobStore を開く
    pub async fn open(root: impl AsRef<Path>) -> Result<Self, StoreError> {
        let dir = root.as_ref().join(BLOBS_DIR);
        fs::create_dir_all(&dir).await.map_err(|source| StoreError::Io {
            key: dir.display().to_string(),
            source,
        })?;
        debug!(dir = %dir.display(), "opened filesystem blob store");
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn blob_path(&self, id: &ImageId) -> PathBuf {
        self.dir.join(id.as_str())
    }

    fn temp_path(&self, id: &ImageId) -> PathBuf {
        self.dir.join(format!(".{}.{}.tmp", id.as_str(), Ulid::new()))
    }
}

fn io_error(id: &ImageId, source: std::io::Error) -> StoreError {
    StoreError::Io {
        key: id.to_string(),
        source,
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn put(&self, id: &ImageId, bytes: Bytes) -> Result<(), StoreError> {
        let tmp = self.temp_path(id);
        fs::write(&tmp, &bytes)
            .await
            .map_err(|e| io_error(id, e))?;

        if let Err(e) = fs::rename(&tmp, self.blob_path(id)).await {
            if let Err(cleanup) = fs::remove_file(&tmp).await {
                warn!(path = %tmp.display(), error = %cleanup, "failed to remove temporary blob");
            }
            return Err(io_error(id, e));
        }

        debug!(id = %id, bytes = bytes.len(), "stored blob");
        Ok(())
    }

    async fn get(&self, id: &ImageId) -> Result<Option<Bytes>, StoreError> {
        match fs::read(self.blob_path(id)).await {
            Ok(bytes) => Ok(Some(Bytes::from(bytes))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error(id, e)),
        }
    }

    async fn delete(&self, id: &ImageId) -> Result<bool, StoreError> {
        match fs::remove_file(self.blob_path(id)).await {
            Ok(()) => {
                debug!(id = %id, "deleted blob");
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(io_error(id, e)),
        }
    }

    async fn list_keys(&self) -> Result<Vec<ImageId>, StoreError> {
        let dir_error = |source| StoreError::Io {
            key: self.dir.display().to_string(),
            source,
        };

        let mut entries = fs::read_dir(&self.dir).await.map_err(dir_error)?;
        let mut keys = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(dir_error)? {
            let Ok(file_type) = entry.file_type().await else {
                continue;
            };
            if !file_type.is_file() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
                warn!(path = %entry.path().display(), "skipping non UTF-8 blob name");
                continue;
            };
            if let Ok(id) = ImageId::parse(name) {
                keys.push(id);
            }
        }
        Ok(keys)
    }
}
