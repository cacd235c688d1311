use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, warn};

use super::{compute_checksum, format_checksum, validate_key_syntax, ObjectMeta, ObjectStore, StorageError};

const HASH_CHUNK_BYTES: usize = 64 * 1024;

/// Objects stored as plain files under a root directory, one file per key.
pub struct FilesystemStore {
    root: PathBuf,
}

impl FilesystemStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn full_path(&self, key: &str) -> Result<PathBuf, StorageError> {
        validate_key_syntax(key)?;
        Ok(self.root.join(key))
    }
}

#[async_trait]
impl ObjectStore for FilesystemStore {
    fn name(&self) -> &'static str {
        "filesystem"
    }

    async fn head(&self, key: &str) -> Result<Option<ObjectMeta>, StorageError> {
        let path = self.full_path(key)?;
        match stream_meta(&path).await {
            Ok(meta) => Ok(Some(meta)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn put(&self, key: &str, data: &[u8]) -> Result<ObjectMeta, StorageError> {
        let path = self.full_path(key)?;
        debug!(storage_key = %key, size = data.len(), "filesystem store: put");

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        // Write to a sibling temp file, then rename into place
        let temp_path = path.with_extension("partial");
        let mut file = fs::File::create(&temp_path).await?;
        file.write_all(data).await?;
        file.sync_all().await?;
        drop(file);

        if let Err(e) = fs::rename(&temp_path, &path).await {
            warn!(storage_key = %key, error = %e, "filesystem store: rename failed");
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        Ok(ObjectMeta {
            size: data.len() as u64,
            checksum: Some(compute_checksum(data)),
        })
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let path = self.full_path(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StorageError::NotFound(key.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        let path = self.full_path(key)?;
        Ok(fs::try_exists(path).await?)
    }
}

/// Size from metadata, checksum hashed in fixed-size chunks
async fn stream_meta(path: &Path) -> std::io::Result<ObjectMeta> {
    let file = fs::File::open(path).await?;
    let size = file.metadata().await?.len();

    let mut reader = BufReader::with_capacity(HASH_CHUNK_BYTES, file);
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; HASH_CHUNK_BYTES];
    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(ObjectMeta {
        size,
        checksum: Some(format_checksum(hasher)),
    })
}
