//! Object storage for document bytes.
//!
//! Clients upload directly to the store. The API only checks that an object
//! exists under the tenant's prefix, reads its size and checksum, and removes
//! it when a document is purged.

pub mod filesystem;
pub mod memory;

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::config::{StorageBackendKind, StorageConfig};

pub use filesystem::FilesystemStore;
pub use memory::MemoryStore;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// What the API needs to know about a stored object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectMeta {
    pub size: u64,
    pub checksum: Option<String>,
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Backend name for logs and health output
    fn name(&self) -> &'static str;

    /// Metadata of an object, `None` when it does not exist.
    async fn head(&self, key: &str) -> Result<Option<ObjectMeta>, StorageError>;

    /// Write an object. Used by tooling and tests; the HTTP API never proxies uploads.
    async fn put(&self, key: &str, data: &[u8]) -> Result<ObjectMeta, StorageError>;

    /// Delete an object. Missing objects yield `StorageError::NotFound`.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        Ok(self.head(key).await?.is_some())
    }
}

/// Build the configured store
pub fn from_config(config: &StorageConfig) -> Arc<dyn ObjectStore> {
    match config.backend {
        StorageBackendKind::Filesystem => Arc::new(FilesystemStore::new(config.root.clone())),
        StorageBackendKind::Memory => Arc::new(MemoryStore::new()),
    }
}

/// Every key a tenant owns starts with this prefix
pub fn tenant_prefix(tenant_id: Uuid) -> String {
    format!("tenants/{}/", tenant_id)
}

/// Check a key's shape: relative, `/`-separated, no empty, `.` or `..` segments,
/// no backslashes or control characters.
pub fn validate_key_syntax(key: &str) -> Result<(), StorageError> {
    if key.is_empty() || key.len() > 1024 {
        return Err(StorageError::InvalidKey("key must be 1-1024 bytes".to_string()));
    }
    if key.starts_with('/') || key.contains('\\') || key.chars().any(|c| c.is_control()) {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    if key.split('/').any(|seg| seg.is_empty() || seg == "." || seg == "..") {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    Ok(())
}

/// A key is usable by a tenant when it is well formed and lives under the
/// tenant's prefix with at least one segment after it.
pub fn validate_tenant_key(tenant_id: Uuid, key: &str) -> Result<(), StorageError> {
    validate_key_syntax(key)?;
    let prefix = tenant_prefix(tenant_id);
    match key.strip_prefix(&prefix) {
        Some(rest) if !rest.is_empty() => Ok(()),
        _ => Err(StorageError::InvalidKey(format!("key must start with '{}'", prefix))),
    }
}

/// Hex SHA-256 with an algorithm prefix, e.g. `sha256:ab12...`
pub fn compute_checksum(data: &[u8]) -> String {
    format_checksum(Sha256::new_with_prefix(data))
}

/// Finish an incrementally fed hasher in the `compute_checksum` format
pub fn format_checksum(hasher: Sha256) -> String {
    format!("sha256:{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tenant_keys_must_sit_under_prefix() {
        let tenant = Uuid::new_v4();
        let other = Uuid::new_v4();
        let key = format!("tenants/{}/reports/q1.pdf", tenant);

        assert!(validate_tenant_key(tenant, &key).is_ok());
        assert!(validate_tenant_key(other, &key).is_err());
        assert!(validate_tenant_key(tenant, &tenant_prefix(tenant)).is_err());
    }

    #[test]
    fn traversal_and_odd_keys_are_rejected() {
        let tenant = Uuid::new_v4();
        for key in [
            format!("tenants/{}/../{}/x.pdf", tenant, Uuid::new_v4()),
            format!("/tenants/{}/x.pdf", tenant),
            format!("tenants/{}//x.pdf", tenant),
            format!("tenants/{}/a\\b.pdf", tenant),
            format!("tenants/{}/./x.pdf", tenant),
            String::new(),
        ] {
            assert!(validate_tenant_key(tenant, &key).is_err(), "accepted {:?}", key);
        }
    }

    #[test]
    fn checksum_is_prefixed_sha256() {
        assert_eq!(
            compute_checksum(b"abc"),
            "sha256:ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
