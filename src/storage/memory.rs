use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{compute_checksum, validate_key_syntax, ObjectMeta, ObjectStore, StorageError};

/// In-process store for development and tests
#[derive(Default)]
pub struct MemoryStore {
    objects: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn head(&self, key: &str) -> Result<Option<ObjectMeta>, StorageError> {
        validate_key_syntax(key)?;
        Ok(self.objects.read().await.get(key).map(|data| ObjectMeta {
            size: data.len() as u64,
            checksum: Some(compute_checksum(data)),
        }))
    }

    async fn put(&self, key: &str, data: &[u8]) -> Result<ObjectMeta, StorageError> {
        validate_key_syntax(key)?;
        self.objects.write().await.insert(key.to_string(), data.to_vec());
        Ok(ObjectMeta {
            size: data.len() as u64,
            checksum: Some(compute_checksum(data)),
        })
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        validate_key_syntax(key)?;
        match self.objects.write().await.remove(key) {
            Some(_) => Ok(()),
            None => Err(StorageError::NotFound(key.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_head_delete() {
        let store = MemoryStore::new();
        let key = "tenants/t/a.txt";

        assert_eq!(store.head(key).await.unwrap(), None);
        let meta = store.put(key, b"hello").await.unwrap();
        assert_eq!(meta.size, 5);
        assert_eq!(store.head(key).await.unwrap(), Some(meta));
        assert!(store.exists(key).await.unwrap());

        store.delete(key).await.unwrap();
        assert!(matches!(store.delete(key).await, Err(StorageError::NotFound(_))));
        assert_eq!(store.len().await, 0);
    }
}
