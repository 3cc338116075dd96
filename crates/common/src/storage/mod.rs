//! File storage contract for challenge photos
//!
//! Signing and serving uploaded bytes belong to the hosting platform. This
//! module hands out upload tickets and resolves storage ids to URLs. Issued
//! ids are recorded in the shared key-value store so they resolve across
//! restarts and gateway instances.

use crate::cache::{keys, KeyValueStore};
use crate::config::StorageConfig;
use crate::errors::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Where and until when a client may upload one file
#[derive(Debug, Clone, Serialize)]
pub struct UploadTicket {
    pub storage_id: Uuid,
    pub upload_url: String,
    pub expires_at: DateTime<Utc>,
}

#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Reserve a storage id and return where to upload it
    async fn generate_upload_url(&self) -> Result<UploadTicket>;

    /// Resolve a storage id to a retrievable URL, `None` if unknown
    async fn get_url(&self, storage_id: Uuid) -> Result<Option<String>>;
}

/// Storage backed by a bucket served under a public base URL
pub struct BucketStorage {
    base_url: String,
    upload_ttl: Duration,
    kv: Arc<dyn KeyValueStore>,
}

impl BucketStorage {
    pub fn new(config: &StorageConfig, kv: Arc<dyn KeyValueStore>) -> Self {
        Self {
            base_url: config.public_base_url.trim_end_matches('/').to_string(),
            upload_ttl: Duration::seconds(config.upload_ttl_secs as i64),
            kv,
        }
    }
}

#[async_trait]
impl FileStorage for BucketStorage {
    async fn generate_upload_url(&self) -> Result<UploadTicket> {
        let storage_id = Uuid::new_v4();
        let issued_at = Utc::now();

        self.kv
            .set(&keys::storage_file(storage_id), issued_at.to_rfc3339())
            .await?;

        let ticket = UploadTicket {
            storage_id,
            upload_url: format!("{}/upload/{}", self.base_url, storage_id),
            expires_at: issued_at + self.upload_ttl,
        };

        debug!(storage_id = %storage_id, "Upload ticket issued");
        Ok(ticket)
    }

    async fn get_url(&self, storage_id: Uuid) -> Result<Option<String>> {
        if self.kv.get(&keys::storage_file(storage_id)).await?.is_none() {
            return Ok(None);
        }
        Ok(Some(format!("{}/{}", self.base_url, storage_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryStore;

    fn config() -> StorageConfig {
        StorageConfig {
            public_base_url: "https://files.example.com/".to_string(),
            upload_ttl_secs: 60,
        }
    }

    fn storage() -> BucketStorage {
        BucketStorage::new(&config(), Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn test_ticket_resolves_to_url() {
        let storage = storage();
        let ticket = storage.generate_upload_url().await.unwrap();

        assert_eq!(
            ticket.upload_url,
            format!("https://files.example.com/upload/{}", ticket.storage_id)
        );
        assert!(ticket.expires_at > Utc::now());
        assert_eq!(
            storage.get_url(ticket.storage_id).await.unwrap(),
            Some(format!("https://files.example.com/{}", ticket.storage_id))
        );
    }

    #[tokio::test]
    async fn test_unknown_id_resolves_to_none() {
        assert_eq!(storage().get_url(Uuid::new_v4()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_ids_survive_a_new_storage_instance() {
        let kv: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let ticket = BucketStorage::new(&config(), kv.clone())
            .generate_upload_url()
            .await
            .unwrap();

        let restarted = BucketStorage::new(&config(), kv);
        assert_eq!(
            restarted.get_url(ticket.storage_id).await.unwrap(),
            Some(format!("https://files.example.com/{}", ticket.storage_id))
        );
    }
}
