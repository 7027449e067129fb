use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{ImageStore, StoreError, StoreResult};
use crate::models::{ImagePatch, ImageRecord, NewImage};

/// In-process image store for tests and database-less local runs.
///
/// Records are kept in insertion order. Marking the store unavailable makes
/// every operation fail the way a lost database connection would.
#[derive(Debug)]
pub struct MemoryImageStore {
    records: RwLock<Vec<ImageRecord>>,
    available: AtomicBool,
}

impl Default for MemoryImageStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryImageStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
            available: AtomicBool::new(true),
        }
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    fn check_available(&self) -> StoreResult<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }
    }
}

#[async_trait]
impl ImageStore for MemoryImageStore {
    async fn create(&self, image: NewImage) -> StoreResult<ImageRecord> {
        self.check_available()?;

        let now = Utc::now();
        let record = ImageRecord {
            id: Uuid::new_v4(),
            name: image.name,
            price: image.price,
            is_outstock: false,
            img_url: image.img_url,
            created_at: now,
            updated_at: now,
        };

        self.records.write().await.push(record.clone());
        Ok(record)
    }

    async fn list_all(&self) -> StoreResult<Vec<ImageRecord>> {
        self.check_available()?;
        Ok(self.records.read().await.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<ImageRecord>> {
        self.check_available()?;
        Ok(self.records.read().await.iter().find(|r| r.id == id).cloned())
    }

    async fn update_by_id(&self, id: Uuid, patch: ImagePatch) -> StoreResult<Option<ImageRecord>> {
        self.check_available()?;

        let mut records = self.records.write().await;
        let Some(record) = records.iter_mut().find(|r| r.id == id) else {
            return Ok(None);
        };

        patch.apply(record);
        record.updated_at = Utc::now();
        Ok(Some(record.clone()))
    }

    async fn delete_by_url(&self, img_url: &str) -> StoreResult<bool> {
        self.check_available()?;

        let mut records = self.records.write().await;
        match records.iter().position(|r| r.img_url == img_url) {
            Some(index) => {
                records.remove(index);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn is_healthy(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }
}
