//! Record store for catalog images

pub mod memory;
pub mod repository;

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{ImagePatch, ImageRecord, NewImage};

pub use memory::MemoryImageStore;
pub use repository::PgImageStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Unavailable(err.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistent collection of image records.
///
/// Every operation is a single atomic statement against the backing store.
/// Failures are reported as [`StoreError::Unavailable`] and never retried.
#[async_trait]
pub trait ImageStore: Send + Sync {
    async fn create(&self, image: NewImage) -> StoreResult<ImageRecord>;

    /// All records in insertion order
    async fn list_all(&self) -> StoreResult<Vec<ImageRecord>>;

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<ImageRecord>>;

    /// Merge `patch` into the record and return the updated record, or `None` if `id` is unknown
    async fn update_by_id(&self, id: Uuid, patch: ImagePatch) -> StoreResult<Option<ImageRecord>>;

    /// Delete the first record whose `img_url` matches; reports whether one was removed
    async fn delete_by_url(&self, img_url: &str) -> StoreResult<bool>;

    async fn is_healthy(&self) -> bool;
}
