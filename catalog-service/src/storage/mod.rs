// Storage module for the remote image host

pub mod cloudinary;

use std::fmt;

use async_trait::async_trait;
use bytes::Bytes;

pub use cloudinary::CloudinaryStorage;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("Storage configuration error: {0}")]
    Config(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Remote object storage for uploaded images
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BlobStorage: Send + Sync {
    /// Store `blob` under the configured folder and return its public URL
    async fn upload(&self, blob: Bytes) -> StorageResult<String>;

    /// Remove the object named by `id` (see [`derive_id`])
    async fn delete(&self, id: &StorageId) -> StorageResult<()>;
}

/// Resource type assumed when the URL does not carry one
pub const DEFAULT_RESOURCE_TYPE: &str = "image";

/// Identifier of a remote object, recovered from its public URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageId {
    /// Remote object name, without folder or extension
    pub name: String,
    /// Kind of resource the host filed the object under (`image`, `video`, `raw`)
    pub resource_type: String,
}

impl fmt::Display for StorageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.resource_type, self.name)
    }
}

/// Recover the storage identifier from a URL returned by [`BlobStorage::upload`].
///
/// The name is the last path segment with the extension stripped at its last
/// `.`; a segment without `.` is used whole. The resource type is the path
/// segment right before `upload` (`.../video/upload/v1/...`), or
/// [`DEFAULT_RESOURCE_TYPE`] when the URL has no such segment.
pub fn derive_id(url: &str) -> StorageId {
    let filename = url.rsplit('/').next().unwrap_or(url);

    let name = match filename.rsplit_once('.') {
        Some((stem, _extension)) => stem,
        None => filename,
    };

    let segments: Vec<&str> = url.split('/').collect();
    let resource_type = segments
        .windows(2)
        .find(|pair| pair[1] == "upload" && !pair[0].is_empty())
        .map(|pair| pair[0])
        .unwrap_or(DEFAULT_RESOURCE_TYPE);

    StorageId {
        name: name.to_string(),
        resource_type: resource_type.to_string(),
    }
}
