// Cloudinary client implementation

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use reqwest::{multipart, Client};
use serde::Deserialize;
use sha1::{Digest, Sha1};
use tracing::{debug, info, warn};

use super::{BlobStorage, StorageError, StorageId, StorageResult};
use crate::config::StorageConfig;

/// Uploads and destroys images through the Cloudinary REST API
pub struct CloudinaryStorage {
    http_client: Client,
    api_base: String,
    cloud_name: String,
    api_key: String,
    api_secret: String,
    folder: String,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl CloudinaryStorage {
    pub fn new(config: &StorageConfig) -> StorageResult<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("catalog-service/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| StorageError::Config(e.to_string()))?;

        Ok(Self {
            http_client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            cloud_name: config.cloud_name.clone(),
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
            folder: config.folder.clone(),
        })
    }

    /// Sign request parameters: sorted `key=value` pairs joined by `&`, secret appended, SHA-1 hex
    pub fn sign(params: &[(&str, &str)], api_secret: &str) -> String {
        let mut signed: Vec<&(&str, &str)> = params.iter().filter(|(_, v)| !v.is_empty()).collect();
        signed.sort_by(|a, b| a.0.cmp(b.0));

        let to_sign = signed
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&");

        let mut hasher = Sha1::new();
        hasher.update(to_sign.as_bytes());
        hasher.update(api_secret.as_bytes());
        hex::encode(hasher.finalize())
    }

    fn endpoint(&self, resource_type: &str, action: &str) -> String {
        format!("{}/{}/{}/{}", self.api_base, self.cloud_name, resource_type, action)
    }

    /// Uploads land under the folder, so the remote public id carries it as a prefix
    fn public_id(&self, identifier: &str) -> String {
        if self.folder.is_empty() {
            identifier.to_string()
        } else {
            format!("{}/{}", self.folder, identifier)
        }
    }

    async fn error_message(response: reqwest::Response) -> String {
        let status = response.status();
        match response.json::<ErrorEnvelope>().await {
            Ok(envelope) => envelope.error.message,
            Err(_) => format!("remote storage responded with {}", status),
        }
    }
}

#[async_trait]
impl BlobStorage for CloudinaryStorage {
    async fn upload(&self, blob: Bytes) -> StorageResult<String> {
        let timestamp = Utc::now().timestamp().to_string();
        let signature = Self::sign(
            &[("folder", self.folder.as_str()), ("timestamp", timestamp.as_str())],
            &self.api_secret,
        );

        debug!(bytes = blob.len(), folder = %self.folder, "Uploading image to Cloudinary");

        let mut form = multipart::Form::new()
            .part("file", multipart::Part::bytes(blob.to_vec()).file_name("upload"))
            .text("timestamp", timestamp)
            .text("api_key", self.api_key.clone())
            .text("signature", signature);
        if !self.folder.is_empty() {
            form = form.text("folder", self.folder.clone());
        }

        let response = self
            .http_client
            .post(self.endpoint("auto", "upload"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| StorageError::UploadFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(StorageError::UploadFailed(Self::error_message(response).await));
        }

        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| StorageError::UploadFailed(format!("Invalid upload response: {}", e)))?;

        info!(url = %body.secure_url, "Image uploaded to Cloudinary");
        Ok(body.secure_url)
    }

    async fn delete(&self, id: &StorageId) -> StorageResult<()> {
        let public_id = self.public_id(&id.name);
        let timestamp = Utc::now().timestamp().to_string();
        let signature = Self::sign(
            &[("public_id", public_id.as_str()), ("timestamp", timestamp.as_str())],
            &self.api_secret,
        );

        let params = [
            ("public_id", public_id.clone()),
            ("timestamp", timestamp),
            ("api_key", self.api_key.clone()),
            ("signature", signature),
        ];

        let response = self
            .http_client
            .post(self.endpoint(&id.resource_type, "destroy"))
            .form(&params)
            .send()
            .await
            .map_err(|e| StorageError::DeleteFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(StorageError::DeleteFailed(Self::error_message(response).await));
        }

        let body: DestroyResponse = response
            .json()
            .await
            .map_err(|e| StorageError::DeleteFailed(format!("Invalid destroy response: {}", e)))?;

        if body.result != "ok" {
            warn!(public_id = %public_id, result = %body.result, "Cloudinary did not destroy image");
            return Err(StorageError::DeleteFailed(format!("{} ({})", body.result, public_id)));
        }

        info!(public_id = %public_id, "Image removed from Cloudinary");
        Ok(())
    }
}
