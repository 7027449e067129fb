use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A product image in the catalog.
///
/// Serialized with the document field names the storefront already consumes
/// (`_id`, `img_url`, `isOutstock`, `createdAt`, `updatedAt`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ImageRecord {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: Option<String>,
    pub price: Option<f64>,
    #[serde(rename = "isOutstock")]
    pub is_outstock: bool,
    pub img_url: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

/// Fields supplied when a record is created after a successful upload
#[derive(Debug, Clone, PartialEq)]
pub struct NewImage {
    pub name: Option<String>,
    pub price: Option<f64>,
    pub img_url: String,
}

/// Partial update; `None` leaves the stored value untouched
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImagePatch {
    pub name: Option<String>,
    pub price: Option<f64>,
    pub is_outstock: Option<bool>,
}

impl ImagePatch {
    pub fn stock(is_outstock: bool) -> Self {
        Self {
            is_outstock: Some(is_outstock),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.price.is_none() && self.is_outstock.is_none()
    }

    /// Merge the present fields into `record`
    pub fn apply(&self, record: &mut ImageRecord) {
        if let Some(name) = &self.name {
            record.name = Some(name.clone());
        }
        if let Some(price) = self.price {
            record.price = Some(price);
        }
        if let Some(is_outstock) = self.is_outstock {
            record.is_outstock = is_outstock;
        }
    }
}

// API Response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub status: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            status: true,
            message: None,
            data: Some(data),
            warning: None,
        }
    }

    pub fn success_with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            status: true,
            message: Some(message.into()),
            data: Some(data),
            warning: None,
        }
    }

    pub fn with_warning(mut self, warning: Option<String>) -> Self {
        self.warning = warning;
        self
    }
}

impl ApiResponse<()> {
    pub fn success_no_data(message: impl Into<String>) -> Self {
        Self {
            status: true,
            message: Some(message.into()),
            data: None,
            warning: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: false,
            message: Some(message.into()),
            data: None,
            warning: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record() -> ImageRecord {
        let now = Utc::now();
        ImageRecord {
            id: Uuid::new_v4(),
            name: Some("Sneaker".to_string()),
            price: Some(49.5),
            is_outstock: false,
            img_url: "https://res.cloudinary.com/demo/image/upload/v1/Akwara/abc123.jpg".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_record_uses_document_field_names() {
        let record = record();
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["_id"], record.id.to_string());
        assert_eq!(json["isOutstock"], false);
        assert_eq!(json["img_url"], record.img_url);
        assert!(json.get("createdAt").is_some());
        assert!(json.get("updatedAt").is_some());
        assert!(json.get("id").is_none());
    }

    #[test]
    fn test_patch_merges_only_present_fields() {
        let mut target = record();
        let original = target.clone();

        ImagePatch::stock(true).apply(&mut target);

        assert!(target.is_outstock);
        assert_eq!(target.name, original.name);
        assert_eq!(target.price, original.price);
        assert_eq!(target.img_url, original.img_url);
    }

    #[test]
    fn test_empty_patch() {
        assert!(ImagePatch::default().is_empty());
        assert!(!ImagePatch::stock(false).is_empty());
    }

    #[test]
    fn test_error_response_omits_data() {
        let json = serde_json::to_value(ApiResponse::error("Image not found")).unwrap();
        assert_eq!(json, serde_json::json!({ "status": false, "message": "Image not found" }));
    }
}
