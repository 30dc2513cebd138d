//! Media library entries

use super::fields::nullable;
use super::validation::{FieldErrors, Validate};
use super::Entity;
use crate::db::schema::{TableDef, MEDIA};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A file stored in the media bucket
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MediaItem {
    pub id: String,
    /// Generated object name (`<timestamp_ms>-<random>.<ext>`)
    pub filename: String,
    /// Name of the file on the uploader's machine
    pub original_name: String,
    pub url: String,
    pub storage_path: String,
    pub mime_type: String,
    pub size_bytes: i64,
    pub alt_text: Option<String>,
    pub folder: String,
    #[serde(default)]
    pub metadata: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateMediaInput {
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub original_name: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub storage_path: String,
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub size_bytes: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

/// Only descriptive fields of a stored file can change
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateMediaInput {
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub alt_text: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl Validate for CreateMediaInput {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.required("filename", &self.filename);
        errors.required("original_name", &self.original_name);
        errors.required("url", &self.url);
        errors.required("storage_path", &self.storage_path);
        errors.required("mime_type", &self.mime_type);
        if self.size_bytes < 0 {
            errors.add("size_bytes", "Size cannot be negative");
        }
        errors.into_result()
    }
}

impl Validate for UpdateMediaInput {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.not_blank("folder", self.folder.as_deref());
        errors.into_result()
    }
}

impl Entity for MediaItem {
    type Create = CreateMediaInput;
    type Update = UpdateMediaInput;
    const TABLE: &'static TableDef = &MEDIA;

    fn id(&self) -> &str {
        &self.id
    }
}
