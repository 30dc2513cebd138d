//! Media library uploads
//!
//! Files in a batch are handled one after another: check type and size,
//! store the bytes under a generated name, resolve the public URL and
//! record a media row. A failing file is reported with its original name
//! and the rest of the batch carries on.

use super::content::{ContentError, ContentService};
use crate::config::StorageConfig;
use crate::models::media::CreateMediaInput;
use crate::models::MediaItem;
use crate::storage::{DynObjectStorage, StorageError};
use chrono::Utc;
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("File type {0} is not allowed")]
    InvalidType(String),

    #[error("File is too large ({size} bytes, max {max} bytes)")]
    TooLarge { size: u64, max: u64 },

    #[error("File is empty")]
    Empty,

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Content(#[from] ContentError),
}

/// A file received from the client
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub original_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
    /// Bytes received; an oversized part keeps its size but not its bytes
    pub size: u64,
}

impl UploadFile {
    pub fn new(
        original_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            original_name: original_name.into(),
            content_type: content_type.into(),
            size: bytes.len() as u64,
            bytes,
        }
    }
}

/// Outcome for one file of a batch
#[derive(Debug, Clone, Serialize)]
pub struct FileResult {
    pub original_name: String,
    pub uploaded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media: Option<MediaItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UploadBatch {
    pub files: Vec<FileResult>,
    pub uploaded: usize,
    pub failed: usize,
}

pub struct MediaService {
    media: ContentService<MediaItem>,
    storage: DynObjectStorage,
    config: StorageConfig,
}

impl MediaService {
    pub fn new(
        media: ContentService<MediaItem>,
        storage: DynObjectStorage,
        config: StorageConfig,
    ) -> Self {
        Self {
            media,
            storage,
            config,
        }
    }

    pub fn content(&self) -> &ContentService<MediaItem> {
        &self.media
    }

    /// Per-file limit in bytes
    pub fn max_file_size(&self) -> u64 {
        self.config.max_file_size
    }

    fn check(&self, file: &UploadFile) -> Result<(), MediaError> {
        if !self.config.is_type_allowed(&file.content_type) {
            return Err(MediaError::InvalidType(file.content_type.clone()));
        }
        let size = file.size;
        if size == 0 {
            return Err(MediaError::Empty);
        }
        if size > self.config.max_file_size {
            return Err(MediaError::TooLarge {
                size,
                max: self.config.max_file_size,
            });
        }
        Ok(())
    }

    pub async fn upload(&self, file: UploadFile, folder: Option<&str>) -> Result<MediaItem, MediaError> {
        self.check(&file)?;

        let object = object_name(&file.original_name, &file.content_type);
        self.storage
            .upload(&object, &file.bytes, &file.content_type)
            .await?;
        let url = self.storage.public_url(&object);

        let input = CreateMediaInput {
            filename: object.clone(),
            original_name: file.original_name,
            url,
            storage_path: format!("{}/{}", self.storage.bucket(), object),
            mime_type: file.content_type,
            size_bytes: file.size as i64,
            alt_text: None,
            folder: folder.map(str::to_string),
            metadata: None,
        };
        Ok(self.media.create(input).await?)
    }

    /// Upload files in order; each gets its own result
    pub async fn upload_batch(&self, files: Vec<UploadFile>, folder: Option<&str>) -> UploadBatch {
        let mut results = Vec::with_capacity(files.len());
        for file in files {
            let original_name = file.original_name.clone();
            match self.upload(file, folder).await {
                Ok(media) => results.push(FileResult {
                    original_name,
                    uploaded: true,
                    media: Some(media),
                    error: None,
                }),
                Err(e) => {
                    tracing::warn!("Upload of {} failed: {}", original_name, e);
                    results.push(FileResult {
                        original_name,
                        uploaded: false,
                        media: None,
                        error: Some(e.to_string()),
                    });
                }
            }
        }

        let uploaded = results.iter().filter(|r| r.uploaded).count();
        let failed = results.len() - uploaded;
        tracing::info!("Media batch finished: {} uploaded, {} failed", uploaded, failed);
        UploadBatch {
            files: results,
            uploaded,
            failed,
        }
    }
}

/// `<timestamp_ms>-<random>.<ext>`
pub fn object_name(original_name: &str, content_type: &str) -> String {
    let random = uuid::Uuid::new_v4().simple().to_string();
    format!(
        "{}-{}.{}",
        Utc::now().timestamp_millis(),
        &random[..8],
        file_extension(original_name, content_type)
    )
}

/// Extension from the file name, else from the content type
pub fn file_extension(filename: &str, content_type: &str) -> String {
    if let Some((_, ext)) = filename.rsplit_once('.') {
        if !ext.is_empty() && ext.len() < 10 && ext.chars().all(|c| c.is_ascii_alphanumeric()) {
            return ext.to_lowercase();
        }
    }

    match content_type {
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "image/svg+xml" => "svg",
        "video/mp4" => "mp4",
        "application/pdf" => "pdf",
        _ => "bin",
    }
    .to_string()
}
