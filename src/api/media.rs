//! Media library upload endpoint
//!
//! POST /api/v1/admin/media/upload takes multipart/form-data with one or
//! more `files` parts and an optional `folder` text part. Files are stored
//! one by one; the response reports each file separately.
//!
//! The request as a whole is capped by `storage.max_batch_size`. Each part
//! is streamed and stops being buffered past `storage.max_file_size`, so an
//! oversized file fails on its own while the rest of the batch is stored.

use axum::{
    extract::{multipart::Field, DefaultBodyLimit, Multipart, State},
    routing::post,
    Json, Router,
};

use crate::api::middleware::{ApiError, AppState};
use crate::services::{UploadBatch, UploadFile};

/// Multipart overhead allowed on top of the file payload
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

/// Upload routes; `max_body` caps the whole request, all files together
pub fn router(max_body: usize) -> Router<AppState> {
    Router::new()
        .route("/upload", post(upload_media))
        .layer(DefaultBodyLimit::max(max_body.saturating_add(FORM_OVERHEAD_BYTES)))
}

async fn upload_media(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadBatch>, ApiError> {
    let max_file_size = state.media.max_file_size();
    let mut files = Vec::new();
    let mut folder: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation_error(format!("Failed to read multipart: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "folder" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::validation_error(format!("Invalid folder: {}", e)))?;
                folder = Some(text.trim().to_string()).filter(|f| !f.is_empty());
            }
            "files" | "file" => files.push(read_file(field, max_file_size).await?),
            _ => continue,
        }
    }

    if files.is_empty() {
        return Err(ApiError::validation_error("No files were provided"));
    }

    Ok(Json(state.media.upload_batch(files, folder.as_deref()).await))
}

/// Stream one file part, buffering at most `limit` bytes.
///
/// Past the limit the rest of the part is still read through, counted and
/// dropped, so the next part can follow.
async fn read_file(mut field: Field<'_>, limit: u64) -> Result<UploadFile, ApiError> {
    let original_name = field
        .file_name()
        .map(|s| s.to_string())
        .unwrap_or_else(|| "unknown".to_string());
    let content_type = field
        .content_type()
        .map(|s| s.to_string())
        .unwrap_or_else(|| "application/octet-stream".to_string());

    let mut bytes = Vec::new();
    let mut size: u64 = 0;
    while let Some(chunk) = field.chunk().await.map_err(|e| {
        ApiError::validation_error(format!("Failed to read {}: {}", original_name, e))
    })? {
        size += chunk.len() as u64;
        if size <= limit {
            bytes.extend_from_slice(&chunk);
        } else if !bytes.is_empty() {
            bytes = Vec::new();
        }
    }

    if size > limit {
        tracing::debug!("{} exceeds the file size limit ({} bytes)", original_name, size);
    }
    Ok(UploadFile {
        original_name,
        content_type,
        bytes,
        size,
    })
}

#[cfg(test)]
mod tests {
    use crate::api::testing::{test_app, test_app_with};
    use axum::http::StatusCode;
    use axum_test::multipart::{MultipartForm, Part};
    use serde_json::Value;

    #[tokio::test]
    async fn test_batch_upload_reports_each_file() {
        let app = test_app().await;
        let token = app.admin_token().await;

        let form = MultipartForm::new()
            .add_text("folder", "products")
            .add_part(
                "files",
                Part::bytes(b"\x89PNG fake image".to_vec())
                    .file_name("cumin.png")
                    .mime_type("image/png"),
            )
            .add_part(
                "files",
                Part::bytes(b"plain notes".to_vec())
                    .file_name("notes.txt")
                    .mime_type("text/plain"),
            );

        let response = app
            .server
            .post("/api/v1/admin/media/upload")
            .authorization_bearer(&token)
            .multipart(form)
            .await;

        assert_eq!(response.status_code(), StatusCode::OK);
        let body = response.json::<Value>();
        assert_eq!(body["uploaded"], 1);
        assert_eq!(body["failed"], 1);

        let stored = &body["files"][0]["media"];
        assert_eq!(stored["original_name"], "cumin.png");
        assert_eq!(stored["folder"], "products");
        assert_eq!(stored["mime_type"], "image/png");
        let filename = stored["filename"].as_str().unwrap();
        assert!(filename.ends_with(".png"));
        assert!(app
            .storage_dir
            .path()
            .join("media-library")
            .join(filename)
            .exists());

        assert_eq!(body["files"][1]["uploaded"], false);
        assert!(body["files"][1]["error"].as_str().is_some());
    }

    const KB: usize = 1024;

    fn png_part(name: &str, len: usize) -> Part {
        Part::bytes(vec![0x42; len]).file_name(name).mime_type("image/png")
    }

    /// 100 KB per file, 1 MB per request
    async fn small_limits_app() -> crate::api::testing::TestApp {
        test_app_with(|config| {
            config.storage.max_file_size = 100 * KB as u64;
            config.storage.max_batch_size = 1024 * KB as u64;
        })
        .await
    }

    #[tokio::test]
    async fn test_batch_larger_than_one_file_limit_is_accepted() {
        let app = small_limits_app().await;
        let token = app.admin_token().await;

        let form = MultipartForm::new()
            .add_part("files", png_part("first.png", 90 * KB))
            .add_part("files", png_part("second.png", 90 * KB));
        let response = app
            .server
            .post("/api/v1/admin/media/upload")
            .authorization_bearer(&token)
            .multipart(form)
            .await;

        assert_eq!(response.status_code(), StatusCode::OK);
        let body = response.json::<Value>();
        assert_eq!(body["uploaded"], 2);
        assert_eq!(body["failed"], 0);
        assert_eq!(body["files"][1]["media"]["size_bytes"], 90 * KB);
    }

    #[tokio::test]
    async fn test_oversized_file_fails_alone() {
        let app = small_limits_app().await;
        let token = app.admin_token().await;

        let form = MultipartForm::new()
            .add_part("files", png_part("ok-1.png", 90 * KB))
            .add_part("files", png_part("too-big.png", 150 * KB))
            .add_part("files", png_part("ok-2.png", 90 * KB));
        let response = app
            .server
            .post("/api/v1/admin/media/upload")
            .authorization_bearer(&token)
            .multipart(form)
            .await;

        assert_eq!(response.status_code(), StatusCode::OK);
        let body = response.json::<Value>();
        assert_eq!(body["uploaded"], 2);
        assert_eq!(body["failed"], 1);

        let files = body["files"].as_array().unwrap();
        let names: Vec<_> = files.iter().map(|f| f["original_name"].as_str().unwrap()).collect();
        assert_eq!(names, vec!["ok-1.png", "too-big.png", "ok-2.png"]);
        assert_eq!(files[0]["uploaded"], true);
        assert_eq!(files[1]["uploaded"], false);
        assert!(files[1]["error"].as_str().unwrap().contains("too large"));
        assert_eq!(files[2]["uploaded"], true);

        let stored = app
            .storage_dir
            .path()
            .join("media-library")
            .read_dir()
            .unwrap()
            .count();
        assert_eq!(stored, 2);
    }

    #[tokio::test]
    async fn test_request_over_batch_limit_is_rejected() {
        let app = small_limits_app().await;
        let token = app.admin_token().await;

        let mut form = MultipartForm::new();
        for i in 0..12 {
            form = form.add_part("files", png_part(&format!("part-{i}.png"), 95 * KB));
        }
        let response = app
            .server
            .post("/api/v1/admin/media/upload")
            .authorization_bearer(&token)
            .multipart(form)
            .await;
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_upload_requires_admin() {
        let app = test_app().await;
        let form = MultipartForm::new().add_part(
            "files",
            Part::bytes(b"data".to_vec())
                .file_name("a.png")
                .mime_type("image/png"),
        );
        let response = app
            .server
            .post("/api/v1/admin/media/upload")
            .multipart(form)
            .await;
        assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_upload_without_files_is_rejected() {
        let app = test_app().await;
        let token = app.admin_token().await;
        let response = app
            .server
            .post("/api/v1/admin/media/upload")
            .authorization_bearer(&token)
            .multipart(MultipartForm::new().add_text("folder", "empty"))
            .await;
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    }
}
