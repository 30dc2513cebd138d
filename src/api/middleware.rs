//! API middleware
//!
//! Contains:
//! - `AppState`, the shared handles every handler receives
//! - `ApiError`, the JSON error body, with conversions from service errors
//! - Session extraction and the admin guard

use axum::{
    extract::{rejection::JsonRejection, FromRequestParts, Request, State},
    http::{header, request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

use crate::cache::Cache;
use crate::config::Config;
use crate::db::repositories::{
    RpcRepository, SqlxRpcRepository, SqlxSessionRepository, SqlxTableRepository, StoreError,
    TableRepository,
};
use crate::db::DynDatabasePool;
use crate::functions::{DynRemoteFunctions, FunctionError};
use crate::models::{Entity, FieldErrors, Profile};
use crate::services::{
    AuthError, AuthService, ContentError, ContentService, EmailError, EmailService, FormError,
    FormService, MediaError, MediaService, SettingsService,
};
use crate::storage::DynObjectStorage;

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub tables: Arc<dyn TableRepository>,
    pub cache: Arc<Cache>,
    pub rpc: Arc<dyn RpcRepository>,
    pub auth: Arc<AuthService>,
    pub forms: Arc<FormService>,
    pub media: Arc<MediaService>,
    pub email: Arc<EmailService>,
    pub settings: Arc<SettingsService>,
}

impl AppState {
    /// Wire repositories and services over one pool
    pub fn new(
        pool: DynDatabasePool,
        cache: Arc<Cache>,
        storage: DynObjectStorage,
        functions: DynRemoteFunctions,
        config: &Config,
    ) -> Self {
        let tables = SqlxTableRepository::boxed(pool.clone());
        let rpc = SqlxRpcRepository::boxed(pool.clone());
        let sessions = SqlxSessionRepository::boxed(pool);
        fn content<E: Entity>(
            tables: &Arc<dyn TableRepository>,
            cache: &Arc<Cache>,
        ) -> ContentService<E> {
            ContentService::new(tables.clone(), cache.clone())
        }
        let (t, c) = (&tables, &cache);

        let auth = AuthService::new(content(t, c), sessions, rpc.clone());
        let forms = FormService::new(
            content(t, c),
            content(t, c),
            content(t, c),
            content(t, c),
            rpc.clone(),
            config.contact.clone(),
        );
        let media = MediaService::new(content(t, c), storage, config.storage.clone());
        let email = EmailService::new(
            content(t, c),
            content(t, c),
            content(t, c),
            content(t, c),
            functions,
        );
        let settings = SettingsService::new(content(t, c));

        Self {
            tables,
            cache,
            rpc,
            auth: Arc::new(auth),
            forms: Arc::new(forms),
            media: Arc::new(media),
            email: Arc::new(email),
            settings: Arc::new(settings),
        }
    }

    /// Content service for any table
    pub fn content<E: Entity>(&self) -> ContentService<E> {
        ContentService::new(self.tables.clone(), self.cache.clone())
    }
}

/// Logged-in admin, set by [`require_admin`]
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub Profile);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))
    }
}

/// Error response for API errors
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
                details: Some(details),
            },
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("UNAUTHORIZED", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new("FORBIDDEN", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new("CONFLICT", message)
    }

    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Self::new("BAD_GATEWAY", message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message)
    }

    /// 400 listing each failing field under `details.fields`
    pub fn fields(errors: FieldErrors) -> Self {
        Self::with_details(
            "VALIDATION_ERROR",
            "Please correct the highlighted fields",
            json!({ "fields": errors }),
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.error.code.as_str() {
            "UNAUTHORIZED" => StatusCode::UNAUTHORIZED,
            "FORBIDDEN" => StatusCode::FORBIDDEN,
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "VALIDATION_ERROR" => StatusCode::BAD_REQUEST,
            "CONFLICT" => StatusCode::CONFLICT,
            "BAD_GATEWAY" => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(self)).into_response()
    }
}

impl From<FieldErrors> for ApiError {
    fn from(errors: FieldErrors) -> Self {
        ApiError::fields(errors)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::validation_error(rejection.body_text())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ContentError::from(err).into()
    }
}

impl From<ContentError> for ApiError {
    fn from(err: ContentError) -> Self {
        match err {
            ContentError::Validation(errors) => ApiError::fields(errors),
            ContentError::NotFound { .. } => ApiError::not_found(err.to_string()),
            ContentError::Conflict(_) => ApiError::conflict(err.to_string()),
            ContentError::Store(
                StoreError::UnknownColumn { .. } | StoreError::InvalidValue { .. },
            ) => ApiError::validation_error(err.to_string()),
            other => {
                tracing::error!("Request failed: {}", other);
                ApiError::internal_error(other.to_string())
            }
        }
    }
}

impl From<FunctionError> for ApiError {
    fn from(err: FunctionError) -> Self {
        ApiError::bad_gateway(err.to_string())
    }
}

impl From<FormError> for ApiError {
    fn from(err: FormError) -> Self {
        match err {
            FormError::Validation(errors) => ApiError::fields(errors),
            FormError::NotSubscribed(_) => ApiError::not_found(err.to_string()),
            FormError::Content(e) => e.into(),
            FormError::Backend(e) => {
                tracing::error!("Form submission failed: {:#}", e);
                ApiError::internal_error(e.to_string())
            }
        }
    }
}

impl From<MediaError> for ApiError {
    fn from(err: MediaError) -> Self {
        match err {
            MediaError::InvalidType(_) | MediaError::TooLarge { .. } | MediaError::Empty => {
                ApiError::validation_error(err.to_string())
            }
            MediaError::Content(e) => e.into(),
            MediaError::Storage(e) => ApiError::internal_error(e.to_string()),
        }
    }
}

impl From<EmailError> for ApiError {
    fn from(err: EmailError) -> Self {
        match err {
            EmailError::Validation(errors) => ApiError::fields(errors),
            EmailError::NoRecipients(_)
            | EmailError::NoContent(_)
            | EmailError::UnknownRecipientType(_) => ApiError::validation_error(err.to_string()),
            EmailError::Content(e) => e.into(),
            EmailError::Function(e) => e.into(),
            EmailError::Serialize(e) => ApiError::internal_error(e.to_string()),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials | AuthError::Unauthenticated => {
                ApiError::unauthorized(err.to_string())
            }
            AuthError::Forbidden => ApiError::forbidden(err.to_string()),
            AuthError::Content(e) => e.into(),
            other => {
                tracing::error!("Authentication failed: {}", other);
                ApiError::internal_error(other.to_string())
            }
        }
    }
}

/// Session token from `Authorization: Bearer` or the `session` cookie
pub fn extract_session_token(headers: &axum::http::HeaderMap) -> Option<String> {
    if let Some(auth_header) = headers.get(header::AUTHORIZATION) {
        if let Ok(auth_str) = auth_header.to_str() {
            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                return Some(token.to_string());
            }
        }
    }

    if let Some(cookie_header) = headers.get(header::COOKIE) {
        if let Ok(cookie_str) = cookie_header.to_str() {
            for cookie in cookie_str.split(';') {
                let cookie = cookie.trim();
                if let Some(token) = cookie.strip_prefix("session=") {
                    return Some(token.to_string());
                }
            }
        }
    }

    None
}

/// Admin authorization middleware
pub async fn require_admin(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_session_token(request.headers())
        .ok_or_else(|| ApiError::unauthorized("Missing authentication token"))?;

    let profile = state.auth.require_admin(&token).await?;

    request.extensions_mut().insert(AuthenticatedUser(profile));
    Ok(next.run(request).await)
}
