//! Authentication API endpoints
//!
//! Handles HTTP requests for console sign-in:
//! - POST /api/v1/auth/login - Start a session
//! - POST /api/v1/auth/logout - End the current session
//! - GET /api/v1/auth/me - Current profile
//!
//! The session token is returned in the body and set as an HttpOnly
//! `session` cookie; either form is accepted on later requests.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use crate::api::middleware::{extract_session_token, ApiError, AppState};
use crate::models::{Profile, SESSION_TTL_DAYS};
use crate::services::{LoginInput, LoginResult};

const CLEAR_SESSION_COOKIE: &str = "session=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0";

/// Build the auth router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/me", get(me))
}

fn session_cookie(token: &str) -> Result<HeaderValue, ApiError> {
    let cookie = format!(
        "session={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        token,
        SESSION_TTL_DAYS * 24 * 60 * 60
    );
    HeaderValue::from_str(&cookie)
        .map_err(|e| ApiError::internal_error(format!("Invalid session cookie: {}", e)))
}

/// POST /api/v1/auth/login
async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginInput>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(input) = payload?;
    let result: LoginResult = state.auth.login(input).await?;

    let mut headers = HeaderMap::new();
    headers.insert(header::SET_COOKIE, session_cookie(&result.token)?);
    Ok((headers, Json(result)))
}

/// POST /api/v1/auth/logout
async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(token) = extract_session_token(&headers) {
        state.auth.logout(&token).await?;
    }

    let mut response_headers = HeaderMap::new();
    response_headers.insert(
        header::SET_COOKIE,
        HeaderValue::from_static(CLEAR_SESSION_COOKIE),
    );
    Ok((StatusCode::NO_CONTENT, response_headers))
}

/// GET /api/v1/auth/me
async fn me(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<Profile>, ApiError> {
    let token = extract_session_token(&headers)
        .ok_or_else(|| ApiError::unauthorized("Missing authentication token"))?;
    Ok(Json(state.auth.me(&token).await?))
}
