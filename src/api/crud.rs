//! Generic admin CRUD endpoints
//!
//! Every console table is served by the same five handlers:
//! - GET    /            list (`?search=` and `?filter=`)
//! - POST   /            create, 201 with the stored row
//! - GET    /{id}        fetch one row
//! - PUT    /{id}        partial update (PATCH is accepted too)
//! - DELETE /{id}        delete, 204

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{ApiError, AppState};
use crate::db::repositories::ListQuery;
use crate::models::Entity;
use crate::services::empty_state_message;

/// Query parameters for list screens
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub search: Option<String>,
    /// Value for the table's filter column; `all` means no filter
    #[serde(default)]
    pub filter: Option<String>,
    /// Screen-specific names for the filter, used when `filter` is absent
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub limit: Option<i64>,
}

impl ListParams {
    /// `filter`, else `category`, else `status`
    pub fn filter_value(&self) -> Option<&str> {
        self.filter
            .as_deref()
            .or(self.category.as_deref())
            .or(self.status.as_deref())
    }

    pub fn is_searching(&self) -> bool {
        self.search.as_deref().is_some_and(|s| !s.trim().is_empty())
            || self
                .filter_value()
                .is_some_and(|f| !f.trim().is_empty() && !f.eq_ignore_ascii_case("all"))
    }

    pub fn to_query(&self) -> ListQuery {
        let query = ListQuery::new(self.search.clone(), self.filter_value().map(str::to_string));
        match self.limit {
            Some(limit) if limit > 0 => query.with_limit(limit),
            _ => query,
        }
    }
}

/// Response for list endpoints
#[derive(Debug, Serialize, Deserialize)]
pub struct ListResponse<T> {
    pub items: Vec<T>,
    pub total: usize,
    /// Set when `items` is empty
    #[serde(skip_serializing_if = "Option::is_none")]
    pub empty_message: Option<String>,
}

impl<T> ListResponse<T> {
    pub fn new(items: Vec<T>, label: &str, searching: bool) -> Self {
        let empty_message = items
            .is_empty()
            .then(|| empty_state_message(label, searching));
        Self {
            total: items.len(),
            items,
            empty_message,
        }
    }
}

/// Build the CRUD router for one table; `label` names its rows in
/// empty-state messages
pub fn crud_router<E: Entity>(label: &'static str) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(move |state: State<AppState>, query: Query<ListParams>| {
                list::<E>(state, query, label)
            })
            .post(create::<E>),
        )
        .route(
            "/{id}",
            get(get_one::<E>)
                .put(update::<E>)
                .patch(update::<E>)
                .delete(remove::<E>),
        )
}

async fn list<E: Entity>(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
    label: &'static str,
) -> Result<Json<ListResponse<E>>, ApiError> {
    let items = state.content::<E>().list(&params.to_query()).await?;
    Ok(Json(ListResponse::new(items, label, params.is_searching())))
}

async fn get_one<E: Entity>(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<E>, ApiError> {
    Ok(Json(state.content::<E>().get(&id).await?))
}

async fn create<E: Entity>(
    State(state): State<AppState>,
    payload: Result<Json<E::Create>, JsonRejection>,
) -> Result<(StatusCode, Json<E>), ApiError> {
    let Json(input) = payload?;
    let created = state.content::<E>().create(input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update<E: Entity>(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<E::Update>, JsonRejection>,
) -> Result<Json<E>, ApiError> {
    let Json(patch) = payload?;
    Ok(Json(state.content::<E>().update(&id, patch).await?))
}

async fn remove<E: Entity>(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.content::<E>().delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
