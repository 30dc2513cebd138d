//! Public site endpoints
//!
//! Read-only views of published content:
//! - GET  /api/v1/health
//! - GET  /api/v1/settings                       public settings map
//! - GET  /api/v1/{products,categories,...}      published rows
//! - GET  /api/v1/farmer-stories, /gallery       filtered with `search` and `category`
//! - GET  /api/v1/farmer-stories/lightbox        `?index=` within the filtered list
//! - GET  /api/v1/blog/{slug}                    one published post
//! - POST /api/v1/blog/{slug}/view               bump the view counter

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::api::crud::{ListParams, ListResponse};
use crate::api::middleware::{ApiError, AppState};
use crate::db::repositories::ListQuery;
use crate::models::{
    BlogPost, Category, CropPortfolio, Entity, FarmerStory, GalleryImage, PortfolioVideo, Product,
    RajasthanStory, TeamMember, Testimonial,
};
use crate::services::{filter_rows, Browsable, Lightbox};

/// Where a missing blog post sends the reader
pub const BLOG_INDEX_PATH: &str = "/agri/blog";

/// Build the public router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/settings", get(public_settings))
        .route("/categories", public_list::<Category>("categories"))
        .route("/products", public_list::<Product>("products"))
        .route("/testimonials", public_list::<Testimonial>("testimonials"))
        .route("/team", public_list::<TeamMember>("team members"))
        .route("/crop-portfolio", public_list::<CropPortfolio>("crops"))
        .route("/portfolio-videos", public_list::<PortfolioVideo>("videos"))
        .route("/rajasthan-stories", public_list::<RajasthanStory>("stories"))
        .route("/blog", public_list::<BlogPost>("posts"))
        .route("/blog/{slug}", get(get_blog_post))
        .route("/blog/{slug}/view", post(record_blog_view))
        .route("/farmer-stories", browse_list::<FarmerStory>("farmer stories"))
        .route("/farmer-stories/lightbox", get(lightbox::<FarmerStory>))
        .route("/gallery", browse_list::<GalleryImage>("images"))
        .route("/gallery/lightbox", get(lightbox::<GalleryImage>))
}

fn public_list<E: Entity>(label: &'static str) -> axum::routing::MethodRouter<AppState> {
    get(
        move |State(state): State<AppState>, Query(params): Query<ListParams>| async move {
            let items = state.content::<E>().list_public(&params.to_query()).await?;
            Ok::<_, ApiError>(Json(ListResponse::new(items, label, params.is_searching())))
        },
    )
}

/// Query parameters for filtered galleries
#[derive(Debug, Default, Deserialize)]
pub struct BrowseParams {
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub category: String,
}

impl BrowseParams {
    fn is_searching(&self) -> bool {
        !self.search.trim().is_empty()
            || !(self.category.trim().is_empty() || self.category.trim().eq_ignore_ascii_case("all"))
    }
}

async fn browse_rows<E: Entity + Browsable>(
    state: &AppState,
    search: &str,
    category: &str,
) -> Result<Vec<E>, ApiError> {
    let rows = state.content::<E>().list_public(&ListQuery::default()).await?;
    Ok(filter_rows(&rows, search, category))
}

fn browse_list<E: Entity + Browsable>(label: &'static str) -> axum::routing::MethodRouter<AppState> {
    get(
        move |State(state): State<AppState>, Query(params): Query<BrowseParams>| async move {
            let items = browse_rows::<E>(&state, &params.search, &params.category).await?;
            Ok::<_, ApiError>(Json(ListResponse::new(items, label, params.is_searching())))
        },
    )
}

/// Position plus the same filters as the list it was opened from
#[derive(Debug, Deserialize)]
pub struct LightboxParams {
    #[serde(default)]
    pub index: usize,
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub category: String,
}

/// One item of a filtered list with its neighbours
#[derive(Debug, Serialize)]
pub struct LightboxResponse<T> {
    pub item: T,
    pub index: usize,
    pub total: usize,
    pub prev_index: usize,
    pub next_index: usize,
}

async fn lightbox<E: Entity + Browsable>(
    State(state): State<AppState>,
    Query(params): Query<LightboxParams>,
) -> Result<Json<LightboxResponse<E>>, ApiError> {
    let mut rows = browse_rows::<E>(&state, &params.search, &params.category).await?;
    let view = Lightbox::open(params.index, rows.len()).ok_or_else(|| {
        ApiError::not_found(format!("No item at position {}", params.index))
    })?;

    Ok(Json(LightboxResponse {
        item: rows.swap_remove(view.index),
        index: view.index,
        total: view.len,
        prev_index: view.prev_index(),
        next_index: view.next_index(),
    }))
}

/// GET /api/v1/blog/{slug}
async fn get_blog_post(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<BlogPost>, ApiError> {
    state
        .content::<BlogPost>()
        .find_by("slug", slug.as_str())
        .await?
        .filter(BlogPost::is_published)
        .map(Json)
        .ok_or_else(|| {
            ApiError::with_details(
                "NOT_FOUND",
                format!("Blog post not found: {}", slug),
                json!({ "back": BLOG_INDEX_PATH }),
            )
        })
}

/// POST /api/v1/blog/{slug}/view
async fn record_blog_view(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let counted = state
        .rpc
        .increment_blog_view_count(&slug)
        .await
        .map_err(|e| ApiError::internal_error(e.to_string()))?;
    if counted {
        state.content::<BlogPost>().invalidate().await;
    }
    Ok(Json(json!({ "counted": counted })))
}

async fn public_settings(State(state): State<AppState>) -> Result<Json<Map<String, Value>>, ApiError> {
    Ok(Json(state.settings.public_settings().await?))
}

async fn health(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    state
        .rpc
        .keep_database_warm()
        .await
        .map_err(|e| ApiError::internal_error(e.to_string()))?;
    Ok(Json(json!({ "status": "ok" })))
}

#[cfg(test)]
mod tests {
    use crate::api::testing::test_app;
    use crate::models::site::CreateGalleryImageInput;
    use crate::models::stories::{CreateBlogPostInput, CreateFarmerStoryInput};
    use crate::models::{BlogPost, FarmerStory, GalleryImage};
    use axum::http::StatusCode;
    use serde_json::Value;

    fn story(farmer: &str, crop: &str, published: bool) -> CreateFarmerStoryInput {
        CreateFarmerStoryInput {
            farmer_name: farmer.into(),
            crop_type: Some(crop.into()),
            title: format!("{farmer} on {crop}"),
            story: "Three seasons of steady yields.".into(),
            is_published: Some(published),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_health() {
        let app = test_app().await;
        let response = app.server.get("/api/v1/health").await;
        assert_eq!(response.status_code(), StatusCode::OK);
        assert_eq!(response.json::<Value>()["status"], "ok");
    }

    #[tokio::test]
    async fn test_farmer_stories_filter_and_hide_drafts() {
        let app = test_app().await;
        let stories = app.state.content::<FarmerStory>();
        for input in [
            story("Mohan", "cumin", true),
            story("Geeta", "mustard", true),
            story("Ravi", "cumin", false),
        ] {
            stories.create(input).await.unwrap();
        }

        let all = app.server.get("/api/v1/farmer-stories").await.json::<Value>();
        assert_eq!(all["total"], 2);

        let cumin = app
            .server
            .get("/api/v1/farmer-stories")
            .add_query_param("category", "cumin")
            .await
            .json::<Value>();
        assert_eq!(cumin["total"], 1);
        assert_eq!(cumin["items"][0]["farmer_name"], "Mohan");

        let none = app
            .server
            .get("/api/v1/farmer-stories")
            .add_query_param("search", "nobody")
            .await
            .json::<Value>();
        assert_eq!(none["total"], 0);
        assert_eq!(none["empty_message"], "No farmer stories match your search.");
    }

    #[tokio::test]
    async fn test_gallery_lightbox_wraps() {
        let app = test_app().await;
        let gallery = app.state.content::<GalleryImage>();
        for (title, order) in [("Dunes", 1), ("Harvest", 2), ("Market", 3)] {
            gallery
                .create(CreateGalleryImageInput {
                    title: title.into(),
                    image_url: format!("/uploads/{title}.jpg"),
                    sort_order: Some(order),
                    is_active: Some(true),
                    ..Default::default()
                })
                .await
                .unwrap();
        }

        let first = app
            .server
            .get("/api/v1/gallery/lightbox")
            .add_query_param("index", 0)
            .await
            .json::<Value>();
        assert_eq!(first["total"], 3);
        assert_eq!(first["prev_index"], 2);
        assert_eq!(first["next_index"], 1);

        let last = app
            .server
            .get("/api/v1/gallery/lightbox")
            .add_query_param("index", 2)
            .await
            .json::<Value>();
        assert_eq!(last["next_index"], 0);

        let out_of_range = app
            .server
            .get("/api/v1/gallery/lightbox")
            .add_query_param("index", 3)
            .await;
        assert_eq!(out_of_range.status_code(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_blog_slug_and_views() {
        let app = test_app().await;
        let posts = app.state.content::<BlogPost>();
        posts
            .create(CreateBlogPostInput {
                title: "Guar season outlook".into(),
                slug: "guar-season-outlook".into(),
                content: "Prices firmed this week as arrivals slowed.".into(),
                status: Some("published".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        posts
            .create(CreateBlogPostInput {
                title: "Draft".into(),
                slug: "draft-post".into(),
                content: "Not ready yet.".into(),
                ..Default::default()
            })
            .await
            .unwrap();

        let found = app.server.get("/api/v1/blog/guar-season-outlook").await;
        assert_eq!(found.status_code(), StatusCode::OK);
        assert_eq!(found.json::<Value>()["view_count"], 0);

        let draft = app.server.get("/api/v1/blog/draft-post").await;
        assert_eq!(draft.status_code(), StatusCode::NOT_FOUND);
        let body = draft.json::<Value>();
        assert_eq!(body["error"]["code"], "NOT_FOUND");
        assert_eq!(body["error"]["details"]["back"], "/agri/blog");

        let view = app
            .server
            .post("/api/v1/blog/guar-season-outlook/view")
            .await
            .json::<Value>();
        assert_eq!(view["counted"], true);
        let after = app
            .server
            .get("/api/v1/blog/guar-season-outlook")
            .await
            .json::<Value>();
        assert_eq!(after["view_count"], 1);

        let missing = app.server.post("/api/v1/blog/missing/view").await.json::<Value>();
        assert_eq!(missing["counted"], false);

        let draft_view = app.server.post("/api/v1/blog/draft-post/view").await.json::<Value>();
        assert_eq!(draft_view["counted"], false);

        let list = app.server.get("/api/v1/blog").await.json::<Value>();
        assert_eq!(list["total"], 1);
    }
}
