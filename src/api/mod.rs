//! API layer - HTTP handlers and routing
//!
//! Everything is served under `/api/v1`:
//! - public content, lightbox navigation and the blog (`public`)
//! - public forms and the newsletter (`forms`)
//! - console sign-in (`auth`)
//! - `/admin/*`: CRUD for every table plus media uploads and campaign
//!   actions, all behind [`middleware::require_admin`]
//!
//! Uploaded media is served from the storage directory under the
//! configured public URL.

pub mod auth;
pub mod campaigns;
pub mod crud;
pub mod forms;
pub mod media;
pub mod middleware;
pub mod public;

#[cfg(test)]
pub(crate) mod testing;

use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    Router,
};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::config::Config;
use crate::models::{
    BlogPost, Category, CropPortfolio, EmailCampaign, EmailTemplate, FarmerNetworkMember,
    FarmerStory, GalleryImage, Inquiry, MediaItem, NewsletterSubscription, PortfolioVideo,
    Product, Profile, RajasthanStory, SmtpConfiguration, StorySubmission, SystemSetting,
    TeamMember, Testimonial,
};
use crud::crud_router;

pub use middleware::{ApiError, AppState, AuthenticatedUser};

/// Console routes, relative to `/admin`
fn admin_router(state: &AppState, config: &Config) -> Router<AppState> {
    let max_batch = usize::try_from(config.storage.max_batch_size).unwrap_or(usize::MAX);

    Router::new()
        .nest("/categories", crud_router::<Category>("categories"))
        .nest("/products", crud_router::<Product>("products"))
        .nest("/inquiries", crud_router::<Inquiry>("inquiries"))
        .nest(
            "/media",
            crud_router::<MediaItem>("media files").merge(media::router(max_batch)),
        )
        .nest("/profiles", crud_router::<Profile>("users"))
        .nest("/testimonials", crud_router::<Testimonial>("testimonials"))
        .nest("/blog-posts", crud_router::<BlogPost>("posts"))
        .nest("/crop-portfolio", crud_router::<CropPortfolio>("crops"))
        .nest("/farmer-stories", crud_router::<FarmerStory>("farmer stories"))
        .nest("/gallery", crud_router::<GalleryImage>("images"))
        .nest(
            "/email-campaigns",
            crud_router::<EmailCampaign>("campaigns").merge(campaigns::campaign_router()),
        )
        .nest("/email-templates", crud_router::<EmailTemplate>("templates"))
        .nest("/subscribers", crud_router::<NewsletterSubscription>("subscribers"))
        .nest("/smtp", crud_router::<SmtpConfiguration>("SMTP configurations"))
        .nest("/settings", crud_router::<SystemSetting>("settings"))
        .nest("/team", crud_router::<TeamMember>("team members"))
        .nest("/farmer-network", crud_router::<FarmerNetworkMember>("network members"))
        .nest("/story-submissions", crud_router::<StorySubmission>("submissions"))
        .nest("/rajasthan-stories", crud_router::<RajasthanStory>("stories"))
        .nest("/portfolio-videos", crud_router::<PortfolioVideo>("videos"))
        .merge(campaigns::email_router())
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_admin,
        ))
}

/// Build the `/api/v1` router
pub fn build_api_router(state: &AppState, config: &Config) -> Router<AppState> {
    Router::new()
        .merge(public::router())
        .merge(forms::router())
        .merge(auth::router())
        .nest("/admin", admin_router(state, config))
}

fn cors_layer(origin: &str) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::COOKIE])
        .allow_credentials(true);

    match origin.parse::<HeaderValue>() {
        Ok(origin) => cors.allow_origin(origin),
        Err(e) => {
            tracing::warn!("Ignoring invalid CORS origin '{}': {}", origin, e);
            cors
        }
    }
}

/// Build the complete router with middleware
pub fn build_router(state: AppState, config: &Config) -> Router {
    let mut router = Router::new().nest("/api/v1", build_api_router(&state, config));

    let public_url = config.storage.public_url.trim_end_matches('/');
    if public_url.starts_with('/') && public_url.len() > 1 {
        router = router.nest_service(public_url, ServeDir::new(&config.storage.path));
    } else {
        tracing::info!("Media served externally from {}", config.storage.public_url);
    }

    router
        .layer(cors_layer(&config.server.cors_origin))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
