//! Public form endpoints
//!
//! - POST /api/v1/forms/inquiry          contact form
//! - POST /api/v1/forms/quick-inquiry    product quick inquiry
//! - POST /api/v1/forms/farmer-network   farmer network sign-up
//! - POST /api/v1/forms/story            story submission
//! - POST /api/v1/newsletter/subscribe
//! - POST /api/v1/newsletter/unsubscribe

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde::Deserialize;

use crate::api::middleware::{ApiError, AppState};
use crate::models::community::{JoinNetworkInput, SubmitStoryInput};
use crate::models::email::SubscribeForm;
use crate::models::{
    FarmerNetworkMember, Inquiry, InquiryForm, NewsletterSubscription, QuickInquiryForm,
    StorySubmission,
};
use crate::services::forms::Subscribed;
use crate::services::Submitted;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/forms/inquiry", post(submit_inquiry))
        .route("/forms/quick-inquiry", post(submit_quick_inquiry))
        .route("/forms/farmer-network", post(join_network))
        .route("/forms/story", post(submit_story))
        .route("/newsletter/subscribe", post(subscribe))
        .route("/newsletter/unsubscribe", post(unsubscribe))
}

type Created<T> = Result<(StatusCode, Json<Submitted<T>>), ApiError>;

async fn submit_inquiry(
    State(state): State<AppState>,
    payload: Result<Json<InquiryForm>, JsonRejection>,
) -> Created<Inquiry> {
    let Json(form) = payload?;
    let submitted = state.forms.submit_inquiry(form).await?;
    Ok((StatusCode::CREATED, Json(submitted)))
}

async fn submit_quick_inquiry(
    State(state): State<AppState>,
    payload: Result<Json<QuickInquiryForm>, JsonRejection>,
) -> Created<Inquiry> {
    let Json(form) = payload?;
    let submitted = state.forms.submit_quick_inquiry(form).await?;
    Ok((StatusCode::CREATED, Json(submitted)))
}

async fn join_network(
    State(state): State<AppState>,
    payload: Result<Json<JoinNetworkInput>, JsonRejection>,
) -> Created<FarmerNetworkMember> {
    let Json(input) = payload?;
    let submitted = state.forms.join_network(input).await?;
    Ok((StatusCode::CREATED, Json(submitted)))
}

async fn submit_story(
    State(state): State<AppState>,
    payload: Result<Json<SubmitStoryInput>, JsonRejection>,
) -> Created<StorySubmission> {
    let Json(input) = payload?;
    let submitted = state.forms.submit_story(input).await?;
    Ok((StatusCode::CREATED, Json(submitted)))
}

async fn subscribe(
    State(state): State<AppState>,
    payload: Result<Json<SubscribeForm>, JsonRejection>,
) -> Result<(StatusCode, Json<Subscribed>), ApiError> {
    let Json(form) = payload?;
    let subscribed = state.forms.subscribe(form).await?;
    let status = if subscribed.already_subscribed {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    Ok((status, Json(subscribed)))
}

#[derive(Debug, Deserialize)]
pub struct UnsubscribeRequest {
    #[serde(default)]
    pub email: String,
}

async fn unsubscribe(
    State(state): State<AppState>,
    payload: Result<Json<UnsubscribeRequest>, JsonRejection>,
) -> Result<Json<NewsletterSubscription>, ApiError> {
    let Json(request) = payload?;
    Ok(Json(state.forms.unsubscribe(&request.email).await?))
}
