//! Email campaign actions
//!
//! Merged into the campaign CRUD router under /api/v1/admin/email-campaigns:
//! - GET  /{id}/recipients    preview the resolved recipient list
//! - POST /{id}/send          send through the remote mailer, record stats
//! - POST /{id}/automation    hand the campaign to an automation trigger
//!
//! Plus POST /api/v1/admin/email/test for one-off test emails.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::Value;

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::functions::SendEmailResponse;
use crate::services::email::{CampaignSendResult, RecipientPreview, TestEmailInput};

/// Routes relative to a single campaign
pub fn campaign_router() -> Router<AppState> {
    Router::new()
        .route("/{id}/recipients", get(preview_recipients))
        .route("/{id}/send", post(send_campaign))
        .route("/{id}/automation", post(trigger_automation))
}

pub fn email_router() -> Router<AppState> {
    Router::new().route("/email/test", post(send_test_email))
}

async fn preview_recipients(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<RecipientPreview>, ApiError> {
    Ok(Json(state.email.preview_recipients(&id).await?))
}

async fn send_campaign(
    State(state): State<AppState>,
    AuthenticatedUser(admin): AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<Json<CampaignSendResult>, ApiError> {
    tracing::info!("{} requested send of campaign {}", admin.email, id);
    Ok(Json(state.email.send_campaign(&id).await?))
}

#[derive(Debug, Deserialize)]
pub struct AutomationBody {
    #[serde(default)]
    pub trigger_type: String,
}

async fn trigger_automation(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<AutomationBody>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(body) = payload?;
    Ok(Json(state.email.trigger_automation(&body.trigger_type, &id).await?))
}

async fn send_test_email(
    State(state): State<AppState>,
    payload: Result<Json<TestEmailInput>, JsonRejection>,
) -> Result<Json<SendEmailResponse>, ApiError> {
    let Json(input) = payload?;
    Ok(Json(state.email.send_test_email(input).await?))
}

#[cfg(test)]
mod tests {
    use crate::api::testing::{test_app, TestApp};
    use crate::functions::Recipients;
    use crate::models::email::CreateSubscriptionInput;
    use crate::models::NewsletterSubscription;
    use axum::http::StatusCode;
    use serde_json::{json, Value};

    async fn campaign(app: &TestApp, token: &str, body: Value) -> String {
        let response = app
            .server
            .post("/api/v1/admin/email-campaigns")
            .authorization_bearer(token)
            .json(&body)
            .await;
        assert_eq!(response.status_code(), StatusCode::CREATED);
        response.json::<Value>()["id"].as_str().unwrap().to_string()
    }

    async fn subscribe(app: &TestApp, email: &str) {
        app.state
            .content::<NewsletterSubscription>()
            .create(CreateSubscriptionInput {
                email: email.into(),
                is_active: Some(true),
                ..Default::default()
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_send_campaign_records_stats() {
        let app = test_app().await;
        let token = app.admin_token().await;
        subscribe(&app, "one@example.com").await;
        subscribe(&app, "two@example.com").await;

        let id = campaign(
            &app,
            &token,
            json!({
                "name": "Harvest update",
                "subject": "Fresh cumin arrivals",
                "content": "<p>New crop is in.</p>",
                "recipient_type": "subscribers"
            }),
        )
        .await;

        let preview = app
            .server
            .get(&format!("/api/v1/admin/email-campaigns/{id}/recipients"))
            .authorization_bearer(&token)
            .await
            .json::<Value>();
        assert_eq!(preview["count"], 2);

        let response = app
            .server
            .post(&format!("/api/v1/admin/email-campaigns/{id}/send"))
            .authorization_bearer(&token)
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);
        let body = response.json::<Value>();
        assert_eq!(body["total_sent"], 2);
        assert_eq!(body["campaign"]["status"], "sent");
        assert_eq!(body["campaign"]["sent_count"], 2);

        let sent = app.functions.emails.lock().unwrap();
        assert_eq!(sent.len(), 1);
        let Recipients::Many(mut to) = sent[0].to.clone() else {
            panic!("expected a recipient list");
        };
        to.sort();
        assert_eq!(to, vec!["one@example.com", "two@example.com"]);
    }

    #[tokio::test]
    async fn test_campaign_without_recipients_is_rejected() {
        let app = test_app().await;
        let token = app.admin_token().await;
        let id = campaign(
            &app,
            &token,
            json!({
                "name": "Empty list",
                "subject": "Nobody home",
                "content": "<p>Hello?</p>",
                "recipient_type": "subscribers"
            }),
        )
        .await;

        let response = app
            .server
            .post(&format!("/api/v1/admin/email-campaigns/{id}/send"))
            .authorization_bearer(&token)
            .await;
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        assert!(app.functions.emails.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_automation_and_test_email() {
        let app = test_app().await;
        let token = app.admin_token().await;
        let id = campaign(
            &app,
            &token,
            json!({ "name": "Welcome", "subject": "Welcome aboard" }),
        )
        .await;

        let response = app
            .server
            .post(&format!("/api/v1/admin/email-campaigns/{id}/automation"))
            .authorization_bearer(&token)
            .json(&json!({ "trigger_type": "welcome" }))
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);
        assert_eq!(response.json::<Value>()["queued"], true);
        assert_eq!(app.functions.automations.lock().unwrap()[0].trigger_type, "welcome");

        let test_email = app
            .server
            .post("/api/v1/admin/email/test")
            .authorization_bearer(&token)
            .json(&json!({ "to": "me@example.com", "subject": "Preview", "html": "<p>Hi</p>" }))
            .await;
        assert_eq!(test_email.status_code(), StatusCode::OK);
        assert_eq!(test_email.json::<Value>()["total_sent"], 1);

        let invalid = app
            .server
            .post("/api/v1/admin/email/test")
            .authorization_bearer(&token)
            .json(&json!({ "to": "nope", "subject": "" }))
            .await;
        assert_eq!(invalid.status_code(), StatusCode::BAD_REQUEST);
    }
}
