//! Email campaigns
//!
//! Delivery is delegated to the `send-email` remote function: one call per
//! campaign with the full recipient list. The returned totals are then
//! written back onto the campaign row. The send and the stats update are
//! separate writes, so a failure in between leaves the campaign unmarked.

use super::content::{ContentError, ContentService};
use crate::db::repositories::ListQuery;
use crate::functions::{
    AutomationRequest, DynRemoteFunctions, FunctionError, Recipients, SendEmailRequest,
    SendEmailResponse,
};
use crate::models::email::{
    UpdateCampaignInput, CAMPAIGN_SENT, RECIPIENT_ALL, RECIPIENT_SUBSCRIBERS, RECIPIENT_USERS,
};
use crate::models::{EmailCampaign, EmailTemplate, FieldErrors, NewsletterSubscription, Profile};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    #[error("Campaign '{0}' has no recipients")]
    NoRecipients(String),

    #[error("Campaign '{0}' has no content")]
    NoContent(String),

    #[error("Unknown recipient type: {0}")]
    UnknownRecipientType(String),

    #[error(transparent)]
    Content(#[from] ContentError),

    #[error(transparent)]
    Function(#[from] FunctionError),

    #[error("Failed to serialize campaign: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl From<FieldErrors> for EmailError {
    fn from(errors: FieldErrors) -> Self {
        EmailError::Validation(errors)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RecipientPreview {
    pub recipient_type: String,
    pub count: usize,
    pub emails: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CampaignSendResult {
    pub campaign: EmailCampaign,
    pub total_sent: i64,
    pub total_failed: i64,
}

/// Body of the test email endpoint
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TestEmailInput {
    #[serde(default)]
    pub to: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub html: String,
    #[serde(default)]
    pub template_id: Option<String>,
}

/// Addresses in first-seen order with exact duplicates removed
pub fn merge_recipients<I>(addresses: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = HashSet::new();
    addresses
        .into_iter()
        .filter(|address| seen.insert(address.clone()))
        .collect()
}

#[derive(Clone)]
pub struct EmailService {
    campaigns: ContentService<EmailCampaign>,
    templates: ContentService<EmailTemplate>,
    subscribers: ContentService<NewsletterSubscription>,
    profiles: ContentService<Profile>,
    functions: DynRemoteFunctions,
}

impl EmailService {
    pub fn new(
        campaigns: ContentService<EmailCampaign>,
        templates: ContentService<EmailTemplate>,
        subscribers: ContentService<NewsletterSubscription>,
        profiles: ContentService<Profile>,
        functions: DynRemoteFunctions,
    ) -> Self {
        Self {
            campaigns,
            templates,
            subscribers,
            profiles,
            functions,
        }
    }

    async fn subscriber_emails(&self) -> Result<Vec<String>, EmailError> {
        let query = ListQuery::default().with_condition("is_active", true);
        Ok(self
            .subscribers
            .list(&query)
            .await?
            .into_iter()
            .map(|s| s.email)
            .collect())
    }

    async fn profile_emails(&self) -> Result<Vec<String>, EmailError> {
        let query = ListQuery::default().with_condition("is_active", true);
        Ok(self
            .profiles
            .list(&query)
            .await?
            .into_iter()
            .map(|p| p.email)
            .collect())
    }

    /// Active addresses for `subscribers`, `users` or `all`
    pub async fn recipients(&self, recipient_type: &str) -> Result<Vec<String>, EmailError> {
        let addresses = match recipient_type {
            RECIPIENT_SUBSCRIBERS => self.subscriber_emails().await?,
            RECIPIENT_USERS => self.profile_emails().await?,
            RECIPIENT_ALL => {
                let mut all = self.subscriber_emails().await?;
                all.extend(self.profile_emails().await?);
                all
            }
            other => return Err(EmailError::UnknownRecipientType(other.to_string())),
        };
        Ok(merge_recipients(addresses))
    }

    pub async fn preview_recipients(&self, campaign_id: &str) -> Result<RecipientPreview, EmailError> {
        let campaign = self.campaigns.get(campaign_id).await?;
        let emails = self.recipients(&campaign.recipient_type).await?;
        Ok(RecipientPreview {
            recipient_type: campaign.recipient_type,
            count: emails.len(),
            emails,
        })
    }

    /// Campaign body, falling back to its template's HTML
    async fn campaign_html(&self, campaign: &EmailCampaign) -> Result<String, EmailError> {
        if let Some(content) = campaign.content.as_deref().filter(|c| !c.trim().is_empty()) {
            return Ok(content.to_string());
        }
        if let Some(template_id) = campaign.template_id.as_deref() {
            let template = self.templates.get(template_id).await?;
            if !template.html_content.trim().is_empty() {
                return Ok(template.html_content);
            }
        }
        Err(EmailError::NoContent(campaign.id.clone()))
    }

    pub async fn send_campaign(&self, campaign_id: &str) -> Result<CampaignSendResult, EmailError> {
        let campaign = self.campaigns.get(campaign_id).await?;
        let html = self.campaign_html(&campaign).await?;
        let recipients = self.recipients(&campaign.recipient_type).await?;
        if recipients.is_empty() {
            return Err(EmailError::NoRecipients(campaign.id));
        }

        tracing::info!(
            "Sending campaign {} to {} recipients",
            campaign.id,
            recipients.len()
        );
        let request = SendEmailRequest {
            to: Recipients::Many(recipients),
            subject: campaign.subject.clone(),
            html,
            template_id: campaign.template_id.clone(),
            campaign_id: Some(campaign.id.clone()),
        };
        let response = self.functions.send_email(&request).await?;

        let patch = UpdateCampaignInput {
            status: Some(CAMPAIGN_SENT.to_string()),
            sent_at: Some(Some(Utc::now().to_rfc3339())),
            sent_count: Some(response.total_sent),
            failed_count: Some(response.total_failed),
            ..Default::default()
        };
        let campaign = self.campaigns.update(&campaign.id, patch).await?;
        tracing::info!(
            "Campaign {} sent: {} delivered, {} failed",
            campaign.id,
            response.total_sent,
            response.total_failed
        );

        Ok(CampaignSendResult {
            campaign,
            total_sent: response.total_sent,
            total_failed: response.total_failed,
        })
    }

    pub async fn send_test_email(&self, input: TestEmailInput) -> Result<SendEmailResponse, EmailError> {
        let mut errors = FieldErrors::new();
        errors.email("to", &input.to);
        errors.required("subject", &input.subject);
        if input.template_id.is_none() {
            errors.required("html", &input.html);
        }
        errors.into_result()?;

        let html = match (input.html.trim().is_empty(), input.template_id.as_deref()) {
            (true, Some(template_id)) => self.templates.get(template_id).await?.html_content,
            _ => input.html,
        };

        let request = SendEmailRequest {
            to: Recipients::One(input.to.trim().to_string()),
            subject: input.subject,
            html,
            template_id: input.template_id,
            campaign_id: None,
        };
        let response = self.functions.send_email(&request).await?;
        tracing::info!("Test email sent to {}", input.to.trim());
        Ok(response)
    }

    pub async fn trigger_automation(
        &self,
        trigger_type: &str,
        campaign_id: &str,
    ) -> Result<Value, EmailError> {
        let mut errors = FieldErrors::new();
        errors.required("trigger_type", trigger_type);
        errors.into_result()?;

        let campaign = self.campaigns.get(campaign_id).await?;
        let request = AutomationRequest {
            trigger_type: trigger_type.trim().to_string(),
            campaign: serde_json::to_value(&campaign)?,
        };
        let result = self.functions.email_automation(&request).await?;
        tracing::info!("Automation '{}' triggered for campaign {}", trigger_type, campaign_id);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::create_test_cache;
    use crate::db::create_test_pool;
    use crate::db::migrations::run_migrations;
    use crate::db::repositories::SqlxTableRepository;
    use crate::functions::RemoteFunctions;
    use crate::models::email::{CreateCampaignInput, CreateSubscriptionInput, CreateTemplateInput};
    use crate::models::profile::CreateProfileInput;
    use async_trait::async_trait;
    use proptest::prelude::*;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct RecordingFunctions {
        sent: Mutex<Vec<SendEmailRequest>>,
        automations: Mutex<Vec<AutomationRequest>>,
        fail: bool,
    }

    #[async_trait]
    impl RemoteFunctions for RecordingFunctions {
        async fn send_email(&self, request: &SendEmailRequest) -> Result<SendEmailResponse, FunctionError> {
            if self.fail {
                return Err(FunctionError::Status {
                    name: "send-email".into(),
                    status: 500,
                    body: "mail provider down".into(),
                });
            }
            self.sent.lock().unwrap().push(request.clone());
            let total = match &request.to {
                Recipients::One(_) => 1,
                Recipients::Many(list) => list.len() as i64,
            };
            Ok(SendEmailResponse {
                total_sent: total - 1,
                total_failed: 1,
                message: None,
            })
        }

        async fn email_automation(&self, request: &AutomationRequest) -> Result<Value, FunctionError> {
            self.automations.lock().unwrap().push(request.clone());
            Ok(json!({"queued": true}))
        }
    }

    struct Fixture {
        svc: EmailService,
        functions: Arc<RecordingFunctions>,
    }

    async fn fixture(functions: RecordingFunctions) -> Fixture {
        let pool = create_test_pool().await.unwrap();
        run_migrations(&pool).await.unwrap();
        let tables = SqlxTableRepository::boxed(pool);
        let cache = create_test_cache();
        let functions = Arc::new(functions);
        let svc = EmailService::new(
            ContentService::new(tables.clone(), cache.clone()),
            ContentService::new(tables.clone(), cache.clone()),
            ContentService::new(tables.clone(), cache.clone()),
            ContentService::new(tables, cache),
            functions.clone(),
        );
        Fixture { svc, functions }
    }

    async fn seed_people(svc: &EmailService) {
        for (email, active) in [
            ("shared@example.com", true),
            ("reader@example.com", true),
            ("gone@example.com", false),
        ] {
            svc.subscribers
                .create(CreateSubscriptionInput {
                    email: email.into(),
                    is_active: Some(active),
                    ..Default::default()
                })
                .await
                .unwrap();
        }
        for email in ["shared@example.com", "staff@example.com"] {
            svc.profiles
                .create(CreateProfileInput {
                    email: email.into(),
                    ..Default::default()
                })
                .await
                .unwrap();
        }
    }

    async fn campaign(svc: &EmailService, recipient_type: &str, content: Option<&str>) -> EmailCampaign {
        svc.campaigns
            .create(CreateCampaignInput {
                name: "Harvest update".into(),
                subject: "New season cumin".into(),
                content: content.map(str::to_string),
                recipient_type: Some(recipient_type.into()),
                ..Default::default()
            })
            .await
            .unwrap()
    }

    fn sorted(mut emails: Vec<String>) -> Vec<String> {
        emails.sort();
        emails
    }

    #[test]
    fn test_merge_keeps_first_occurrence() {
        let merged = merge_recipients(
            ["b@x.com", "a@x.com", "b@x.com", "A@x.com"]
                .into_iter()
                .map(String::from),
        );
        assert_eq!(merged, vec!["b@x.com", "a@x.com", "A@x.com"]);
    }

    #[tokio::test]
    async fn test_recipients_by_type() {
        let f = fixture(RecordingFunctions::default()).await;
        seed_people(&f.svc).await;

        assert_eq!(
            sorted(f.svc.recipients("subscribers").await.unwrap()),
            vec!["reader@example.com", "shared@example.com"]
        );
        assert_eq!(
            sorted(f.svc.recipients("users").await.unwrap()),
            vec!["shared@example.com", "staff@example.com"]
        );
        assert_eq!(
            sorted(f.svc.recipients("all").await.unwrap()),
            vec!["reader@example.com", "shared@example.com", "staff@example.com"]
        );
        assert!(matches!(
            f.svc.recipients("everyone").await,
            Err(EmailError::UnknownRecipientType(_))
        ));
    }

    #[tokio::test]
    async fn test_send_campaign_records_totals() {
        let f = fixture(RecordingFunctions::default()).await;
        seed_people(&f.svc).await;
        let draft = campaign(&f.svc, "all", Some("<p>Fresh stock</p>")).await;
        assert_eq!(draft.status, "draft");

        let result = f.svc.send_campaign(&draft.id).await.unwrap();
        assert_eq!(result.total_sent, 2);
        assert_eq!(result.total_failed, 1);
        assert_eq!(result.campaign.status, "sent");
        assert_eq!(result.campaign.sent_count, 2);
        assert_eq!(result.campaign.failed_count, 1);
        assert!(result.campaign.sent_at.is_some());

        let sent = f.functions.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        let Recipients::Many(to) = &sent[0].to else {
            panic!("campaign sends a recipient list");
        };
        assert_eq!(to.len(), 3);
        assert_eq!(sent[0].campaign_id.as_deref(), Some(draft.id.as_str()));
        assert_eq!(sent[0].html, "<p>Fresh stock</p>");
    }

    #[tokio::test]
    async fn test_failed_send_leaves_campaign_untouched() {
        let f = fixture(RecordingFunctions {
            fail: true,
            ..Default::default()
        })
        .await;
        seed_people(&f.svc).await;
        let draft = campaign(&f.svc, "subscribers", Some("<p>Hi</p>")).await;

        let err = f.svc.send_campaign(&draft.id).await.unwrap_err();
        assert!(matches!(err, EmailError::Function(FunctionError::Status { status: 500, .. })));

        let stored = f.svc.campaigns.get(&draft.id).await.unwrap();
        assert_eq!(stored.status, "draft");
        assert_eq!(stored.sent_count, 0);
    }

    #[tokio::test]
    async fn test_campaign_uses_template_html() {
        let f = fixture(RecordingFunctions::default()).await;
        seed_people(&f.svc).await;
        let template = f
            .svc
            .templates
            .create(CreateTemplateInput {
                name: "Monthly".into(),
                subject: "Monthly".into(),
                html_content: "<h1>Monthly news</h1>".into(),
                ..Default::default()
            })
            .await
            .unwrap();
        let draft = f
            .svc
            .campaigns
            .create(CreateCampaignInput {
                name: "Monthly".into(),
                subject: "Monthly".into(),
                template_id: Some(template.id.clone()),
                recipient_type: Some("users".into()),
                ..Default::default()
            })
            .await
            .unwrap();

        f.svc.send_campaign(&draft.id).await.unwrap();
        let sent = f.functions.sent.lock().unwrap();
        assert_eq!(sent[0].html, "<h1>Monthly news</h1>");
        assert_eq!(sent[0].template_id.as_deref(), Some(template.id.as_str()));
    }

    #[tokio::test]
    async fn test_empty_audience_is_rejected() {
        let f = fixture(RecordingFunctions::default()).await;
        let draft = campaign(&f.svc, "subscribers", Some("<p>Hi</p>")).await;
        assert!(matches!(
            f.svc.send_campaign(&draft.id).await,
            Err(EmailError::NoRecipients(_))
        ));
        assert!(f.functions.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_preview_and_test_email() {
        let f = fixture(RecordingFunctions::default()).await;
        seed_people(&f.svc).await;
        let draft = campaign(&f.svc, "users", None).await;

        let preview = f.svc.preview_recipients(&draft.id).await.unwrap();
        assert_eq!(preview.recipient_type, "users");
        assert_eq!(preview.count, 2);

        let err = f
            .svc
            .send_test_email(TestEmailInput {
                to: "bad".into(),
                ..Default::default()
            })
            .await
            .unwrap_err();
        let EmailError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        assert!(errors.get("to").is_some());
        assert!(errors.get("subject").is_some());

        f.svc
            .send_test_email(TestEmailInput {
                to: "qa@example.com".into(),
                subject: "Preview".into(),
                html: "<p>Preview</p>".into(),
                template_id: None,
            })
            .await
            .unwrap();
        let sent = f.functions.sent.lock().unwrap();
        assert_eq!(sent[0].to, Recipients::One("qa@example.com".into()));
    }

    #[tokio::test]
    async fn test_trigger_automation_sends_campaign_payload() {
        let f = fixture(RecordingFunctions::default()).await;
        let draft = campaign(&f.svc, "all", Some("<p>x</p>")).await;

        let result = f.svc.trigger_automation("welcome", &draft.id).await.unwrap();
        assert_eq!(result, json!({"queued": true}));

        let automations = f.functions.automations.lock().unwrap();
        assert_eq!(automations[0].trigger_type, "welcome");
        assert_eq!(automations[0].campaign["id"], draft.id.as_str());
        assert_eq!(automations[0].campaign["subject"], "New season cumin");
    }

    proptest! {
        #[test]
        fn merged_recipients_are_unique_and_ordered(
            input in proptest::collection::vec("[a-d]@x\\.com", 0..30)
        ) {
            let merged = merge_recipients(input.clone());
            let unique: HashSet<_> = merged.iter().collect();
            prop_assert_eq!(unique.len(), merged.len());

            let mut firsts = Vec::new();
            for address in &input {
                if !firsts.contains(address) {
                    firsts.push(address.clone());
                }
            }
            prop_assert_eq!(merged, firsts);
        }
    }
}
