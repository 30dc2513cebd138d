//! Email marketing: campaigns, templates, subscribers and SMTP settings

use super::fields::{nullable, opt_string_list, string_list};
use super::validation::{FieldErrors, Validate};
use super::{to_row, Entity, RowError};
use crate::db::repositories::{Row, SqlValue};
use crate::db::schema::{
    TableDef, EMAIL_CAMPAIGNS, EMAIL_TEMPLATES, NEWSLETTER_SUBSCRIPTIONS, SMTP_CONFIGURATIONS,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const RECIPIENT_SUBSCRIBERS: &str = "subscribers";
pub const RECIPIENT_USERS: &str = "users";
pub const RECIPIENT_ALL: &str = "all";
pub const RECIPIENT_TYPES: &[&str] = &[RECIPIENT_SUBSCRIBERS, RECIPIENT_USERS, RECIPIENT_ALL];

pub const CAMPAIGN_DRAFT: &str = "draft";
pub const CAMPAIGN_SENT: &str = "sent";
pub const CAMPAIGN_STATUSES: &[&str] = &[CAMPAIGN_DRAFT, "scheduled", "sending", CAMPAIGN_SENT, "failed"];

// ============================================================================
// Campaigns
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmailCampaign {
    pub id: String,
    pub name: String,
    pub subject: String,
    /// HTML body
    pub content: Option<String>,
    pub template_id: Option<String>,
    pub status: String,
    pub recipient_type: String,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub sent_at: Option<DateTime<Utc>>,
    pub sent_count: i64,
    pub failed_count: i64,
    #[serde(default)]
    pub metadata: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateCampaignInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

/// Edits from the console plus the delivery stats written after a send
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateCampaignInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub content: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub template_id: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient_type: Option<String>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub scheduled_at: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub sent_at: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sent_count: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_count: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

fn check_one_of(errors: &mut FieldErrors, field: &str, value: Option<&str>, allowed: &[&str]) {
    if let Some(value) = value {
        if !allowed.contains(&value) {
            errors.add(
                field,
                format!("Must be one of: {}", allowed.join(", ")),
            );
        }
    }
}

impl Validate for CreateCampaignInput {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.required("name", &self.name);
        errors.required("subject", &self.subject);
        check_one_of(&mut errors, "status", self.status.as_deref(), CAMPAIGN_STATUSES);
        check_one_of(
            &mut errors,
            "recipient_type",
            self.recipient_type.as_deref(),
            RECIPIENT_TYPES,
        );
        errors.into_result()
    }
}

impl Validate for UpdateCampaignInput {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.not_blank("name", self.name.as_deref());
        errors.not_blank("subject", self.subject.as_deref());
        check_one_of(&mut errors, "status", self.status.as_deref(), CAMPAIGN_STATUSES);
        check_one_of(
            &mut errors,
            "recipient_type",
            self.recipient_type.as_deref(),
            RECIPIENT_TYPES,
        );
        errors.into_result()
    }
}

impl Entity for EmailCampaign {
    type Create = CreateCampaignInput;
    type Update = UpdateCampaignInput;
    const TABLE: &'static TableDef = &EMAIL_CAMPAIGNS;

    fn id(&self) -> &str {
        &self.id
    }
}

// ============================================================================
// Templates
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmailTemplate {
    pub id: String,
    pub name: String,
    pub subject: String,
    pub html_content: String,
    pub category: Option<String>,
    /// Placeholder names such as `first_name`
    #[serde(default, deserialize_with = "string_list")]
    pub variables: Vec<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateTemplateInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub html_content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "string_list")]
    pub variables: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTemplateInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html_content: Option<String>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub category: Option<Option<String>>,
    #[serde(default, deserialize_with = "opt_string_list", skip_serializing_if = "Option::is_none")]
    pub variables: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl Validate for CreateTemplateInput {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.required("name", &self.name);
        errors.required("subject", &self.subject);
        errors.required("html_content", &self.html_content);
        errors.into_result()
    }
}

impl Validate for UpdateTemplateInput {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.not_blank("name", self.name.as_deref());
        errors.not_blank("subject", self.subject.as_deref());
        errors.not_blank("html_content", self.html_content.as_deref());
        errors.into_result()
    }
}

impl Entity for EmailTemplate {
    type Create = CreateTemplateInput;
    type Update = UpdateTemplateInput;
    const TABLE: &'static TableDef = &EMAIL_TEMPLATES;

    fn id(&self) -> &str {
        &self.id
    }

    fn published_condition() -> Option<(&'static str, SqlValue)> {
        Some(("is_active", SqlValue::Bool(true)))
    }
}

// ============================================================================
// Newsletter subscriptions
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewsletterSubscription {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub source: Option<String>,
    pub is_active: bool,
    #[serde(default)]
    pub preferences: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateSubscriptionInput {
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferences: Option<Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateSubscriptionInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub name: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub source: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferences: Option<Value>,
}

impl Validate for CreateSubscriptionInput {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.email("email", &self.email);
        errors.into_result()
    }
}

impl Validate for UpdateSubscriptionInput {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        if let Some(email) = self.email.as_deref() {
            errors.email("email", email);
        }
        errors.into_result()
    }
}

impl Entity for NewsletterSubscription {
    type Create = CreateSubscriptionInput;
    type Update = UpdateSubscriptionInput;
    const TABLE: &'static TableDef = &NEWSLETTER_SUBSCRIPTIONS;

    fn id(&self) -> &str {
        &self.id
    }

    fn create_row(mut input: Self::Create) -> Result<Row, RowError> {
        input.email = input.email.trim().to_string();
        to_row(&input)
    }
}

/// Public newsletter signup
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubscribeForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
}

impl Validate for SubscribeForm {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.email("email", &self.email);
        errors.into_result()
    }
}

impl SubscribeForm {
    pub fn into_create(self) -> CreateSubscriptionInput {
        CreateSubscriptionInput {
            email: self.email.trim().to_string(),
            name: self.name.filter(|n| !n.trim().is_empty()),
            source: Some(self.source.unwrap_or_else(|| "website".to_string())),
            is_active: Some(true),
            preferences: None,
        }
    }
}

// ============================================================================
// SMTP configurations
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SmtpConfiguration {
    pub id: String,
    pub name: String,
    pub host: String,
    pub port: i64,
    pub username: Option<String>,
    /// Write-only
    #[serde(default, skip_serializing)]
    pub password: Option<String>,
    pub from_email: String,
    pub from_name: Option<String>,
    pub use_tls: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateSmtpInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub host: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default)]
    pub from_email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_tls: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateSmtpInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<i64>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub username: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub password: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_email: Option<String>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub from_name: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_tls: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

fn check_port(errors: &mut FieldErrors, port: Option<i64>) {
    if port.is_some_and(|p| !(1..=65535).contains(&p)) {
        errors.add("port", "Port must be between 1 and 65535");
    }
}

impl Validate for CreateSmtpInput {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.required("name", &self.name);
        errors.required("host", &self.host);
        errors.email("from_email", &self.from_email);
        check_port(&mut errors, self.port);
        errors.into_result()
    }
}

impl Validate for UpdateSmtpInput {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.not_blank("name", self.name.as_deref());
        errors.not_blank("host", self.host.as_deref());
        if let Some(from) = self.from_email.as_deref() {
            errors.email("from_email", from);
        }
        check_port(&mut errors, self.port);
        errors.into_result()
    }
}

impl Entity for SmtpConfiguration {
    type Create = CreateSmtpInput;
    type Update = UpdateSmtpInput;
    const TABLE: &'static TableDef = &SMTP_CONFIGURATIONS;

    fn id(&self) -> &str {
        &self.id
    }

    /// An empty password in an edit form means "keep the current one"
    fn update_row(mut patch: Self::Update) -> Result<Row, RowError> {
        if patch
            .password
            .as_ref()
            .is_some_and(|p| p.as_deref().is_some_and(str::is_empty))
        {
            patch.password = None;
        }
        to_row(&patch)
    }
}
