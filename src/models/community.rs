//! Community sign-ups: the farmer network and story submissions

use super::fields::{nullable, opt_string_list, opt_trimmed, string_list};
use super::validation::{FieldErrors, Validate};
use super::Entity;
use crate::db::schema::{TableDef, FARMER_NETWORK, STORY_SUBMISSIONS};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status of a sign-up or submission awaiting review
pub const STATUS_PENDING: &str = "pending";

// ============================================================================
// Farmer network
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FarmerNetworkMember {
    pub id: String,
    pub full_name: String,
    pub phone: String,
    pub email: Option<String>,
    pub village: Option<String>,
    pub district: Option<String>,
    pub state: Option<String>,
    pub land_size: Option<String>,
    #[serde(default, deserialize_with = "string_list")]
    pub crops: Vec<String>,
    pub farming_experience: Option<String>,
    pub message: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Join form; also used by admins creating a member by hand
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JoinNetworkInput {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default, deserialize_with = "opt_trimmed", skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "opt_trimmed", skip_serializing_if = "Option::is_none")]
    pub village: Option<String>,
    #[serde(default, deserialize_with = "opt_trimmed", skip_serializing_if = "Option::is_none")]
    pub district: Option<String>,
    #[serde(default, deserialize_with = "opt_trimmed", skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, deserialize_with = "opt_trimmed", skip_serializing_if = "Option::is_none")]
    pub land_size: Option<String>,
    #[serde(default, deserialize_with = "string_list")]
    pub crops: Vec<String>,
    #[serde(default, deserialize_with = "opt_trimmed", skip_serializing_if = "Option::is_none")]
    pub farming_experience: Option<String>,
    #[serde(default, deserialize_with = "opt_trimmed", skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateNetworkMemberInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub email: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub village: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub district: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub state: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub land_size: Option<Option<String>>,
    #[serde(default, deserialize_with = "opt_string_list", skip_serializing_if = "Option::is_none")]
    pub crops: Option<Vec<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub farming_experience: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub message: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl Validate for JoinNetworkInput {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.min_len("full_name", &self.full_name, 2);
        errors.phone("phone", &self.phone);
        errors.optional_email("email", self.email.as_deref());
        errors.into_result()
    }
}

impl Validate for UpdateNetworkMemberInput {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.not_blank("full_name", self.full_name.as_deref());
        if let Some(phone) = self.phone.as_deref() {
            errors.phone("phone", phone);
        }
        errors.optional_email("email", self.email.as_ref().and_then(Option::as_deref));
        errors.not_blank("status", self.status.as_deref());
        errors.into_result()
    }
}

impl JoinNetworkInput {
    /// Public sign-ups always start out pending
    pub fn into_submission(mut self) -> Self {
        self.full_name = self.full_name.trim().to_string();
        self.phone = self.phone.trim().to_string();
        self.status = Some(STATUS_PENDING.to_string());
        self
    }
}

impl Entity for FarmerNetworkMember {
    type Create = JoinNetworkInput;
    type Update = UpdateNetworkMemberInput;
    const TABLE: &'static TableDef = &FARMER_NETWORK;

    fn id(&self) -> &str {
        &self.id
    }
}

// ============================================================================
// Story submissions
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StorySubmission {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub story_title: String,
    pub story_content: String,
    pub crop_type: Option<String>,
    #[serde(default, deserialize_with = "string_list")]
    pub image_urls: Vec<String>,
    /// Permission to publish the story
    pub consent: bool,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubmitStoryInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, deserialize_with = "opt_trimmed", skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "opt_trimmed", skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default)]
    pub story_title: String,
    #[serde(default)]
    pub story_content: String,
    #[serde(default, deserialize_with = "opt_trimmed", skip_serializing_if = "Option::is_none")]
    pub crop_type: Option<String>,
    #[serde(default, deserialize_with = "string_list")]
    pub image_urls: Vec<String>,
    #[serde(default)]
    pub consent: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateStorySubmissionInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub location: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub story_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub story_content: Option<String>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub crop_type: Option<Option<String>>,
    #[serde(default, deserialize_with = "opt_string_list", skip_serializing_if = "Option::is_none")]
    pub image_urls: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consent: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl Validate for SubmitStoryInput {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.min_len("name", &self.name, 2);
        errors.email("email", &self.email);
        if let Some(phone) = self.phone.as_deref() {
            errors.phone("phone", phone);
        }
        errors.min_len("story_title", &self.story_title, 5);
        errors.min_len("story_content", &self.story_content, 50);
        if !self.consent {
            errors.add("consent", "Consent is required to share your story");
        }
        errors.into_result()
    }
}

impl Validate for UpdateStorySubmissionInput {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.not_blank("name", self.name.as_deref());
        errors.not_blank("story_title", self.story_title.as_deref());
        errors.not_blank("story_content", self.story_content.as_deref());
        if let Some(email) = self.email.as_deref() {
            errors.email("email", email);
        }
        errors.not_blank("status", self.status.as_deref());
        errors.into_result()
    }
}

impl SubmitStoryInput {
    pub fn into_submission(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.email = self.email.trim().to_string();
        self.story_title = self.story_title.trim().to_string();
        self.story_content = self.story_content.trim().to_string();
        self.status = Some(STATUS_PENDING.to_string());
        self
    }
}

impl Entity for StorySubmission {
    type Create = SubmitStoryInput;
    type Update = UpdateStorySubmissionInput;
    const TABLE: &'static TableDef = &STORY_SUBMISSIONS;

    fn id(&self) -> &str {
        &self.id
    }
}
