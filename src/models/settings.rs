//! Key/value site settings

use super::fields::nullable;
use super::validation::{FieldErrors, Validate};
use super::Entity;
use crate::db::repositories::SqlValue;
use crate::db::schema::{TableDef, SYSTEM_SETTINGS};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SystemSetting {
    pub id: String,
    pub setting_key: String,
    /// Any JSON value
    #[serde(default)]
    pub setting_value: Value,
    pub category: Option<String>,
    pub description: Option<String>,
    /// Exposed on the public settings endpoint
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateSettingInput {
    #[serde(default)]
    pub setting_key: String,
    #[serde(default)]
    pub setting_value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_public: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateSettingInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub setting_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub setting_value: Option<Value>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub category: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_public: Option<bool>,
}

fn check_key(errors: &mut FieldErrors, key: &str) {
    if key.chars().any(char::is_whitespace) {
        errors.add("setting_key", "Setting key cannot contain spaces");
    }
}

impl Validate for CreateSettingInput {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.required("setting_key", &self.setting_key);
        check_key(&mut errors, self.setting_key.trim());
        errors.into_result()
    }
}

impl Validate for UpdateSettingInput {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.not_blank("setting_key", self.setting_key.as_deref());
        if let Some(key) = self.setting_key.as_deref() {
            check_key(&mut errors, key.trim());
        }
        errors.into_result()
    }
}

impl Entity for SystemSetting {
    type Create = CreateSettingInput;
    type Update = UpdateSettingInput;
    const TABLE: &'static TableDef = &SYSTEM_SETTINGS;

    fn id(&self) -> &str {
        &self.id
    }

    fn published_condition() -> Option<(&'static str, SqlValue)> {
        Some(("is_public", SqlValue::Bool(true)))
    }
}
