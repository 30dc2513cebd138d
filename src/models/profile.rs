//! User profiles
//!
//! Profiles double as console accounts. The password hash is stored on the
//! row but never serialized.

use super::fields::nullable;
use super::validation::{FieldErrors, Validate};
use super::{to_row, Entity, RowError};
use crate::db::repositories::Row;
use crate::db::schema::{TableDef, PROFILES};
use crate::services::password::{hash_password, MIN_PASSWORD_LENGTH};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const ROLES: &[&str] = &["admin", "editor", "user"];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Profile {
    pub id: String,
    pub email: String,
    pub full_name: Option<String>,
    pub role: String,
    pub avatar_url: Option<String>,
    pub phone: Option<String>,
    pub is_active: bool,
    #[serde(default, skip_serializing)]
    pub password_hash: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    pub fn is_admin(&self) -> bool {
        self.role == "admin" && self.is_active
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateProfileInput {
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    /// Plain password; replaced by its hash before the row is written
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProfileInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub full_name: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub phone: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

fn check_role(errors: &mut FieldErrors, role: Option<&str>) {
    if let Some(role) = role {
        if !ROLES.contains(&role) {
            errors.add("role", format!("Role must be one of: {}", ROLES.join(", ")));
        }
    }
}

fn check_password(errors: &mut FieldErrors, password: Option<&str>) {
    if let Some(password) = password {
        if password.chars().count() < MIN_PASSWORD_LENGTH {
            errors.add(
                "password",
                format!("Password must be at least {} characters", MIN_PASSWORD_LENGTH),
            );
        }
    }
}

impl Validate for CreateProfileInput {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.email("email", &self.email);
        check_role(&mut errors, self.role.as_deref());
        check_password(&mut errors, self.password.as_deref());
        errors.into_result()
    }
}

impl Validate for UpdateProfileInput {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        if let Some(email) = self.email.as_deref() {
            errors.email("email", email);
        }
        check_role(&mut errors, self.role.as_deref());
        check_password(&mut errors, self.password.as_deref());
        errors.into_result()
    }
}

/// Swap a plain `password` key for `password_hash`
fn hash_password_field(mut row: Row) -> Result<Row, RowError> {
    if let Some(Value::String(password)) = row.remove("password") {
        row.insert(
            "password_hash".to_string(),
            Value::String(hash_password(&password)?),
        );
    }
    Ok(row)
}

impl Entity for Profile {
    type Create = CreateProfileInput;
    type Update = UpdateProfileInput;
    const TABLE: &'static TableDef = &PROFILES;

    fn id(&self) -> &str {
        &self.id
    }

    fn create_row(mut input: Self::Create) -> Result<Row, RowError> {
        input.email = input.email.trim().to_lowercase();
        hash_password_field(to_row(&input)?)
    }

    fn update_row(mut patch: Self::Update) -> Result<Row, RowError> {
        patch.email = patch.email.map(|e| e.trim().to_lowercase());
        hash_password_field(to_row(&patch)?)
    }
}
