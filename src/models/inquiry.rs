//! Buyer inquiries
//!
//! Two public forms feed the `inquiries` table: the full contact form and
//! the quick inquiry dialog on a product card. Admins create and edit rows
//! through the generic inputs.

use super::fields::{nullable, opt_trimmed};
use super::validation::{FieldErrors, Validate};
use super::Entity;
use crate::db::schema::{TableDef, INQUIRIES};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `inquiry_type` recorded for quick inquiries
pub const PRODUCT_INQUIRY: &str = "product_inquiry";
/// `inquiry_type` when the contact form leaves it unset
pub const GENERAL_INQUIRY: &str = "general";
/// Status of a freshly submitted inquiry
pub const STATUS_NEW: &str = "new";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Inquiry {
    pub id: String,
    pub inquiry_number: Option<String>,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub country: Option<String>,
    pub product_id: Option<String>,
    pub product_name: Option<String>,
    /// Kept verbatim as typed by the buyer
    pub quantity: Option<String>,
    pub quantity_unit: Option<String>,
    pub message: Option<String>,
    pub inquiry_type: String,
    pub status: String,
    pub source: String,
    #[serde(default)]
    pub metadata: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateInquiryInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inquiry_number: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, deserialize_with = "opt_trimmed", skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "opt_trimmed", skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, deserialize_with = "opt_trimmed", skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, deserialize_with = "opt_trimmed", skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity_unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inquiry_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

/// Admin edit of an inquiry, typically a status change
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateInquiryInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub company: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub country: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub product_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub quantity: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub quantity_unit: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub message: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inquiry_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl Validate for CreateInquiryInput {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.required("name", &self.name);
        errors.email("email", &self.email);
        errors.into_result()
    }
}

impl Validate for UpdateInquiryInput {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.not_blank("name", self.name.as_deref());
        if let Some(email) = self.email.as_deref() {
            errors.email("email", email);
        }
        errors.not_blank("status", self.status.as_deref());
        errors.into_result()
    }
}

impl Entity for Inquiry {
    type Create = CreateInquiryInput;
    type Update = UpdateInquiryInput;
    const TABLE: &'static TableDef = &INQUIRIES;

    fn id(&self) -> &str {
        &self.id
    }
}

/// Public contact form
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InquiryForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, deserialize_with = "opt_trimmed")]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "opt_trimmed")]
    pub company: Option<String>,
    #[serde(default, deserialize_with = "opt_trimmed")]
    pub country: Option<String>,
    #[serde(default, deserialize_with = "opt_trimmed")]
    pub product_id: Option<String>,
    #[serde(default, deserialize_with = "opt_trimmed")]
    pub product_name: Option<String>,
    #[serde(default, deserialize_with = "opt_trimmed")]
    pub quantity: Option<String>,
    #[serde(default, deserialize_with = "opt_trimmed")]
    pub quantity_unit: Option<String>,
    #[serde(default)]
    pub message: String,
    #[serde(default, deserialize_with = "opt_trimmed")]
    pub inquiry_type: Option<String>,
    #[serde(default)]
    pub metadata: Option<Value>,
}

impl Validate for InquiryForm {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.min_len("name", &self.name, 2);
        errors.email("email", &self.email);
        if let Some(phone) = self.phone.as_deref() {
            errors.phone("phone", phone);
        }
        errors.min_len("message", &self.message, 10);
        errors.into_result()
    }
}

impl InquiryForm {
    pub fn into_create(self, inquiry_number: String) -> CreateInquiryInput {
        CreateInquiryInput {
            inquiry_number: Some(inquiry_number),
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: self.phone,
            company: self.company,
            country: self.country,
            product_id: self.product_id,
            product_name: self.product_name,
            quantity: self.quantity,
            quantity_unit: self.quantity_unit,
            message: Some(self.message.trim().to_string()),
            inquiry_type: Some(
                self.inquiry_type
                    .unwrap_or_else(|| GENERAL_INQUIRY.to_string()),
            ),
            status: Some(STATUS_NEW.to_string()),
            source: Some("contact_form".to_string()),
            metadata: self.metadata,
        }
    }
}

/// Quick inquiry dialog opened from a product
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuickInquiryForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default, deserialize_with = "opt_trimmed")]
    pub company: Option<String>,
    #[serde(default, deserialize_with = "opt_trimmed")]
    pub country: Option<String>,
    #[serde(default, deserialize_with = "opt_trimmed")]
    pub product_id: Option<String>,
    #[serde(default, deserialize_with = "opt_trimmed")]
    pub product_name: Option<String>,
    #[serde(default)]
    pub quantity: String,
    #[serde(default)]
    pub quantity_unit: String,
    #[serde(default, deserialize_with = "opt_trimmed")]
    pub message: Option<String>,
}

impl Validate for QuickInquiryForm {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.min_len("name", &self.name, 2);
        errors.email("email", &self.email);
        errors.phone("phone", &self.phone);
        errors.required("quantity", &self.quantity);
        errors.required("quantity_unit", &self.quantity_unit);
        errors.into_result()
    }
}

impl QuickInquiryForm {
    /// Quantity and unit are stored exactly as submitted.
    pub fn into_create(self, inquiry_number: String) -> CreateInquiryInput {
        CreateInquiryInput {
            inquiry_number: Some(inquiry_number),
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: Some(self.phone.trim().to_string()),
            company: self.company,
            country: self.country,
            product_id: self.product_id,
            product_name: self.product_name,
            quantity: Some(self.quantity),
            quantity_unit: Some(self.quantity_unit),
            message: self.message,
            inquiry_type: Some(PRODUCT_INQUIRY.to_string()),
            status: Some(STATUS_NEW.to_string()),
            source: Some("quick_inquiry".to_string()),
            metadata: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn quick_form() -> QuickInquiryForm {
        serde_json::from_value(json!({
            "name": "Asha Traders",
            "email": "asha@example.com",
            "phone": "+91 98765 43210",
            "product_name": "Cumin Seeds",
            "quantity": "500",
            "quantity_unit": "kg"
        }))
        .unwrap()
    }

    #[test]
    fn test_quick_inquiry_defaults() {
        let form = quick_form();
        assert!(form.validate().is_ok());

        let input = form.into_create("INQ-2024-00001".into());
        assert_eq!(input.inquiry_type.as_deref(), Some(PRODUCT_INQUIRY));
        assert_eq!(input.status.as_deref(), Some(STATUS_NEW));
        assert_eq!(input.quantity.as_deref(), Some("500"));
        assert_eq!(input.quantity_unit.as_deref(), Some("kg"));
        assert_eq!(input.inquiry_number.as_deref(), Some("INQ-2024-00001"));
    }

    #[test]
    fn test_quick_inquiry_requires_contact_details() {
        let errors = QuickInquiryForm::default().validate().unwrap_err();
        for field in ["name", "email", "phone", "quantity", "quantity_unit"] {
            assert!(errors.get(field).is_some(), "{} should be required", field);
        }
    }

    #[test]
    fn test_inquiry_form_validation() {
        let form: InquiryForm = serde_json::from_value(json!({
            "name": "A",
            "email": "bad",
            "phone": "123",
            "message": "hi"
        }))
        .unwrap();
        let errors = form.validate().unwrap_err();
        assert!(errors.get("name").is_some());
        assert!(errors.get("email").is_some());
        assert!(errors.get("phone").is_some());
        assert!(errors.get("message").is_some());
    }

    #[test]
    fn test_inquiry_form_defaults_type() {
        let form: InquiryForm = serde_json::from_value(json!({
            "name": "Ravi",
            "email": "ravi@example.com",
            "message": "Looking for 20 MT of guar gum"
        }))
        .unwrap();
        let input = form.into_create("INQ-2024-00002".into());
        assert_eq!(input.inquiry_type.as_deref(), Some(GENERAL_INQUIRY));
        assert!(input.phone.is_none());
    }
}
