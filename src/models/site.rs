//! Marketing site content: testimonials, team, gallery, videos and the crop
//! portfolio

use super::fields::{nullable, opt_string_list, string_list};
use super::validation::{FieldErrors, Validate};
use super::Entity;
use crate::db::repositories::SqlValue;
use crate::db::schema::{
    TableDef, CROP_PORTFOLIO, GALLERY_IMAGES, PORTFOLIO_VIDEOS, TEAM_MEMBERS, TESTIMONIALS,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

fn active() -> Option<(&'static str, SqlValue)> {
    Some(("is_active", SqlValue::Bool(true)))
}

// ============================================================================
// Testimonials
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Testimonial {
    pub id: String,
    pub name: String,
    pub company: Option<String>,
    pub country: Option<String>,
    pub designation: Option<String>,
    pub content: String,
    /// 1 to 5 stars
    pub rating: i64,
    pub image_url: Option<String>,
    pub is_featured: bool,
    pub is_active: bool,
    pub sort_order: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateTestimonialInput {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub designation: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_featured: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTestimonialInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub company: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub country: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub designation: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<i64>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub image_url: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_featured: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i64>,
}

fn check_rating(errors: &mut FieldErrors, rating: Option<i64>) {
    if let Some(rating) = rating {
        if !(1..=5).contains(&rating) {
            errors.add("rating", "Rating must be between 1 and 5");
        }
    }
}

impl Validate for CreateTestimonialInput {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.required("name", &self.name);
        errors.required("content", &self.content);
        check_rating(&mut errors, self.rating);
        errors.into_result()
    }
}

impl Validate for UpdateTestimonialInput {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.not_blank("name", self.name.as_deref());
        errors.not_blank("content", self.content.as_deref());
        check_rating(&mut errors, self.rating);
        errors.into_result()
    }
}

impl Entity for Testimonial {
    type Create = CreateTestimonialInput;
    type Update = UpdateTestimonialInput;
    const TABLE: &'static TableDef = &TESTIMONIALS;

    fn id(&self) -> &str {
        &self.id
    }

    fn published_condition() -> Option<(&'static str, SqlValue)> {
        active()
    }
}

// ============================================================================
// Team members
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TeamMember {
    pub id: String,
    pub name: String,
    pub designation: Option<String>,
    pub department: Option<String>,
    pub bio: Option<String>,
    pub image_url: Option<String>,
    pub email: Option<String>,
    pub linkedin_url: Option<String>,
    pub sort_order: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateTeamMemberInput {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub designation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTeamMemberInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub designation: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub department: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub bio: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub image_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub email: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub linkedin_url: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl Validate for CreateTeamMemberInput {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.required("name", &self.name);
        errors.optional_email("email", self.email.as_deref());
        errors.into_result()
    }
}

impl Validate for UpdateTeamMemberInput {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.not_blank("name", self.name.as_deref());
        errors.optional_email("email", self.email.as_ref().and_then(Option::as_deref));
        errors.into_result()
    }
}

impl Entity for TeamMember {
    type Create = CreateTeamMemberInput;
    type Update = UpdateTeamMemberInput;
    const TABLE: &'static TableDef = &TEAM_MEMBERS;

    fn id(&self) -> &str {
        &self.id
    }

    fn published_condition() -> Option<(&'static str, SqlValue)> {
        active()
    }
}

// ============================================================================
// Gallery
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GalleryImage {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub image_url: String,
    pub category: Option<String>,
    #[serde(default, deserialize_with = "string_list")]
    pub tags: Vec<String>,
    pub alt_text: Option<String>,
    pub sort_order: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateGalleryImageInput {
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "string_list")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateGalleryImageInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub category: Option<Option<String>>,
    #[serde(default, deserialize_with = "opt_string_list", skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub alt_text: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl Validate for CreateGalleryImageInput {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.required("title", &self.title);
        errors.required("image_url", &self.image_url);
        errors.into_result()
    }
}

impl Validate for UpdateGalleryImageInput {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.not_blank("title", self.title.as_deref());
        errors.not_blank("image_url", self.image_url.as_deref());
        errors.into_result()
    }
}

impl Entity for GalleryImage {
    type Create = CreateGalleryImageInput;
    type Update = UpdateGalleryImageInput;
    const TABLE: &'static TableDef = &GALLERY_IMAGES;

    fn id(&self) -> &str {
        &self.id
    }

    fn published_condition() -> Option<(&'static str, SqlValue)> {
        active()
    }
}

// ============================================================================
// Portfolio videos
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PortfolioVideo {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub video_url: String,
    pub thumbnail_url: Option<String>,
    pub category: Option<String>,
    /// Display duration such as `3:45`
    pub duration: Option<String>,
    pub sort_order: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreatePortfolioVideoInput {
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub video_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePortfolioVideoInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub category: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub duration: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl Validate for CreatePortfolioVideoInput {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.required("title", &self.title);
        errors.required("video_url", &self.video_url);
        errors.into_result()
    }
}

impl Validate for UpdatePortfolioVideoInput {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.not_blank("title", self.title.as_deref());
        errors.not_blank("video_url", self.video_url.as_deref());
        errors.into_result()
    }
}

impl Entity for PortfolioVideo {
    type Create = CreatePortfolioVideoInput;
    type Update = UpdatePortfolioVideoInput;
    const TABLE: &'static TableDef = &PORTFOLIO_VIDEOS;

    fn id(&self) -> &str {
        &self.id
    }

    fn published_condition() -> Option<(&'static str, SqlValue)> {
        active()
    }
}

// ============================================================================
// Crop portfolio
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CropPortfolio {
    pub id: String,
    pub name: String,
    pub scientific_name: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "string_list")]
    pub varieties: Vec<String>,
    #[serde(default, deserialize_with = "string_list")]
    pub growing_regions: Vec<String>,
    pub harvest_season: Option<String>,
    pub image_url: Option<String>,
    #[serde(default)]
    pub nutritional_info: Value,
    #[serde(default, deserialize_with = "string_list")]
    pub export_markets: Vec<String>,
    pub is_active: bool,
    pub sort_order: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateCropInput {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scientific_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "string_list")]
    pub varieties: Vec<String>,
    #[serde(default, deserialize_with = "string_list")]
    pub growing_regions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub harvest_season: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nutritional_info: Option<Value>,
    #[serde(default, deserialize_with = "string_list")]
    pub export_markets: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateCropInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub scientific_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub category: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "opt_string_list", skip_serializing_if = "Option::is_none")]
    pub varieties: Option<Vec<String>>,
    #[serde(default, deserialize_with = "opt_string_list", skip_serializing_if = "Option::is_none")]
    pub growing_regions: Option<Vec<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub harvest_season: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub image_url: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nutritional_info: Option<Value>,
    #[serde(default, deserialize_with = "opt_string_list", skip_serializing_if = "Option::is_none")]
    pub export_markets: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i64>,
}

impl Validate for CreateCropInput {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.required("name", &self.name);
        errors.into_result()
    }
}

impl Validate for UpdateCropInput {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.not_blank("name", self.name.as_deref());
        errors.into_result()
    }
}

impl Entity for CropPortfolio {
    type Create = CreateCropInput;
    type Update = UpdateCropInput;
    const TABLE: &'static TableDef = &CROP_PORTFOLIO;

    fn id(&self) -> &str {
        &self.id
    }

    fn published_condition() -> Option<(&'static str, SqlValue)> {
        active()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::to_row;
    use serde_json::json;

    #[test]
    fn test_testimonial_rating_range() {
        let input: CreateTestimonialInput = serde_json::from_value(json!({
            "name": "Hans Müller",
            "content": "Consistent quality across every shipment.",
            "rating": 6
        }))
        .unwrap();
        let errors = input.validate().unwrap_err();
        assert_eq!(errors.get("rating"), Some("Rating must be between 1 and 5"));
    }

    #[test]
    fn test_crop_lists_from_comma_text() {
        let input: CreateCropInput = serde_json::from_value(json!({
            "name": "Cumin",
            "varieties": "GC-4, RZ-19",
            "export_markets": "UAE,  Germany, USA"
        }))
        .unwrap();
        let row = to_row(&input).unwrap();
        assert_eq!(row["varieties"], json!(["GC-4", "RZ-19"]));
        assert_eq!(row["export_markets"], json!(["UAE", "Germany", "USA"]));
        assert_eq!(row["growing_regions"], json!([]));
    }

    #[test]
    fn test_gallery_patch_tags() {
        let patch: UpdateGalleryImageInput =
            serde_json::from_value(json!({"tags": "harvest, mandi"})).unwrap();
        assert_eq!(patch.tags, Some(vec!["harvest".to_string(), "mandi".to_string()]));
        assert!(patch.validate().is_ok());
    }

    #[test]
    fn test_team_member_email_optional_but_checked() {
        let ok = CreateTeamMemberInput {
            name: "Priya".into(),
            ..Default::default()
        };
        assert!(ok.validate().is_ok());

        let bad = CreateTeamMemberInput {
            name: "Priya".into(),
            email: Some("priya-at-example".into()),
            ..Default::default()
        };
        assert!(bad.validate().is_err());
    }
}
