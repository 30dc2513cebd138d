//! Editorial content: the blog, farmer stories and regional stories

use super::fields::{nullable, opt_string_list, string_list};
use super::validation::{FieldErrors, Validate};
use super::{to_row, Entity, RowError};
use crate::db::repositories::{Row, SqlValue};
use crate::db::schema::{TableDef, BLOG_POSTS, FARMER_STORIES, RAJASTHAN_STORIES};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const STATUS_DRAFT: &str = "draft";
pub const STATUS_PUBLISHED: &str = "published";
pub const BLOG_STATUSES: &[&str] = &[STATUS_DRAFT, STATUS_PUBLISHED, "archived"];

/// Average reading speed used for `reading_time`
const WORDS_PER_MINUTE: usize = 200;

// ============================================================================
// Blog
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BlogPost {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub excerpt: Option<String>,
    pub content: String,
    pub featured_image: Option<String>,
    pub author: Option<String>,
    pub category: Option<String>,
    #[serde(default, deserialize_with = "string_list")]
    pub tags: Vec<String>,
    pub status: String,
    pub published_at: Option<DateTime<Utc>>,
    pub view_count: i64,
    /// Minutes
    pub reading_time: Option<i64>,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BlogPost {
    pub fn is_published(&self) -> bool {
        self.status == STATUS_PUBLISHED
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateBlogPostInput {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub featured_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "string_list")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reading_time: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateBlogPostInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub featured_image: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub author: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub category: Option<Option<String>>,
    #[serde(default, deserialize_with = "opt_string_list", skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub published_at: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub reading_time: Option<Option<i64>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub meta_title: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub meta_description: Option<Option<String>>,
}

fn check_status(errors: &mut FieldErrors, status: Option<&str>) {
    if let Some(status) = status {
        if !BLOG_STATUSES.contains(&status) {
            errors.add(
                "status",
                format!("Status must be one of: {}", BLOG_STATUSES.join(", ")),
            );
        }
    }
}

impl Validate for CreateBlogPostInput {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.required("title", &self.title);
        errors.required("slug", &self.slug);
        errors.required("content", &self.content);
        check_status(&mut errors, self.status.as_deref());
        errors.into_result()
    }
}

impl Validate for UpdateBlogPostInput {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.not_blank("title", self.title.as_deref());
        errors.not_blank("slug", self.slug.as_deref());
        errors.not_blank("content", self.content.as_deref());
        check_status(&mut errors, self.status.as_deref());
        errors.into_result()
    }
}

/// Estimated minutes to read `content`, at least one
pub fn reading_time(content: &str) -> i64 {
    let words = content.split_whitespace().count();
    words.div_ceil(WORDS_PER_MINUTE).max(1) as i64
}

/// Stamp `published_at` when the row publishes the post without a date
fn stamp_published_at(row: &mut Row) {
    let publishing = row.get("status").and_then(Value::as_str) == Some(STATUS_PUBLISHED);
    if publishing && !row.contains_key("published_at") {
        row.insert("published_at".into(), Value::String(Utc::now().to_rfc3339()));
    }
}

/// Derive `reading_time` from edited content unless the editor set it
fn fill_reading_time(mut row: Row) -> Row {
    if !row.contains_key("reading_time") {
        if let Some(content) = row.get("content").and_then(Value::as_str) {
            row.insert("reading_time".into(), Value::from(reading_time(content)));
        }
    }
    row
}

impl Entity for BlogPost {
    type Create = CreateBlogPostInput;
    type Update = UpdateBlogPostInput;
    const TABLE: &'static TableDef = &BLOG_POSTS;

    fn id(&self) -> &str {
        &self.id
    }

    fn published_condition() -> Option<(&'static str, SqlValue)> {
        Some(("status", SqlValue::from(STATUS_PUBLISHED)))
    }

    fn create_row(input: Self::Create) -> Result<Row, RowError> {
        let mut row = fill_reading_time(to_row(&input)?);
        stamp_published_at(&mut row);
        Ok(row)
    }

    fn update_row(patch: Self::Update) -> Result<Row, RowError> {
        Ok(fill_reading_time(to_row(&patch)?))
    }

    /// Only a post going live gets a new publication date
    fn complete_update(&self, row: &mut Row) {
        if !self.is_published() || self.published_at.is_none() {
            stamp_published_at(row);
        }
    }
}

// ============================================================================
// Farmer stories
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FarmerStory {
    pub id: String,
    pub farmer_name: String,
    pub location: Option<String>,
    pub crop_type: Option<String>,
    pub title: String,
    pub story: String,
    pub quote: Option<String>,
    pub image_url: Option<String>,
    pub video_url: Option<String>,
    #[serde(default, deserialize_with = "string_list")]
    pub achievements: Vec<String>,
    /// Acres under cultivation
    pub acreage: Option<f64>,
    pub years_farming: Option<i64>,
    pub is_featured: bool,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateFarmerStoryInput {
    #[serde(default)]
    pub farmer_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crop_type: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub story: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quote: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(default, deserialize_with = "string_list")]
    pub achievements: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acreage: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub years_farming: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_featured: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_published: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateFarmerStoryInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub farmer_name: Option<String>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub location: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub crop_type: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub story: Option<String>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub quote: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub image_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub video_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "opt_string_list", skip_serializing_if = "Option::is_none")]
    pub achievements: Option<Vec<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub acreage: Option<Option<f64>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub years_farming: Option<Option<i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_featured: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_published: Option<bool>,
}

fn check_farm_numbers(errors: &mut FieldErrors, acreage: Option<f64>, years: Option<i64>) {
    if acreage.is_some_and(|a| a < 0.0) {
        errors.add("acreage", "Acreage cannot be negative");
    }
    if years.is_some_and(|y| y < 0) {
        errors.add("years_farming", "Years farming cannot be negative");
    }
}

impl Validate for CreateFarmerStoryInput {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.required("farmer_name", &self.farmer_name);
        errors.required("title", &self.title);
        errors.required("story", &self.story);
        check_farm_numbers(&mut errors, self.acreage, self.years_farming);
        errors.into_result()
    }
}

impl Validate for UpdateFarmerStoryInput {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.not_blank("farmer_name", self.farmer_name.as_deref());
        errors.not_blank("title", self.title.as_deref());
        errors.not_blank("story", self.story.as_deref());
        check_farm_numbers(&mut errors, self.acreage.flatten(), self.years_farming.flatten());
        errors.into_result()
    }
}

impl Entity for FarmerStory {
    type Create = CreateFarmerStoryInput;
    type Update = UpdateFarmerStoryInput;
    const TABLE: &'static TableDef = &FARMER_STORIES;

    fn id(&self) -> &str {
        &self.id
    }

    fn published_condition() -> Option<(&'static str, SqlValue)> {
        Some(("is_published", SqlValue::Bool(true)))
    }
}

// ============================================================================
// Rajasthan stories
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RajasthanStory {
    pub id: String,
    pub title: String,
    pub subtitle: Option<String>,
    pub content: Option<String>,
    pub location: Option<String>,
    pub category: Option<String>,
    pub image_url: Option<String>,
    #[serde(default, deserialize_with = "string_list")]
    pub gallery: Vec<String>,
    pub is_featured: bool,
    pub is_published: bool,
    pub sort_order: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateRajasthanStoryInput {
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, deserialize_with = "string_list")]
    pub gallery: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_featured: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_published: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateRajasthanStoryInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub content: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub location: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub category: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub image_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "opt_string_list", skip_serializing_if = "Option::is_none")]
    pub gallery: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_featured: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_published: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i64>,
}

impl Validate for CreateRajasthanStoryInput {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.required("title", &self.title);
        errors.into_result()
    }
}

impl Validate for UpdateRajasthanStoryInput {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.not_blank("title", self.title.as_deref());
        errors.into_result()
    }
}

impl Entity for RajasthanStory {
    type Create = CreateRajasthanStoryInput;
    type Update = UpdateRajasthanStoryInput;
    const TABLE: &'static TableDef = &RAJASTHAN_STORIES;

    fn id(&self) -> &str {
        &self.id
    }

    fn published_condition() -> Option<(&'static str, SqlValue)> {
        Some(("is_published", SqlValue::Bool(true)))
    }
}
