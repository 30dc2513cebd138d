//! Product catalog: categories and export products

use super::fields::{nullable, opt_string_list, opt_trimmed, string_list};
use super::validation::{FieldErrors, Validate};
use super::Entity;
use crate::db::repositories::SqlValue;
use crate::db::schema::{TableDef, CATEGORIES, PRODUCTS};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Product category
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Category {
    pub id: String,
    pub name: String,
    /// URL-friendly slug, unique
    pub slug: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub sort_order: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateCategoryInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default, deserialize_with = "opt_trimmed", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "opt_trimmed", skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateCategoryInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub image_url: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl Validate for CreateCategoryInput {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.required("name", &self.name);
        errors.required("slug", &self.slug);
        errors.into_result()
    }
}

impl Validate for UpdateCategoryInput {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.not_blank("name", self.name.as_deref());
        errors.not_blank("slug", self.slug.as_deref());
        errors.into_result()
    }
}

impl Entity for Category {
    type Create = CreateCategoryInput;
    type Update = UpdateCategoryInput;
    const TABLE: &'static TableDef = &CATEGORIES;

    fn id(&self) -> &str {
        &self.id
    }

    fn published_condition() -> Option<(&'static str, SqlValue)> {
        Some(("is_active", SqlValue::Bool(true)))
    }
}

/// Export product listed in the catalog
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub category_id: Option<String>,
    pub description: Option<String>,
    pub short_description: Option<String>,
    pub image_url: Option<String>,
    #[serde(default, deserialize_with = "string_list")]
    pub gallery_images: Vec<String>,
    /// Free-form spec sheet (moisture, purity, packaging...)
    #[serde(default)]
    pub specifications: Value,
    pub origin: Option<String>,
    pub min_order_quantity: Option<String>,
    pub unit: Option<String>,
    pub price_range: Option<String>,
    #[serde(default, deserialize_with = "string_list")]
    pub certifications: Vec<String>,
    pub is_featured: bool,
    pub is_active: bool,
    pub sort_order: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateProductInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default, deserialize_with = "opt_trimmed", skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_description: Option<String>,
    #[serde(default, deserialize_with = "opt_trimmed", skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, deserialize_with = "string_list")]
    pub gallery_images: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specifications: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_order_quantity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_range: Option<String>,
    #[serde(default, deserialize_with = "string_list")]
    pub certifications: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_featured: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProductInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub category_id: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub short_description: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub image_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "opt_string_list", skip_serializing_if = "Option::is_none")]
    pub gallery_images: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specifications: Option<Value>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub origin: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub min_order_quantity: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub unit: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub price_range: Option<Option<String>>,
    #[serde(default, deserialize_with = "opt_string_list", skip_serializing_if = "Option::is_none")]
    pub certifications: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_featured: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i64>,
}

impl Validate for CreateProductInput {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.required("name", &self.name);
        errors.required("slug", &self.slug);
        errors.into_result()
    }
}

impl Validate for UpdateProductInput {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.not_blank("name", self.name.as_deref());
        errors.not_blank("slug", self.slug.as_deref());
        errors.into_result()
    }
}

impl Entity for Product {
    type Create = CreateProductInput;
    type Update = UpdateProductInput;
    const TABLE: &'static TableDef = &PRODUCTS;

    fn id(&self) -> &str {
        &self.id
    }

    fn published_condition() -> Option<(&'static str, SqlValue)> {
        Some(("is_active", SqlValue::Bool(true)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::to_row;
    use serde_json::json;

    #[test]
    fn test_create_product_splits_lists() {
        let input: CreateProductInput = serde_json::from_value(json!({
            "name": "Cumin Seeds",
            "slug": "cumin-seeds",
            "certifications": "Organic, FSSAI, ",
            "gallery_images": ["/a.jpg", "/b.jpg"]
        }))
        .unwrap();

        assert_eq!(input.certifications, vec!["Organic", "FSSAI"]);
        let row = to_row(&input).unwrap();
        assert_eq!(row["certifications"], json!(["Organic", "FSSAI"]));
        assert!(!row.contains_key("is_active"));
        assert!(!row.contains_key("description"));
    }

    #[test]
    fn test_update_only_serializes_supplied_fields() {
        let patch: UpdateProductInput =
            serde_json::from_value(json!({"price_range": "$2-3/kg"})).unwrap();
        let row = to_row(&patch).unwrap();
        assert_eq!(row.len(), 1);
        assert_eq!(row["price_range"], "$2-3/kg");
    }

    #[test]
    fn test_category_validation() {
        let input = CreateCategoryInput::default();
        let errors = input.validate().unwrap_err();
        assert!(errors.get("name").is_some());
        assert!(errors.get("slug").is_some());

        let patch = UpdateCategoryInput {
            name: Some("".into()),
            ..Default::default()
        };
        assert!(patch.validate().is_err());
        assert!(UpdateCategoryInput::default().validate().is_ok());
    }

    #[test]
    fn test_product_record_from_row() {
        let product: Product = serde_json::from_value(json!({
            "id": "p1", "name": "Guar", "slug": "guar", "category_id": null,
            "description": null, "short_description": null, "image_url": null,
            "gallery_images": null, "specifications": {"purity": "99%"},
            "origin": "Rajasthan", "min_order_quantity": "1 MT", "unit": "kg",
            "price_range": null, "certifications": ["ISO"], "is_featured": false,
            "is_active": true, "sort_order": 0,
            "created_at": "2024-01-01T00:00:00Z", "updated_at": "2024-01-01T00:00:00Z"
        }))
        .unwrap();
        assert!(product.gallery_images.is_empty());
        assert_eq!(product.certifications, vec!["ISO"]);
        assert_eq!(product.specifications["purity"], "99%");
    }
}
