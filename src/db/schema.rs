//! Static table descriptors
//!
//! Every content table is described once here. The generic store uses the
//! descriptor to build column lists, decode rows and validate patch keys, so
//! a column that is not listed can never reach a SQL string.
//!
//! All tables carry an implicit `id` (UUID text), `created_at` and
//! `updated_at` in addition to the columns listed.

/// How a column is stored and decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Integer,
    Real,
    Boolean,
    Timestamp,
    /// Array of strings, stored as JSON text
    TextList,
    /// Arbitrary JSON document, stored as JSON text
    Json,
}

#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub name: &'static str,
    pub kind: ColumnKind,
}

impl Column {
    pub const fn new(name: &'static str, kind: ColumnKind) -> Self {
        Self { name, kind }
    }
}

/// Descriptor for one table
#[derive(Debug)]
pub struct TableDef {
    pub name: &'static str,
    pub columns: &'static [Column],
    /// Columns matched by the free-text search (case-insensitive substring)
    pub search_columns: &'static [&'static str],
    /// Enum-like column used by the equality filter
    pub filter_column: Option<&'static str>,
    pub order_by: &'static str,
    pub descending: bool,
}

/// Columns every table carries
pub const ID: Column = Column::new("id", ColumnKind::Text);
pub const CREATED_AT: Column = Column::new("created_at", ColumnKind::Timestamp);
pub const UPDATED_AT: Column = Column::new("updated_at", ColumnKind::Timestamp);

impl TableDef {
    /// Look up a column, including the implicit ones
    pub fn column(&self, name: &str) -> Option<Column> {
        match name {
            "id" => Some(ID),
            "created_at" => Some(CREATED_AT),
            "updated_at" => Some(UPDATED_AT),
            _ => self.columns.iter().find(|c| c.name == name).copied(),
        }
    }

    /// All columns in select order
    pub fn all_columns(&self) -> impl Iterator<Item = Column> + '_ {
        [ID, CREATED_AT, UPDATED_AT]
            .into_iter()
            .chain(self.columns.iter().copied())
    }

    /// Comma separated select list
    pub fn select_list(&self) -> String {
        self.all_columns()
            .map(|c| c.name)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Cache key prefix for this table
    pub fn cache_pattern(&self) -> String {
        format!("{}:*", self.name)
    }
}

use ColumnKind::{Boolean, Integer, Json, Real, Text, TextList, Timestamp};

pub static CATEGORIES: TableDef = TableDef {
    name: "categories",
    columns: &[
        Column::new("name", Text),
        Column::new("slug", Text),
        Column::new("description", Text),
        Column::new("image_url", Text),
        Column::new("sort_order", Integer),
        Column::new("is_active", Boolean),
    ],
    search_columns: &["name", "description"],
    filter_column: None,
    order_by: "sort_order",
    descending: false,
};

pub static PRODUCTS: TableDef = TableDef {
    name: "products",
    columns: &[
        Column::new("name", Text),
        Column::new("slug", Text),
        Column::new("category_id", Text),
        Column::new("description", Text),
        Column::new("short_description", Text),
        Column::new("image_url", Text),
        Column::new("gallery_images", TextList),
        Column::new("specifications", Json),
        Column::new("origin", Text),
        Column::new("min_order_quantity", Text),
        Column::new("unit", Text),
        Column::new("price_range", Text),
        Column::new("certifications", TextList),
        Column::new("is_featured", Boolean),
        Column::new("is_active", Boolean),
        Column::new("sort_order", Integer),
    ],
    search_columns: &["name", "description", "origin"],
    filter_column: Some("category_id"),
    order_by: "sort_order",
    descending: false,
};

pub static INQUIRIES: TableDef = TableDef {
    name: "inquiries",
    columns: &[
        Column::new("inquiry_number", Text),
        Column::new("name", Text),
        Column::new("email", Text),
        Column::new("phone", Text),
        Column::new("company", Text),
        Column::new("country", Text),
        Column::new("product_id", Text),
        Column::new("product_name", Text),
        Column::new("quantity", Text),
        Column::new("quantity_unit", Text),
        Column::new("message", Text),
        Column::new("inquiry_type", Text),
        Column::new("status", Text),
        Column::new("source", Text),
        Column::new("metadata", Json),
    ],
    search_columns: &["name", "email", "company"],
    filter_column: Some("status"),
    order_by: "created_at",
    descending: true,
};

pub static MEDIA: TableDef = TableDef {
    name: "media",
    columns: &[
        Column::new("filename", Text),
        Column::new("original_name", Text),
        Column::new("url", Text),
        Column::new("storage_path", Text),
        Column::new("mime_type", Text),
        Column::new("size_bytes", Integer),
        Column::new("alt_text", Text),
        Column::new("folder", Text),
        Column::new("metadata", Json),
    ],
    search_columns: &["filename", "original_name", "alt_text"],
    filter_column: Some("folder"),
    order_by: "created_at",
    descending: true,
};

pub static PROFILES: TableDef = TableDef {
    name: "profiles",
    columns: &[
        Column::new("email", Text),
        Column::new("full_name", Text),
        Column::new("role", Text),
        Column::new("avatar_url", Text),
        Column::new("phone", Text),
        Column::new("is_active", Boolean),
        Column::new("password_hash", Text),
    ],
    search_columns: &["email", "full_name"],
    filter_column: Some("role"),
    order_by: "created_at",
    descending: true,
};

pub static TESTIMONIALS: TableDef = TableDef {
    name: "testimonials",
    columns: &[
        Column::new("name", Text),
        Column::new("company", Text),
        Column::new("country", Text),
        Column::new("designation", Text),
        Column::new("content", Text),
        Column::new("rating", Integer),
        Column::new("image_url", Text),
        Column::new("is_featured", Boolean),
        Column::new("is_active", Boolean),
        Column::new("sort_order", Integer),
    ],
    search_columns: &["name", "company", "content"],
    filter_column: Some("country"),
    order_by: "sort_order",
    descending: false,
};

pub static BLOG_POSTS: TableDef = TableDef {
    name: "agri_blog_posts",
    columns: &[
        Column::new("title", Text),
        Column::new("slug", Text),
        Column::new("excerpt", Text),
        Column::new("content", Text),
        Column::new("featured_image", Text),
        Column::new("author", Text),
        Column::new("category", Text),
        Column::new("tags", TextList),
        Column::new("status", Text),
        Column::new("published_at", Timestamp),
        Column::new("view_count", Integer),
        Column::new("reading_time", Integer),
        Column::new("meta_title", Text),
        Column::new("meta_description", Text),
    ],
    search_columns: &["title", "excerpt", "author"],
    filter_column: Some("category"),
    order_by: "created_at",
    descending: true,
};

pub static CROP_PORTFOLIO: TableDef = TableDef {
    name: "crop_portfolio",
    columns: &[
        Column::new("name", Text),
        Column::new("scientific_name", Text),
        Column::new("category", Text),
        Column::new("description", Text),
        Column::new("varieties", TextList),
        Column::new("growing_regions", TextList),
        Column::new("harvest_season", Text),
        Column::new("image_url", Text),
        Column::new("nutritional_info", Json),
        Column::new("export_markets", TextList),
        Column::new("is_active", Boolean),
        Column::new("sort_order", Integer),
    ],
    search_columns: &["name", "scientific_name", "description"],
    filter_column: Some("category"),
    order_by: "sort_order",
    descending: false,
};

pub static FARMER_STORIES: TableDef = TableDef {
    name: "farmer_stories",
    columns: &[
        Column::new("farmer_name", Text),
        Column::new("location", Text),
        Column::new("crop_type", Text),
        Column::new("title", Text),
        Column::new("story", Text),
        Column::new("quote", Text),
        Column::new("image_url", Text),
        Column::new("video_url", Text),
        Column::new("achievements", TextList),
        Column::new("acreage", Real),
        Column::new("years_farming", Integer),
        Column::new("is_featured", Boolean),
        Column::new("is_published", Boolean),
    ],
    search_columns: &["farmer_name", "location", "title"],
    filter_column: Some("crop_type"),
    order_by: "created_at",
    descending: true,
};

pub static GALLERY_IMAGES: TableDef = TableDef {
    name: "gallery_images",
    columns: &[
        Column::new("title", Text),
        Column::new("description", Text),
        Column::new("image_url", Text),
        Column::new("category", Text),
        Column::new("tags", TextList),
        Column::new("alt_text", Text),
        Column::new("sort_order", Integer),
        Column::new("is_active", Boolean),
    ],
    search_columns: &["title", "description"],
    filter_column: Some("category"),
    order_by: "sort_order",
    descending: false,
};

pub static EMAIL_CAMPAIGNS: TableDef = TableDef {
    name: "email_campaigns",
    columns: &[
        Column::new("name", Text),
        Column::new("subject", Text),
        Column::new("content", Text),
        Column::new("template_id", Text),
        Column::new("status", Text),
        Column::new("recipient_type", Text),
        Column::new("scheduled_at", Timestamp),
        Column::new("sent_at", Timestamp),
        Column::new("sent_count", Integer),
        Column::new("failed_count", Integer),
        Column::new("metadata", Json),
    ],
    search_columns: &["name", "subject"],
    filter_column: Some("status"),
    order_by: "created_at",
    descending: true,
};

pub static EMAIL_TEMPLATES: TableDef = TableDef {
    name: "email_templates",
    columns: &[
        Column::new("name", Text),
        Column::new("subject", Text),
        Column::new("html_content", Text),
        Column::new("category", Text),
        Column::new("variables", TextList),
        Column::new("is_active", Boolean),
    ],
    search_columns: &["name", "subject"],
    filter_column: Some("category"),
    order_by: "created_at",
    descending: true,
};

pub static NEWSLETTER_SUBSCRIPTIONS: TableDef = TableDef {
    name: "newsletter_subscriptions",
    columns: &[
        Column::new("email", Text),
        Column::new("name", Text),
        Column::new("source", Text),
        Column::new("is_active", Boolean),
        Column::new("preferences", Json),
    ],
    search_columns: &["email", "name"],
    filter_column: Some("source"),
    order_by: "created_at",
    descending: true,
};

pub static SMTP_CONFIGURATIONS: TableDef = TableDef {
    name: "smtp_configurations",
    columns: &[
        Column::new("name", Text),
        Column::new("host", Text),
        Column::new("port", Integer),
        Column::new("username", Text),
        Column::new("password", Text),
        Column::new("from_email", Text),
        Column::new("from_name", Text),
        Column::new("use_tls", Boolean),
        Column::new("is_active", Boolean),
    ],
    search_columns: &["name", "host"],
    filter_column: None,
    order_by: "created_at",
    descending: true,
};

pub static SYSTEM_SETTINGS: TableDef = TableDef {
    name: "system_settings",
    columns: &[
        Column::new("setting_key", Text),
        Column::new("setting_value", Json),
        Column::new("category", Text),
        Column::new("description", Text),
        Column::new("is_public", Boolean),
    ],
    search_columns: &["setting_key", "description"],
    filter_column: Some("category"),
    order_by: "setting_key",
    descending: false,
};

pub static TEAM_MEMBERS: TableDef = TableDef {
    name: "org_team_members",
    columns: &[
        Column::new("name", Text),
        Column::new("designation", Text),
        Column::new("department", Text),
        Column::new("bio", Text),
        Column::new("image_url", Text),
        Column::new("email", Text),
        Column::new("linkedin_url", Text),
        Column::new("sort_order", Integer),
        Column::new("is_active", Boolean),
    ],
    search_columns: &["name", "designation", "department"],
    filter_column: Some("department"),
    order_by: "sort_order",
    descending: false,
};

pub static FARMER_NETWORK: TableDef = TableDef {
    name: "farmer_network",
    columns: &[
        Column::new("full_name", Text),
        Column::new("phone", Text),
        Column::new("email", Text),
        Column::new("village", Text),
        Column::new("district", Text),
        Column::new("state", Text),
        Column::new("land_size", Text),
        Column::new("crops", TextList),
        Column::new("farming_experience", Text),
        Column::new("message", Text),
        Column::new("status", Text),
    ],
    search_columns: &["full_name", "village", "district"],
    filter_column: Some("status"),
    order_by: "created_at",
    descending: true,
};

pub static STORY_SUBMISSIONS: TableDef = TableDef {
    name: "story_submissions",
    columns: &[
        Column::new("name", Text),
        Column::new("email", Text),
        Column::new("phone", Text),
        Column::new("location", Text),
        Column::new("story_title", Text),
        Column::new("story_content", Text),
        Column::new("crop_type", Text),
        Column::new("image_urls", TextList),
        Column::new("consent", Boolean),
        Column::new("status", Text),
    ],
    search_columns: &["name", "story_title", "location"],
    filter_column: Some("status"),
    order_by: "created_at",
    descending: true,
};

pub static RAJASTHAN_STORIES: TableDef = TableDef {
    name: "rajasthan_stories",
    columns: &[
        Column::new("title", Text),
        Column::new("subtitle", Text),
        Column::new("content", Text),
        Column::new("location", Text),
        Column::new("category", Text),
        Column::new("image_url", Text),
        Column::new("gallery", TextList),
        Column::new("is_featured", Boolean),
        Column::new("is_published", Boolean),
        Column::new("sort_order", Integer),
    ],
    search_columns: &["title", "location", "subtitle"],
    filter_column: Some("category"),
    order_by: "sort_order",
    descending: false,
};

pub static PORTFOLIO_VIDEOS: TableDef = TableDef {
    name: "portfolio_videos",
    columns: &[
        Column::new("title", Text),
        Column::new("description", Text),
        Column::new("video_url", Text),
        Column::new("thumbnail_url", Text),
        Column::new("category", Text),
        Column::new("duration", Text),
        Column::new("sort_order", Integer),
        Column::new("is_active", Boolean),
    ],
    search_columns: &["title", "description"],
    filter_column: Some("category"),
    order_by: "sort_order",
    descending: false,
};

/// Every content table, in migration order
pub static ALL_TABLES: &[&TableDef] = &[
    &CATEGORIES,
    &PRODUCTS,
    &INQUIRIES,
    &MEDIA,
    &PROFILES,
    &TESTIMONIALS,
    &BLOG_POSTS,
    &CROP_PORTFOLIO,
    &FARMER_STORIES,
    &GALLERY_IMAGES,
    &EMAIL_CAMPAIGNS,
    &EMAIL_TEMPLATES,
    &NEWSLETTER_SUBSCRIPTIONS,
    &SMTP_CONFIGURATIONS,
    &SYSTEM_SETTINGS,
    &TEAM_MEMBERS,
    &FARMER_NETWORK,
    &STORY_SUBMISSIONS,
    &RAJASTHAN_STORIES,
    &PORTFOLIO_VIDEOS,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_columns_are_consistent() {
        for table in ALL_TABLES {
            for search in table.search_columns {
                assert!(
                    table.column(search).is_some(),
                    "{} search column {} missing",
                    table.name,
                    search
                );
            }
            if let Some(filter) = table.filter_column {
                assert!(table.column(filter).is_some(), "{} filter {}", table.name, filter);
            }
            assert!(table.column(table.order_by).is_some(), "{} order", table.name);
            assert!(!table.search_columns.is_empty() && table.search_columns.len() <= 3);
        }
    }

    #[test]
    fn test_column_lookup_includes_implicit_columns() {
        assert_eq!(CATEGORIES.column("id").map(|c| c.kind), Some(ColumnKind::Text));
        assert_eq!(
            CATEGORIES.column("created_at").map(|c| c.kind),
            Some(ColumnKind::Timestamp)
        );
        assert!(CATEGORIES.column("bogus").is_none());
        assert!(CATEGORIES.select_list().starts_with("id, created_at, updated_at, name"));
    }

    #[test]
    fn test_table_names_unique() {
        let mut names: Vec<_> = ALL_TABLES.iter().map(|t| t.name).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), ALL_TABLES.len());
    }
}
