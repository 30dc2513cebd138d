//! Data models
//!
//! One typed record per table, with a create input and a partial update
//! patch. Inputs serialize to row maps for the generic table store; absent
//! optional fields are skipped so database defaults apply on insert and
//! untouched columns stay as they are on update.

pub mod catalog;
pub mod community;
pub mod email;
pub mod fields;
pub mod inquiry;
pub mod media;
pub mod profile;
mod session;
pub mod settings;
pub mod site;
pub mod stories;
pub mod validation;

pub use catalog::{Category, Product};
pub use community::{FarmerNetworkMember, StorySubmission};
pub use email::{EmailCampaign, EmailTemplate, NewsletterSubscription, SmtpConfiguration};
pub use inquiry::{Inquiry, InquiryForm, QuickInquiryForm};
pub use media::MediaItem;
pub use profile::Profile;
pub use session::{Session, SESSION_TTL_DAYS};
pub use settings::SystemSetting;
pub use site::{CropPortfolio, GalleryImage, PortfolioVideo, TeamMember, Testimonial};
pub use stories::{BlogPost, FarmerStory, RajasthanStory};
pub use validation::{FieldErrors, Validate};

use crate::db::repositories::{Row, SqlValue};
use crate::db::schema::TableDef;
use serde::{de::DeserializeOwned, Serialize};

/// Failure turning an input into a row
#[derive(Debug, thiserror::Error)]
pub enum RowError {
    #[error("Failed to serialize input: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Input did not serialize to an object")]
    NotAnObject,

    #[error(transparent)]
    Password(#[from] crate::services::password::PasswordError),
}

/// Serialize an input into a column map
pub fn to_row<T: Serialize>(value: &T) -> Result<Row, RowError> {
    match serde_json::to_value(value)? {
        serde_json::Value::Object(map) => Ok(map),
        _ => Err(RowError::NotAnObject),
    }
}

/// A record stored in one of the content tables
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    type Create: DeserializeOwned + Serialize + Validate + Send + Sync + 'static;
    type Update: DeserializeOwned + Serialize + Validate + Send + Sync + 'static;

    const TABLE: &'static TableDef;

    fn id(&self) -> &str;

    /// Condition a row must meet to appear on the public site
    fn published_condition() -> Option<(&'static str, SqlValue)> {
        None
    }

    fn create_row(input: Self::Create) -> Result<Row, RowError> {
        to_row(&input)
    }

    fn update_row(patch: Self::Update) -> Result<Row, RowError> {
        to_row(&patch)
    }

    /// Adjust an update row against the stored record before it is written
    fn complete_update(&self, _row: &mut Row) {}
}
