//! Services layer - Business logic
//!
//! Services sit between the HTTP handlers and the repositories:
//! - `content` gives every table validated, cached CRUD
//! - `forms`, `media`, `email` and `auth` compose those into the
//!   workflows the site and console need
//! - `browse` and `deeplink` are pure helpers

pub mod auth;
pub mod browse;
pub mod content;
pub mod deeplink;
pub mod email;
pub mod forms;
pub mod media;
pub mod password;
pub mod settings;

pub use auth::{AuthError, AuthService, LoginInput, LoginResult};
pub use browse::{empty_state_message, filter_rows, Browsable, Lightbox};
pub use content::{ContentError, ContentService};
pub use deeplink::{mailto_link, whatsapp_link, ContactLinks};
pub use email::{EmailError, EmailService};
pub use forms::{FormError, FormService, Submitted};
pub use media::{MediaError, MediaService, UploadBatch, UploadFile};
pub use password::{hash_password, verify_password};
pub use settings::SettingsService;
