//! agricms - content backend for an agricultural export website
//!
//! Serves the public site's content and forms, and the admin console's
//! CRUD, media library and email campaigns over one JSON API.

pub mod api;
pub mod cache;
pub mod config;
pub mod db;
pub mod functions;
pub mod models;
pub mod services;
pub mod storage;
