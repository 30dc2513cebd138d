//! Public browsing helpers
//!
//! Pure functions behind the public screens: text and category filtering
//! over an already loaded list, and lightbox navigation that wraps at both
//! ends.

use crate::models::{FarmerStory, GalleryImage};
use serde::Serialize;

/// A record the public screens can filter
pub trait Browsable {
    /// Text fields matched by the search box
    fn search_fields(&self) -> Vec<&str>;

    /// Value compared against the category selector
    fn category(&self) -> Option<&str>;
}

impl Browsable for FarmerStory {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.farmer_name.as_str(), self.title.as_str()];
        fields.extend(self.location.as_deref());
        fields
    }

    fn category(&self) -> Option<&str> {
        self.crop_type.as_deref()
    }
}

impl Browsable for GalleryImage {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.title.as_str()];
        fields.extend(self.description.as_deref());
        fields
    }

    fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }
}

/// True when the selector means "no category filter"
fn is_all(category: &str) -> bool {
    let category = category.trim();
    category.is_empty() || category.eq_ignore_ascii_case("all")
}

/// Rows matching a case-insensitive substring `query` and a `category`.
///
/// An empty query matches everything; `all` or an empty category disables
/// the category filter. Order is preserved.
pub fn filter_rows<T: Browsable + Clone>(rows: &[T], query: &str, category: &str) -> Vec<T> {
    let needle = query.trim().to_lowercase();
    rows.iter()
        .filter(|row| is_all(category) || row.category() == Some(category.trim()))
        .filter(|row| {
            needle.is_empty()
                || row
                    .search_fields()
                    .iter()
                    .any(|field| field.to_lowercase().contains(&needle))
        })
        .cloned()
        .collect()
}

/// Position inside a lightbox over `len` items
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Lightbox {
    pub index: usize,
    pub len: usize,
}

impl Lightbox {
    /// `None` when the list is empty or `index` is out of range
    pub fn open(index: usize, len: usize) -> Option<Self> {
        (index < len).then_some(Self { index, len })
    }

    pub fn next_index(&self) -> usize {
        (self.index + 1) % self.len
    }

    pub fn prev_index(&self) -> usize {
        (self.index + self.len - 1) % self.len
    }

    pub fn next(self) -> Self {
        Self {
            index: self.next_index(),
            ..self
        }
    }

    pub fn prev(self) -> Self {
        Self {
            index: self.prev_index(),
            ..self
        }
    }
}

/// Message shown when a list comes back empty
pub fn empty_state_message(label: &str, searching: bool) -> String {
    if searching {
        format!("No {label} match your search.")
    } else {
        format!("No {label} yet.")
    }
}
