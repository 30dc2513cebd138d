//! Field helpers shared by the input types
//!
//! Array columns are edited in forms as comma separated text. Both that form
//! and a JSON array are accepted on input.

use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum ListInput {
    Text(String),
    List(Vec<String>),
}

impl ListInput {
    fn into_list(self) -> Vec<String> {
        match self {
            ListInput::Text(text) => split_list(&text),
            ListInput::List(items) => items,
        }
    }
}

/// Split comma separated text into trimmed items, dropping blanks.
///
/// `"a, b, c"` becomes `["a", "b", "c"]`.
pub fn split_list(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Deserialize a required list column; absent or null yields an empty list
pub fn string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<ListInput>::deserialize(deserializer)?
        .map(ListInput::into_list)
        .unwrap_or_default())
}

/// Deserialize an optional list column in a patch
pub fn opt_string_list<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<ListInput>::deserialize(deserializer)?.map(ListInput::into_list))
}

/// Treat blank strings as absent
pub fn opt_trimmed<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty()))
}

/// Patch value for a nullable column.
///
/// Used with `#[serde(default)]`: an absent key stays `None` and leaves the
/// column alone, an explicit `null` becomes `Some(None)` and clears it.
pub fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
