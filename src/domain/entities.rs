//! Domain entities mirrored from persistent storage.

use std::collections::BTreeSet;

use serde::{Deserialize, Deserializer};
use time::OffsetDateTime;

/// A rendered document as persisted by the store and served to readers.
///
/// Documents are replaced wholesale on every load; `slug` is the identity and
/// never changes for a given source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub slug: String,
    pub title: String,
    pub summary: String,
    /// Markup produced by the render pipeline. Never hand-authored.
    pub rendered_body: String,
    /// Source markdown, kept for audit and re-rendering.
    pub raw_body: String,
    pub published_at: OffsetDateTime,
    /// Time of the load pass that produced this record.
    pub updated_at: OffsetDateTime,
    pub is_draft: bool,
    pub tags: BTreeSet<String>,
}

/// Metadata block decoded from the head of a document file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FrontMatter {
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(deserialize_with = "null_as_default")]
    pub date: String,
    #[serde(deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub summary: String,
    #[serde(deserialize_with = "null_as_default")]
    pub draft: bool,
}

/// A key written without a value (`title:`) decodes as the field default.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Tag with the number of visible documents that reference it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopularTag {
    pub name: String,
    pub count: u64,
}
