//! Content pipeline: front matter, slug and date derivation, rendering, and
//! the directory walk that ties them together.

mod front_matter;
mod loader;

use std::{io, path::PathBuf};

use thiserror::Error;

use crate::{application::render::RenderError, domain::dates::DateError};

pub use front_matter::split_front_matter;
pub use loader::{ContentLoader, LoadFailure, LoadReport};

/// Failure of a single document. The walk records it and moves on.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("malformed metadata: {reason}")]
    MalformedMetadata { reason: String },
    #[error(transparent)]
    InvalidDate(#[from] DateError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("failed to read document: {0}")]
    Read(#[source] io::Error),
    #[error("file name yields an empty slug")]
    EmptySlug,
    #[error("slug `{slug}` already taken by {}", first.display())]
    DuplicateSlug { slug: String, first: PathBuf },
}

impl DocumentError {
    /// Short label used as a metric and log field.
    pub fn kind(&self) -> &'static str {
        match self {
            DocumentError::MalformedMetadata { .. } => "malformed_metadata",
            DocumentError::InvalidDate(_) => "invalid_date",
            DocumentError::Render(_) => "render",
            DocumentError::Read(_) => "read",
            DocumentError::EmptySlug => "empty_slug",
            DocumentError::DuplicateSlug { .. } => "duplicate_slug",
        }
    }
}

/// Failure of the walk as a whole.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("content root {} is unreadable: {source}", path.display())]
    RootUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
