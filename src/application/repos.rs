//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::entities::{Document, PopularTag};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
    #[error("batch write failed at `{slug}`: {message}")]
    BatchWriteFailed { slug: String, message: String },
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

#[async_trait]
pub trait DocumentsRepo: Send + Sync {
    /// Documents ordered by publication time, newest first.
    async fn list_documents(&self, include_drafts: bool) -> Result<Vec<Document>, RepoError>;

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Document>, RepoError>;
}

#[async_trait]
pub trait DocumentsWriteRepo: Send + Sync {
    /// Insert or replace every document by slug, all or nothing. Returns the
    /// number of documents written.
    async fn upsert_documents(&self, documents: &[Document]) -> Result<usize, RepoError>;
}

#[async_trait]
pub trait TagsRepo: Send + Sync {
    /// Tags used by visible documents, most used first, ties by name.
    async fn popular_tags(&self, limit: u32) -> Result<Vec<PopularTag>, RepoError>;
}
