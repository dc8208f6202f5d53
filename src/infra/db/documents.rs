use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use sqlx::{Sqlite, Transaction};

use crate::{
    application::repos::{DocumentsRepo, DocumentsWriteRepo, RepoError},
    domain::{
        dates::{format_timestamp, parse_timestamp},
        entities::Document,
    },
};

use super::{SqliteRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct DocumentRow {
    id: i64,
    slug: String,
    title: String,
    summary: String,
    rendered_body: String,
    raw_body: String,
    published_at: String,
    updated_at: String,
    is_draft: bool,
}

#[derive(sqlx::FromRow)]
struct DocumentTagRow {
    document_id: i64,
    name: String,
}

impl DocumentRow {
    fn into_document(self, tags: BTreeSet<String>) -> Result<Document, RepoError> {
        let parse = |column: &str, value: &str| {
            parse_timestamp(value).map_err(|err| RepoError::Integrity {
                message: format!("document `{}` has invalid {column} `{value}`: {err}", self.slug),
            })
        };
        let published_at = parse("published_at", &self.published_at)?;
        let updated_at = parse("updated_at", &self.updated_at)?;

        Ok(Document {
            slug: self.slug,
            title: self.title,
            summary: self.summary,
            rendered_body: self.rendered_body,
            raw_body: self.raw_body,
            published_at,
            updated_at,
            is_draft: self.is_draft,
            tags,
        })
    }
}

#[async_trait]
impl DocumentsRepo for SqliteRepositories {
    async fn list_documents(&self, include_drafts: bool) -> Result<Vec<Document>, RepoError> {
        let rows = sqlx::query_as::<_, DocumentRow>(
            r#"
            SELECT id, slug, title, summary, rendered_body, raw_body,
                   published_at, updated_at, is_draft
            FROM documents
            WHERE ?1 OR is_draft = 0
            ORDER BY published_at DESC, slug ASC
            "#,
        )
        .bind(include_drafts)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        let tag_rows = sqlx::query_as::<_, DocumentTagRow>(
            r#"
            SELECT dt.document_id, t.name
            FROM document_tags dt
            INNER JOIN tags t ON t.id = dt.tag_id
            "#,
        )
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        let mut tags_by_document: HashMap<i64, BTreeSet<String>> = HashMap::new();
        for row in tag_rows {
            tags_by_document
                .entry(row.document_id)
                .or_default()
                .insert(row.name);
        }

        rows.into_iter()
            .map(|row| {
                let tags = tags_by_document.remove(&row.id).unwrap_or_default();
                row.into_document(tags)
            })
            .collect()
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Document>, RepoError> {
        let row = sqlx::query_as::<_, DocumentRow>(
            r#"
            SELECT id, slug, title, summary, rendered_body, raw_body,
                   published_at, updated_at, is_draft
            FROM documents
            WHERE slug = ?1
            "#,
        )
        .bind(slug)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let tags = sqlx::query_scalar::<_, String>(
            r#"
            SELECT t.name
            FROM document_tags dt
            INNER JOIN tags t ON t.id = dt.tag_id
            WHERE dt.document_id = ?1
            "#,
        )
        .bind(row.id)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        row.into_document(tags.into_iter().collect()).map(Some)
    }
}

#[async_trait]
impl DocumentsWriteRepo for SqliteRepositories {
    async fn upsert_documents(&self, documents: &[Document]) -> Result<usize, RepoError> {
        let _guard = self.write_gate.lock().await;
        let mut tx = self
            .begin()
            .await
            .map_err(|err| batch_failure(BATCH_BEGIN, map_sqlx_error(err)))?;

        for document in documents {
            upsert_document(&mut tx, document)
                .await
                .map_err(|err| batch_failure(&document.slug, err))?;
        }

        tx.commit()
            .await
            .map_err(|err| batch_failure(BATCH_COMMIT, map_sqlx_error(err)))?;
        Ok(documents.len())
    }
}

/// Slug placeholders for failures outside any single record.
const BATCH_BEGIN: &str = "<begin>";
const BATCH_COMMIT: &str = "<commit>";

fn batch_failure(slug: &str, err: RepoError) -> RepoError {
    RepoError::BatchWriteFailed {
        slug: slug.to_string(),
        message: err.to_string(),
    }
}

async fn upsert_document(
    tx: &mut Transaction<'_, Sqlite>,
    document: &Document,
) -> Result<(), RepoError> {
    let published_at =
        format_timestamp(document.published_at).map_err(RepoError::from_persistence)?;
    let updated_at = format_timestamp(document.updated_at).map_err(RepoError::from_persistence)?;

    let document_id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO documents (
            slug, title, summary, rendered_body, raw_body,
            published_at, updated_at, is_draft
        )
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        ON CONFLICT (slug) DO UPDATE SET
            title = excluded.title,
            summary = excluded.summary,
            rendered_body = excluded.rendered_body,
            raw_body = excluded.raw_body,
            published_at = excluded.published_at,
            updated_at = excluded.updated_at,
            is_draft = excluded.is_draft
        RETURNING id
        "#,
    )
    .bind(&document.slug)
    .bind(&document.title)
    .bind(&document.summary)
    .bind(&document.rendered_body)
    .bind(&document.raw_body)
    .bind(&published_at)
    .bind(&updated_at)
    .bind(document.is_draft)
    .fetch_one(tx.as_mut())
    .await
    .map_err(map_sqlx_error)?;

    sqlx::query("DELETE FROM document_tags WHERE document_id = ?1")
        .bind(document_id)
        .execute(tx.as_mut())
        .await
        .map_err(map_sqlx_error)?;

    for tag in &document.tags {
        sqlx::query("INSERT INTO tags (name) VALUES (?1) ON CONFLICT (name) DO NOTHING")
            .bind(tag)
            .execute(tx.as_mut())
            .await
            .map_err(map_sqlx_error)?;

        sqlx::query(
            r#"
            INSERT INTO document_tags (document_id, tag_id)
            SELECT ?1, id FROM tags WHERE name = ?2
            "#,
        )
        .bind(document_id)
        .bind(tag)
        .execute(tx.as_mut())
        .await
        .map_err(map_sqlx_error)?;
    }

    Ok(())
}
