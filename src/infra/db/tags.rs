use async_trait::async_trait;

use crate::{
    application::repos::{RepoError, TagsRepo},
    domain::{
        dates::{format_timestamp, now_utc},
        entities::PopularTag,
    },
};

use super::{SqliteRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct PopularTagRow {
    name: String,
    usage_count: i64,
}

#[async_trait]
impl TagsRepo for SqliteRepositories {
    async fn popular_tags(&self, limit: u32) -> Result<Vec<PopularTag>, RepoError> {
        let now = format_timestamp(now_utc()).map_err(RepoError::from_persistence)?;

        let rows = sqlx::query_as::<_, PopularTagRow>(
            r#"
            SELECT t.name, COUNT(d.id) AS usage_count
            FROM tags t
            INNER JOIN document_tags dt ON dt.tag_id = t.id
            INNER JOIN documents d ON d.id = dt.document_id
            WHERE d.is_draft = 0
              AND d.published_at <= ?1
            GROUP BY t.id, t.name
            ORDER BY usage_count DESC, t.name ASC
            LIMIT ?2
            "#,
        )
        .bind(now)
        .bind(i64::from(limit))
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter()
            .map(|row| {
                Ok(PopularTag {
                    name: row.name,
                    count: Self::convert_count(row.usage_count)?,
                })
            })
            .collect()
    }
}
