//! Repository for the `doc_contents` and `doc_content_versions` tables.
//!
//! Every content change is recorded as a numbered version.

use folio_core::types::DbId;
use sqlx::{PgPool, Postgres, Transaction};

use crate::models::documentation::{
    CreateDocContent, DocContent, DocContentFilter, DocContentVersion, UpdateDocContent,
};
use crate::models::ReorderItem;

const COLUMNS: &str = "id, section_id, library_type, title, slug, content, excerpt, tags, \
                       is_published, published_at, author_id, sort_order, view_count, \
                       created_at, updated_at";

const VERSION_COLUMNS: &str =
    "id, content_id, version, title, content, change_log, author_id, created_at";

/// Provides CRUD, versioning and view counting for documentation contents.
pub struct DocContentRepo;

impl DocContentRepo {
    /// Insert a content item and its first version.
    pub async fn create(
        pool: &PgPool,
        input: &CreateDocContent,
        slug: &str,
        library_type: &str,
        author_id: DbId,
    ) -> Result<DocContent, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO doc_contents
                (section_id, library_type, title, slug, content, excerpt, tags,
                 is_published, published_at, author_id, sort_order)
             VALUES ($1, $2, $3, $4, $5, $6, $7, COALESCE($8, false),
                     CASE WHEN COALESCE($8, false) THEN NOW() END, $9, COALESCE($10, 0))
             RETURNING {COLUMNS}"
        );
        let content = sqlx::query_as::<_, DocContent>(&query)
            .bind(input.section_id)
            .bind(library_type)
            .bind(&input.title)
            .bind(slug)
            .bind(&input.content)
            .bind(&input.excerpt)
            .bind(&input.tags)
            .bind(input.is_published)
            .bind(author_id)
            .bind(input.sort_order)
            .fetch_one(&mut *tx)
            .await?;

        Self::insert_version(&mut tx, &content, Some("Initial version"), author_id).await?;

        tx.commit().await?;
        Ok(content)
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<DocContent>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM doc_contents WHERE id = $1");
        sqlx::query_as::<_, DocContent>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find by slug, optionally within one library.
    pub async fn find_by_slug(
        pool: &PgPool,
        slug: &str,
        library_type: Option<&str>,
    ) -> Result<Option<DocContent>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM doc_contents
             WHERE slug = $1 AND ($2::TEXT IS NULL OR library_type = $2)
             ORDER BY id
             LIMIT 1"
        );
        sqlx::query_as::<_, DocContent>(&query)
            .bind(slug)
            .bind(library_type)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(
        pool: &PgPool,
        filter: &DocContentFilter,
    ) -> Result<Vec<DocContent>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM doc_contents
             WHERE ($1::BIGINT IS NULL OR section_id = $1)
               AND ($2::TEXT IS NULL OR library_type = $2)
               AND (NOT $3 OR is_published = true)
             ORDER BY sort_order, id
             LIMIT $4 OFFSET $5"
        );
        sqlx::query_as::<_, DocContent>(&query)
            .bind(filter.section_id)
            .bind(&filter.library_type)
            .bind(filter.published_only)
            .bind(filter.limit)
            .bind(filter.offset)
            .fetch_all(pool)
            .await
    }

    /// Apply a patch; a new version is recorded when `content` or `title` is given.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateDocContent,
        author_id: DbId,
    ) -> Result<Option<DocContent>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "UPDATE doc_contents SET
                section_id = COALESCE($2, section_id),
                title = COALESCE($3, title),
                slug = COALESCE($4, slug),
                content = COALESCE($5, content),
                excerpt = COALESCE($6, excerpt),
                tags = COALESCE($7, tags),
                is_published = COALESCE($8, is_published),
                published_at = CASE
                    WHEN $8 = true AND published_at IS NULL THEN NOW()
                    WHEN $8 = false THEN NULL
                    ELSE published_at
                END,
                sort_order = COALESCE($9, sort_order)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let Some(content) = sqlx::query_as::<_, DocContent>(&query)
            .bind(id)
            .bind(input.section_id)
            .bind(&input.title)
            .bind(&input.slug)
            .bind(&input.content)
            .bind(&input.excerpt)
            .bind(&input.tags)
            .bind(input.is_published)
            .bind(input.sort_order)
            .fetch_optional(&mut *tx)
            .await?
        else {
            tx.rollback().await?;
            return Ok(None);
        };

        if input.content.is_some() || input.title.is_some() {
            Self::insert_version(&mut tx, &content, input.change_log.as_deref(), author_id).await?;
        }

        tx.commit().await?;
        Ok(Some(content))
    }

    /// Delete a content item, returning it so callers know its library.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<Option<DocContent>, sqlx::Error> {
        let query = format!("DELETE FROM doc_contents WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, DocContent>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn increment_view_count(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE doc_contents SET view_count = view_count + 1 WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Versions of one content item, newest first.
    pub async fn versions(
        pool: &PgPool,
        content_id: DbId,
    ) -> Result<Vec<DocContentVersion>, sqlx::Error> {
        let query = format!(
            "SELECT {VERSION_COLUMNS} FROM doc_content_versions
             WHERE content_id = $1
             ORDER BY version DESC"
        );
        sqlx::query_as::<_, DocContentVersion>(&query)
            .bind(content_id)
            .fetch_all(pool)
            .await
    }

    /// The library a content item belongs to, if it exists.
    pub async fn library_type_of(pool: &PgPool, id: DbId) -> Result<Option<String>, sqlx::Error> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT library_type FROM doc_contents WHERE id = $1")
                .bind(id)
                .fetch_optional(pool)
                .await?;
        Ok(row.map(|r| r.0))
    }

    pub async fn reorder(pool: &PgPool, items: &[ReorderItem]) -> Result<u64, sqlx::Error> {
        super::reorder_rows(pool, "doc_contents", items).await
    }

    async fn insert_version(
        tx: &mut Transaction<'_, Postgres>,
        content: &DocContent,
        change_log: Option<&str>,
        author_id: DbId,
    ) -> Result<DocContentVersion, sqlx::Error> {
        let query = format!(
            "INSERT INTO doc_content_versions (content_id, version, title, content, change_log, author_id)
             VALUES ($1,
                     (SELECT COALESCE(MAX(version), 0) + 1 FROM doc_content_versions WHERE content_id = $1),
                     $2, $3, $4, $5)
             RETURNING {VERSION_COLUMNS}"
        );
        sqlx::query_as::<_, DocContentVersion>(&query)
            .bind(content.id)
            .bind(&content.title)
            .bind(&content.content)
            .bind(change_log)
            .bind(author_id)
            .fetch_one(&mut **tx)
            .await
    }
}
