//! Repository for the `blog_posts` table.

use folio_core::types::DbId;
use sqlx::PgPool;

use crate::models::blog::{BlogPost, BlogPostFilter, CreateBlogPost, UpdateBlogPost};

const COLUMNS: &str = "id, title, description, content, category_id, image_url, thumbnail_url, \
                       project_url, technologies, tags, slug, status, author_id, \
                       created_at, updated_at";

/// Provides CRUD and search operations for blog posts.
pub struct BlogPostRepo;

impl BlogPostRepo {
    /// Insert a post. `slug` and `status` are already resolved by the caller.
    pub async fn create(
        pool: &PgPool,
        input: &CreateBlogPost,
        slug: &str,
        status: &str,
        author_id: DbId,
    ) -> Result<BlogPost, sqlx::Error> {
        let query = format!(
            "INSERT INTO blog_posts
                (title, description, content, category_id, image_url, thumbnail_url,
                 project_url, technologies, tags, slug, status, author_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, BlogPost>(&query)
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.content)
            .bind(input.category_id)
            .bind(&input.image_url)
            .bind(&input.thumbnail_url)
            .bind(&input.project_url)
            .bind(&input.technologies)
            .bind(&input.tags)
            .bind(slug)
            .bind(status)
            .bind(author_id)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<BlogPost>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM blog_posts WHERE id = $1");
        sqlx::query_as::<_, BlogPost>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_slug(pool: &PgPool, slug: &str) -> Result<Option<BlogPost>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM blog_posts WHERE slug = $1");
        sqlx::query_as::<_, BlogPost>(&query)
            .bind(slug)
            .fetch_optional(pool)
            .await
    }

    /// List posts, newest first, with optional status and category filters.
    pub async fn list(pool: &PgPool, filter: &BlogPostFilter) -> Result<Vec<BlogPost>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM blog_posts
             WHERE ($1::TEXT IS NULL OR status = $1)
               AND ($2::BIGINT IS NULL OR category_id = $2)
             ORDER BY created_at DESC, id DESC
             LIMIT $3 OFFSET $4"
        );
        sqlx::query_as::<_, BlogPost>(&query)
            .bind(&filter.status)
            .bind(filter.category_id)
            .bind(filter.limit)
            .bind(filter.offset)
            .fetch_all(pool)
            .await
    }

    /// Count posts matching the same filters as [`list`](Self::list).
    pub async fn count(pool: &PgPool, filter: &BlogPostFilter) -> Result<i64, sqlx::Error> {
        let row: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM blog_posts
             WHERE ($1::TEXT IS NULL OR status = $1)
               AND ($2::BIGINT IS NULL OR category_id = $2)",
        )
        .bind(&filter.status)
        .bind(filter.category_id)
        .fetch_one(pool)
        .await?;
        Ok(row.0)
    }

    /// Case-insensitive search over title, description, content and tags.
    ///
    /// `published_only` hides drafts and archived posts from anonymous readers.
    pub async fn search(
        pool: &PgPool,
        q: &str,
        published_only: bool,
        limit: i64,
    ) -> Result<Vec<BlogPost>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM blog_posts
             WHERE (title ILIKE $1 OR description ILIKE $1 OR content ILIKE $1
                    OR EXISTS (SELECT 1 FROM unnest(tags) t WHERE t ILIKE $1))
               AND (NOT $2 OR status = 'published')
             ORDER BY created_at DESC, id DESC
             LIMIT $3"
        );
        sqlx::query_as::<_, BlogPost>(&query)
            .bind(format!("%{}%", escape_like(q)))
            .bind(published_only)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateBlogPost,
    ) -> Result<Option<BlogPost>, sqlx::Error> {
        let query = format!(
            "UPDATE blog_posts SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                content = COALESCE($4, content),
                category_id = COALESCE($5, category_id),
                image_url = COALESCE($6, image_url),
                thumbnail_url = COALESCE($7, thumbnail_url),
                project_url = COALESCE($8, project_url),
                technologies = COALESCE($9, technologies),
                tags = COALESCE($10, tags),
                slug = COALESCE($11, slug),
                status = COALESCE($12, status)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, BlogPost>(&query)
            .bind(id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.content)
            .bind(input.category_id)
            .bind(&input.image_url)
            .bind(&input.thumbnail_url)
            .bind(&input.project_url)
            .bind(&input.technologies)
            .bind(&input.tags)
            .bind(&input.slug)
            .bind(&input.status)
            .fetch_optional(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM blog_posts WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// Escape `%`, `_` and `\` so user input matches literally inside `ILIKE`.
pub(crate) fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::escape_like;

    #[test]
    fn like_metacharacters_are_escaped() {
        assert_eq!(escape_like("rust"), "rust");
        assert_eq!(escape_like("50%_off"), "50\\%\\_off");
        assert_eq!(escape_like("a\\b"), "a\\\\b");
    }
}
