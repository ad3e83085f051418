//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod blog_category_repo;
pub mod blog_post_repo;
pub mod cart_repo;
pub mod comment_repo;
pub mod content_lock_repo;
pub mod doc_content_repo;
pub mod doc_menu_repo;
pub mod doc_section_repo;
pub mod media_file_repo;
pub mod order_repo;
pub mod product_category_repo;
pub mod product_repo;
pub mod role_repo;
pub mod session_repo;
pub mod user_repo;

pub use blog_category_repo::BlogCategoryRepo;
pub use blog_post_repo::BlogPostRepo;
pub use cart_repo::CartRepo;
pub use comment_repo::CommentRepo;
pub use content_lock_repo::ContentLockRepo;
pub use doc_content_repo::DocContentRepo;
pub use doc_menu_repo::DocMenuRepo;
pub use doc_section_repo::DocSectionRepo;
pub use media_file_repo::MediaFileRepo;
pub use order_repo::{CheckoutError, OrderRepo};
pub use product_category_repo::ProductCategoryRepo;
pub use product_repo::ProductRepo;
pub use role_repo::RoleRepo;
pub use session_repo::SessionRepo;
pub use user_repo::UserRepo;

use crate::models::ReorderItem;

/// Apply `sort_order` values to rows of `table` in one transaction.
///
/// Returns the number of rows updated. `table` is always a compile-time
/// constant supplied by a repository, never user input.
pub(crate) async fn reorder_rows(
    pool: &sqlx::PgPool,
    table: &'static str,
    items: &[ReorderItem],
) -> Result<u64, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let query = format!("UPDATE {table} SET sort_order = $2 WHERE id = $1");
    let mut updated = 0;
    for item in items {
        updated += sqlx::query(&query)
            .bind(item.id)
            .bind(item.sort_order)
            .execute(&mut *tx)
            .await?
            .rows_affected();
    }
    tx.commit().await?;
    Ok(updated)
}
