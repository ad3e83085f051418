//! Request handlers, one module per REST resource.

pub mod admin;
pub mod auth;
pub mod blog;
pub mod blog_categories;
pub mod cart;
pub mod comments;
pub mod documentation;
pub mod media;
pub mod orders;
pub mod product_categories;
pub mod products;

use folio_core::tree::{descendant_ids, TreeItem};
use folio_core::types::DbId;

use crate::error::{AppError, AppResult};

/// Length limit for names and titles of hierarchy nodes.
pub(crate) const MAX_NAME_LEN: usize = 255;

/// Check a requested `parent` for a hierarchy node.
///
/// The parent must exist in `items`. When `moving` is an existing node, the
/// parent may not be that node or any of its descendants.
pub(crate) fn validate_parent<T: TreeItem>(
    items: &[T],
    moving: Option<DbId>,
    parent: Option<DbId>,
) -> AppResult<()> {
    let Some(parent) = parent else {
        return Ok(());
    };
    if !items.iter().any(|item| item.id() == parent) {
        return Err(AppError::validation(format!(
            "Parent {parent} does not exist"
        )));
    }
    if let Some(id) = moving {
        if descendant_ids(items, id).contains(&parent) {
            return Err(AppError::validation(
                "A node cannot be moved under itself or one of its descendants",
            ));
        }
    }
    Ok(())
}
