//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A `Deserialize` create DTO for inserts
//! - A `Deserialize` update DTO (all `Option` fields) for patches

pub mod blog;
pub mod cart;
pub mod comment;
pub mod content_lock;
pub mod documentation;
pub mod media;
pub mod order;
pub mod product;
pub mod role;
pub mod session;
pub mod user;

use folio_core::types::DbId;
use serde::Deserialize;

/// One entry of a bulk reorder request.
#[derive(Debug, Clone, Deserialize)]
pub struct ReorderItem {
    pub id: DbId,
    pub sort_order: i32,
}
