//! Names of the events broadcast to WebSocket clients.
//!
//! The names are part of the wire protocol consumed by existing front ends,
//! which is why their casing is not uniform.

pub mod blog {
    pub const CREATED: &str = "blog_created";
    pub const UPDATED: &str = "blog_updated";
    pub const DELETED: &str = "blog_deleted";
}

pub mod blog_category {
    pub const CREATED: &str = "blog_category_created";
    pub const UPDATED: &str = "blog_category_updated";
    pub const DELETED: &str = "blog_category_deleted";
}

pub mod product_category {
    pub const CREATED: &str = "category_created";
    pub const UPDATED: &str = "category_updated";
    pub const DELETED: &str = "category_deleted";
}

pub mod product {
    pub const CREATED: &str = "product_created";
    pub const UPDATED: &str = "product_updated";
    pub const DELETED: &str = "product_deleted";
}

pub mod order {
    pub const CREATED: &str = "order_created";
    pub const STATUS_UPDATED: &str = "order_status_updated";
}

/// User account changes. Delivered to [`ADMIN_ROOM`] only.
pub mod user {
    pub const CREATED: &str = "user_created";
    pub const UPDATED: &str = "user_updated";
    pub const DELETED: &str = "user_deleted";
}

pub mod documentation {
    pub const SECTION_CREATED: &str = "documentation_section_created";
    pub const SECTION_UPDATED: &str = "documentation_section_updated";
    pub const SECTION_DELETED: &str = "documentation_section_deleted";
    pub const CONTENT_CREATED: &str = "documentation_content_created";
    pub const CONTENT_UPDATED: &str = "documentation_content_updated";
    pub const CONTENT_DELETED: &str = "documentation_content_deleted";
    pub const MENU_UPDATED: &str = "documentation_menu_updated";
    pub const REORDERED: &str = "documentation_reordered";
}

pub mod collab {
    pub const CONTENT_LOCKED: &str = "content_locked";
    pub const CONTENT_UNLOCKED: &str = "content_unlocked";
    pub const CONTENT_UPDATED: &str = "content_updated";
    pub const USER_DISCONNECTED: &str = "user_disconnected";
}

/// Blog comment changes. Delivered to every connection.
pub mod comment {
    pub const CREATED: &str = "COMMENT_CREATED";
    pub const UPDATED: &str = "COMMENT_UPDATED";
    pub const DELETED: &str = "COMMENT_DELETED";
}

pub const MEDIA_UPDATE: &str = "MEDIA_UPDATE";
pub const CACHE_INVALIDATED: &str = "CACHE_INVALIDATED";
pub const CART_UPDATE: &str = "CART_UPDATE";

/// `action` values carried in `MEDIA_UPDATE` and `CART_UPDATE` payloads.
pub mod actions {
    pub const CREATE: &str = "create";
    pub const UPDATE: &str = "update";
    pub const DELETE: &str = "delete";
    pub const ADD: &str = "add";
    pub const REMOVE: &str = "remove";
    pub const CLEAR: &str = "clear";
}

/// Room every admin connection joins on connect. Order and user events go here.
pub const ADMIN_ROOM: &str = "admins";

/// Room every authenticated connection of `user_id` joins on connect.
///
/// Per-user events such as `CART_UPDATE` are delivered here.
pub fn user_room(user_id: crate::types::DbId) -> String {
    format!("user_{user_id}")
}
