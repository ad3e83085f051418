//! Authentication and authorization extractors.
//!
//! - [`auth::AuthUser`] -- the user behind a Bearer token or session cookie.
//! - [`auth::OptionalAuthUser`] -- same, but never rejects.
//! - [`rbac::RequireAdmin`] -- requires the `admin` role.
//! - [`rbac::RequireEditor`] -- requires `editor` or `admin`.
//! - [`rbac::RequireAuth`] -- requires any authenticated user.

pub mod auth;
pub mod rbac;
