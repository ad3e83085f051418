pub mod admin;
pub mod auth;
pub mod blog;
pub mod blog_categories;
pub mod cart;
pub mod comments;
pub mod documentation;
pub mod health;
pub mod media;
pub mod orders;
pub mod product_categories;
pub mod products;

use axum::Router;

use crate::state::AppState;

/// Build the `/api` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/register, /auth/login, /auth/refresh     public
/// /auth/logout, /auth/me                         requires auth
///
/// /blog                                          list, create (editor)
/// /blog/search                                   search
/// /blog/slug/{slug}                              get by slug
/// /blog/{id}                                     get, update, delete (editor)
///
/// /comments                                      create (auth)
/// /comments/{id}                                 post's comments; edit, delete (author)
/// /comments/{id}/count                           approved count for a post
/// /comments/{id}/replies                         replies to a comment
/// /comments/{id}/reactions                       mine for a post; react, unreact
///
/// /categories                                    tree, create (admin)
/// /categories/{id}                               get, update, delete (admin)
///
/// /media                                         list, create (editor)
/// /media/{id}                                    get, update, delete (editor)
///
/// /product-categories                            list, create (admin)
/// /product-categories/tree                       tree
/// /product-categories/{id}                       get, update, delete (admin)
///
/// /products                                      list, create (admin)
/// /products/search                               search
/// /products/slug/{slug}                          get by slug
/// /products/{id}                                 get, update, delete (admin)
///
/// /cart                                          get, clear (auth)
/// /cart/items                                    add (auth)
/// /cart/items/{id}                               update, remove (auth)
///
/// /orders                                        list, create (auth)
/// /orders/track/{order_number}                   track (public)
/// /orders/{id}                                   get (owner or admin)
/// /orders/{id}/status                            update status (admin)
///
/// /documentation/sections[/{id}|/reorder]        section tree and CRUD
/// /documentation/contents[/{id}|/reorder]        contents, versions
/// /documentation/menu[/{id}|/reorder]            menu tree and CRUD
/// /documentation/content/{id}/lock               edit locks
/// /documentation/locks/cleanup                   expired-lock sweep (admin)
///
/// /admin/users[/{id}]                            user management
/// /admin/comments[/stats|/{id}]                  moderation queue, delete
/// /admin/comments/{id}/approve|reject            moderation decisions
/// /admin/cache/stats, /admin/cache/invalidate    response cache
/// /admin/cache                                   clear cache
/// /admin/realtime                                connection stats
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/blog", blog::router())
        .nest("/comments", comments::router())
        .nest("/categories", blog_categories::router())
        .nest("/media", media::router())
        .nest("/product-categories", product_categories::router())
        .nest("/products", products::router())
        .nest("/cart", cart::router())
        .nest("/orders", orders::router())
        .nest("/documentation", documentation::router())
        .nest("/admin", admin::router())
}
