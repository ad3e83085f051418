//! Fixtures shared by the repository integration tests.

#![allow(dead_code)]

use folio_db::models::blog::{BlogPost, CreateBlogPost};
use folio_db::models::documentation::{CreateDocContent, CreateDocSection, DocContent};
use folio_db::models::product::{CreateProduct, Product};
use folio_db::models::user::{CreateUser, User};
use folio_db::repositories::{
    BlogPostRepo, DocContentRepo, DocSectionRepo, ProductRepo, RoleRepo, UserRepo,
};
use sqlx::PgPool;

pub async fn create_user(pool: &PgPool, username: &str, role: &str) -> User {
    let role = RoleRepo::find_by_name(pool, role).await.unwrap().unwrap();
    UserRepo::create(
        pool,
        &CreateUser {
            username: username.to_string(),
            email: format!("{username}@example.com"),
            password_hash: "not-a-real-hash".to_string(),
            first_name: None,
            last_name: None,
            role_id: role.id,
        },
    )
    .await
    .unwrap()
}

pub async fn create_content(pool: &PgPool, author: &User, slug: &str, library: &str) -> DocContent {
    let section = DocSectionRepo::create(
        pool,
        &CreateDocSection {
            title: format!("Section for {slug}"),
            slug: None,
            description: None,
            parent_id: None,
            sort_order: None,
            is_active: None,
        },
        &format!("section-{slug}"),
    )
    .await
    .unwrap();

    DocContentRepo::create(
        pool,
        &CreateDocContent {
            section_id: section.id,
            library_type: Some(library.to_string()),
            title: format!("Title {slug}"),
            slug: None,
            content: "Initial body".to_string(),
            excerpt: None,
            tags: vec![],
            is_published: Some(true),
            sort_order: None,
        },
        slug,
        library,
        author.id,
    )
    .await
    .unwrap()
}

pub async fn create_product(pool: &PgPool, slug: &str, price_cents: i64) -> Product {
    ProductRepo::create(
        pool,
        &CreateProduct {
            title: format!("Product {slug}"),
            description: None,
            content: None,
            price_cents,
            image: None,
            slug: None,
            category_id: None,
            features: None,
            is_active: None,
            sort_order: None,
        },
        slug,
    )
    .await
    .unwrap()
}

pub async fn create_post(pool: &PgPool, author: &User, slug: &str) -> BlogPost {
    BlogPostRepo::create(
        pool,
        &CreateBlogPost {
            title: format!("Post {slug}"),
            description: String::new(),
            content: "Body".to_string(),
            category_id: None,
            image_url: None,
            thumbnail_url: None,
            project_url: None,
            technologies: vec![],
            tags: vec![],
            slug: None,
            status: None,
        },
        slug,
        "published",
        author.id,
    )
    .await
    .unwrap()
}
