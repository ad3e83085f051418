//! Response-cache key scheme.
//!
//! Keys are colon-separated (`{resource}:{view}:{discriminator}`) so that a
//! glob such as `blog:*` selects every cached view of one resource. Each
//! cached entry is also tagged with the resource it was derived from; tag
//! invalidation is what mutations use, glob invalidation is exposed to admins.

use regex::Regex;

// ---------------------------------------------------------------------------
// Tags
// ---------------------------------------------------------------------------

pub const TAG_BLOG: &str = "blog";
pub const TAG_BLOG_CATEGORIES: &str = "blog_categories";
pub const TAG_MEDIA: &str = "media";
pub const TAG_PRODUCTS: &str = "products";
pub const TAG_PRODUCT_CATEGORIES: &str = "product_categories";
pub const TAG_DOCUMENTATION: &str = "documentation";

/// Every tag the API attaches to cache entries.
pub const ALL_TAGS: &[&str] = &[
    TAG_BLOG,
    TAG_BLOG_CATEGORIES,
    TAG_MEDIA,
    TAG_PRODUCTS,
    TAG_PRODUCT_CATEGORIES,
    TAG_DOCUMENTATION,
];

pub fn is_known_tag(tag: &str) -> bool {
    ALL_TAGS.contains(&tag)
}

// ---------------------------------------------------------------------------
// Key builders
// ---------------------------------------------------------------------------

/// Build a list-view key from a resource name and its normalized query.
///
/// `query` is a list of `(name, value)` pairs; `None` values are skipped so
/// that `?limit=20` and the default produce different keys but absent
/// filters do not.
pub fn list_key(resource: &str, query: &[(&str, Option<String>)]) -> String {
    let parts: Vec<String> = query
        .iter()
        .filter_map(|(k, v)| v.as_ref().map(|v| format!("{k}={v}")))
        .collect();
    if parts.is_empty() {
        format!("{resource}:list")
    } else {
        format!("{resource}:list:{}", parts.join("&"))
    }
}

/// Key for a single item view.
pub fn item_key(resource: &str, id: impl std::fmt::Display) -> String {
    format!("{resource}:item:{id}")
}

/// Key for a tree view.
pub fn tree_key(resource: &str) -> String {
    format!("{resource}:tree")
}

// ---------------------------------------------------------------------------
// Glob patterns
// ---------------------------------------------------------------------------

/// Compile a glob (`*` = any run, `?` = one character) into an anchored regex.
pub fn compile_glob(pattern: &str) -> Result<Regex, regex::Error> {
    let mut re = String::with_capacity(pattern.len() + 8);
    re.push('^');
    let mut literal = String::new();
    for c in pattern.chars() {
        match c {
            '*' | '?' => {
                re.push_str(&regex::escape(&literal));
                literal.clear();
                re.push_str(if c == '*' { ".*" } else { "." });
            }
            other => literal.push(other),
        }
    }
    re.push_str(&regex::escape(&literal));
    re.push('$');
    Regex::new(&re)
}

/// Returns `true` if `key` matches the glob `pattern`.
pub fn glob_matches(pattern: &str, key: &str) -> bool {
    compile_glob(pattern).is_ok_and(|re| re.is_match(key))
}

/// Validate an admin-supplied invalidation pattern.
pub fn validate_pattern(pattern: &str) -> Result<(), String> {
    if pattern.trim().is_empty() {
        return Err("Pattern must not be empty".to_string());
    }
    if pattern.len() > 200 {
        return Err("Pattern must be at most 200 characters".to_string());
    }
    Ok(())
}
