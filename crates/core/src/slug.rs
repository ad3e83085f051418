//! URL slug generation and validation for posts, categories, products and
//! documentation pages.

/// Maximum slug length in characters.
pub const MAX_SLUG_LEN: usize = 200;

/// Generate a URL-safe slug from a title.
///
/// Lowercases, replaces every non-alphanumeric run with a single hyphen, and
/// trims hyphens from both ends.
pub fn generate_slug(title: &str) -> String {
    let lowered = title.to_lowercase();
    let mut result = String::with_capacity(lowered.len());
    let mut prev_hyphen = true;
    for c in lowered.chars() {
        if c.is_ascii_alphanumeric() {
            result.push(c);
            prev_hyphen = false;
        } else if !prev_hyphen {
            result.push('-');
            prev_hyphen = true;
        }
    }
    while result.ends_with('-') {
        result.pop();
    }
    result.truncate(MAX_SLUG_LEN);
    result
}

/// Validate a caller-supplied slug: `[a-z0-9-]`, no leading/trailing hyphen.
pub fn validate_slug(slug: &str) -> Result<(), String> {
    if slug.is_empty() {
        return Err("Slug must not be empty".to_string());
    }
    if slug.len() > MAX_SLUG_LEN {
        return Err(format!("Slug must be at most {MAX_SLUG_LEN} characters"));
    }
    if !slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(format!(
            "Slug '{slug}' may only contain lowercase letters, digits and hyphens"
        ));
    }
    if slug.starts_with('-') || slug.ends_with('-') {
        return Err("Slug must not start or end with a hyphen".to_string());
    }
    Ok(())
}

/// Use `explicit` when given (after validation), otherwise derive from `title`.
pub fn resolve_slug(explicit: Option<&str>, title: &str) -> Result<String, String> {
    match explicit {
        Some(s) => {
            validate_slug(s)?;
            Ok(s.to_string())
        }
        None => {
            let slug = generate_slug(title);
            if slug.is_empty() {
                return Err(format!("Cannot derive a slug from '{title}'"));
            }
            Ok(slug)
        }
    }
}
