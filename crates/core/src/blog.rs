//! Blog post status values and field validation.

pub const STATUS_DRAFT: &str = "draft";
pub const STATUS_PUBLISHED: &str = "published";
pub const STATUS_ARCHIVED: &str = "archived";

pub const VALID_STATUSES: &[&str] = &[STATUS_DRAFT, STATUS_PUBLISHED, STATUS_ARCHIVED];

/// Maximum title length in characters.
pub const MAX_TITLE_LEN: usize = 255;

/// Maximum post body size in bytes (1 MiB).
pub const MAX_CONTENT_BYTES: usize = 1024 * 1024;

/// Maximum number of tags (or technologies) on one post.
pub const MAX_TAGS: usize = 20;

/// Maximum length of a single tag.
pub const MAX_TAG_LEN: usize = 50;

pub fn validate_status(status: &str) -> Result<(), String> {
    if VALID_STATUSES.contains(&status) {
        Ok(())
    } else {
        Err(format!(
            "Invalid status '{status}'. Must be one of: {}",
            VALID_STATUSES.join(", ")
        ))
    }
}

pub fn validate_title(title: &str) -> Result<(), String> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err("Title must not be empty".to_string());
    }
    if trimmed.chars().count() > MAX_TITLE_LEN {
        return Err(format!("Title must be at most {MAX_TITLE_LEN} characters"));
    }
    Ok(())
}

pub fn validate_content(content: &str) -> Result<(), String> {
    if content.trim().is_empty() {
        return Err("Content must not be empty".to_string());
    }
    if content.len() > MAX_CONTENT_BYTES {
        return Err(format!("Content must be at most {MAX_CONTENT_BYTES} bytes"));
    }
    Ok(())
}

pub fn validate_tags(tags: &[String]) -> Result<(), String> {
    if tags.len() > MAX_TAGS {
        return Err(format!("At most {MAX_TAGS} tags are allowed"));
    }
    if let Some(bad) = tags
        .iter()
        .find(|t| t.trim().is_empty() || t.chars().count() > MAX_TAG_LEN)
    {
        return Err(format!(
            "Tag '{bad}' must be non-empty and at most {MAX_TAG_LEN} characters"
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses() {
        assert!(validate_status("draft").is_ok());
        assert!(validate_status("published").is_ok());
        assert!(validate_status("archived").is_ok());
        assert!(validate_status("Draft").is_err());
        assert!(validate_status("deleted").is_err());
    }

    #[test]
    fn titles() {
        assert!(validate_title("Hello").is_ok());
        assert!(validate_title("   ").is_err());
        assert!(validate_title(&"t".repeat(MAX_TITLE_LEN + 1)).is_err());
    }

    #[test]
    fn content() {
        assert!(validate_content("body").is_ok());
        assert!(validate_content("").is_err());
        assert!(validate_content(&"x".repeat(MAX_CONTENT_BYTES + 1)).is_err());
    }

    #[test]
    fn tags() {
        assert!(validate_tags(&["rust".into(), "axum".into()]).is_ok());
        assert!(validate_tags(&[" ".into()]).is_err());
        let many: Vec<String> = (0..=MAX_TAGS).map(|i| format!("t{i}")).collect();
        assert!(validate_tags(&many).is_err());
    }
}
