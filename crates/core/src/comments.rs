//! Blog comment statuses, validation and rendering.

pub const STATUS_PENDING: &str = "pending";
pub const STATUS_APPROVED: &str = "approved";
pub const STATUS_REJECTED: &str = "rejected";

pub const VALID_STATUSES: &[&str] = &[STATUS_PENDING, STATUS_APPROVED, STATUS_REJECTED];

/// Status given to new comments. Moderators reject after the fact.
pub const DEFAULT_STATUS: &str = STATUS_APPROVED;

/// Maximum comment length in characters.
pub const MAX_COMMENT_CHARS: usize = 5_000;

/// Maximum length of a reaction name such as `like`.
pub const MAX_REACTION_LEN: usize = 32;

/// Default page size for reply listings.
pub const DEFAULT_REPLIES_LIMIT: i64 = 10;

pub fn validate_status(status: &str) -> Result<(), String> {
    if VALID_STATUSES.contains(&status) {
        Ok(())
    } else {
        Err(format!(
            "Invalid comment status '{status}'. Must be one of: {}",
            VALID_STATUSES.join(", ")
        ))
    }
}

pub fn validate_comment(content: &str) -> Result<(), String> {
    if content.trim().is_empty() {
        return Err("Content is required".to_string());
    }
    if content.chars().count() > MAX_COMMENT_CHARS {
        return Err(format!(
            "Comment must be at most {MAX_COMMENT_CHARS} characters"
        ));
    }
    Ok(())
}

/// Reaction names are short lowercase identifiers (`like`, `thumbs_up`).
pub fn validate_reaction_type(reaction: &str) -> Result<(), String> {
    if reaction.is_empty() {
        return Err("Reaction type is required".to_string());
    }
    if reaction.len() > MAX_REACTION_LEN {
        return Err(format!(
            "Reaction type must be at most {MAX_REACTION_LEN} characters"
        ));
    }
    if !reaction
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
    {
        return Err("Reaction type may only contain a-z, 0-9 and '_'".to_string());
    }
    Ok(())
}

/// HTML shown for a comment: the text escaped, with line breaks kept.
pub fn render_html(content: &str) -> String {
    let mut html = String::with_capacity(content.len());
    for c in content.trim().chars() {
        match c {
            '&' => html.push_str("&amp;"),
            '<' => html.push_str("&lt;"),
            '>' => html.push_str("&gt;"),
            '"' => html.push_str("&quot;"),
            '\'' => html.push_str("&#39;"),
            '\r' => {}
            '\n' => html.push_str("<br>"),
            c => html.push(c),
        }
    }
    html
}
