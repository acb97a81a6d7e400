//! Blog post model and its list projection.

use serde::{Deserialize, Serialize};

/// Maximum number of characters of `content` shown in list views.
pub const SUMMARY_CONTENT_LENGTH: usize = 200;

/// Appended to content cut short by [`truncate`].
pub const TRUNCATION_MARKER: &str = "...";

/// A blog post as stored in the collection. Never mutated after loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlogPost {
    pub id: i64,
    pub title: String,
    pub content: String,
}

/// List view of a post with `content` cut to [`SUMMARY_CONTENT_LENGTH`] characters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlogPostSummary {
    pub id: i64,
    pub title: String,
    pub content: String,
}

impl From<&BlogPost> for BlogPostSummary {
    fn from(post: &BlogPost) -> Self {
        Self {
            id: post.id,
            title: post.title.clone(),
            content: truncate(&post.content, SUMMARY_CONTENT_LENGTH),
        }
    }
}

/// Cut `text` to at most `max_chars` characters, appending the marker when cut.
///
/// Counts Unicode scalar values, so multi-byte text is never split mid-character.
pub fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => format!("{}{}", &text[..byte_index], TRUNCATION_MARKER),
        None => text.to_string(),
    }
}
