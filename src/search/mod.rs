//! Post search.
//!
//! Case-insensitive substring match over title and content. The collection is
//! small and in memory, so a linear scan is all that is needed.

use crate::models::BlogPost;

/// Lower-cased search term, prepared once per request.
#[derive(Debug, Clone)]
pub struct SearchTerm {
    needle: String,
}

impl SearchTerm {
    /// Prepare `query`; blank or missing queries match everything and yield `None`.
    pub fn parse(query: Option<&str>) -> Option<Self> {
        query.filter(|q| !q.is_empty()).map(|q| Self {
            needle: q.to_lowercase(),
        })
    }

    pub fn matches(&self, post: &BlogPost) -> bool {
        post.title.to_lowercase().contains(&self.needle)
            || post.content.to_lowercase().contains(&self.needle)
    }
}

/// Posts matching `query`, in collection order. No query returns every post.
pub fn filter_posts<'a>(posts: &'a [BlogPost], query: Option<&str>) -> Vec<&'a BlogPost> {
    match SearchTerm::parse(query) {
        Some(term) => posts.iter().filter(|post| term.matches(post)).collect(),
        None => posts.iter().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_post(id: i64, title: &str, content: &str) -> BlogPost {
        BlogPost {
            id,
            title: title.to_string(),
            content: content.to_string(),
        }
    }

    fn posts() -> Vec<BlogPost> {
        vec![
            create_test_post(1, "My Blog Post", "About nothing much"),
            create_test_post(2, "Ownership", "Borrowing rules for the BLOG reader"),
            create_test_post(3, "Async", "Futures and tasks"),
        ]
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let posts = posts();
        let found = filter_posts(&posts, Some("BLOG"));
        let ids: Vec<i64> = found.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_search_matches_content() {
        let posts = posts();
        let found = filter_posts(&posts, Some("futures"));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, 3);
    }

    #[test]
    fn test_search_empty_query_returns_all() {
        let posts = posts();
        assert_eq!(filter_posts(&posts, None).len(), 3);
        assert_eq!(filter_posts(&posts, Some("")).len(), 3);
    }

    #[test]
    fn test_search_no_match() {
        let posts = posts();
        assert!(filter_posts(&posts, Some("kubernetes")).is_empty());
    }
}
