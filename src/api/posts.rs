//! Post API endpoints.

use axum::extract::{
    rejection::{PathRejection, QueryRejection},
    Path, Query, State,
};
use serde::Deserialize;

use super::{success, ApiResult};
use crate::errors::AppError;
use crate::models::BlogPostSummary;
use crate::pagination::{offset, paginate, pagination_schema};
use crate::search::filter_posts;
use crate::validation::{pairs_to_value, FieldRule, SchemaValidator, Validator};
use crate::AppState;

/// Validated query for the post list.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPostsQuery {
    pub page: u64,
    pub per_page: u64,
    #[serde(default)]
    pub search: Option<String>,
}

/// Validated path for a single post.
#[derive(Debug, Clone, Deserialize)]
pub struct PostPath {
    pub id: i64,
}

fn list_posts_schema() -> SchemaValidator<ListPostsQuery> {
    pagination_schema().field(
        "search",
        FieldRule::string().allow_empty().allow_null().optional(),
    )
}

fn post_path_schema() -> SchemaValidator<PostPath> {
    SchemaValidator::new().field("id", FieldRule::integer().required())
}

/// GET /api/posts - List posts, optionally filtered, one page at a time.
pub async fn list_posts(
    State(state): State<AppState>,
    raw: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> ApiResult {
    let Query(raw) = raw.map_err(|e| AppError::bad_request(e.body_text()))?;
    let query = list_posts_schema().validate(pairs_to_value(raw))?;

    let matched = filter_posts(state.posts.all(), query.search.as_deref());
    let count = matched.len() as u64;

    let start = usize::try_from(offset(query.page, query.per_page)).unwrap_or(usize::MAX);
    let take = usize::try_from(query.per_page).unwrap_or(usize::MAX);
    let rows: Vec<BlogPostSummary> = matched
        .into_iter()
        .skip(start)
        .take(take)
        .map(BlogPostSummary::from)
        .collect();

    let result = paginate(count, rows, query.page, query.per_page);

    success(&state.logger, "Posts retrieved successfully", result)
}

/// GET /api/posts/{id} - Get a single post.
pub async fn get_post(
    State(state): State<AppState>,
    raw: Result<Path<Vec<(String, String)>>, PathRejection>,
) -> ApiResult {
    let Path(raw) = raw.map_err(|e| AppError::bad_request(e.body_text()))?;
    let path = post_path_schema().validate(pairs_to_value(raw))?;

    match state.posts.find(path.id) {
        Some(post) => success(&state.logger, "Post retrieved successfully", post),
        None => Err(AppError::not_found("Post not found")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_list_schema_defaults() {
        let query = list_posts_schema().validate(json!({})).unwrap();
        assert_eq!(query.page, 1);
        assert_eq!(query.per_page, 10);
        assert!(query.search.is_none());
    }

    #[test]
    fn test_list_schema_rejects_zero_per_page() {
        let err = list_posts_schema()
            .validate(json!({"perPage": "0"}))
            .unwrap_err();
        assert_eq!(err.status().as_u16(), 422);
        assert_eq!(err.payload().unwrap()[0]["field"], "perPage");
    }

    #[test]
    fn test_path_schema_requires_number() {
        let err = post_path_schema().validate(json!({"id": "abc"})).unwrap_err();
        assert_eq!(err.status().as_u16(), 422);
        assert_eq!(err.payload().unwrap()[0]["message"], "Id must be a number");

        assert_eq!(post_path_schema().validate(json!({"id": "12"})).unwrap().id, 12);
    }
}
