//! In-memory post collection.
//!
//! Loaded once at startup and shared read-only across all requests, so no
//! locking is needed.

use std::path::Path;

use crate::errors::AppError;
use crate::models::BlogPost;

/// Seed collection bundled into the binary.
const SEED_POSTS: &str = include_str!("../../data/blog.json");

/// Read-only repository over the post collection.
#[derive(Debug, Clone, Default)]
pub struct PostStore {
    posts: Vec<BlogPost>,
}

impl PostStore {
    pub fn new(posts: Vec<BlogPost>) -> Self {
        Self { posts }
    }

    /// Parse a JSON array of posts.
    pub fn from_json(json: &str) -> Result<Self, AppError> {
        let posts: Vec<BlogPost> = serde_json::from_str(json)?;
        Ok(Self::new(posts))
    }

    /// The collection bundled with the binary.
    pub fn seed() -> Result<Self, AppError> {
        Self::from_json(SEED_POSTS)
    }

    /// Load the collection from a JSON file.
    pub async fn load(path: &Path) -> Result<Self, AppError> {
        let json = tokio::fs::read_to_string(path).await?;
        Self::from_json(&json)
    }

    /// Load from `path` when given, otherwise fall back to the seed collection.
    pub async fn open(path: Option<&Path>) -> Result<Self, AppError> {
        match path {
            Some(path) => Self::load(path).await,
            None => Self::seed(),
        }
    }

    /// The whole collection, in stored order.
    pub fn all(&self) -> &[BlogPost] {
        &self.posts
    }

    /// Linear lookup by id.
    pub fn find(&self, id: i64) -> Option<&BlogPost> {
        self.posts.iter().find(|post| post.id == id)
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }
}
