//! Data models for the blog API.

mod post;

pub use post::*;
