//! Blog API
//!
//! A read-only, paginated and searchable blog post API. Every response, success
//! or failure, is wrapped in the same JSON envelope.

pub mod api;
pub mod config;
pub mod errors;
pub mod logging;
pub mod middleware;
pub mod models;
pub mod pagination;
pub mod search;
pub mod store;
pub mod validation;

use std::sync::Arc;

use axum::{middleware::from_fn_with_state, routing::get, Router};
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use logging::{Logger, LoggerRegistry};
use store::PostStore;

/// Name of the logger that records HTTP traffic.
pub const APP_LOGGER: &str = "app";

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub posts: Arc<PostStore>,
    pub logger: Logger,
}

impl AppState {
    pub fn new(posts: PostStore, loggers: &LoggerRegistry) -> Self {
        Self {
            posts: Arc::new(posts),
            logger: loggers.get(APP_LOGGER),
        }
    }
}

/// Create the application router with all routes.
///
/// Unknown paths and unsupported methods on known paths both answer with the
/// 404 envelope. Layers, outermost first: tracing, request log, CORS, security
/// headers, error rendering, panic recovery.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let [nosniff, frame_options, referrer_policy, xss_protection] =
        middleware::security_headers();

    // API routes
    let api_routes = Router::new()
        .route("/posts", get(api::list_posts))
        .route("/posts/", get(api::list_posts))
        .route("/posts/{id}", get(api::get_post))
        .method_not_allowed_fallback(api::not_found);

    Router::new()
        .nest("/api", api_routes)
        .fallback(api::not_found)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(from_fn_with_state(
                    state.logger.clone(),
                    middleware::log_request,
                ))
                .layer(cors)
                .layer(nosniff)
                .layer(frame_options)
                .layer(referrer_policy)
                .layer(xss_protection)
                .layer(from_fn_with_state(
                    state.logger.clone(),
                    middleware::render_errors,
                ))
                .layer(CatchPanicLayer::custom(middleware::panic_to_error)),
        )
        .with_state(state)
}
