//! Request and error middleware.
//!
//! `log_request` runs first on every request and always passes it on.
//! `render_errors` sits innermost and is the only place an [`AppError`] is
//! logged and written to the client.

use std::any::Any;
use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, OriginalUri, Request, State},
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::Level;

use crate::api::error_response;
use crate::errors::{messages, AppError};
use crate::logging::{LogMeta, Logger};

/// Header carrying the client chain when behind a proxy.
pub const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";

/// Header carrying the original scheme when behind a proxy.
pub const FORWARDED_PROTO_HEADER: &str = "x-forwarded-proto";

/// Log method, absolute URL and client address, then continue.
pub async fn log_request(State(logger): State<Logger>, request: Request, next: Next) -> Response {
    let meta = LogMeta {
        url: Some(request_url(&request)),
        ip: client_ip(&request),
    };
    logger.log(Level::INFO, request.method().as_str(), Some(&meta));

    next.run(request).await
}

/// Turn any carrier left in the response into the error envelope.
pub async fn render_errors(State(logger): State<Logger>, request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;

    match response.extensions_mut().remove::<AppError>() {
        Some(error) => handle_error(&logger, error),
        None => response,
    }
}

/// Log a carrier at the severity of its status class and render it.
///
/// Server-class failures are answered with the generic message and no payload;
/// the real message only goes to the log.
pub fn handle_error(logger: &Logger, error: AppError) -> Response {
    let status = error.status();
    let message = match error.message() {
        "" => messages::SERVER_ERROR,
        message => message,
    };

    logger.log(severity(status), message, None);

    if error.is_server_error() {
        return error_response(status, messages::SERVER_ERROR, None);
    }
    error_response(status, message, error.payload().cloned())
}

/// 3xx and 4xx are the client's doing and log as warnings; anything else is an error.
pub fn severity(status: StatusCode) -> Level {
    match status.as_u16() / 100 {
        3 | 4 => Level::WARN,
        _ => Level::ERROR,
    }
}

/// Convert a handler panic into a carrier so it reaches `render_errors`.
pub fn panic_to_error(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };

    AppError::internal(format!("Handler panicked: {}", detail)).into_response()
}

/// Security headers added to every response unless a handler set them.
pub fn security_headers() -> [SetResponseHeaderLayer<HeaderValue>; 4] {
    [
        (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
        (header::X_FRAME_OPTIONS, "SAMEORIGIN"),
        (header::REFERRER_POLICY, "no-referrer"),
        (header::X_XSS_PROTECTION, "0"),
    ]
    .map(|(name, value): (HeaderName, &'static str)| {
        SetResponseHeaderLayer::if_not_present(name, HeaderValue::from_static(value))
    })
}

/// Rebuild `scheme://host/original-path?query` for the log line.
fn request_url(request: &Request) -> String {
    let headers = request.headers();
    let uri = request
        .extensions()
        .get::<OriginalUri>()
        .map(|original| &original.0)
        .unwrap_or_else(|| request.uri());

    let scheme = first_value(headers, FORWARDED_PROTO_HEADER)
        .or_else(|| uri.scheme_str().map(str::to_string))
        .unwrap_or_else(|| "http".to_string());

    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .or_else(|| uri.authority().map(|a| a.to_string()))
        .unwrap_or_else(|| "localhost".to_string());

    let path = uri.path_and_query().map(|p| p.as_str()).unwrap_or("/");

    format!("{}://{}{}", scheme, host, path)
}

/// First forwarded address if present, else the peer address of the socket.
fn client_ip(request: &Request) -> Option<String> {
    first_value(request.headers(), FORWARDED_FOR_HEADER)
        .or_else(|| first_value(request.headers(), header::FORWARDED.as_str()))
        .or_else(|| {
            request
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string())
        })
}

/// First comma-separated entry of a header, trimmed.
fn first_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, middleware, routing::get, Router};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::validation::FieldError;

    fn logger() -> Logger {
        Logger::new("test", Level::ERROR)
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn app() -> Router {
        Router::new()
            .route("/missing", get(|| async { AppError::not_found("Post not found") }))
            .route(
                "/invalid",
                get(|| async {
                    AppError::validation(vec![FieldError::new("perPage", "PerPage is required")])
                }),
            )
            .route(
                "/broken",
                get(|| async { AppError::internal("connection refused at 10.0.0.7") }),
            )
            .route("/ok", get(|| async { "fine" }))
            .layer(middleware::from_fn_with_state(logger(), render_errors))
    }

    async fn call(uri: &str) -> Response {
        app()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    #[test]
    fn test_severity_by_status_class() {
        assert_eq!(severity(StatusCode::MOVED_PERMANENTLY), Level::WARN);
        assert_eq!(severity(StatusCode::NOT_FOUND), Level::WARN);
        assert_eq!(severity(StatusCode::UNPROCESSABLE_ENTITY), Level::WARN);
        assert_eq!(severity(StatusCode::INTERNAL_SERVER_ERROR), Level::ERROR);
        assert_eq!(severity(StatusCode::OK), Level::ERROR);
    }

    #[tokio::test]
    async fn test_not_found_rendered() {
        let response = call("/missing").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = body_json(response).await;
        assert_eq!(body["meta"]["success"], false);
        assert_eq!(body["meta"]["code"], 404);
        assert_eq!(body["meta"]["message"], "Post not found");
        assert!(body.get("data").is_none());
    }

    #[tokio::test]
    async fn test_validation_rendered_with_errors() {
        let response = call("/invalid").await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = body_json(response).await;
        assert_eq!(body["meta"]["message"], "Validation Error");
        assert_eq!(
            body["errors"],
            json!([{"field": "perPage", "message": "PerPage is required"}])
        );
    }

    #[tokio::test]
    async fn test_server_error_message_not_leaked() {
        let response = call("/broken").await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["meta"]["message"], "Internal Server Error");
        assert_eq!(body["meta"]["status"], "Server Error");
    }

    #[tokio::test]
    async fn test_success_passes_through() {
        let response = call("/ok").await;
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&bytes[..], b"fine");
    }

    #[test]
    fn test_empty_message_defaults() {
        let response = handle_error(&logger(), AppError::new("", None, StatusCode::BAD_REQUEST));
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_panic_becomes_carrier() {
        let response = panic_to_error(Box::new("boom"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let carried = response.extensions().get::<AppError>().unwrap();
        assert_eq!(carried.message(), "Handler panicked: boom");
    }

    #[test]
    fn test_request_url_and_forwarded_ip() {
        let request = Request::builder()
            .uri("/api/posts?page=2")
            .header(header::HOST, "blog.example.com")
            .header(FORWARDED_PROTO_HEADER, "https")
            .header(FORWARDED_FOR_HEADER, "203.0.113.9, 10.0.0.1")
            .body(Body::empty())
            .unwrap();

        assert_eq!(
            request_url(&request),
            "https://blog.example.com/api/posts?page=2"
        );
        assert_eq!(client_ip(&request).as_deref(), Some("203.0.113.9"));
    }

    #[test]
    fn test_client_ip_falls_back_to_socket() {
        let mut request = Request::builder().uri("/").body(Body::empty()).unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 5000))));

        assert_eq!(client_ip(&request).as_deref(), Some("127.0.0.1"));
        assert_eq!(request_url(&request), "http://localhost/");
    }
}
