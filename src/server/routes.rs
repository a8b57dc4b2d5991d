use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{header::CONTENT_DISPOSITION, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use super::{handlers, AppState};
use crate::SynthesisEngine;

/// Build the application router.
///
/// `cors_origins` is `"*"` to allow any origin, or a comma-separated list.
/// Request bodies larger than `max_body_bytes` are rejected with 413.
pub fn create_router<E: SynthesisEngine>(
    state: Arc<AppState<E>>,
    cors_origins: &str,
    max_body_bytes: usize,
) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/voices", get(handlers::list_voices))
        .route("/paragraphs", post(handlers::paragraphs::<E>))
        .route("/synthesize", post(handlers::synthesize::<E>))
        .route("/preload", post(handlers::preload::<E>))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(cors_layer(cors_origins))
        .with_state(state)
}

/// CORS policy for the extension, which calls from its own origin.
pub fn cors_layer(allowed_origins: &str) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
        .expose_headers([CONTENT_DISPOSITION]);

    if allowed_origins.trim() == "*" {
        layer.allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> = allowed_origins
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .filter_map(|origin| origin.parse().ok())
            .collect();
        layer.allow_origin(origins)
    }
}
