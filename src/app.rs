use axum::{extract::DefaultBodyLimit, http::HeaderName, http::HeaderValue, Router};
use std::sync::Arc;
use tower_http::{
    cors::{AllowHeaders, AllowMethods, Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::config::Settings;
use crate::routes;
use crate::services::{AnalyzerService, BatchProcessor};

/// Header name for request ID
pub const X_REQUEST_ID: &str = "x-request-id";

/// Shared application state
pub struct AppState {
    pub settings: Settings,
    pub analyzer: Arc<AnalyzerService>,
    pub batch: BatchProcessor,
}

impl AppState {
    pub fn new(
        settings: Settings,
        analyzer: Arc<AnalyzerService>,
        batch: BatchProcessor,
    ) -> Arc<Self> {
        Arc::new(Self {
            settings,
            analyzer,
            batch,
        })
    }
}

/// Build the complete application with all middleware
pub fn create_app(state: Arc<AppState>) -> Router {
    let cors = build_cors_layer(&state.settings);

    // Use DEBUG for spans to reduce overhead at INFO level
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::DEBUG))
        .on_request(DefaultOnRequest::new().level(Level::DEBUG))
        .on_response(DefaultOnResponse::new().level(Level::DEBUG));

    let request_id_header = HeaderName::from_static(X_REQUEST_ID);
    let set_request_id = SetRequestIdLayer::new(request_id_header.clone(), MakeRequestUuid);
    let propagate_request_id = PropagateRequestIdLayer::new(request_id_header);

    // A whole batch of maximum-size documents must fit in one request body.
    let body_limit =
        state.settings.max_file_size_bytes() * state.settings.max_batch_files + 1024 * 1024;

    Router::new()
        .merge(routes::api_router())
        // Middleware stack (applied bottom-up)
        .layer(propagate_request_id)
        .layer(trace_layer)
        .layer(set_request_id)
        .layer(cors)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .with_state(state)
}

fn build_cors_layer(settings: &Settings) -> CorsLayer {
    // A wildcard origin cannot be combined with credentials.
    if settings.cors_allow_origins.iter().any(|o| o == "*") {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let origins: Vec<HeaderValue> = settings
        .cors_allow_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(AllowMethods::list([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::ACCEPT,
            HeaderName::from_static(X_REQUEST_ID),
        ]))
        .allow_credentials(true)
}
