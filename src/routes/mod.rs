pub mod analyze;
pub mod batch;
pub mod compatibility;
pub mod health;

use axum::{routing::get, routing::post, Router};
use std::sync::Arc;

use crate::app::AppState;

/// Build the API router with all routes
pub fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(health::service_info))
        .route("/health", get(health::health_check))
        .route("/analyze-tdr", post(analyze::analyze_tdr))
        .route("/compatibility-score", post(compatibility::compatibility_score))
        .route("/batch/analyze-tdrs", post(batch::analyze_batch))
        .route("/batch/stats", get(batch::batch_stats))
}
