use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

use crate::app::AppState;

#[derive(Serialize)]
pub struct ServiceInfo {
    pub message: String,
    pub version: String,
    pub llm: String,
    pub batch_processing: bool,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub app_name: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub llm_provider: String,
}

/// Root endpoint - service banner
pub async fn service_info(State(state): State<Arc<AppState>>) -> Json<ServiceInfo> {
    Json(ServiceInfo {
        message: state.settings.app_name.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        llm: format!(
            "{} ({})",
            state.settings.default_provider.as_str(),
            state.settings.default_model()
        ),
        batch_processing: state.settings.enable_batch_processing,
    })
}

/// Health check endpoint - public
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        app_name: state.settings.app_name.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
        llm_provider: state.settings.default_provider.as_str().to_string(),
    })
}
