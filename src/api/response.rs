//! Response envelopes for the HTTP surface.

use axum::{
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::analysis::TdrAnalysis;
use crate::domain::batch::BatchOutcome;

/// Envelope for a single-document analysis.
#[derive(Debug, Serialize)]
pub struct AnalysisEnvelope {
    pub success: bool,
    pub data: TdrAnalysis,
    pub timestamp: DateTime<Utc>,
    pub filename: String,
}

impl AnalysisEnvelope {
    pub fn new(data: TdrAnalysis, filename: impl Into<String>) -> Self {
        Self {
            success: true,
            data,
            timestamp: Utc::now(),
            filename: filename.into(),
        }
    }
}

impl IntoResponse for AnalysisEnvelope {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// Ordered batch outcomes plus aggregate counts.
#[derive(Debug, Serialize)]
pub struct BatchSummary {
    pub results: Vec<BatchOutcome>,
    pub success_count: usize,
    pub error_count: usize,
    pub elapsed_seconds: f64,
}

impl BatchSummary {
    pub fn new(results: Vec<BatchOutcome>, elapsed_seconds: f64) -> Self {
        let success_count = results.iter().filter(|o| o.is_success()).count();
        let error_count = results.len() - success_count;
        Self {
            results,
            success_count,
            error_count,
            elapsed_seconds,
        }
    }
}

impl IntoResponse for BatchSummary {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}
