//! Batch input/outcome types.

use serde::Serialize;

use crate::domain::analysis::TdrAnalysis;

/// One document submitted in a batch.
#[derive(Debug, Clone)]
pub struct BatchItem {
    pub filename: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchStatus {
    Success,
    Error,
}

/// Per-document result of a batch run. Outcome order matches input order.
#[derive(Debug, Clone, Serialize)]
pub struct BatchOutcome {
    pub filename: String,
    pub status: BatchStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<TdrAnalysis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BatchOutcome {
    pub fn success(filename: impl Into<String>, analysis: TdrAnalysis) -> Self {
        Self {
            filename: filename.into(),
            status: BatchStatus::Success,
            analysis: Some(analysis),
            error: None,
        }
    }

    pub fn error(filename: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            status: BatchStatus::Error,
            analysis: None,
            error: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == BatchStatus::Success
    }
}
