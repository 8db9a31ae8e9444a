//! Analysis service for SEACE procurement documents (TDRs).
//!
//! Pipeline: PDF text extraction → rule-based fragment retrieval → LLM
//! structured analysis → sanitization and schema validation, plus a
//! compatibility-scoring pass and a bounded-concurrency batch mode.

pub mod api;
pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod logging;
pub mod routes;
pub mod services;
