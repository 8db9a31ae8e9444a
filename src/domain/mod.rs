//! Domain models and sanitization rules for the analysis wire schemas.
//!
//! Wire field names stay in Spanish to match the consumers of the original
//! service; Rust-side names are idiomatic English.

pub mod analysis;
pub mod batch;
pub mod compatibility;

pub use analysis::TdrAnalysis;
pub use batch::{BatchItem, BatchOutcome, BatchStatus};
pub use compatibility::{CompatibilityLevel, CompatibilityScore, CompatibilityScoreRequest};
