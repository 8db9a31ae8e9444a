//! API response envelopes.

pub mod response;
