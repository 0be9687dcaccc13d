//! Application-level configuration.
//!
//! - [`EngineConfig`]: budgets, limits and policies of a consultation run
//! - [`RetryPolicy`]: bounded backoff for transient generation failures

pub mod engine_config;

pub use engine_config::{EngineConfig, RetryPolicy};
