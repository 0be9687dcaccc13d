//! Logging infrastructure: the structured run transcript.
//!
//! Provides [`JsonlRunEventLogger`], a JSONL file writer that implements
//! the [`RunEventLogger`](interconsult_application::RunEventLogger) port.

mod jsonl_logger;

pub use jsonl_logger::JsonlRunEventLogger;
