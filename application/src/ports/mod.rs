//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.

pub mod generation;
pub mod knowledge;
pub mod literature;
pub mod progress;
pub mod run_event_logger;
pub mod tool_capability;
