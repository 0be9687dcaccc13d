//! Tool domain module
//!
//! Defines how agents describe and invoke tools. A [`ToolSpec`] is the
//! schema offered to the generation capability, a [`ToolCall`] is what the
//! model asks for, and a [`ToolResult`] is what comes back.
//!
//! ```text
//! ┌──────────────┐    ┌──────────────┐    ┌──────────────┐
//! │ ToolSpec     │───▶│ ToolCall     │───▶│ ToolResult   │
//! │ (schema)     │    │ (invocation) │    │ (observation)│
//! └──────────────┘    └──────────────┘    └──────────────┘
//! ```
//!
//! Research tools (RAG, literature, calculators, criteria) are routed to
//! capabilities by the application layer's `ToolRouter`. Control tools
//! (`ConsultSpecialist`, `submit_counter_referral`, ...) are interpreted by the
//! engine and never routed.

pub mod entities;
pub mod traits;
pub mod value_objects;

pub use entities::{ToolCall, ToolDefinition, ToolKind, ToolParameter, ToolSpec};
pub use traits::{DefaultToolValidator, ToolValidator};
pub use value_objects::{ToolError, ToolResult};
