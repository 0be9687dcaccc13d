//! GP (general practitioner) domain: the coordinating agent's phases,
//! action tools, and the rules for reading its responses.

pub mod action;
pub mod phase;
pub mod tools;

pub use action::{GpAction, RejectedCall, interpret, parse_consult_request};
pub use phase::GpPhase;
pub use tools::gp_tool_spec;
