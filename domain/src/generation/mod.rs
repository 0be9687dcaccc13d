//! Generation domain: conversation history and structured model responses.

pub mod message;
pub mod response;

pub use message::{Message, Role};
pub use response::{ContentBlock, GenerationResponse, StopReason};
