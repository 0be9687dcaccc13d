//! Generation gateway adapters

pub mod chat_format;
#[cfg(feature = "openai")]
mod openai;

#[cfg(feature = "openai")]
pub use openai::{OpenAiGateway, OpenAiSettings};
