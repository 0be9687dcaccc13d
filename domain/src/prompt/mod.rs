//! Prompt domain
//!
//! Templates for the GP and specialist prompts at each stage of a run.

mod template;

pub use template::PromptTemplate;
